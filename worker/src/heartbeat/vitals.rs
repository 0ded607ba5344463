//! Host vitals sampling.

use std::sync::Mutex;

use sysinfo::System;

/// One load sample of the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostVitals {
    /// CPU load percentage in `[0, 100]`.
    pub cpu: f64,
    /// Memory used percentage in `[0, 100]`.
    pub memory: f64,
}

impl HostVitals {
    /// Build a sample, clamping both values into `[0, 100]`.
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            cpu: clamp_percent(cpu),
            memory: clamp_percent(memory),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Source of host load samples.
pub trait VitalsSource: Send + Sync {
    fn sample(&self) -> HostVitals;
}

/// Samples the real host through `sysinfo`.
///
/// CPU usage is computed between consecutive refreshes, so the first sample
/// after startup may read low.
pub struct SystemVitals {
    system: Mutex<System>,
}

impl SystemVitals {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemVitals {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsSource for SystemVitals {
    fn sample(&self) -> HostVitals {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_cpu_usage();
        system.refresh_memory();

        let cpu = system.global_cpu_usage() as f64;
        let total = system.total_memory() as f64;
        let memory = if total > 0.0 {
            system.used_memory() as f64 / total * 100.0
        } else {
            0.0
        };

        HostVitals::new(cpu, memory)
    }
}

/// Fixed sample, for tests and for hosts where sampling is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct FixedVitals(pub HostVitals);

impl VitalsSource for FixedVitals {
    fn sample(&self) -> HostVitals {
        self.0
    }
}
