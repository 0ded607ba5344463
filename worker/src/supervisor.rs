//! Listener supervision.
//!
//! Each listener runs in its own tokio task. When it fails or panics it is
//! restarted after a delay; the other listener is unaffected.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Aborts the running listener when the supervisor itself goes away.
struct AbortOnDrop(JoinHandle<std::io::Result<()>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawn `make_listener` under supervision.
///
/// Aborting the returned handle also stops the running listener.
///
/// The factory is called again for every restart, so it must rebuild
/// everything the listener needs (including binding the socket). A listener
/// that returns `Ok(())` is treated as a clean shutdown and not restarted.
pub fn spawn_supervised<F, Fut>(
    name: &'static str,
    restart_delay: Duration,
    make_listener: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(supervise(name, restart_delay, make_listener))
}

/// Run `make_listener` until it shuts down cleanly, restarting it on failure.
pub async fn supervise<F, Fut>(name: &'static str, restart_delay: Duration, mut make_listener: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let mut restarts: u64 = 0;
    loop {
        tracing::info!(listener = name, restarts, "Starting listener");

        let mut listener = AbortOnDrop(tokio::spawn(make_listener()));
        match (&mut listener.0).await {
            Ok(Ok(())) => {
                tracing::info!(listener = name, "Listener stopped");
                return;
            }
            Ok(Err(e)) => {
                tracing::error!(listener = name, error = %e, "Listener failed");
            }
            Err(e) if e.is_panic() => {
                tracing::error!(listener = name, "Listener panicked");
            }
            Err(_) => {
                tracing::info!(listener = name, "Listener cancelled");
                return;
            }
        }

        restarts += 1;
        tracing::info!(
            listener = name,
            "Restarting listener in {}ms",
            restart_delay.as_millis()
        );
        tokio::time::sleep(restart_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_restarts_after_error_and_panic() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        supervise("test", Duration::from_millis(1), move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match attempt {
                    0 => Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy")),
                    1 => panic!("listener crashed"),
                    _ => Ok(()),
                }
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clean_shutdown_is_not_restarted() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        supervise("test", Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_aborting_supervisor_stops_listener() {
        let started = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let (started_flag, stopped_flag) = (started.clone(), stopped.clone());

        let handle = spawn_supervised("test", Duration::from_millis(1), move || {
            started_flag.store(true, Ordering::SeqCst);
            let guard = SetOnDrop(stopped_flag.clone());
            async move {
                let _guard = guard;
                std::future::pending::<()>().await;
                Ok(())
            }
        });

        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!stopped.load(Ordering::SeqCst));

        handle.abort();
        let _ = handle.await;
        for _ in 0..100 {
            if stopped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(stopped.load(Ordering::SeqCst));
    }
}
