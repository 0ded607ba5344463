//! Task catalog: the callables a worker is willing to run.
//!
//! Envelopes name a callable; they never carry executable code. Only
//! functions registered here can be invoked.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use taskgate_common::Kwargs;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure raised by a task body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TaskFault(pub String);

impl TaskFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A registered task body. Runs on a blocking thread.
pub type TaskFn = Arc<dyn Fn(&[Value], &Kwargs) -> Result<Value, TaskFault> + Send + Sync>;

/// Registry of named task bodies.
pub struct TaskCatalog {
    tasks: RwLock<HashMap<String, TaskFn>>,
}

impl TaskCatalog {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Catalog preloaded with the built-in tasks.
    pub fn builtin() -> Self {
        let mut tasks: HashMap<String, TaskFn> = HashMap::new();
        tasks.insert("identity".to_string(), Arc::new(identity));
        tasks.insert("square".to_string(), Arc::new(square));
        tasks.insert("add".to_string(), Arc::new(add));
        tasks.insert("sum".to_string(), Arc::new(sum));
        tasks.insert("echo".to_string(), Arc::new(echo));
        tasks.insert("sleep_ms".to_string(), Arc::new(sleep_ms));
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    /// Register a task under a name, replacing any previous one.
    pub async fn register<F>(&self, name: &str, task: F)
    where
        F: Fn(&[Value], &Kwargs) -> Result<Value, TaskFault> + Send + Sync + 'static,
    {
        self.tasks.write().await.insert(name.to_string(), Arc::new(task));
        tracing::info!("Registered task: {}", name);
    }

    pub async fn get(&self, name: &str) -> Option<TaskFn> {
        self.tasks.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.tasks.read().await.contains_key(name)
    }

    /// Names of all registered tasks, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Positional argument at `index`, or the keyword argument `name`.
fn argument<'a>(
    args: &'a [Value],
    kwargs: &'a Kwargs,
    index: usize,
    name: &str,
) -> Result<&'a Value, TaskFault> {
    args.get(index)
        .or_else(|| kwargs.get(name))
        .ok_or_else(|| TaskFault::new(format!("missing argument '{}'", name)))
}

fn number(value: &Value, name: &str) -> Result<Value, TaskFault> {
    if value.is_number() {
        Ok(value.clone())
    } else {
        Err(TaskFault::new(format!("argument '{}' must be a number, got {}", name, value)))
    }
}

fn float(value: &Value, name: &str) -> Result<f64, TaskFault> {
    value.as_f64().ok_or_else(|| {
        TaskFault::new(format!("argument '{}' must be a number, got {}", name, value))
    })
}

fn identity(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    argument(args, kwargs, 0, "x").cloned()
}

fn square(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    let x = number(argument(args, kwargs, 0, "x")?, "x")?;
    if let Some(i) = x.as_i64() {
        return i
            .checked_mul(i)
            .map(Value::from)
            .ok_or_else(|| TaskFault::new(format!("square of {} overflows", i)));
    }
    let f = float(&x, "x")?;
    Ok(json!(f * f))
}

fn add(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    let a = number(argument(args, kwargs, 0, "a")?, "a")?;
    let b = number(argument(args, kwargs, 1, "b")?, "b")?;
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a
            .checked_add(b)
            .map(Value::from)
            .ok_or_else(|| TaskFault::new(format!("{} + {} overflows", a, b)));
    }
    Ok(json!(float(&a, "a")? + float(&b, "b")?))
}

/// Sums every positional argument, or the `values` keyword list.
fn sum(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    let values: &[Value] = if args.is_empty() {
        match kwargs.get("values") {
            Some(Value::Array(values)) => values.as_slice(),
            Some(other) => {
                return Err(TaskFault::new(format!("'values' must be a list, got {}", other)));
            }
            None => &[],
        }
    } else {
        args
    };

    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut all_ints = true;
    for value in values {
        let value = number(value, "values")?;
        if all_ints {
            match value.as_i64().and_then(|i| int_total.checked_add(i)) {
                Some(total) => {
                    int_total = total;
                    continue;
                }
                None => {
                    all_ints = false;
                    float_total = int_total as f64;
                }
            }
        }
        float_total += float(&value, "values")?;
    }

    Ok(if all_ints { json!(int_total) } else { json!(float_total) })
}

fn echo(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    Ok(json!({ "args": args, "kwargs": kwargs }))
}

fn sleep_ms(args: &[Value], kwargs: &Kwargs) -> Result<Value, TaskFault> {
    let ms = argument(args, kwargs, 0, "ms")?;
    let ms = ms.as_u64().ok_or_else(|| {
        TaskFault::new(format!("argument 'ms' must be a non-negative integer, got {}", ms))
    })?;
    std::thread::sleep(Duration::from_millis(ms));
    Ok(json!(ms))
}
