//! Task definitions and argument merging.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword arguments for a task call.
pub type Kwargs = Map<String, Value>;

/// Identity of a callable in a worker's task catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableRef {
    /// Catalog name (e.g., "square").
    pub name: String,
}

impl CallableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A unit of work: a callable plus the "setup" arguments bound at gateway
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The callable to run on the worker.
    pub callable: CallableRef,
    /// Setup positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Setup keyword arguments.
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl Task {
    /// Task with no setup arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            callable: CallableRef::new(name),
            args: Vec::new(),
            kwargs: Kwargs::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn name(&self) -> &str {
        &self.callable.name
    }

    /// Merge setup arguments with call-time arguments.
    ///
    /// Call-time kwargs win on key collision. When the call brings no
    /// positional list, the setup positionals are used; an explicit call
    /// list replaces them entirely.
    pub fn merge(
        &self,
        call_args: Option<Vec<Value>>,
        call_kwargs: Kwargs,
    ) -> (Vec<Value>, Kwargs) {
        let args = match call_args {
            Some(args) => args,
            None => self.args.clone(),
        };

        let mut kwargs = self.kwargs.clone();
        kwargs.extend(call_kwargs);

        (args, kwargs)
    }
}
