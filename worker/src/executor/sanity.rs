//! Sanity gates run before a task is invoked.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use taskgate_common::{CallableRef, Kwargs};

use super::TaskCatalog;

/// Gate deciding whether a dispatched task may run.
///
/// A `false` answer is a normal outcome (`failed_check`), not an error.
#[async_trait]
pub trait SanityCheck: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &'static str;

    async fn check(&self, callable: &CallableRef, args: &[Value], kwargs: &Kwargs) -> bool;
}

/// Lets every task through.
pub struct AllowAll;

#[async_trait]
impl SanityCheck for AllowAll {
    fn name(&self) -> &'static str {
        "allow_all"
    }

    async fn check(&self, _callable: &CallableRef, _args: &[Value], _kwargs: &Kwargs) -> bool {
        true
    }
}

/// Passes only callables registered in the task catalog.
pub struct CatalogMembership {
    catalog: Arc<TaskCatalog>,
}

impl CatalogMembership {
    pub fn new(catalog: Arc<TaskCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl SanityCheck for CatalogMembership {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn check(&self, callable: &CallableRef, _args: &[Value], _kwargs: &Kwargs) -> bool {
        self.catalog.contains(&callable.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allow_all() {
        assert!(AllowAll.check(&CallableRef::new("anything"), &[], &Kwargs::new()).await);
    }

    #[tokio::test]
    async fn test_catalog_membership() {
        let gate = CatalogMembership::new(Arc::new(TaskCatalog::builtin()));
        assert!(gate.check(&CallableRef::new("square"), &[], &Kwargs::new()).await);
        assert!(!gate.check(&CallableRef::new("os.system"), &[], &Kwargs::new()).await);
    }
}
