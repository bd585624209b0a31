//! Repositories for the campaign portal, layered over the CRM SQL gateway.
//!
//! Modules are free async functions over a [`DbContext`], which bundles the
//! gateway with the table resolver. No state is held beyond the resolver's
//! process-local memo; every operation is independent and stateless.

pub mod campaigns;
mod error;
pub mod features;
pub mod requirements;
pub mod resolver;
pub mod users;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;

use hirelane_gateway::CrmGateway;
use hirelane_store::KvStore;

pub use error::RepoError;
pub use resolver::{LogicalTable, TableResolver};

/// Shared handle the repository functions operate on.
pub struct DbContext {
    gateway: Arc<dyn CrmGateway>,
    resolver: TableResolver,
}

impl DbContext {
    #[must_use]
    pub fn new(gateway: Arc<dyn CrmGateway>, store: Arc<dyn KvStore>) -> Self {
        let resolver = TableResolver::new(Arc::clone(&gateway), store);
        Self { gateway, resolver }
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn CrmGateway {
        self.gateway.as_ref()
    }

    #[must_use]
    pub fn resolver(&self) -> &TableResolver {
        &self.resolver
    }
}
