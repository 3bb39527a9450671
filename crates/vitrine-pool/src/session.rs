//! Document session: groups the leases held by one open document.
//!
//! A document embeds components as it is rendered and returns all of
//! them at once when it unloads, followed by a reset sweep so the
//! returned instances are clean for the next document.

use tracing::{debug, info};

use vitrine_types::ComponentKind;

use crate::component::InstanceHandle;
use crate::error::PoolError;
use crate::pool::{InstancePool, Lease, ResetSummary, StopSummary};

/// Leases held on behalf of one open document.
pub struct DocumentSession {
    pool: InstancePool,
    label: String,
    leases: Vec<Lease>,
}

impl DocumentSession {
    /// Opens a session against the given pool.
    pub fn new(pool: InstancePool, label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(label = %label, "document session opened");
        Self {
            pool,
            label,
            leases: Vec::new(),
        }
    }

    /// Checks out an instance for this document and keeps the lease
    /// until [`unload`](Self::unload) or drop.
    ///
    /// # Errors
    /// Propagates any checkout error from the pool.
    pub async fn embed(&mut self, kind: &ComponentKind) -> Result<InstanceHandle, PoolError> {
        let lease = self.pool.checkout(kind).await?;
        debug!(label = %self.label, id = %lease.id(), kind = %kind, "component embedded");
        let instance = std::sync::Arc::clone(lease.instance());
        self.leases.push(lease);
        Ok(instance)
    }

    /// Number of components currently embedded.
    pub fn embedded(&self) -> usize {
        self.leases.len()
    }

    /// Returns every lease to the pool, then runs the reset sweep so
    /// the returned instances are clean for the next document.
    pub fn unload(&mut self) -> ResetSummary {
        let returned = self.leases.len();
        self.leases.clear();
        let summary = self.pool.reset();
        if returned > 0 {
            info!(label = %self.label, returned, "document unloaded");
        }
        summary
    }

    /// Stops everything this pool currently has running, without
    /// returning this document's leases.
    pub fn suspend(&self) -> StopSummary {
        self.pool.stop_all_running()
    }

    /// Label given at construction, for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        if !self.leases.is_empty() {
            self.leases.clear();
            self.pool.reset();
        }
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("label", &self.label)
            .field("embedded", &self.leases.len())
            .finish()
    }
}
