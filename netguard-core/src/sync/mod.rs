//! External Sync Bridge: a fire-and-forget notification hook the
//! orchestrator calls after a commit, carrying whatever changed to whatever
//! downstream system (e.g. an enforcement data plane) cares. Never blocks
//! the request that triggered it and never feeds validation — only the
//! condition manager's `Synced` stamp observes its outcome.

use async_trait::async_trait;

use crate::model::{AnyResource, ResourceKind};

/// What happened to one resource in a unit of work, as reported to the
/// sync bridge.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Upserted(AnyResource),
    Deleted(ResourceKind, crate::model::Identifier),
}

#[async_trait]
pub trait SyncManager: Send + Sync {
    /// Push a batch of changes downstream. `Ok(())` means the bridge
    /// accepted the batch for delivery, not that delivery is confirmed —
    /// callers that need confirmation should report it back out-of-band.
    async fn push(&self, events: Vec<SyncEvent>) -> Result<(), String>;
}

/// Accepts every batch and does nothing with it. The default for
/// deployments (and tests) with no downstream to sync to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSyncManager;

#[async_trait]
impl SyncManager for NoopSyncManager {
    async fn push(&self, _events: Vec<SyncEvent>) -> Result<(), String> {
        Ok(())
    }
}

/// Logs every batch at `info` and accepts it. Useful for demoing the
/// orchestrator without a real downstream to wire up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSyncManager;

#[async_trait]
impl SyncManager for LoggingSyncManager {
    async fn push(&self, events: Vec<SyncEvent>) -> Result<(), String> {
        for event in &events {
            match event {
                SyncEvent::Upserted(resource) => {
                    tracing::info!(kind = %resource.kind(), id = %resource.identifier(), "external sync: upsert");
                }
                SyncEvent::Deleted(kind, id) => {
                    tracing::info!(%kind, %id, "external sync: delete");
                }
            }
        }
        Ok(())
    }
}
