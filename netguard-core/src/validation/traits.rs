//! The validator seam. The orchestrator never inspects a resource's
//! fields itself — every creation/update/delete is routed through whatever
//! `Validator` it was built with, and the full catalogue of business rules a
//! production deployment would enforce is explicitly left to that
//! implementation, not to this crate.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::AnyResource;
use crate::registry::Reader;

#[async_trait]
pub trait Validator: Send + Sync {
    /// Checked before a new resource's write is buffered. `reader` already
    /// includes whatever else this same unit of work has buffered so far.
    async fn validate_for_creation(&self, resource: &AnyResource, reader: &dyn Reader) -> Result<()>;

    /// Checked before an existing resource's write is buffered.
    async fn validate_for_update(&self, resource: &AnyResource, reader: &dyn Reader) -> Result<()>;

    /// Checked before a delete is buffered. Returning an error blocks the
    /// delete; cascading kinds are handled by the
    /// orchestrator itself and don't rely on this call to do it.
    async fn check_dependencies(&self, resource: &AnyResource, reader: &dyn Reader) -> Result<()>;
}
