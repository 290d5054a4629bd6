use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

/// Indirection from a RuleS2S to a Service, allowing rules to be written
/// against stable aliases rather than Service identifiers directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAlias {
    pub metadata: Metadata,
    pub service_ref: Identifier,
}

impl ServiceAlias {
    pub fn new(identifier: Identifier, service_ref: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            service_ref,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
