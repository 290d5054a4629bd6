use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

/// A catch-all top-level resource with no fixed schema of its own. Modeled
/// minimally (free-form settings) so it participates in the Registry and
/// Condition Manager like every other resource; see DESIGN.md for the
/// rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub metadata: Metadata,
    pub settings: serde_json::Value,
}

impl Policy {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            settings: serde_json::Value::Null,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
