use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::ieagag_rule::Direction;
use super::metadata::Metadata;

/// A declarative service-to-service rule. On write, the reactive engine
/// regenerates its derived [`super::ieagag_rule::IEAgAgRule`]s and
/// durably records their identifiers in `ieagag_rule_refs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleS2S {
    pub metadata: Metadata,
    pub service_local_ref: Identifier,
    pub service_ref: Identifier,
    pub direction: Direction,
    pub ieagag_rule_refs: Vec<Identifier>,
}

impl RuleS2S {
    pub fn new(
        identifier: Identifier,
        service_local_ref: Identifier,
        service_ref: Identifier,
        direction: Direction,
    ) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            service_local_ref,
            service_ref,
            direction,
            ieagag_rule_refs: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
