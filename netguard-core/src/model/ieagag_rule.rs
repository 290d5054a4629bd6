use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    pub fn as_lower(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    /// The 3-letter lower-case prefix used in deterministic rule names:
    /// `ing` / `egr`.
    pub fn prefix3(self) -> &'static str {
        match self {
            Direction::Ingress => "ing",
            Direction::Egress => "egr",
        }
    }

    pub fn as_lower(self) -> &'static str {
        match self {
            Direction::Ingress => "ingress",
            Direction::Egress => "egress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Accept,
    Drop,
}

/// A single port entry on a derived rule. The generator always emits one
/// entry per `(local AG, target AG, transport)` triple whose `destination`
/// is the comma-joined raw port strings from the source service, in
/// source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePort {
    pub destination: String,
}

/// A derived ingress/egress rule between a pair of AddressGroups. Never
/// written by clients — produced only by [`crate::generate::generate`] and
/// reconciled by [`crate::reactive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IEAgAgRule {
    pub metadata: Metadata,
    pub transport: Transport,
    pub direction: Direction,
    pub address_group_local: Identifier,
    pub address_group: Identifier,
    pub ports: Vec<RulePort>,
    pub action: RuleAction,
    pub priority: i32,
    pub logs: bool,
    /// The RuleS2S that currently owns this derived rule. Exactly one
    /// owner at a time.
    pub owner: Identifier,
}

impl IEAgAgRule {
    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
