use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub metadata: Metadata,
    /// Raw CIDR text as supplied by the client (e.g. `"10.0.0.0/24"`).
    /// Parsing/validity is a validator concern; the model stores the
    /// text verbatim.
    pub cidr: String,
}

impl Network {
    pub fn new(identifier: Identifier, cidr: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            cidr: cidr.into(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}

/// Associates a Network with an AddressGroup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkBinding {
    pub metadata: Metadata,
    pub network_ref: Identifier,
    pub address_group_ref: Identifier,
}

impl NetworkBinding {
    pub fn new(identifier: Identifier, network_ref: Identifier, address_group_ref: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            network_ref,
            address_group_ref,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
