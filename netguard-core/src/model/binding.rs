use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressGroupBinding {
    pub metadata: Metadata,
    pub service_ref: Identifier,
    pub address_group_ref: Identifier,
}

impl AddressGroupBinding {
    pub fn new(identifier: Identifier, service_ref: Identifier, address_group_ref: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            service_ref,
            address_group_ref,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}

/// Client-declared policy scoping which Service/AddressGroup pairs may be
/// bound. The core only stores and reports conditions for it; enforcement
/// of the policy's rules is a validator concern, out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressGroupBindingPolicy {
    pub metadata: Metadata,
    pub address_group_ref: Identifier,
    pub service_ref: Identifier,
}

impl AddressGroupBindingPolicy {
    pub fn new(identifier: Identifier, address_group_ref: Identifier, service_ref: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            address_group_ref,
            service_ref,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
