use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultAction {
    Accept,
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressGroup {
    pub metadata: Metadata,
    pub default_action: DefaultAction,
    pub logs: bool,
    pub trace: bool,
}

impl AddressGroup {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            default_action: DefaultAction::Drop,
            logs: false,
            trace: false,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }
}
