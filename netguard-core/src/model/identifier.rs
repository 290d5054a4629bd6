//! Namespaced resource identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::kind::ResourceKind;

/// A `(name, namespace)` pair. The `Display` impl produces the stable
/// `"namespace/name"` key used in maps, logs and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Validate)]
pub struct Identifier {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "namespace must not be empty"))]
    pub namespace: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The stable `"namespace/name"` key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// An identifier plus the kind of resource it points at. Used wherever one
/// resource references another (`ServiceRef`, `AddressGroupRef`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    pub identifier: Identifier,
    pub kind: ResourceKind,
}

impl Ref {
    pub fn new(kind: ResourceKind, identifier: Identifier) -> Self {
        Self { identifier, kind }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespace_slash_name() {
        let id = Identifier::new("default", "ag1");
        assert_eq!(id.key(), "default/ag1");
        assert_eq!(id.to_string(), "default/ag1");
    }
}
