//! The closed set of resource kinds the control plane knows about.
//!
//! Kept as a tagged enum purely for batch/ref bookkeeping (routing an
//! `AnyResource` to its per-kind handler, labeling a `Ref`). The actual
//! per-kind logic lives as ordinary typed methods, not behind a dispatch
//! table keyed by this enum, so the compiler checks call sites directly.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Service,
    AddressGroup,
    AddressGroupBinding,
    AddressGroupPortMapping,
    AddressGroupBindingPolicy,
    ServiceAlias,
    RuleS2S,
    IEAgAgRule,
    Network,
    NetworkBinding,
    Policy,
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        ResourceKind::Service,
        ResourceKind::AddressGroup,
        ResourceKind::AddressGroupBinding,
        ResourceKind::AddressGroupPortMapping,
        ResourceKind::AddressGroupBindingPolicy,
        ResourceKind::ServiceAlias,
        ResourceKind::RuleS2S,
        ResourceKind::IEAgAgRule,
        ResourceKind::Network,
        ResourceKind::NetworkBinding,
        ResourceKind::Policy,
    ];

    /// Whether clients may write this kind directly. `IEAgAgRule` and
    /// `AddressGroupPortMapping` are derived-only.
    pub fn is_client_writable(self) -> bool {
        !matches!(
            self,
            ResourceKind::IEAgAgRule | ResourceKind::AddressGroupPortMapping
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Service => "Service",
            ResourceKind::AddressGroup => "AddressGroup",
            ResourceKind::AddressGroupBinding => "AddressGroupBinding",
            ResourceKind::AddressGroupPortMapping => "AddressGroupPortMapping",
            ResourceKind::AddressGroupBindingPolicy => "AddressGroupBindingPolicy",
            ResourceKind::ServiceAlias => "ServiceAlias",
            ResourceKind::RuleS2S => "RuleS2S",
            ResourceKind::IEAgAgRule => "IEAgAgRule",
            ResourceKind::Network => "Network",
            ResourceKind::NetworkBinding => "NetworkBinding",
            ResourceKind::Policy => "Policy",
        };
        f.write_str(s)
    }
}
