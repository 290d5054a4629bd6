//! A heterogeneous resource wrapper, used where the facade boundary needs
//! to talk about "some resource of some kind" — logging, cascade-delete
//! bookkeeping, condition-manager dispatch — without every call site
//! having to be generic. Per-kind write paths on [`crate::orchestrator`]
//! remain strongly typed; this enum is not used as a dispatch table.

use super::address_group::AddressGroup;
use super::alias::ServiceAlias;
use super::binding::{AddressGroupBinding, AddressGroupBindingPolicy};
use super::identifier::Identifier;
use super::ieagag_rule::IEAgAgRule;
use super::kind::ResourceKind;
use super::network::{Network, NetworkBinding};
use super::policy::Policy;
use super::port_mapping::AddressGroupPortMapping;
use super::rule_s2s::RuleS2S;
use super::service::Service;

#[derive(Debug, Clone)]
pub enum AnyResource {
    Service(Service),
    AddressGroup(AddressGroup),
    AddressGroupBinding(AddressGroupBinding),
    AddressGroupPortMapping(AddressGroupPortMapping),
    AddressGroupBindingPolicy(AddressGroupBindingPolicy),
    ServiceAlias(ServiceAlias),
    RuleS2S(RuleS2S),
    IEAgAgRule(IEAgAgRule),
    Network(Network),
    NetworkBinding(NetworkBinding),
    Policy(Policy),
}

impl AnyResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Service(_) => ResourceKind::Service,
            AnyResource::AddressGroup(_) => ResourceKind::AddressGroup,
            AnyResource::AddressGroupBinding(_) => ResourceKind::AddressGroupBinding,
            AnyResource::AddressGroupPortMapping(_) => ResourceKind::AddressGroupPortMapping,
            AnyResource::AddressGroupBindingPolicy(_) => ResourceKind::AddressGroupBindingPolicy,
            AnyResource::ServiceAlias(_) => ResourceKind::ServiceAlias,
            AnyResource::RuleS2S(_) => ResourceKind::RuleS2S,
            AnyResource::IEAgAgRule(_) => ResourceKind::IEAgAgRule,
            AnyResource::Network(_) => ResourceKind::Network,
            AnyResource::NetworkBinding(_) => ResourceKind::NetworkBinding,
            AnyResource::Policy(_) => ResourceKind::Policy,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        match self {
            AnyResource::Service(r) => r.identifier(),
            AnyResource::AddressGroup(r) => r.identifier(),
            AnyResource::AddressGroupBinding(r) => r.identifier(),
            AnyResource::AddressGroupPortMapping(r) => r.identifier(),
            AnyResource::AddressGroupBindingPolicy(r) => r.identifier(),
            AnyResource::ServiceAlias(r) => r.identifier(),
            AnyResource::RuleS2S(r) => r.identifier(),
            AnyResource::IEAgAgRule(r) => r.identifier(),
            AnyResource::Network(r) => r.identifier(),
            AnyResource::NetworkBinding(r) => r.identifier(),
            AnyResource::Policy(r) => r.identifier(),
        }
    }
}

macro_rules! any_resource_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for AnyResource {
            fn from(value: $ty) -> Self {
                AnyResource::$variant(value)
            }
        }
    };
}

any_resource_from!(Service, Service);
any_resource_from!(AddressGroup, AddressGroup);
any_resource_from!(AddressGroupBinding, AddressGroupBinding);
any_resource_from!(AddressGroupPortMapping, AddressGroupPortMapping);
any_resource_from!(AddressGroupBindingPolicy, AddressGroupBindingPolicy);
any_resource_from!(ServiceAlias, ServiceAlias);
any_resource_from!(RuleS2S, RuleS2S);
any_resource_from!(IEAgAgRule, IEAgAgRule);
any_resource_from!(Network, Network);
any_resource_from!(NetworkBinding, NetworkBinding);
any_resource_from!(Policy, Policy);
