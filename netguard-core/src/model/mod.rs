//! Canonical resource model: identifiers, refs, per-kind entities and
//! condition/metadata scaffolding shared by all of them.

pub mod address_group;
pub mod alias;
pub mod binding;
pub mod condition;
pub mod identifier;
pub mod ieagag_rule;
pub mod kind;
pub mod metadata;
pub mod network;
pub mod policy;
pub mod port_mapping;
pub mod resource;
pub mod rule_s2s;
pub mod service;

pub use address_group::AddressGroup;
pub use alias::ServiceAlias;
pub use binding::{AddressGroupBinding, AddressGroupBindingPolicy};
pub use condition::{Condition, ConditionReason, ConditionSet, ConditionStatus, ConditionType};
pub use identifier::{Identifier, Ref};
pub use ieagag_rule::{Direction, IEAgAgRule, RuleAction, RulePort, Transport};
pub use kind::ResourceKind;
pub use metadata::Metadata;
pub use network::{Network, NetworkBinding};
pub use policy::Policy;
pub use port_mapping::{AddressGroupPortMapping, ProtocolPorts};
pub use resource::AnyResource;
pub use rule_s2s::RuleS2S;
pub use service::{IngressPort, Protocol, Service};
