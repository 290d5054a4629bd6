//! Reader/Writer/Registry seams.
//!
//! Everything above this module — dependency index, generator, reactive
//! engine, validators, condition manager, orchestrator — is written purely
//! against these traits. No module outside `registry` knows whether a given
//! `Reader` is backed by a committed snapshot or by a `Writer`'s pending
//! buffers; `Writer::as_reader` is what makes the two indistinguishable to
//! callers.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping,
    IEAgAgRule, Identifier, Network, NetworkBinding, Policy, RuleS2S, Service, ServiceAlias,
};

use super::scope::{Scope, SyncOp};

/// Read-only access to one kind's worth of state at a time. A `Reader` is
/// either a snapshot of the committed store or a view of a `Writer`'s
/// pending mutations layered over that snapshot.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn get_service(&self, id: &Identifier) -> Result<Option<Service>>;
    async fn list_services(&self) -> Result<Vec<Service>>;

    async fn get_address_group(&self, id: &Identifier) -> Result<Option<AddressGroup>>;
    async fn list_address_groups(&self) -> Result<Vec<AddressGroup>>;

    async fn get_address_group_binding(&self, id: &Identifier) -> Result<Option<AddressGroupBinding>>;
    async fn list_address_group_bindings(&self) -> Result<Vec<AddressGroupBinding>>;

    async fn get_address_group_binding_policy(
        &self,
        id: &Identifier,
    ) -> Result<Option<AddressGroupBindingPolicy>>;
    async fn list_address_group_binding_policies(&self) -> Result<Vec<AddressGroupBindingPolicy>>;

    async fn get_address_group_port_mapping(
        &self,
        id: &Identifier,
    ) -> Result<Option<AddressGroupPortMapping>>;
    async fn list_address_group_port_mappings(&self) -> Result<Vec<AddressGroupPortMapping>>;

    async fn get_service_alias(&self, id: &Identifier) -> Result<Option<ServiceAlias>>;
    async fn list_service_aliases(&self) -> Result<Vec<ServiceAlias>>;

    async fn get_rule_s2s(&self, id: &Identifier) -> Result<Option<RuleS2S>>;
    async fn list_rule_s2s(&self) -> Result<Vec<RuleS2S>>;

    async fn get_ieagag_rule(&self, id: &Identifier) -> Result<Option<IEAgAgRule>>;
    async fn list_ieagag_rules(&self) -> Result<Vec<IEAgAgRule>>;
    /// IEAgAgRules currently owned by the given RuleS2S.
    async fn list_ieagag_rules_owned_by(&self, owner: &Identifier) -> Result<Vec<IEAgAgRule>>;

    async fn get_network(&self, id: &Identifier) -> Result<Option<Network>>;
    async fn list_networks(&self) -> Result<Vec<Network>>;

    async fn get_network_binding(&self, id: &Identifier) -> Result<Option<NetworkBinding>>;
    async fn list_network_bindings(&self) -> Result<Vec<NetworkBinding>>;

    async fn get_policy(&self, id: &Identifier) -> Result<Option<Policy>>;
    async fn list_policies(&self) -> Result<Vec<Policy>>;
}

/// A single unit of work. All `sync_*`/`delete_*` calls buffer against
/// the snapshot the writer was opened from; nothing is visible to other
/// writers or to fresh readers until [`Writer::commit`] succeeds. Dropping a
/// writer without committing discards the buffer, matching `Writer::abort`.
#[async_trait]
pub trait Writer: Reader {
    async fn sync_services(&mut self, items: Vec<Service>, scope: Scope, op: SyncOp) -> Result<()>;
    async fn delete_services_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_address_groups(
        &mut self,
        items: Vec<AddressGroup>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_address_groups_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_address_group_bindings(
        &mut self,
        items: Vec<AddressGroupBinding>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_address_group_bindings_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_address_group_binding_policies(
        &mut self,
        items: Vec<AddressGroupBindingPolicy>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_address_group_binding_policies_by_ids(
        &mut self,
        ids: &[Identifier],
    ) -> Result<()>;

    async fn sync_address_group_port_mappings(
        &mut self,
        items: Vec<AddressGroupPortMapping>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_address_group_port_mappings_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_service_aliases(
        &mut self,
        items: Vec<ServiceAlias>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_service_aliases_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_rule_s2s(&mut self, items: Vec<RuleS2S>, scope: Scope, op: SyncOp) -> Result<()>;
    async fn delete_rule_s2s_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_ieagag_rules(
        &mut self,
        items: Vec<IEAgAgRule>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_ieagag_rules_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_networks(&mut self, items: Vec<Network>, scope: Scope, op: SyncOp) -> Result<()>;
    async fn delete_networks_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_network_bindings(
        &mut self,
        items: Vec<NetworkBinding>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()>;
    async fn delete_network_bindings_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    async fn sync_policies(&mut self, items: Vec<Policy>, scope: Scope, op: SyncOp) -> Result<()>;
    async fn delete_policies_by_ids(&mut self, ids: &[Identifier]) -> Result<()>;

    /// Exposes this writer's pending-write-aware view as `&dyn Reader`, for
    /// callers (validators) that take a trait object rather than a generic
    /// `Reader` bound. A plain `&self` default works for every implementor:
    /// the coercion is concrete-type-to-`dyn`, not `dyn`-to-`dyn`, so it
    /// needs no trait-object-upcasting support from the compiler.
    fn as_reader(&self) -> &dyn Reader {
        self
    }

    /// Atomically applies every buffered mutation to the committed store.
    /// Consumes the writer: once called, there is nothing left to abort.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards the buffer without touching the committed store. Cheap: for
    /// the in-memory reference registry this is just a drop.
    fn abort(self: Box<Self>);
}

/// Opens units of work against the committed store.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn reader(&self) -> Result<Box<dyn Reader>>;
    async fn writer(&self) -> Result<Box<dyn Writer>>;
}
