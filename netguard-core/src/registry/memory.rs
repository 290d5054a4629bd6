//! Reference `Registry` implementation: one `RwLock`-guarded snapshot table
//! per process, `Reader`s are clones taken under a read lock, `Writer`s are
//! clones mutated locally and swapped back in wholesale on commit. Good
//! enough to drive every module above `registry` and to unit-test them
//! against, without naming a real storage engine.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping,
    IEAgAgRule, Identifier, Network, NetworkBinding, Policy, RuleS2S, Service, ServiceAlias,
};

use super::scope::{Scope, SyncOp};
use super::traits::{Reader, Registry, Writer};

/// Applies a `sync_<kind>` call to one table. `Upsert` inserts/overwrites
/// exactly `items`; `FullSync` additionally removes any existing member of
/// `scope` that isn't present in `items`.
fn apply_sync<T: Clone>(
    table: &mut HashMap<String, T>,
    items: Vec<T>,
    scope: &Scope,
    op: SyncOp,
    key_of: impl Fn(&T) -> &Identifier,
) {
    if op == SyncOp::FullSync {
        let incoming: std::collections::HashSet<String> =
            items.iter().map(|i| key_of(i).key()).collect();
        let stale: Vec<String> = table
            .keys()
            .filter(|k| scope.contains_key(k) && !incoming.contains(k.as_str()))
            .cloned()
            .collect();
        for key in stale {
            table.remove(&key);
        }
    }
    for item in items {
        table.insert(key_of(&item).key(), item);
    }
}

fn remove_by_ids<T>(table: &mut HashMap<String, T>, ids: &[Identifier]) {
    for id in ids {
        table.remove(&id.key());
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    services: HashMap<String, Service>,
    address_groups: HashMap<String, AddressGroup>,
    address_group_bindings: HashMap<String, AddressGroupBinding>,
    address_group_binding_policies: HashMap<String, AddressGroupBindingPolicy>,
    address_group_port_mappings: HashMap<String, AddressGroupPortMapping>,
    service_aliases: HashMap<String, ServiceAlias>,
    rule_s2s: HashMap<String, RuleS2S>,
    ieagag_rules: HashMap<String, IEAgAgRule>,
    networks: HashMap<String, Network>,
    network_bindings: HashMap<String, NetworkBinding>,
    policies: HashMap<String, Policy>,
}

/// Wraps a `Tables` snapshot and answers every `Reader` query against it.
/// Both [`MemoryReader`] and [`MemoryWriter`] hold one of these and forward
/// to it, so a writer automatically sees its own pending edits.
impl Tables {
    fn get_service(&self, id: &Identifier) -> Option<Service> {
        self.services.get(&id.key()).cloned()
    }
    fn list_services(&self) -> Vec<Service> {
        self.services.values().cloned().collect()
    }
    fn get_address_group(&self, id: &Identifier) -> Option<AddressGroup> {
        self.address_groups.get(&id.key()).cloned()
    }
    fn list_address_groups(&self) -> Vec<AddressGroup> {
        self.address_groups.values().cloned().collect()
    }
    fn get_address_group_binding(&self, id: &Identifier) -> Option<AddressGroupBinding> {
        self.address_group_bindings.get(&id.key()).cloned()
    }
    fn list_address_group_bindings(&self) -> Vec<AddressGroupBinding> {
        self.address_group_bindings.values().cloned().collect()
    }
    fn get_address_group_binding_policy(
        &self,
        id: &Identifier,
    ) -> Option<AddressGroupBindingPolicy> {
        self.address_group_binding_policies.get(&id.key()).cloned()
    }
    fn list_address_group_binding_policies(&self) -> Vec<AddressGroupBindingPolicy> {
        self.address_group_binding_policies.values().cloned().collect()
    }
    fn get_address_group_port_mapping(&self, id: &Identifier) -> Option<AddressGroupPortMapping> {
        self.address_group_port_mappings.get(&id.key()).cloned()
    }
    fn list_address_group_port_mappings(&self) -> Vec<AddressGroupPortMapping> {
        self.address_group_port_mappings.values().cloned().collect()
    }
    fn get_service_alias(&self, id: &Identifier) -> Option<ServiceAlias> {
        self.service_aliases.get(&id.key()).cloned()
    }
    fn list_service_aliases(&self) -> Vec<ServiceAlias> {
        self.service_aliases.values().cloned().collect()
    }
    fn get_rule_s2s(&self, id: &Identifier) -> Option<RuleS2S> {
        self.rule_s2s.get(&id.key()).cloned()
    }
    fn list_rule_s2s(&self) -> Vec<RuleS2S> {
        self.rule_s2s.values().cloned().collect()
    }
    fn get_ieagag_rule(&self, id: &Identifier) -> Option<IEAgAgRule> {
        self.ieagag_rules.get(&id.key()).cloned()
    }
    fn list_ieagag_rules(&self) -> Vec<IEAgAgRule> {
        self.ieagag_rules.values().cloned().collect()
    }
    fn list_ieagag_rules_owned_by(&self, owner: &Identifier) -> Vec<IEAgAgRule> {
        self.ieagag_rules
            .values()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect()
    }
    fn get_network(&self, id: &Identifier) -> Option<Network> {
        self.networks.get(&id.key()).cloned()
    }
    fn list_networks(&self) -> Vec<Network> {
        self.networks.values().cloned().collect()
    }
    fn get_network_binding(&self, id: &Identifier) -> Option<NetworkBinding> {
        self.network_bindings.get(&id.key()).cloned()
    }
    fn list_network_bindings(&self) -> Vec<NetworkBinding> {
        self.network_bindings.values().cloned().collect()
    }
    fn get_policy(&self, id: &Identifier) -> Option<Policy> {
        self.policies.get(&id.key()).cloned()
    }
    fn list_policies(&self) -> Vec<Policy> {
        self.policies.values().cloned().collect()
    }
}

/// Generates the async `Reader` impl for a type with a `tables: Tables`
/// field (both [`MemoryReader`] and [`MemoryWriter`] qualify).
macro_rules! impl_reader_via_tables {
    ($ty:ty) => {
        #[async_trait]
        impl Reader for $ty {
            async fn get_service(&self, id: &Identifier) -> Result<Option<Service>> {
                Ok(self.tables.get_service(id))
            }
            async fn list_services(&self) -> Result<Vec<Service>> {
                Ok(self.tables.list_services())
            }
            async fn get_address_group(&self, id: &Identifier) -> Result<Option<AddressGroup>> {
                Ok(self.tables.get_address_group(id))
            }
            async fn list_address_groups(&self) -> Result<Vec<AddressGroup>> {
                Ok(self.tables.list_address_groups())
            }
            async fn get_address_group_binding(
                &self,
                id: &Identifier,
            ) -> Result<Option<AddressGroupBinding>> {
                Ok(self.tables.get_address_group_binding(id))
            }
            async fn list_address_group_bindings(&self) -> Result<Vec<AddressGroupBinding>> {
                Ok(self.tables.list_address_group_bindings())
            }
            async fn get_address_group_binding_policy(
                &self,
                id: &Identifier,
            ) -> Result<Option<AddressGroupBindingPolicy>> {
                Ok(self.tables.get_address_group_binding_policy(id))
            }
            async fn list_address_group_binding_policies(
                &self,
            ) -> Result<Vec<AddressGroupBindingPolicy>> {
                Ok(self.tables.list_address_group_binding_policies())
            }
            async fn get_address_group_port_mapping(
                &self,
                id: &Identifier,
            ) -> Result<Option<AddressGroupPortMapping>> {
                Ok(self.tables.get_address_group_port_mapping(id))
            }
            async fn list_address_group_port_mappings(
                &self,
            ) -> Result<Vec<AddressGroupPortMapping>> {
                Ok(self.tables.list_address_group_port_mappings())
            }
            async fn get_service_alias(&self, id: &Identifier) -> Result<Option<ServiceAlias>> {
                Ok(self.tables.get_service_alias(id))
            }
            async fn list_service_aliases(&self) -> Result<Vec<ServiceAlias>> {
                Ok(self.tables.list_service_aliases())
            }
            async fn get_rule_s2s(&self, id: &Identifier) -> Result<Option<RuleS2S>> {
                Ok(self.tables.get_rule_s2s(id))
            }
            async fn list_rule_s2s(&self) -> Result<Vec<RuleS2S>> {
                Ok(self.tables.list_rule_s2s())
            }
            async fn get_ieagag_rule(&self, id: &Identifier) -> Result<Option<IEAgAgRule>> {
                Ok(self.tables.get_ieagag_rule(id))
            }
            async fn list_ieagag_rules(&self) -> Result<Vec<IEAgAgRule>> {
                Ok(self.tables.list_ieagag_rules())
            }
            async fn list_ieagag_rules_owned_by(&self, owner: &Identifier) -> Result<Vec<IEAgAgRule>> {
                Ok(self.tables.list_ieagag_rules_owned_by(owner))
            }
            async fn get_network(&self, id: &Identifier) -> Result<Option<Network>> {
                Ok(self.tables.get_network(id))
            }
            async fn list_networks(&self) -> Result<Vec<Network>> {
                Ok(self.tables.list_networks())
            }
            async fn get_network_binding(&self, id: &Identifier) -> Result<Option<NetworkBinding>> {
                Ok(self.tables.get_network_binding(id))
            }
            async fn list_network_bindings(&self) -> Result<Vec<NetworkBinding>> {
                Ok(self.tables.list_network_bindings())
            }
            async fn get_policy(&self, id: &Identifier) -> Result<Option<Policy>> {
                Ok(self.tables.get_policy(id))
            }
            async fn list_policies(&self) -> Result<Vec<Policy>> {
                Ok(self.tables.list_policies())
            }
        }
    };
}

/// A point-in-time, read-only view of the committed store.
pub struct MemoryReader {
    tables: Tables,
}

impl_reader_via_tables!(MemoryReader);

/// One unit of work: a working copy of the store, mutated locally by
/// `sync_*`/`delete_*` calls and swapped into the committed store atomically
/// on [`Writer::commit`].
pub struct MemoryWriter {
    tables: Tables,
    inner: Arc<RwLock<Tables>>,
}

impl_reader_via_tables!(MemoryWriter);

#[async_trait]
impl Writer for MemoryWriter {
    async fn sync_services(&mut self, items: Vec<Service>, scope: Scope, op: SyncOp) -> Result<()> {
        apply_sync(&mut self.tables.services, items, &scope, op, Service::identifier);
        Ok(())
    }
    async fn delete_services_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.services, ids);
        Ok(())
    }

    async fn sync_address_groups(
        &mut self,
        items: Vec<AddressGroup>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(&mut self.tables.address_groups, items, &scope, op, AddressGroup::identifier);
        Ok(())
    }
    async fn delete_address_groups_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.address_groups, ids);
        Ok(())
    }

    async fn sync_address_group_bindings(
        &mut self,
        items: Vec<AddressGroupBinding>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(
            &mut self.tables.address_group_bindings,
            items,
            &scope,
            op,
            AddressGroupBinding::identifier,
        );
        Ok(())
    }
    async fn delete_address_group_bindings_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.address_group_bindings, ids);
        Ok(())
    }

    async fn sync_address_group_binding_policies(
        &mut self,
        items: Vec<AddressGroupBindingPolicy>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(
            &mut self.tables.address_group_binding_policies,
            items,
            &scope,
            op,
            AddressGroupBindingPolicy::identifier,
        );
        Ok(())
    }
    async fn delete_address_group_binding_policies_by_ids(
        &mut self,
        ids: &[Identifier],
    ) -> Result<()> {
        remove_by_ids(&mut self.tables.address_group_binding_policies, ids);
        Ok(())
    }

    async fn sync_address_group_port_mappings(
        &mut self,
        items: Vec<AddressGroupPortMapping>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(
            &mut self.tables.address_group_port_mappings,
            items,
            &scope,
            op,
            AddressGroupPortMapping::identifier,
        );
        Ok(())
    }
    async fn delete_address_group_port_mappings_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.address_group_port_mappings, ids);
        Ok(())
    }

    async fn sync_service_aliases(
        &mut self,
        items: Vec<ServiceAlias>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(&mut self.tables.service_aliases, items, &scope, op, ServiceAlias::identifier);
        Ok(())
    }
    async fn delete_service_aliases_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.service_aliases, ids);
        Ok(())
    }

    async fn sync_rule_s2s(&mut self, items: Vec<RuleS2S>, scope: Scope, op: SyncOp) -> Result<()> {
        apply_sync(&mut self.tables.rule_s2s, items, &scope, op, RuleS2S::identifier);
        Ok(())
    }
    async fn delete_rule_s2s_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.rule_s2s, ids);
        Ok(())
    }

    async fn sync_ieagag_rules(
        &mut self,
        items: Vec<IEAgAgRule>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(&mut self.tables.ieagag_rules, items, &scope, op, IEAgAgRule::identifier);
        Ok(())
    }
    async fn delete_ieagag_rules_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.ieagag_rules, ids);
        Ok(())
    }

    async fn sync_networks(&mut self, items: Vec<Network>, scope: Scope, op: SyncOp) -> Result<()> {
        apply_sync(&mut self.tables.networks, items, &scope, op, Network::identifier);
        Ok(())
    }
    async fn delete_networks_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.networks, ids);
        Ok(())
    }

    async fn sync_network_bindings(
        &mut self,
        items: Vec<NetworkBinding>,
        scope: Scope,
        op: SyncOp,
    ) -> Result<()> {
        apply_sync(&mut self.tables.network_bindings, items, &scope, op, NetworkBinding::identifier);
        Ok(())
    }
    async fn delete_network_bindings_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.network_bindings, ids);
        Ok(())
    }

    async fn sync_policies(&mut self, items: Vec<Policy>, scope: Scope, op: SyncOp) -> Result<()> {
        apply_sync(&mut self.tables.policies, items, &scope, op, Policy::identifier);
        Ok(())
    }
    async fn delete_policies_by_ids(&mut self, ids: &[Identifier]) -> Result<()> {
        remove_by_ids(&mut self.tables.policies, ids);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut guard = self.inner.write().await;
        *guard = self.tables;
        Ok(())
    }

    fn abort(self: Box<Self>) {}
}

/// In-memory reference `Registry`. Cheap to clone (an `Arc` bump); every
/// clone shares the same underlying store.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn reader(&self) -> Result<Box<dyn Reader>> {
        let tables = self.inner.read().await.clone();
        Ok(Box::new(MemoryReader { tables }))
    }

    async fn writer(&self) -> Result<Box<dyn Writer>> {
        let tables = self.inner.read().await.clone();
        Ok(Box::new(MemoryWriter {
            tables,
            inner: Arc::clone(&self.inner),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identifier;

    #[tokio::test]
    async fn writer_sees_its_own_pending_writes() {
        let registry = MemoryRegistry::new();
        let mut writer = registry.writer().await.unwrap();
        let id = Identifier::new("default", "svc1");
        writer
            .sync_services(vec![Service::new(id.clone())], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();

        assert!(writer.get_service(&id).await.unwrap().is_some());

        let reader = registry.reader().await.unwrap();
        assert!(reader.get_service(&id).await.unwrap().is_none());

        writer.commit().await.unwrap();
        let reader = registry.reader().await.unwrap();
        assert!(reader.get_service(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn full_sync_removes_stale_members_in_scope() {
        let registry = MemoryRegistry::new();
        let a = Identifier::new("default", "a");
        let b = Identifier::new("default", "b");
        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_address_groups(
                vec![AddressGroup::new(a.clone()), AddressGroup::new(b.clone())],
                Scope::All,
                SyncOp::Upsert,
            )
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_address_groups(
                vec![AddressGroup::new(a.clone())],
                Scope::ids([a.clone(), b.clone()]),
                SyncOp::FullSync,
            )
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        assert!(reader.get_address_group(&a).await.unwrap().is_some());
        assert!(reader.get_address_group(&b).await.unwrap().is_none());
    }
}
