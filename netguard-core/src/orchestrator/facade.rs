//! Transactional Resource Orchestrator: the single entry point
//! client-facing code calls through. Every method opens one unit of work,
//! runs the validator, buffers the write (plus, for `RuleS2S`, the reactive
//! engine's regeneration) in the same writer, and commits — all inside that
//! unit of work. Condition stamping and the external sync bridge both run
//! afterward, outside the writer, so a slow condition write or a stuck
//! downstream sync can never hold the registry lock open.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::condition::{ConditionManager, SyncOutcome};
use crate::dependency;
use crate::error::{Error, Result};
use crate::model::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping,
    AnyResource, Identifier, Network, NetworkBinding, Policy, ResourceKind, RuleS2S, Service,
    ServiceAlias,
};
use crate::reactive::{self, ReactiveMode};
use crate::registry::{Registry, Scope, SyncOp};
use crate::sync::{SyncEvent, SyncManager};
use crate::validation::Validator;

use super::cascade;
use super::guard::WriterGuard;

/// Checked at the start of every entry point and again right before
/// `commit`: a context cancelled before the writer commits means the
/// writer is dropped (and therefore aborted, per [`WriterGuard`]) without
/// ever touching the registry's committed store.
fn ensure_live(ctx: &CancellationToken) -> Result<()> {
    if ctx.is_cancelled() {
        return Err(Error::Backend("operation cancelled".to_string()));
    }
    Ok(())
}

/// Wires a concrete [`Registry`], [`Validator`] and [`SyncManager`]
/// together into one orchestrator. Kept as one
/// struct with typed inherent methods per kind rather than a dispatch
/// table: the set of kinds is closed, so there is nothing a runtime
/// dispatch would buy that the compiler doesn't already check at each call
/// site.
pub struct NetguardFacade<R: Registry, V: Validator, S: SyncManager> {
    registry: Arc<R>,
    validator: Arc<V>,
    sync_manager: Arc<S>,
    conditions: ConditionManager<R>,
    /// Process-wide serialization for `RuleS2S` mutations: held for the
    /// lifetime of one create/update/delete call so two concurrent
    /// `RuleS2S` writes can't race the reactive engine's read-diff-write of
    /// the same derived rules. Owned by the facade and handed to nothing
    /// else — there is no global/static equivalent anywhere in this crate.
    rule_s2s_lock: Arc<Mutex<()>>,
}

impl<R: Registry + 'static, V: Validator + 'static, S: SyncManager + 'static> NetguardFacade<R, V, S> {
    pub fn new(registry: R, validator: V, sync_manager: S) -> Self {
        let registry = Arc::new(registry);
        let validator = Arc::new(validator);
        let dyn_validator: Arc<dyn Validator> = Arc::clone(&validator);
        Self {
            registry: Arc::clone(&registry),
            validator,
            sync_manager: Arc::new(sync_manager),
            conditions: ConditionManager::new(Arc::clone(&registry), dyn_validator),
            rule_s2s_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn writer_guard(&self) -> Result<WriterGuard> {
        Ok(WriterGuard::new(self.registry.writer().await?))
    }

    /// Fire-and-forget push to the external sync bridge. Scoped to
    /// `AddressGroup` and `Network` only — every other kind is this
    /// control plane's own concept and has nothing downstream to sync to.
    async fn push_sync(&self, resource: AnyResource) -> SyncOutcome {
        match self.sync_manager.push(vec![SyncEvent::Upserted(resource)]).await {
            Ok(()) => SyncOutcome::Succeeded,
            Err(message) => SyncOutcome::Failed(message),
        }
    }

    async fn notify_deleted(&self, kind: ResourceKind, id: Identifier) {
        if let Err(message) = self.sync_manager.push(vec![SyncEvent::Deleted(kind, id)]).await {
            tracing::warn!(%message, "external sync failed to process a delete");
        }
    }

    /// Runs the condition manager over every `IEAgAgRule` a `RuleS2S`
    /// write just (re)generated, per the post-commit algorithm's "and for
    /// derived IEAgAgRules created in the transaction" step.
    async fn process_generated_rules(&self, rule_id: &Identifier) {
        let Ok(reader) = self.registry.reader().await else { return };
        let Ok(Some(rule)) = reader.get_rule_s2s(rule_id).await else { return };
        for ieagag_id in &rule.ieagag_rule_refs {
            self.conditions.process_ieagag_rule_conditions(ieagag_id).await;
        }
    }

    pub async fn create_service(&self, ctx: &CancellationToken, service: Service) -> Result<Service> {
        ensure_live(ctx)?;
        let id = service.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(service.clone()), writer.as_reader())
            .await?;
        writer
            .sync_services(vec![service.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_service_conditions(&id).await;
        Ok(service)
    }

    /// A port or AddressGroup-membership change can change what every
    /// `RuleS2S` reaching this service would generate, so the update
    /// recomputes them inline, in the same unit of work, under the
    /// `RuleS2S` serialization primitive.
    pub async fn update_service(&self, ctx: &CancellationToken, service: Service) -> Result<Service> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let id = service.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_update(&AnyResource::from(service.clone()), writer.as_reader())
            .await?;

        writer
            .sync_services(vec![service.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        let affected = dependency::find_rule_s2s_for_services(writer.as_reader(), std::slice::from_ref(&id)).await?;
        let rule_ids: Vec<Identifier> = affected.iter().map(|r| r.identifier().clone()).collect();
        if !rule_ids.is_empty() {
            reactive::regenerate_for_rules(&mut *writer, &rule_ids).await?;
        }
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_service_conditions(&id).await;
        for rule_id in &rule_ids {
            self.conditions.process_rule_s2s_conditions(rule_id).await;
            self.process_generated_rules(rule_id).await;
        }
        Ok(service)
    }

    pub async fn delete_service(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_service(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    pub async fn create_address_group(&self, ctx: &CancellationToken, ag: AddressGroup) -> Result<AddressGroup> {
        ensure_live(ctx)?;
        let id = ag.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(ag.clone()), writer.as_reader())
            .await?;
        writer
            .sync_address_groups(vec![ag.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.push_sync(AnyResource::from(ag.clone())).await;
        self.conditions.process_address_group_conditions(&id).await;
        Ok(ag)
    }

    pub async fn update_address_group(&self, ctx: &CancellationToken, ag: AddressGroup) -> Result<AddressGroup> {
        ensure_live(ctx)?;
        let id = ag.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_update(&AnyResource::from(ag.clone()), writer.as_reader())
            .await?;
        writer
            .sync_address_groups(vec![ag.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.push_sync(AnyResource::from(ag.clone())).await;
        self.conditions.process_address_group_conditions(&id).await;
        Ok(ag)
    }

    pub async fn delete_address_group(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_address_group(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.notify_deleted(ResourceKind::AddressGroup, id.clone()).await;
        Ok(())
    }

    pub async fn create_address_group_binding(
        &self,
        ctx: &CancellationToken,
        binding: AddressGroupBinding,
    ) -> Result<AddressGroupBinding> {
        ensure_live(ctx)?;
        let id = binding.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(binding.clone()), writer.as_reader())
            .await?;
        writer
            .sync_address_group_bindings(vec![binding.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        upsert_port_mapping_entry(&mut *writer, &binding).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_address_group_binding_conditions(&id).await;
        Ok(binding)
    }

    /// Cascades into the reactive engine (a binding's removal can shrink the
    /// `(local AG, target AG)` pairs a `RuleS2S` generates from), so this
    /// runs under the same serialization primitive as direct `RuleS2S`
    /// writes.
    pub async fn delete_address_group_binding(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let mut writer = self.writer_guard().await?;
        let affected = if let Some(binding) = writer.get_address_group_binding(id).await? {
            dependency::find_rule_s2s_for_services(writer.as_reader(), std::slice::from_ref(&binding.service_ref))
                .await?
                .into_iter()
                .map(|r| r.identifier().clone())
                .collect()
        } else {
            Vec::new()
        };
        cascade::delete_address_group_binding(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        for rule_id in &affected {
            self.conditions.process_rule_s2s_conditions(rule_id).await;
            self.process_generated_rules(rule_id).await;
        }
        Ok(())
    }

    pub async fn create_address_group_binding_policy(
        &self,
        ctx: &CancellationToken,
        policy: AddressGroupBindingPolicy,
    ) -> Result<AddressGroupBindingPolicy> {
        ensure_live(ctx)?;
        let id = policy.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(policy.clone()), writer.as_reader())
            .await?;
        writer
            .sync_address_group_binding_policies(vec![policy.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions
            .process_address_group_binding_policy_conditions(&id)
            .await;
        Ok(policy)
    }

    pub async fn delete_address_group_binding_policy(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_address_group_binding_policy(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    /// A newly created alias can make a previously-unresolvable `RuleS2S`
    /// resolvable, so any rule that already names it is recomputed inline
    /// under the `RuleS2S` lock, same as a `Service` update.
    pub async fn create_service_alias(&self, ctx: &CancellationToken, alias: ServiceAlias) -> Result<ServiceAlias> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let id = alias.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(alias.clone()), writer.as_reader())
            .await?;
        writer
            .sync_service_aliases(vec![alias.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        let affected = dependency::find_rule_s2s_for_service_aliases(writer.as_reader(), std::slice::from_ref(&id)).await?;
        let rule_ids: Vec<Identifier> = affected.iter().map(|r| r.identifier().clone()).collect();
        if !rule_ids.is_empty() {
            reactive::regenerate_for_rules(&mut *writer, &rule_ids).await?;
        }
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_service_alias_conditions(&id).await;
        for rule_id in &rule_ids {
            self.conditions.process_rule_s2s_conditions(rule_id).await;
            self.process_generated_rules(rule_id).await;
        }
        Ok(alias)
    }

    pub async fn delete_service_alias(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_service_alias(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    /// `RuleS2S` create/update additionally run the reactive engine inline,
    /// in the same unit of work, under the process-wide `RuleS2S` lock.
    pub async fn create_rule_s2s(&self, ctx: &CancellationToken, rule: RuleS2S) -> Result<RuleS2S> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let id = rule.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(rule.clone()), writer.as_reader())
            .await?;
        writer
            .sync_rule_s2s(vec![rule.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        reactive::regenerate_for_rules(&mut *writer, std::slice::from_ref(&id)).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_rule_s2s_conditions(&id).await;
        self.process_generated_rules(&id).await;
        Ok(rule)
    }

    pub async fn update_rule_s2s(&self, ctx: &CancellationToken, rule: RuleS2S) -> Result<RuleS2S> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let id = rule.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_update(&AnyResource::from(rule.clone()), writer.as_reader())
            .await?;
        writer
            .sync_rule_s2s(vec![rule.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        reactive::regenerate_for_rules(&mut *writer, std::slice::from_ref(&id)).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_rule_s2s_conditions(&id).await;
        self.process_generated_rules(&id).await;
        Ok(rule)
    }

    pub async fn delete_rule_s2s(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let _serialize = self.rule_s2s_lock.lock().await;
        let mut writer = self.writer_guard().await?;
        cascade::delete_rule_s2s(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    /// `Deferred`-mode reactive recompute for a batch of `RuleS2S` ids,
    /// e.g. after a bulk dependency change. Returns immediately; the
    /// recompute runs, and commits, independently.
    pub fn schedule_reactive(&self, mode: ReactiveMode, rule_ids: Vec<Identifier>) {
        match mode {
            ReactiveMode::Inline => {
                tracing::debug!("schedule_reactive called with Inline mode; call sites should instead run regenerate_for_rules in their own writer");
            }
            ReactiveMode::Deferred => {
                let registry: Arc<dyn Registry> = Arc::clone(&self.registry);
                reactive::spawn_deferred(registry, rule_ids);
            }
        }
    }

    pub async fn create_network(&self, ctx: &CancellationToken, network: Network) -> Result<Network> {
        ensure_live(ctx)?;
        let id = network.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(network.clone()), writer.as_reader())
            .await?;
        writer
            .sync_networks(vec![network.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        let sync_result = self.push_sync(AnyResource::from(network.clone())).await;
        self.conditions.process_network_conditions(&id, sync_result).await;
        Ok(network)
    }

    pub async fn delete_network(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_network(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.notify_deleted(ResourceKind::Network, id.clone()).await;
        Ok(())
    }

    pub async fn create_network_binding(&self, ctx: &CancellationToken, binding: NetworkBinding) -> Result<NetworkBinding> {
        ensure_live(ctx)?;
        let id = binding.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(binding.clone()), writer.as_reader())
            .await?;
        writer
            .sync_network_bindings(vec![binding.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        self.conditions.process_network_binding_conditions(&id).await;
        Ok(binding)
    }

    pub async fn delete_network_binding(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_network_binding(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    pub async fn create_policy(&self, ctx: &CancellationToken, policy: Policy) -> Result<Policy> {
        ensure_live(ctx)?;
        let id = policy.identifier().clone();
        let mut writer = self.writer_guard().await?;
        self.validator
            .validate_for_creation(&AnyResource::from(policy.clone()), writer.as_reader())
            .await?;
        writer
            .sync_policies(vec![policy.clone()], Scope::All, SyncOp::Upsert)
            .await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        // Policy has no downstream sync target and no outward Refs, so
        // readiness tracks validation alone.
        self.conditions.process_policy_conditions(&id).await;
        Ok(policy)
    }

    pub async fn delete_policy(&self, ctx: &CancellationToken, id: &Identifier) -> Result<()> {
        ensure_live(ctx)?;
        let mut writer = self.writer_guard().await?;
        cascade::delete_policy(&mut *writer, id).await?;
        ensure_live(ctx)?;
        writer.commit().await?;
        Ok(())
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }
}

/// Folds one binding's service ports into its target AG's port mapping,
/// creating the mapping if this is the AG's first binding.
async fn upsert_port_mapping_entry<W: crate::registry::Writer + ?Sized>(
    writer: &mut W,
    binding: &AddressGroupBinding,
) -> Result<()> {
    let Some(service) = writer.get_service(&binding.service_ref).await? else {
        return Ok(());
    };
    let mut mapping = writer
        .get_address_group_port_mapping(&binding.address_group_ref)
        .await?
        .unwrap_or_else(|| AddressGroupPortMapping::new(binding.address_group_ref.clone()));
    mapping.access_ports.insert(
        service.identifier().clone(),
        crate::model::ProtocolPorts {
            tcp: service.ports_for_transport(crate::model::Transport::Tcp),
            udp: service.ports_for_transport(crate::model::Transport::Udp),
        },
    );
    writer
        .sync_address_group_port_mappings(vec![mapping], Scope::All, SyncOp::Upsert)
        .await
}
