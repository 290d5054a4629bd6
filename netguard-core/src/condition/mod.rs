//! Condition Manager: re-reads just-committed state and stamps
//! `{Validated, Synced, Ready}` on a resource in its own unit of work,
//! separate from the write that triggered it. Never returns an error to its
//! caller — a failure to stamp a condition is logged and dropped, since the
//! mutation it's reporting on has already committed (or already failed) by
//! the time this runs.

use std::sync::Arc;

use crate::error::Error;
use crate::generate;
use crate::model::{
    AnyResource, Condition, ConditionReason, ConditionSet, ConditionStatus, ConditionType,
    Identifier, ResourceKind,
};
use crate::registry::{Reader, Registry, Scope, SyncOp};
use crate::validation::Validator;

/// The outcome of a fire-and-forget external sync attempt, threaded in by
/// the caller for the one kind (`Network`) whose `Synced` condition depends
/// on it. `Skipped` covers resources the sync bridge has nothing to say
/// about (`Policy`): the `Synced` condition is left absent rather than
/// stamped `False`, so readiness falls back to validation alone.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Skipped,
    Succeeded,
    Failed(String),
}

/// The result of resolving a resource's Refs against committed state.
enum RefCheck {
    Ok,
    Missing(String),
    Backend(String),
}

type PostCheck = std::result::Result<String, (ConditionReason, String)>;

fn recompute_ready(conditions: &mut ConditionSet) {
    let validated = conditions.is_true(ConditionType::Validated);
    let synced = match conditions.get(ConditionType::Synced) {
        None => true,
        Some(c) => c.status == ConditionStatus::True,
    };
    let (status, reason, message) = match (validated, synced) {
        (true, true) => (ConditionStatus::True, ConditionReason::Ready, "validated and synced".to_string()),
        (false, _) => (ConditionStatus::False, ConditionReason::NotReady, "waiting on validation".to_string()),
        (true, false) => (ConditionStatus::False, ConditionReason::NotReady, "waiting on external sync".to_string()),
    };
    conditions.set(Condition::new(ConditionType::Ready, status, reason, message));
}

/// Folds the pieces a `process_<kind>_conditions` call computed ahead of
/// time (they all need their own `Reader`, taken before the write-back
/// `Writer` opens) into the mutation the write-back applies.
fn apply(
    synced: Option<(ConditionStatus, ConditionReason, String)>,
    validated: std::result::Result<(), Error>,
    refs: RefCheck,
    post_check: PostCheck,
) -> impl FnOnce(&mut ConditionSet) + Send {
    move |conditions: &mut ConditionSet| {
        conditions.clear_error();
        if let Some((status, reason, message)) = synced {
            conditions.set(Condition::new(ConditionType::Synced, status, reason, message));
        }

        match validated {
            Ok(()) => {
                conditions.set(Condition::new(
                    ConditionType::Validated,
                    ConditionStatus::True,
                    ConditionReason::Validated,
                    "validation passed",
                ));
            }
            Err(err) => {
                let message = err.to_string();
                conditions.set(Condition::new(
                    ConditionType::Validated,
                    ConditionStatus::False,
                    ConditionReason::ValidationFailed,
                    message.clone(),
                ));
                conditions.set(Condition::new(
                    ConditionType::Ready,
                    ConditionStatus::False,
                    ConditionReason::NotReady,
                    message.clone(),
                ));
                conditions.set(Condition::new(
                    ConditionType::Error,
                    ConditionStatus::True,
                    ConditionReason::ValidationFailed,
                    message,
                ));
                return;
            }
        }

        match refs {
            RefCheck::Ok => {}
            RefCheck::Missing(message) => {
                conditions.set(Condition::new(
                    ConditionType::Ready,
                    ConditionStatus::False,
                    ConditionReason::DependencyError,
                    message.clone(),
                ));
                conditions.set(Condition::new(
                    ConditionType::Error,
                    ConditionStatus::True,
                    ConditionReason::DependencyError,
                    message,
                ));
                return;
            }
            RefCheck::Backend(message) => {
                conditions.set(Condition::new(
                    ConditionType::Ready,
                    ConditionStatus::False,
                    ConditionReason::BackendError,
                    message.clone(),
                ));
                conditions.set(Condition::new(
                    ConditionType::Error,
                    ConditionStatus::True,
                    ConditionReason::BackendError,
                    message,
                ));
                return;
            }
        }

        match post_check {
            Ok(message) => {
                conditions.set(Condition::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Ready, message));
            }
            Err((reason, message)) => {
                conditions.set(Condition::new(ConditionType::Ready, ConditionStatus::False, reason, message.clone()));
                conditions.set(Condition::new(ConditionType::Error, ConditionStatus::True, reason, message));
            }
        }
    }
}

/// Leaves `Validated=Unknown/Validating` and `Ready=False` untouched by the
/// normal pipeline — used only for `Network` when the external sync call
/// itself failed, per the open question in the design notes: dependency
/// validation for a sync-governed resource isn't meaningful until the sync
/// outcome is known.
fn apply_sync_pending(synced: (ConditionStatus, ConditionReason, String)) -> impl FnOnce(&mut ConditionSet) + Send {
    move |conditions: &mut ConditionSet| {
        conditions.clear_error();
        conditions.set(Condition::new(ConditionType::Synced, synced.0, synced.1, synced.2));
        conditions.set(Condition::new(
            ConditionType::Validated,
            ConditionStatus::Unknown,
            ConditionReason::Validating,
            "dependency validation deferred until external sync succeeds",
        ));
        conditions.set(Condition::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::NotReady,
            "waiting on external sync",
        ));
    }
}

macro_rules! stamp_kind {
    ($fn_name:ident, $get:ident, $sync:ident) => {
        async fn $fn_name<F>(&self, id: &Identifier, mutate: F)
        where
            F: FnOnce(&mut ConditionSet) + Send,
        {
            let mut writer = match self.registry.writer().await {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!(error = %err, resource = %id, "condition manager: failed to open writer");
                    return;
                }
            };
            let item = match writer.$get(id).await {
                Ok(Some(item)) => item,
                Ok(None) => return,
                Err(err) => {
                    tracing::warn!(error = %err, resource = %id, "condition manager: failed to read resource");
                    return;
                }
            };
            let mut item = item;
            mutate(&mut item.metadata.conditions);
            item.metadata.bump_resource_version();
            if let Err(err) = writer.$sync(vec![item], Scope::All, SyncOp::Upsert).await {
                tracing::warn!(error = %err, resource = %id, "condition manager: failed to stamp conditions");
                return;
            }
            if let Err(err) = writer.commit().await {
                tracing::warn!(error = %err, resource = %id, "condition manager: failed to commit condition update");
            }
        }
    };
}

/// Owns its own handle on the registry and a validator so it can re-run
/// dependency validation and open units of work independently of whatever
/// orchestrator call triggered a stamp.
pub struct ConditionManager<R: Registry> {
    registry: Arc<R>,
    validator: Arc<dyn Validator>,
}

impl<R: Registry> ConditionManager<R> {
    pub fn new(registry: Arc<R>, validator: Arc<dyn Validator>) -> Self {
        Self { registry, validator }
    }

    stamp_kind!(stamp_service, get_service, sync_services);
    stamp_kind!(stamp_address_group, get_address_group, sync_address_groups);
    stamp_kind!(stamp_address_group_binding, get_address_group_binding, sync_address_group_bindings);
    stamp_kind!(
        stamp_address_group_binding_policy,
        get_address_group_binding_policy,
        sync_address_group_binding_policies
    );
    stamp_kind!(
        stamp_address_group_port_mapping,
        get_address_group_port_mapping,
        sync_address_group_port_mappings
    );
    stamp_kind!(stamp_service_alias, get_service_alias, sync_service_aliases);
    stamp_kind!(stamp_rule_s2s, get_rule_s2s, sync_rule_s2s);
    stamp_kind!(stamp_ieagag_rule, get_ieagag_rule, sync_ieagag_rules);
    stamp_kind!(stamp_network, get_network, sync_networks);
    stamp_kind!(stamp_network_binding, get_network_binding, sync_network_bindings);
    stamp_kind!(stamp_policy, get_policy, sync_policies);

    async fn dispatch<F>(&self, kind: ResourceKind, id: &Identifier, mutate: F)
    where
        F: FnOnce(&mut ConditionSet) + Send,
    {
        match kind {
            ResourceKind::Service => self.stamp_service(id, mutate).await,
            ResourceKind::AddressGroup => self.stamp_address_group(id, mutate).await,
            ResourceKind::AddressGroupBinding => self.stamp_address_group_binding(id, mutate).await,
            ResourceKind::AddressGroupBindingPolicy => {
                self.stamp_address_group_binding_policy(id, mutate).await
            }
            ResourceKind::AddressGroupPortMapping => {
                self.stamp_address_group_port_mapping(id, mutate).await
            }
            ResourceKind::ServiceAlias => self.stamp_service_alias(id, mutate).await,
            ResourceKind::RuleS2S => self.stamp_rule_s2s(id, mutate).await,
            ResourceKind::IEAgAgRule => self.stamp_ieagag_rule(id, mutate).await,
            ResourceKind::Network => self.stamp_network(id, mutate).await,
            ResourceKind::NetworkBinding => self.stamp_network_binding(id, mutate).await,
            ResourceKind::Policy => self.stamp_policy(id, mutate).await,
        }
    }

    /// `Service`: every `AddressGroupRef` must resolve; at least one
    /// ingress port must be declared for `Ready`. A missing AddressGroup
    /// is reported as `NotReady` rather than the generic `DependencyError`
    /// used elsewhere — this is the one resource kind the spec gives a
    /// literal end-to-end scenario for, and that scenario names `NotReady`.
    pub async fn process_service_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(service)) = reader.get_service(id).await else { return };

        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(service.clone()), reader.as_ref())
            .await;

        let mut missing = Vec::new();
        let mut backend = None;
        for ag in &service.address_groups {
            match reader.get_address_group(ag).await {
                Ok(Some(_)) => {}
                Ok(None) => missing.push(ag.to_string()),
                Err(err) => backend = Some(err.to_string()),
            }
        }

        let post_check = if let Some(message) = backend {
            Err((ConditionReason::BackendError, message))
        } else if !missing.is_empty() {
            Err((
                ConditionReason::NotReady,
                format!("Missing AddressGroups: {}", missing.join(", ")),
            ))
        } else if service.ingress_ports.is_empty() {
            Err((ConditionReason::Pending, "service declares no ingress ports".to_string()))
        } else {
            Ok(format!("{} ingress port(s) configured", service.ingress_ports.len()))
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(ResourceKind::Service, id, apply(synced, validated, RefCheck::Ok, post_check)).await;
    }

    /// `AddressGroup` has no outward Refs; `Synced` is always `True` once
    /// committed (the external-sync outcome resurfaces only on a later
    /// reconciliation pass, not here — see DESIGN.md).
    pub async fn process_address_group_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(ag)) = reader.get_address_group(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(ag), reader.as_ref())
            .await;
        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(
            ResourceKind::AddressGroup,
            id,
            apply(synced, validated, RefCheck::Ok, Ok("address group is ready".to_string())),
        )
        .await;
    }

    /// `AddressGroupBinding`: both the `Service` and `AddressGroup` it names
    /// must resolve; `Ready` additionally requires the derived port mapping
    /// to exist, and reports its port count.
    pub async fn process_address_group_binding_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(binding)) = reader.get_address_group_binding(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(binding.clone()), reader.as_ref())
            .await;

        let mut missing = Vec::new();
        let mut backend = None;
        match reader.get_service(&binding.service_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("Service {}", binding.service_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        match reader.get_address_group(&binding.address_group_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("AddressGroup {}", binding.address_group_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        let refs = if let Some(message) = backend {
            RefCheck::Backend(message)
        } else if missing.is_empty() {
            RefCheck::Ok
        } else {
            RefCheck::Missing(format!("Missing {}", missing.join(", ")))
        };

        let post_check = match reader.get_address_group_port_mapping(&binding.address_group_ref).await {
            Ok(Some(mapping)) => {
                let count = mapping
                    .access_ports
                    .get(&binding.service_ref)
                    .map(|p| p.tcp.len() + p.udp.len())
                    .unwrap_or(0);
                Ok(format!("{count} port(s) mapped"))
            }
            Ok(None) => Err((ConditionReason::Pending, "no port mapping derived yet".to_string())),
            Err(err) => Err((ConditionReason::BackendError, err.to_string())),
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(ResourceKind::AddressGroupBinding, id, apply(synced, validated, refs, post_check))
            .await;
    }

    pub async fn process_address_group_binding_policy_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(policy)) = reader.get_address_group_binding_policy(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(policy.clone()), reader.as_ref())
            .await;

        let mut missing = Vec::new();
        let mut backend = None;
        match reader.get_service(&policy.service_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("Service {}", policy.service_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        match reader.get_address_group(&policy.address_group_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("AddressGroup {}", policy.address_group_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        let refs = if let Some(message) = backend {
            RefCheck::Backend(message)
        } else if missing.is_empty() {
            RefCheck::Ok
        } else {
            RefCheck::Missing(format!("Missing {}", missing.join(", ")))
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(
            ResourceKind::AddressGroupBindingPolicy,
            id,
            apply(synced, validated, refs, Ok("binding policy is ready".to_string())),
        )
        .await;
    }

    /// `ServiceAlias`: the `Service` it names must resolve.
    pub async fn process_service_alias_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(alias)) = reader.get_service_alias(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(alias.clone()), reader.as_ref())
            .await;

        let refs = match reader.get_service(&alias.service_ref).await {
            Ok(Some(_)) => RefCheck::Ok,
            Ok(None) => RefCheck::Missing(format!("Missing Service: {}", alias.service_ref)),
            Err(err) => RefCheck::Backend(err.to_string()),
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(
            ResourceKind::ServiceAlias,
            id,
            apply(synced, validated, refs, Ok("alias is ready".to_string())),
        )
        .await;
    }

    /// `RuleS2S`: both aliases must resolve through to a `Service`; `Ready`
    /// additionally requires that the rule's expected `IEAgAgRule`s (per
    /// [`generate::generate`]) actually exist in committed state.
    pub async fn process_rule_s2s_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(rule)) = reader.get_rule_s2s(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(rule.clone()), reader.as_ref())
            .await;

        let expected = generate::generate(&rule, reader.as_ref()).await;
        let (refs, post_check) = match expected {
            Err(_) => (
                RefCheck::Missing(format!(
                    "Missing ServiceAlias/Service: {} or {}",
                    rule.service_local_ref, rule.service_ref
                )),
                Err((ConditionReason::DependencyError, "dependencies unresolved".to_string())),
            ),
            Ok(expected) if expected.is_empty() => (
                RefCheck::Ok,
                Err((
                    ConditionReason::Pending,
                    "no IEAgAgRules could be generated (no overlapping transports)".to_string(),
                )),
            ),
            Ok(expected) => {
                let mut found = 0usize;
                let mut backend = None;
                for wanted in &expected {
                    match reader.get_ieagag_rule(wanted.identifier()).await {
                        Ok(Some(_)) => found += 1,
                        Ok(None) => {}
                        Err(err) => backend = Some(err.to_string()),
                    }
                }
                let post = if let Some(message) = backend {
                    Err((ConditionReason::BackendError, message))
                } else if found == 0 {
                    Err((
                        ConditionReason::DependencyError,
                        format!("0/{} IEAgAgRules created", expected.len()),
                    ))
                } else {
                    Ok(format!("{found}/{} IEAgAgRules created", expected.len()))
                };
                (RefCheck::Ok, post)
            }
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(ResourceKind::RuleS2S, id, apply(synced, validated, refs, post_check)).await;
    }

    /// `Network`: when `sync_result` reports a failure, dependency
    /// validation is deferred (see [`apply_sync_pending`]); otherwise the
    /// normal pipeline runs with `Synced=True`.
    pub async fn process_network_conditions(&self, id: &Identifier, sync_result: SyncOutcome) {
        if let SyncOutcome::Failed(message) = sync_result {
            self.dispatch(
                ResourceKind::Network,
                id,
                apply_sync_pending((ConditionStatus::False, ConditionReason::SyncFailed, message)),
            )
            .await;
            return;
        }

        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(network)) = reader.get_network(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(network), reader.as_ref())
            .await;
        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "external sync succeeded".to_string()));
        self.dispatch(
            ResourceKind::Network,
            id,
            apply(synced, validated, RefCheck::Ok, Ok("network is ready".to_string())),
        )
        .await;
    }

    pub async fn process_network_binding_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(binding)) = reader.get_network_binding(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(binding.clone()), reader.as_ref())
            .await;

        let mut missing = Vec::new();
        let mut backend = None;
        match reader.get_network(&binding.network_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("Network {}", binding.network_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        match reader.get_address_group(&binding.address_group_ref).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(format!("AddressGroup {}", binding.address_group_ref)),
            Err(err) => backend = Some(err.to_string()),
        }
        let refs = if let Some(message) = backend {
            RefCheck::Backend(message)
        } else if missing.is_empty() {
            RefCheck::Ok
        } else {
            RefCheck::Missing(format!("Missing {}", missing.join(", ")))
        };

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(
            ResourceKind::NetworkBinding,
            id,
            apply(synced, validated, refs, Ok("network binding is ready".to_string())),
        )
        .await;
    }

    /// `Policy` is inert: no Refs, no resource-specific post-check, and no
    /// downstream sync target, so `Synced` is left unset entirely (readiness
    /// tracks validation alone).
    pub async fn process_policy_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(policy)) = reader.get_policy(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(policy), reader.as_ref())
            .await;
        self.dispatch(
            ResourceKind::Policy,
            id,
            apply(None, validated, RefCheck::Ok, Ok("no further checks".to_string())),
        )
        .await;
    }

    /// `IEAgAgRule`s are derived-only: `Validated` always passes (the
    /// default validator has no opinion on them) and `Synced` is always
    /// `True`, but the `(local AG, target AG)` pair must still resolve.
    pub async fn process_ieagag_rule_conditions(&self, id: &Identifier) {
        let Ok(reader) = self.open_reader().await else { return };
        let Ok(Some(rule)) = reader.get_ieagag_rule(id).await else { return };
        let validated = self
            .validator
            .validate_for_creation(&AnyResource::from(rule.clone()), reader.as_ref())
            .await;

        let mut missing = Vec::new();
        let mut backend = None;
        for ag in [&rule.address_group_local, &rule.address_group] {
            match reader.get_address_group(ag).await {
                Ok(Some(_)) => {}
                Ok(None) => missing.push(ag.to_string()),
                Err(err) => backend = Some(err.to_string()),
            }
        }
        let refs = ref_check(backend, missing, "AddressGroups");

        let synced = Some((ConditionStatus::True, ConditionReason::Synced, "commit succeeded".to_string()));
        self.dispatch(
            ResourceKind::IEAgAgRule,
            id,
            apply(synced, validated, refs, Ok("derived rule is ready".to_string())),
        )
        .await;
    }

    async fn open_reader(&self) -> crate::error::Result<Box<dyn Reader>> {
        self.registry.reader().await
    }
}

fn ref_check(backend: Option<String>, missing: Vec<String>, category: &str) -> RefCheck {
    if let Some(message) = backend {
        RefCheck::Backend(message)
    } else if missing.is_empty() {
        RefCheck::Ok
    } else {
        RefCheck::Missing(format!("Missing {category}: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, IngressPort, Protocol, RuleS2S, Service, ServiceAlias};
    use crate::registry::{MemoryRegistry, Scope, SyncOp};
    use crate::validation::DefaultValidator;

    fn manager(registry: Arc<MemoryRegistry>) -> ConditionManager<MemoryRegistry> {
        ConditionManager::new(registry, Arc::new(DefaultValidator))
    }

    #[tokio::test]
    async fn service_with_no_ports_is_pending() {
        let registry = Arc::new(MemoryRegistry::new());
        let id = Identifier::new("default", "svc1");
        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![Service::new(id.clone())], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let manager = manager(Arc::clone(&registry));
        manager.process_service_conditions(&id).await;

        let reader = registry.reader().await.unwrap();
        let service = reader.get_service(&id).await.unwrap().unwrap();
        assert!(!service.metadata.conditions.is_true(ConditionType::Ready));
        assert_eq!(
            service.metadata.conditions.get(ConditionType::Ready).unwrap().reason,
            ConditionReason::Pending
        );
    }

    #[tokio::test]
    async fn service_with_missing_address_group_reports_not_ready() {
        let registry = Arc::new(MemoryRegistry::new());
        let id = Identifier::new("default", "svc-x");
        let mut svc = Service::new(id.clone());
        svc.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
        svc.address_groups.push(Identifier::new("default", "ag-missing"));
        let mut writer = registry.writer().await.unwrap();
        writer.sync_services(vec![svc], Scope::All, SyncOp::Upsert).await.unwrap();
        writer.commit().await.unwrap();

        let manager = manager(Arc::clone(&registry));
        manager.process_service_conditions(&id).await;

        let reader = registry.reader().await.unwrap();
        let service = reader.get_service(&id).await.unwrap().unwrap();
        assert!(!service.metadata.conditions.is_true(ConditionType::Ready));
        let ready = service.metadata.conditions.get(ConditionType::Ready).unwrap();
        assert_eq!(ready.reason, ConditionReason::NotReady);
        assert!(ready.message.contains("Missing AddressGroups"));
        assert!(service.metadata.conditions.is_true(ConditionType::Validated));
        assert!(service.metadata.conditions.is_true(ConditionType::Synced));
    }

    #[tokio::test]
    async fn rule_s2s_ready_reports_created_fraction() {
        let registry = Arc::new(MemoryRegistry::new());
        let local_id = Identifier::new("default", "svc-a");
        let target_id = Identifier::new("default", "svc-b");
        let local_ag = Identifier::new("default", "ag1");
        let target_ag = Identifier::new("default", "ag2");
        let alias_a = Identifier::new("default", "alias-a");
        let alias_b = Identifier::new("default", "alias-b");

        let mut local = Service::new(local_id.clone());
        local.address_groups.push(local_ag);
        let mut target = Service::new(target_id.clone());
        target.address_groups.push(target_ag);
        target.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));

        let rule_id = Identifier::new("default", "r1");
        let rule = RuleS2S::new(rule_id.clone(), alias_a.clone(), alias_b.clone(), Direction::Egress);

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![local, target], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer
            .sync_service_aliases(
                vec![
                    ServiceAlias::new(alias_a, local_id),
                    ServiceAlias::new(alias_b, target_id),
                ],
                Scope::All,
                SyncOp::Upsert,
            )
            .await
            .unwrap();
        writer.sync_rule_s2s(vec![rule], Scope::All, SyncOp::Upsert).await.unwrap();
        crate::reactive::regenerate_for_rules(writer.as_mut(), &[rule_id.clone()])
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let manager = manager(Arc::clone(&registry));
        manager.process_rule_s2s_conditions(&rule_id).await;

        let reader = registry.reader().await.unwrap();
        let rule = reader.get_rule_s2s(&rule_id).await.unwrap().unwrap();
        assert!(rule.metadata.conditions.is_true(ConditionType::Ready));
        let ready = rule.metadata.conditions.get(ConditionType::Ready).unwrap();
        assert!(ready.message.contains("1/1 IEAgAgRules created"), "message was {:?}", ready.message);
    }
}
