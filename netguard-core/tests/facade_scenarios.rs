//! End-to-end scenarios driven entirely through [`NetguardFacade`], the
//! way a façade-layer caller would: no direct registry pokes except to
//! read back committed state for assertions.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use netguard_core::model::{
    AddressGroup, AddressGroupBinding, ConditionReason, ConditionStatus, ConditionType, Direction,
    Identifier, IngressPort, Network, Protocol, RuleS2S, Service, ServiceAlias, Transport,
};
use netguard_core::registry::{MemoryRegistry, Registry};
use netguard_core::sync::{SyncEvent, SyncManager};
use netguard_core::validation::DefaultValidator;
use netguard_core::{Error, NetguardFacade};

#[derive(Debug, Default, Clone, Copy)]
struct FailingSyncManager;

#[async_trait]
impl SyncManager for FailingSyncManager {
    async fn push(&self, _events: Vec<SyncEvent>) -> Result<(), String> {
        Err("downstream sgroups unreachable".to_string())
    }
}

fn facade() -> NetguardFacade<MemoryRegistry, DefaultValidator, netguard_core::sync::NoopSyncManager> {
    NetguardFacade::new(MemoryRegistry::new(), DefaultValidator, netguard_core::sync::NoopSyncManager)
}

/// Scenario 1: happy path. One EGRESS RuleS2S between two aliased services
/// each bound to its own AddressGroup yields exactly one IEAgAgRule.
#[tokio::test]
async fn happy_path_generates_one_rule_and_goes_ready() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag1 = Identifier::new("default", "ag1");
    let ag2 = Identifier::new("default", "ag2");
    facade.create_address_group(&ctx, AddressGroup::new(ag1.clone())).await.unwrap();
    facade.create_address_group(&ctx, AddressGroup::new(ag2.clone())).await.unwrap();

    let svc_a_id = Identifier::new("default", "svc-a");
    let mut svc_a = Service::new(svc_a_id.clone());
    svc_a.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_a.address_groups.push(ag1.clone());
    facade.create_service(&ctx, svc_a).await.unwrap();

    let svc_b_id = Identifier::new("default", "svc-b");
    let mut svc_b = Service::new(svc_b_id.clone());
    svc_b.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_b.address_groups.push(ag2.clone());
    facade.create_service(&ctx, svc_b).await.unwrap();

    let alias_a = Identifier::new("default", "alias-a");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_a.clone(), svc_a_id))
        .await
        .unwrap();
    let alias_b = Identifier::new("default", "alias-b");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_b.clone(), svc_b_id))
        .await
        .unwrap();

    let rule_id = Identifier::new("default", "r1");
    let rule = RuleS2S::new(rule_id.clone(), alias_a, alias_b, Direction::Egress);
    facade.create_rule_s2s(&ctx, rule).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    let committed = reader.get_rule_s2s(&rule_id).await.unwrap().unwrap();
    assert_eq!(committed.ieagag_rule_refs.len(), 1);
    let rule_name = &committed.ieagag_rule_refs[0];
    assert!(rule_name.name.starts_with("egr-"));

    let derived = reader.get_ieagag_rule(rule_name).await.unwrap().unwrap();
    assert_eq!(derived.transport, Transport::Tcp);
    assert_eq!(derived.address_group_local, ag1);
    assert_eq!(derived.address_group, ag2);
    assert_eq!(derived.ports.len(), 1);
    assert_eq!(derived.ports[0].destination, "80");
    assert_eq!(derived.priority, 100);

    let ready = committed.metadata.conditions.get(ConditionType::Ready).unwrap();
    assert_eq!(ready.status, ConditionStatus::True);
    assert!(ready.message.contains("1/1 IEAgAgRules created"), "message was {:?}", ready.message);
}

/// Scenario 3: port overlap. Two bindings onto the same AddressGroup whose
/// services both expose TCP/80 — the second binding is refused and the
/// port mapping is unchanged.
#[tokio::test]
async fn overlapping_bindings_are_refused() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag = Identifier::new("default", "ag");
    facade.create_address_group(&ctx, AddressGroup::new(ag.clone())).await.unwrap();

    let svc_a_id = Identifier::new("default", "svc-a");
    let mut svc_a = Service::new(svc_a_id.clone());
    svc_a.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    facade.create_service(&ctx, svc_a).await.unwrap();

    let svc_b_id = Identifier::new("default", "svc-b");
    let mut svc_b = Service::new(svc_b_id.clone());
    svc_b.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    facade.create_service(&ctx, svc_b).await.unwrap();

    let b1 = AddressGroupBinding::new(Identifier::new("default", "b1"), svc_a_id, ag.clone());
    facade.create_address_group_binding(&ctx, b1).await.unwrap();

    let b2 = AddressGroupBinding::new(Identifier::new("default", "b2"), svc_b_id, ag.clone());
    let err = facade.create_address_group_binding(&ctx, b2).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(..)));

    let reader = facade.registry().reader().await.unwrap();
    let mapping = reader.get_address_group_port_mapping(&ag).await.unwrap().unwrap();
    assert_eq!(mapping.access_ports.len(), 1);
}

/// Scenario 4: cascade service delete. Deleting a Service (or its alias)
/// while a RuleS2S still depends on it is refused; deleting the RuleS2S
/// first (which also deletes its derived IEAgAgRule) clears the way.
#[tokio::test]
async fn service_delete_is_refused_until_rule_s2s_is_gone() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag1 = Identifier::new("default", "ag1");
    let ag2 = Identifier::new("default", "ag2");
    facade.create_address_group(&ctx, AddressGroup::new(ag1.clone())).await.unwrap();
    facade.create_address_group(&ctx, AddressGroup::new(ag2.clone())).await.unwrap();

    let svc_a_id = Identifier::new("default", "svc-a");
    let mut svc_a = Service::new(svc_a_id.clone());
    svc_a.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_a.address_groups.push(ag1);
    facade.create_service(&ctx, svc_a).await.unwrap();

    let svc_b_id = Identifier::new("default", "svc-b");
    let mut svc_b = Service::new(svc_b_id.clone());
    svc_b.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_b.address_groups.push(ag2);
    facade.create_service(&ctx, svc_b).await.unwrap();

    let alias_a_id = Identifier::new("default", "alias-a");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_a_id.clone(), svc_a_id.clone()))
        .await
        .unwrap();
    let alias_b_id = Identifier::new("default", "alias-b");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_b_id.clone(), svc_b_id))
        .await
        .unwrap();

    let rule_id = Identifier::new("default", "r1");
    let rule = RuleS2S::new(rule_id.clone(), alias_a_id.clone(), alias_b_id, Direction::Egress);
    facade.create_rule_s2s(&ctx, rule).await.unwrap();

    let err = facade.delete_service(&ctx, &svc_a_id).await.unwrap_err();
    assert!(matches!(err, Error::Dependency(..)));

    let err = facade.delete_service_alias(&ctx, &alias_a_id).await.unwrap_err();
    assert!(matches!(err, Error::Dependency(..)));

    let reader_before = facade.registry().reader().await.unwrap();
    let derived_id = reader_before
        .get_rule_s2s(&rule_id)
        .await
        .unwrap()
        .unwrap()
        .ieagag_rule_refs[0]
        .clone();

    facade.delete_rule_s2s(&ctx, &rule_id).await.unwrap();
    facade.delete_service_alias(&ctx, &alias_a_id).await.unwrap();
    facade.delete_service(&ctx, &svc_a_id).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    assert!(reader.get_service(&svc_a_id).await.unwrap().is_none());
    assert!(reader.get_service_alias(&alias_a_id).await.unwrap().is_none());
    assert!(reader.get_rule_s2s(&rule_id).await.unwrap().is_none());
    assert!(reader.get_ieagag_rule(&derived_id).await.unwrap().is_none());
}

/// Scenario 5: reactive update. Adding a UDP port to an already-ruled
/// service produces a second, UDP-specific IEAgAgRule while leaving the
/// existing TCP rule untouched.
#[tokio::test]
async fn service_update_adds_a_second_derived_rule() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag1 = Identifier::new("default", "ag1");
    let ag2 = Identifier::new("default", "ag2");
    facade.create_address_group(&ctx, AddressGroup::new(ag1.clone())).await.unwrap();
    facade.create_address_group(&ctx, AddressGroup::new(ag2.clone())).await.unwrap();

    let svc_a_id = Identifier::new("default", "svc-a");
    let mut svc_a = Service::new(svc_a_id.clone());
    svc_a.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_a.address_groups.push(ag1);
    facade.create_service(&ctx, svc_a.clone()).await.unwrap();

    let svc_b_id = Identifier::new("default", "svc-b");
    let mut svc_b = Service::new(svc_b_id.clone());
    svc_b.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc_b.address_groups.push(ag2);
    facade.create_service(&ctx, svc_b).await.unwrap();

    let alias_a = Identifier::new("default", "alias-a");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_a.clone(), svc_a_id.clone()))
        .await
        .unwrap();
    let alias_b = Identifier::new("default", "alias-b");
    facade
        .create_service_alias(&ctx, ServiceAlias::new(alias_b.clone(), svc_b_id))
        .await
        .unwrap();

    let rule_id = Identifier::new("default", "r1");
    let rule = RuleS2S::new(rule_id.clone(), alias_a, alias_b, Direction::Egress);
    facade.create_rule_s2s(&ctx, rule).await.unwrap();

    svc_a.ingress_ports.push(IngressPort::new(Protocol::Udp, "53"));
    facade.update_service(&ctx, svc_a).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    let committed = reader.get_rule_s2s(&rule_id).await.unwrap().unwrap();
    assert_eq!(committed.ieagag_rule_refs.len(), 2);

    let mut transports: Vec<Transport> = Vec::new();
    for id in &committed.ieagag_rule_refs {
        let rule = reader.get_ieagag_rule(id).await.unwrap().unwrap();
        transports.push(rule.transport);
    }
    transports.sort_by_key(|t| matches!(t, Transport::Udp));
    assert_eq!(transports, vec![Transport::Tcp, Transport::Udp]);
}

/// Scenario 6: external sync failure on Network. Commit still succeeds;
/// the condition manager records `Synced=False(SyncFailed)` and leaves
/// `Validated=Unknown(Validating)`.
#[tokio::test]
async fn network_sync_failure_reports_synced_false() {
    let facade = NetguardFacade::new(MemoryRegistry::new(), DefaultValidator, FailingSyncManager);
    let ctx = CancellationToken::new();

    let net_id = Identifier::new("default", "net1");
    let network = Network::new(net_id.clone(), "10.0.0.0/24");
    facade.create_network(&ctx, network).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    let committed = reader.get_network(&net_id).await.unwrap().unwrap();

    let synced = committed.metadata.conditions.get(ConditionType::Synced).unwrap();
    assert_eq!(synced.status, ConditionStatus::False);
    assert_eq!(synced.reason, ConditionReason::SyncFailed);

    let validated = committed.metadata.conditions.get(ConditionType::Validated).unwrap();
    assert_eq!(validated.status, ConditionStatus::Unknown);
    assert_eq!(validated.reason, ConditionReason::Validating);

    let ready = committed.metadata.conditions.get(ConditionType::Ready).unwrap();
    assert_eq!(ready.status, ConditionStatus::False);
}

/// Scenario 2: missing AddressGroup. A Service referencing a
/// non-existent AddressGroup commits fine; the condition manager marks
/// it `Validated=True, Synced=True, Ready=False(NotReady)`.
#[tokio::test]
async fn service_with_missing_address_group_commits_but_is_not_ready() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let svc_id = Identifier::new("default", "svc-x");
    let mut svc = Service::new(svc_id.clone());
    svc.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc.address_groups.push(Identifier::new("default", "ag-missing"));
    facade.create_service(&ctx, svc).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    let committed = reader.get_service(&svc_id).await.unwrap().unwrap();

    assert!(committed.metadata.conditions.is_true(ConditionType::Validated));
    assert!(committed.metadata.conditions.is_true(ConditionType::Synced));
    let ready = committed.metadata.conditions.get(ConditionType::Ready).unwrap();
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason, ConditionReason::NotReady);
    assert!(ready.message.contains("Missing AddressGroups"), "message was {:?}", ready.message);
}

/// AddressGroup delete must rewrite every Service that still lists it,
/// not just its bindings — otherwise a later reactive recompute would
/// resurrect IEAgAgRules naming an AddressGroup that no longer exists.
#[tokio::test]
async fn address_group_delete_drops_the_ref_from_referencing_services() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag1 = Identifier::new("default", "ag1");
    let ag2 = Identifier::new("default", "ag2");
    facade.create_address_group(&ctx, AddressGroup::new(ag1.clone())).await.unwrap();
    facade.create_address_group(&ctx, AddressGroup::new(ag2.clone())).await.unwrap();

    let svc_id = Identifier::new("default", "svc-a");
    let mut svc = Service::new(svc_id.clone());
    svc.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    svc.address_groups.push(ag1.clone());
    svc.address_groups.push(ag2.clone());
    facade.create_service(&ctx, svc).await.unwrap();

    facade.delete_address_group(&ctx, &ag1).await.unwrap();

    let reader = facade.registry().reader().await.unwrap();
    let committed = reader.get_service(&svc_id).await.unwrap().unwrap();
    assert_eq!(committed.address_groups, vec![ag2]);
}

/// Re-applying the same binding (the declarative re-push clients do) must
/// not trip the port-overlap check against the binding's own prior
/// contribution to the mapping.
#[tokio::test]
async fn reapplying_the_same_binding_is_not_a_conflict() {
    let facade = facade();
    let ctx = CancellationToken::new();

    let ag = Identifier::new("default", "ag");
    facade.create_address_group(&ctx, AddressGroup::new(ag.clone())).await.unwrap();

    let svc_id = Identifier::new("default", "svc-a");
    let mut svc = Service::new(svc_id.clone());
    svc.ingress_ports.push(IngressPort::new(Protocol::Tcp, "80"));
    facade.create_service(&ctx, svc).await.unwrap();

    let binding = AddressGroupBinding::new(Identifier::new("default", "b1"), svc_id, ag);
    facade.create_address_group_binding(&ctx, binding.clone()).await.unwrap();
    facade.create_address_group_binding(&ctx, binding).await.unwrap();
}

/// Cancellation: a context cancelled before commit aborts the writer and
/// leaves no trace of the attempted mutation.
#[tokio::test]
async fn cancelled_context_aborts_before_commit() {
    let facade = facade();
    let ctx = CancellationToken::new();
    ctx.cancel();

    let ag_id = Identifier::new("default", "ag1");
    let err = facade
        .create_address_group(&ctx, AddressGroup::new(ag_id.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend(..)));

    let reader = facade.registry().reader().await.unwrap();
    assert!(reader.get_address_group(&ag_id).await.unwrap().is_none());
}
