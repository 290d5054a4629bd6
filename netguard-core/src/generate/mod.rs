//! IEAgAgRule Generator: the pure function that turns one `RuleS2S`
//! into the full set of derived `IEAgAgRule`s it implies. Never touches a
//! `Writer` — the reactive engine is the only caller and owns the
//! diff/commit against the registry.

pub mod naming;

use crate::error::{Error, Result};
use crate::model::{
    Direction, IEAgAgRule, Identifier, Metadata, RuleAction, RulePort, RuleS2S, Service, Transport,
};
use crate::registry::Reader;

const DEFAULT_PRIORITY: i32 = 100;

async fn resolve_service<R: Reader + ?Sized>(reader: &R, rule_ref: &Identifier) -> Result<Service> {
    if let Some(service) = reader.get_service(rule_ref).await? {
        return Ok(service);
    }
    if let Some(alias) = reader.get_service_alias(rule_ref).await? {
        if let Some(service) = reader.get_service(&alias.service_ref).await? {
            return Ok(service);
        }
    }
    Err(Error::Dependency(
        rule_ref.clone(),
        "referenced service or alias not found".to_string(),
    ))
}

/// Every `IEAgAgRule` that `rule` implies, one per `(local AG, target AG,
/// transport)` triple that actually has ports on the selected side.
/// `INGRESS` rules draw their ports from the local service; `EGRESS` rules
/// draw from the target service. Transports with no matching ports
/// contribute nothing.
pub async fn generate<R: Reader + ?Sized>(rule: &RuleS2S, reader: &R) -> Result<Vec<IEAgAgRule>> {
    let local = resolve_service(reader, &rule.service_local_ref).await?;
    let target = resolve_service(reader, &rule.service_ref).await?;
    let port_source = match rule.direction {
        Direction::Ingress => &local,
        Direction::Egress => &target,
    };

    let mut out = Vec::new();
    for local_ag in &local.address_groups {
        for target_ag in &target.address_groups {
            for transport in [Transport::Tcp, Transport::Udp] {
                let ports = port_source.ports_for_transport(transport);
                if ports.is_empty() {
                    continue;
                }
                let name = naming::rule_name(rule.direction, local_ag, target_ag, transport);
                let namespace = match rule.direction {
                    Direction::Ingress => non_empty(&local_ag.namespace).unwrap_or(&rule.metadata.identifier.namespace),
                    Direction::Egress => non_empty(&target_ag.namespace).unwrap_or(&rule.metadata.identifier.namespace),
                };
                let id = Identifier::new(namespace.clone(), name);
                out.push(IEAgAgRule {
                    metadata: Metadata::new(id),
                    transport,
                    direction: rule.direction,
                    address_group_local: local_ag.clone(),
                    address_group: target_ag.clone(),
                    ports: vec![RulePort {
                        destination: ports.join(","),
                    }],
                    action: RuleAction::Accept,
                    priority: DEFAULT_PRIORITY,
                    logs: true,
                    owner: rule.identifier().clone(),
                });
            }
        }
    }
    Ok(out)
}

fn non_empty(s: &String) -> Option<&String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngressPort, Protocol};
    use crate::registry::{MemoryRegistry, Registry, Scope, SyncOp};

    #[tokio::test]
    async fn one_rule_per_ag_pair_and_populated_transport() {
        let registry = MemoryRegistry::new();
        let local_svc_id = Identifier::new("default", "web");
        let target_svc_id = Identifier::new("default", "db");
        let local_ag = Identifier::new("default", "web-ag");
        let target_ag = Identifier::new("default", "db-ag");

        let mut local = Service::new(local_svc_id.clone());
        local.address_groups.push(local_ag.clone());
        local
            .ingress_ports
            .push(IngressPort::new(Protocol::Tcp, "5432"));
        let mut target = Service::new(target_svc_id.clone());
        target.address_groups.push(target_ag.clone());

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![local, target], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let rule = RuleS2S::new(
            Identifier::new("default", "web-to-db"),
            local_svc_id,
            target_svc_id,
            Direction::Ingress,
        );
        let rules = generate(&rule, reader.as_ref()).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].transport, Transport::Tcp);
        assert_eq!(rules[0].ports[0].destination, "5432");
        assert!(rules[0].logs);
        assert_eq!(rules[0].owner, rule.identifier().clone());
    }

    #[tokio::test]
    async fn egress_draws_ports_from_target_service() {
        let registry = MemoryRegistry::new();
        let local_svc_id = Identifier::new("default", "web");
        let target_svc_id = Identifier::new("default", "db");
        let local_ag = Identifier::new("default", "web-ag");
        let target_ag = Identifier::new("default", "db-ag");

        let mut local = Service::new(local_svc_id.clone());
        local.address_groups.push(local_ag);
        let mut target = Service::new(target_svc_id.clone());
        target.address_groups.push(target_ag);
        target
            .ingress_ports
            .push(IngressPort::new(Protocol::Tcp, "80"));

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![local, target], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let rule = RuleS2S::new(
            Identifier::new("default", "web-to-db"),
            local_svc_id,
            target_svc_id,
            Direction::Egress,
        );
        let rules = generate(&rule, reader.as_ref()).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].ports[0].destination, "80");
    }

    #[tokio::test]
    async fn missing_service_is_a_dependency_error() {
        let registry = MemoryRegistry::new();
        let reader = registry.reader().await.unwrap();
        let rule = RuleS2S::new(
            Identifier::new("default", "orphan"),
            Identifier::new("default", "ghost-local"),
            Identifier::new("default", "ghost-target"),
            Direction::Egress,
        );
        let err = generate(&rule, reader.as_ref()).await.unwrap_err();
        assert!(matches!(err, Error::Dependency(..)));
    }
}
