//! Dependency Index: pure queries over whatever `Reader` is handed in,
//! answering "what depends on this?" without ever mutating or caching
//! anything themselves. Generic over `Reader` so callers can pass either a
//! committed snapshot or a `Writer` mid unit-of-work — the latter is
//! how the reactive engine sees its own just-buffered edits.

use std::collections::HashSet;

use crate::error::Result;
use crate::model::{Identifier, RuleS2S};
use crate::registry::Reader;

/// Every `RuleS2S` that references one of `aliases` as its local or remote
/// endpoint.
pub async fn find_rule_s2s_for_service_aliases<R: Reader + ?Sized>(
    reader: &R,
    aliases: &[Identifier],
) -> Result<Vec<RuleS2S>> {
    let wanted: HashSet<&Identifier> = aliases.iter().collect();
    let rules = reader
        .list_rule_s2s()
        .await?
        .into_iter()
        .filter(|rule| wanted.contains(&rule.service_local_ref) || wanted.contains(&rule.service_ref))
        .collect();
    Ok(rules)
}

/// Every `RuleS2S` reachable from `services`, resolved through the
/// `ServiceAlias` indirection: a rule references aliases, not services
/// directly, so this first finds the aliases that point at `services` and
/// then delegates to [`find_rule_s2s_for_service_aliases`].
pub async fn find_rule_s2s_for_services<R: Reader + ?Sized>(
    reader: &R,
    services: &[Identifier],
) -> Result<Vec<RuleS2S>> {
    let wanted: HashSet<&Identifier> = services.iter().collect();
    let alias_ids: Vec<Identifier> = reader
        .list_service_aliases()
        .await?
        .into_iter()
        .filter(|alias| wanted.contains(&alias.service_ref))
        .map(|alias| alias.metadata.identifier)
        .collect();

    // A rule may also reference a service identifier directly (nothing in
    // the model forbids it), so the service ids themselves are searched too.
    let mut probe = alias_ids;
    probe.extend(services.iter().cloned());
    find_rule_s2s_for_service_aliases(reader, &probe).await
}

/// Every `Service` currently bound to one of `address_groups`, via
/// `AddressGroupBinding`, a port-mapping upstream dependency.
pub async fn find_services_for_address_groups<R: Reader + ?Sized>(
    reader: &R,
    address_groups: &[Identifier],
) -> Result<Vec<Identifier>> {
    let wanted: HashSet<&Identifier> = address_groups.iter().collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for binding in reader.list_address_group_bindings().await? {
        if wanted.contains(&binding.address_group_ref) && seen.insert(binding.service_ref.clone()) {
            out.push(binding.service_ref);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressGroupBinding, Service, ServiceAlias};
    use crate::registry::{MemoryRegistry, Registry, Scope, SyncOp};

    #[tokio::test]
    async fn resolves_rule_s2s_through_aliases() {
        let registry = MemoryRegistry::new();
        let svc = Identifier::new("default", "svc1");
        let alias = Identifier::new("default", "alias1");
        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_service_aliases(
                vec![ServiceAlias::new(alias.clone(), svc.clone())],
                Scope::All,
                SyncOp::Upsert,
            )
            .await
            .unwrap();
        writer
            .sync_rule_s2s(
                vec![RuleS2S::new(
                    Identifier::new("default", "rule1"),
                    alias.clone(),
                    alias.clone(),
                    crate::model::Direction::Ingress,
                )],
                Scope::All,
                SyncOp::Upsert,
            )
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let rules = find_rule_s2s_for_services(reader.as_ref(), std::slice::from_ref(&svc))
            .await
            .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn finds_services_bound_to_address_group() {
        let registry = MemoryRegistry::new();
        let ag = Identifier::new("default", "ag1");
        let svc = Identifier::new("default", "svc1");
        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![Service::new(svc.clone())], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer
            .sync_address_group_bindings(
                vec![AddressGroupBinding::new(
                    Identifier::new("default", "bind1"),
                    svc.clone(),
                    ag.clone(),
                )],
                Scope::All,
                SyncOp::Upsert,
            )
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let services = find_services_for_address_groups(reader.as_ref(), &[ag]).await.unwrap();
        assert_eq!(services, vec![svc]);
    }
}
