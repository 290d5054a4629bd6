//! Reactive Dependency Engine: keeps the `IEAgAgRule`s owned by a
//! `RuleS2S` in step with what [`crate::generate::generate`] says they
//! should be, diffing by deterministic name and upserting/deleting in the
//! same unit of work as whatever write triggered the recompute.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::generate;
use crate::model::{Identifier, IEAgAgRule};
use crate::registry::{Reader, Registry, Scope, SyncOp, Writer};

/// Whether a recompute happens inside the caller's own unit of work
/// (`Inline`, the common case — the orchestrator already has a `Writer`
/// open for the mutation that triggered it) or in a fresh, separately
/// committed one dispatched after the triggering commit (`Deferred`, for
/// batch recomputation that shouldn't block the request that caused it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactiveMode {
    Inline,
    Deferred,
}

fn rules_equivalent(a: &IEAgAgRule, b: &IEAgAgRule) -> bool {
    a.transport == b.transport
        && a.direction == b.direction
        && a.address_group_local == b.address_group_local
        && a.address_group == b.address_group
        && a.ports == b.ports
        && a.action == b.action
        && a.priority == b.priority
        && a.logs == b.logs
}

async fn regenerate_one<W: Writer + ?Sized>(writer: &mut W, rule_id: &Identifier) -> Result<()> {
    let Some(rule) = writer.get_rule_s2s(rule_id).await? else {
        // The RuleS2S was deleted in this same unit of work; its owned
        // rules are removed by the orchestrator's cascade, not here.
        return Ok(());
    };

    let expected = generate::generate(&rule, &*writer).await?;
    let existing = writer.list_ieagag_rules_owned_by(rule_id).await?;

    let expected_by_name: HashMap<String, IEAgAgRule> = expected
        .into_iter()
        .map(|r| (r.identifier().key(), r))
        .collect();
    let existing_by_name: HashMap<String, IEAgAgRule> = existing
        .into_iter()
        .map(|r| (r.identifier().key(), r))
        .collect();

    let to_upsert: Vec<IEAgAgRule> = expected_by_name
        .iter()
        .filter(|(name, wanted)| {
            !matches!(existing_by_name.get(*name), Some(current) if rules_equivalent(current, wanted))
        })
        .map(|(_, wanted)| wanted.clone())
        .collect();

    let to_delete: Vec<Identifier> = existing_by_name
        .iter()
        .filter(|(name, _)| !expected_by_name.contains_key(*name))
        .map(|(_, rule)| rule.identifier().clone())
        .collect();

    if !to_upsert.is_empty() {
        writer
            .sync_ieagag_rules(to_upsert, Scope::All, SyncOp::Upsert)
            .await?;
    }
    if !to_delete.is_empty() {
        writer.delete_ieagag_rules_by_ids(&to_delete).await?;
    }

    let mut refs: Vec<Identifier> = expected_by_name.values().map(|r| r.identifier().clone()).collect();
    refs.sort();
    let mut updated_rule = rule;
    updated_rule.ieagag_rule_refs = refs;
    writer
        .sync_rule_s2s(vec![updated_rule], Scope::All, SyncOp::Upsert)
        .await?;

    Ok(())
}

/// Recomputes derived rules for every id in `rule_ids`, within the given
/// writer's unit of work. Safe to call with an empty slice.
pub async fn regenerate_for_rules<W: Writer + ?Sized>(
    writer: &mut W,
    rule_ids: &[Identifier],
) -> Result<()> {
    for rule_id in rule_ids {
        regenerate_one(writer, rule_id).await?;
    }
    Ok(())
}

/// Runs a `Deferred` recompute in its own unit of work, committing (or
/// logging and dropping) independently of whatever triggered it.
async fn run_deferred(registry: Arc<dyn Registry>, rule_ids: Vec<Identifier>) -> Result<()> {
    let mut writer = registry.writer().await?;
    regenerate_for_rules(writer.as_mut(), &rule_ids).await?;
    writer.commit().await
}

/// Fires a `Deferred` recompute on the current Tokio runtime. Errors are
/// logged, not propagated: by the time this runs the triggering request has
/// already returned.
pub fn spawn_deferred(registry: Arc<dyn Registry>, rule_ids: Vec<Identifier>) {
    if rule_ids.is_empty() {
        return;
    }
    tokio::spawn(async move {
        if let Err(err) = run_deferred(registry, rule_ids).await {
            tracing::error!(error = %err, "deferred reactive regeneration failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, IngressPort, Protocol, RuleS2S, Service};
    use crate::registry::MemoryRegistry;

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let registry = MemoryRegistry::new();
        let local_id = Identifier::new("default", "web");
        let target_id = Identifier::new("default", "db");
        let local_ag = Identifier::new("default", "web-ag");
        let target_ag = Identifier::new("default", "db-ag");

        let mut local = Service::new(local_id.clone());
        local.address_groups.push(local_ag);
        let mut target = Service::new(target_id.clone());
        target.address_groups.push(target_ag);
        target.ingress_ports.push(IngressPort::new(Protocol::Tcp, "443"));

        let rule_id = Identifier::new("default", "web-to-db");
        let rule = RuleS2S::new(rule_id.clone(), local_id, target_id, Direction::Ingress);

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![local, target], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer
            .sync_rule_s2s(vec![rule], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        regenerate_for_rules(writer.as_mut(), &[rule_id.clone()]).await.unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let derived_first = reader.list_ieagag_rules().await.unwrap();
        assert_eq!(derived_first.len(), 1);

        let mut writer = registry.writer().await.unwrap();
        regenerate_for_rules(writer.as_mut(), &[rule_id]).await.unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let derived_second = reader.list_ieagag_rules().await.unwrap();
        assert_eq!(derived_first.len(), derived_second.len());
        assert_eq!(derived_first[0].metadata.identifier, derived_second[0].metadata.identifier);
    }
}
