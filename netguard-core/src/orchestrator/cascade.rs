//! Cascade-delete ordering. Every function here deletes everything
//! that would otherwise dangle if its argument vanished first, then deletes
//! the argument itself — always child-before-parent, derived-before-source.
//! Takes a `Writer` directly so a cascade runs inside the caller's own unit
//! of work; nothing here opens or commits anything on its own.

use std::collections::HashSet;

use crate::dependency;
use crate::error::{Error, Result};
use crate::model::Identifier;
use crate::reactive;
use crate::registry::{Scope, SyncOp, Writer};

async fn delete_rule_s2s_and_owned<W: Writer + ?Sized>(writer: &mut W, rule_id: &Identifier) -> Result<()> {
    let owned = writer.list_ieagag_rules_owned_by(rule_id).await?;
    if !owned.is_empty() {
        let ids: Vec<Identifier> = owned.iter().map(|r| r.identifier().clone()).collect();
        writer.delete_ieagag_rules_by_ids(&ids).await?;
    }
    writer.delete_rule_s2s_by_ids(std::slice::from_ref(rule_id)).await
}

/// `RuleS2S` → its derived `IEAgAgRule`s.
pub async fn delete_rule_s2s<W: Writer + ?Sized>(writer: &mut W, rule_id: &Identifier) -> Result<()> {
    delete_rule_s2s_and_owned(writer, rule_id).await
}

/// `ServiceAlias` delete is refused outright while any `RuleS2S` still
/// references it: the client must delete those `RuleS2S` (and thereby
/// their derived rules) first. There is no implicit cascade through this
/// edge.
pub async fn delete_service_alias<W: Writer + ?Sized>(writer: &mut W, alias_id: &Identifier) -> Result<()> {
    let rules = dependency::find_rule_s2s_for_service_aliases(&*writer, std::slice::from_ref(alias_id)).await?;
    if !rules.is_empty() {
        return Err(Error::Dependency(
            alias_id.clone(),
            format!("{} RuleS2S still reference this ServiceAlias", rules.len()),
        ));
    }
    writer.delete_service_aliases_by_ids(std::slice::from_ref(alias_id)).await
}

/// `AddressGroupBinding` → its entry in the target AG's port mapping (the
/// mapping itself is removed once empty, left in place otherwise) → a
/// recompute of any `RuleS2S` that reaches the bound service, since losing
/// the binding can shrink or empty the `(local AG, target AG)` pairs the
/// generator would otherwise produce for it.
pub async fn delete_address_group_binding<W: Writer + ?Sized>(
    writer: &mut W,
    binding_id: &Identifier,
) -> Result<()> {
    let Some(binding) = writer.get_address_group_binding(binding_id).await? else {
        return Ok(());
    };
    if let Some(mut mapping) = writer
        .get_address_group_port_mapping(&binding.address_group_ref)
        .await?
    {
        mapping.access_ports.remove(&binding.service_ref);
        if mapping.is_empty() {
            writer
                .delete_address_group_port_mappings_by_ids(std::slice::from_ref(mapping.identifier()))
                .await?;
        } else {
            writer
                .sync_address_group_port_mappings(vec![mapping], Scope::All, SyncOp::Upsert)
                .await?;
        }
    }
    writer.delete_address_group_bindings_by_ids(std::slice::from_ref(binding_id)).await?;

    let affected_rules =
        dependency::find_rule_s2s_for_services(&*writer, std::slice::from_ref(&binding.service_ref)).await?;
    if !affected_rules.is_empty() {
        let rule_ids: Vec<Identifier> = affected_rules.iter().map(|r| r.identifier().clone()).collect();
        reactive::regenerate_for_rules(writer, &rule_ids).await?;
    }
    Ok(())
}

/// `Service` delete is refused outright while any `RuleS2S` still reaches
/// it (directly or through one of its aliases): those `RuleS2S` must be
/// deleted first, which in turn requires deleting the alias they name.
/// Once no dependents remain, this cascades `AddressGroupBinding`s
/// (which themselves cascade into port mappings) and orphaned
/// `ServiceAlias`es before deleting the service itself.
pub async fn delete_service<W: Writer + ?Sized>(writer: &mut W, service_id: &Identifier) -> Result<()> {
    let rules = dependency::find_rule_s2s_for_services(&*writer, std::slice::from_ref(service_id)).await?;
    if !rules.is_empty() {
        return Err(Error::Dependency(
            service_id.clone(),
            format!("{} RuleS2S still reference this Service", rules.len()),
        ));
    }

    let aliases: Vec<Identifier> = writer
        .list_service_aliases()
        .await?
        .into_iter()
        .filter(|alias| &alias.service_ref == service_id)
        .map(|alias| alias.metadata.identifier)
        .collect();
    if !aliases.is_empty() {
        writer.delete_service_aliases_by_ids(&aliases).await?;
    }

    let bindings: Vec<Identifier> = writer
        .list_address_group_bindings()
        .await?
        .into_iter()
        .filter(|binding| &binding.service_ref == service_id)
        .map(|binding| binding.metadata.identifier)
        .collect();
    for binding_id in &bindings {
        delete_address_group_binding(writer, binding_id).await?;
    }

    writer.delete_services_by_ids(std::slice::from_ref(service_id)).await
}

/// `AddressGroup` → its bindings (cascading into port mappings) →
/// `AddressGroupBindingPolicy`s and `NetworkBinding`s naming it → derived
/// `IEAgAgRule`s naming it as either side (with a best-effort prune of the
/// owning `RuleS2S`'s stale `ieagag_rule_refs`) → `Service`s that still list
/// it in `address_groups` (rewritten to drop the ref, so a later reactive
/// recompute can't regenerate a rule naming an AG that no longer exists) →
/// its own port mapping → the address group.
pub async fn delete_address_group<W: Writer + ?Sized>(writer: &mut W, ag_id: &Identifier) -> Result<()> {
    let bindings: Vec<Identifier> = writer
        .list_address_group_bindings()
        .await?
        .into_iter()
        .filter(|binding| &binding.address_group_ref == ag_id)
        .map(|binding| binding.metadata.identifier)
        .collect();
    for binding_id in &bindings {
        delete_address_group_binding(writer, binding_id).await?;
    }

    let policies: Vec<Identifier> = writer
        .list_address_group_binding_policies()
        .await?
        .into_iter()
        .filter(|policy| &policy.address_group_ref == ag_id)
        .map(|policy| policy.metadata.identifier)
        .collect();
    if !policies.is_empty() {
        writer.delete_address_group_binding_policies_by_ids(&policies).await?;
    }

    let network_bindings: Vec<Identifier> = writer
        .list_network_bindings()
        .await?
        .into_iter()
        .filter(|binding| &binding.address_group_ref == ag_id)
        .map(|binding| binding.metadata.identifier)
        .collect();
    if !network_bindings.is_empty() {
        writer.delete_network_bindings_by_ids(&network_bindings).await?;
    }

    let affected: Vec<_> = writer
        .list_ieagag_rules()
        .await?
        .into_iter()
        .filter(|rule| &rule.address_group_local == ag_id || &rule.address_group == ag_id)
        .collect();
    if !affected.is_empty() {
        let stale_rules: Vec<Identifier> = affected.iter().map(|rule| rule.identifier().clone()).collect();
        let owners: HashSet<Identifier> = affected.into_iter().map(|rule| rule.owner).collect();
        writer.delete_ieagag_rules_by_ids(&stale_rules).await?;
        for owner in owners {
            if let Some(mut rule) = writer.get_rule_s2s(&owner).await? {
                rule.ieagag_rule_refs.retain(|id| !stale_rules.contains(id));
                writer.sync_rule_s2s(vec![rule], Scope::All, SyncOp::Upsert).await?;
            }
        }
    }

    let referencing_services: Vec<_> = writer
        .list_services()
        .await?
        .into_iter()
        .filter(|service| service.address_groups.contains(ag_id))
        .collect();
    if !referencing_services.is_empty() {
        let rewritten: Vec<_> = referencing_services
            .into_iter()
            .map(|mut service| {
                service.address_groups.retain(|ag| ag != ag_id);
                service
            })
            .collect();
        writer.sync_services(rewritten, Scope::All, SyncOp::Upsert).await?;
    }

    if let Some(mapping) = writer.get_address_group_port_mapping(ag_id).await? {
        writer
            .delete_address_group_port_mappings_by_ids(std::slice::from_ref(mapping.identifier()))
            .await?;
    }

    writer.delete_address_groups_by_ids(std::slice::from_ref(ag_id)).await
}

/// `Network` → `NetworkBinding`s naming it → the network.
pub async fn delete_network<W: Writer + ?Sized>(writer: &mut W, network_id: &Identifier) -> Result<()> {
    let bindings: Vec<Identifier> = writer
        .list_network_bindings()
        .await?
        .into_iter()
        .filter(|binding| &binding.network_ref == network_id)
        .map(|binding| binding.metadata.identifier)
        .collect();
    if !bindings.is_empty() {
        writer.delete_network_bindings_by_ids(&bindings).await?;
    }
    writer.delete_networks_by_ids(std::slice::from_ref(network_id)).await
}

/// No downstream references this kind; deleting it is never more than
/// itself.
pub async fn delete_address_group_binding_policy<W: Writer + ?Sized>(
    writer: &mut W,
    id: &Identifier,
) -> Result<()> {
    writer.delete_address_group_binding_policies_by_ids(std::slice::from_ref(id)).await
}

pub async fn delete_network_binding<W: Writer + ?Sized>(writer: &mut W, id: &Identifier) -> Result<()> {
    writer.delete_network_bindings_by_ids(std::slice::from_ref(id)).await
}

pub async fn delete_policy<W: Writer + ?Sized>(writer: &mut W, id: &Identifier) -> Result<()> {
    writer.delete_policies_by_ids(std::slice::from_ref(id)).await
}
