//! Drives `NetguardFacade` through the end-to-end scenario this crate is
//! built around: two services, an address group each, a binding, an S2S
//! rule, and the derived firewall rule that falls out of it.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use netguard_core::config::Settings;
use netguard_core::model::{
    AddressGroup, AddressGroupBinding, Direction, Identifier, IngressPort, Protocol, RuleS2S,
    Service,
};
use netguard_core::orchestrator::NetguardFacade;
use netguard_core::registry::MemoryRegistry;
use netguard_core::sync::LoggingSyncManager;
use netguard_core::telemetry;
use netguard_core::validation::DefaultValidator;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;
    let settings = Settings::load().unwrap_or_default();
    tracing::info!(?settings, "netguard-demo starting");

    let facade = NetguardFacade::new(MemoryRegistry::new(), DefaultValidator, LoggingSyncManager);
    let ctx = CancellationToken::new();

    let web_ag = facade
        .create_address_group(&ctx, AddressGroup::new(Identifier::new("default", "web-ag")))
        .await?;
    let db_ag = facade
        .create_address_group(&ctx, AddressGroup::new(Identifier::new("default", "db-ag")))
        .await?;
    tracing::info!(web_ag = %web_ag.identifier(), db_ag = %db_ag.identifier(), "address groups ready");

    let mut web = Service::new(Identifier::new("default", "web"));
    web.address_groups.push(web_ag.identifier().clone());
    let web = facade.create_service(&ctx, web).await?;

    let mut db = Service::new(Identifier::new("default", "db"));
    db.address_groups.push(db_ag.identifier().clone());
    db.ingress_ports.push(IngressPort::new(Protocol::Tcp, "5432"));
    let db = facade.create_service(&ctx, db).await?;
    tracing::info!(web = %web.identifier(), db = %db.identifier(), "services ready");

    facade
        .create_address_group_binding(
            &ctx,
            AddressGroupBinding::new(
                Identifier::new("default", "web-binding"),
                web.identifier().clone(),
                web_ag.identifier().clone(),
            ),
        )
        .await?;
    facade
        .create_address_group_binding(
            &ctx,
            AddressGroupBinding::new(
                Identifier::new("default", "db-binding"),
                db.identifier().clone(),
                db_ag.identifier().clone(),
            ),
        )
        .await?;

    let rule = facade
        .create_rule_s2s(
            &ctx,
            RuleS2S::new(
                Identifier::new("default", "web-to-db"),
                web.identifier().clone(),
                db.identifier().clone(),
                Direction::Ingress,
            ),
        )
        .await?;
    tracing::info!(rule = %rule.identifier(), derived = rule.ieagag_rule_refs.len(), "rule s2s reconciled");

    let reader = facade.registry().reader().await?;
    use netguard_core::registry::Reader;
    for derived in reader.list_ieagag_rules().await? {
        tracing::info!(
            name = %derived.identifier(),
            local = %derived.address_group_local,
            target = %derived.address_group,
            transport = derived.transport.as_lower(),
            ports = ?derived.ports,
            "derived IEAgAgRule"
        );
    }

    match facade.delete_service(&ctx, db.identifier()).await {
        Err(err) => tracing::info!(%err, "delete refused while web-to-db still references db, as expected"),
        Ok(()) => tracing::warn!("expected delete_service to be refused while a RuleS2S still references it"),
    }

    facade.delete_rule_s2s(&ctx, rule.identifier()).await?;
    facade.delete_service(&ctx, db.identifier()).await?;
    let reader = facade.registry().reader().await?;
    let remaining = reader.list_rule_s2s().await?;
    tracing::info!(remaining = remaining.len(), "db removed once web-to-db was deleted first");

    Ok(())
}
