//! A minimal reference [`Validator`]: only the invariants the resource
//! model itself names (reference resolution, the port-overlap rule
//! `AddressGroupPortMapping` exists to support, and CIDR well-formedness).
//! A real deployment's validator would know far more about its own
//! policies; that knowledge is deliberately not this crate's to have.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use validator::Validate;

use crate::error::{Error, Result};
use crate::model::{AnyResource, Identifier, Transport};
use crate::registry::Reader;

use super::traits::Validator;

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultValidator;

fn require_well_formed_identifier(id: &Identifier) -> Result<()> {
    id.validate().map_err(|errors| Error::Validation(id.clone(), errors.to_string()))
}

async fn require_service(reader: &dyn Reader, id: &Identifier) -> Result<()> {
    if reader.get_service(id).await?.is_some() {
        return Ok(());
    }
    Err(Error::Validation(id.clone(), format!("no such Service {id}")))
}

async fn require_service_or_alias(reader: &dyn Reader, id: &Identifier) -> Result<()> {
    if reader.get_service(id).await?.is_some() || reader.get_service_alias(id).await?.is_some() {
        return Ok(());
    }
    Err(Error::Validation(
        id.clone(),
        format!("no such Service or ServiceAlias {id}"),
    ))
}

async fn require_address_group(reader: &dyn Reader, id: &Identifier) -> Result<()> {
    if reader.get_address_group(id).await?.is_some() {
        return Ok(());
    }
    Err(Error::Validation(id.clone(), format!("no such AddressGroup {id}")))
}

async fn require_network(reader: &dyn Reader, id: &Identifier) -> Result<()> {
    if reader.get_network(id).await?.is_some() {
        return Ok(());
    }
    Err(Error::Validation(id.clone(), format!("no such Network {id}")))
}

/// `10.0.0.0/24`-shaped text: four dotted-decimal octets, `/`, a 0-32
/// prefix. Rejects anything else, including bare addresses and IPv6.
fn validate_cidr(owner: &Identifier, cidr: &str) -> Result<()> {
    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| Error::Validation(owner.clone(), format!("CIDR {cidr:?} is missing a prefix length")))?;
    addr.parse::<Ipv4Addr>()
        .map_err(|_| Error::Validation(owner.clone(), format!("CIDR {cidr:?} has an invalid address")))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| Error::Validation(owner.clone(), format!("CIDR {cidr:?} has a non-numeric prefix")))?;
    if prefix > 32 {
        return Err(Error::Validation(
            owner.clone(),
            format!("CIDR {cidr:?} prefix {prefix} exceeds 32"),
        ));
    }
    Ok(())
}

fn validate_no_self_overlap(service_id: &Identifier, ports: &crate::model::Service) -> Result<()> {
    for transport in [Transport::Tcp, Transport::Udp] {
        let values = ports.ports_for_transport(transport);
        let mut seen = std::collections::HashSet::new();
        for port in values {
            if !seen.insert(port.clone()) {
                return Err(Error::Validation(
                    service_id.clone(),
                    format!("duplicate {} port {port:?} within the same Service", transport.as_lower()),
                ));
            }
        }
    }
    Ok(())
}

async fn validate_binding_port_overlap(
    binding: &crate::model::AddressGroupBinding,
    reader: &dyn Reader,
) -> Result<()> {
    let Some(service) = reader.get_service(&binding.service_ref).await? else {
        return Ok(()); // reported by require_service instead
    };
    let Some(mapping) = reader
        .get_address_group_port_mapping(&binding.address_group_ref)
        .await?
    else {
        return Ok(()); // nothing mapped yet, nothing to overlap with
    };

    // Excludes the binding's own service: a re-applied binding (the same
    // Service re-bound to the same AddressGroup) must not collide with the
    // ports it itself already contributed on a prior upsert.
    let existing_tcp = mapping.all_tcp_ports_excluding(&binding.service_ref);
    for port in service.ports_for_transport(Transport::Tcp) {
        if existing_tcp.contains(&port.as_str()) {
            return Err(Error::Conflict(
                binding.identifier().clone(),
                format!("tcp port {port:?} already mapped on {}", binding.address_group_ref),
            ));
        }
    }
    let existing_udp = mapping.all_udp_ports_excluding(&binding.service_ref);
    for port in service.ports_for_transport(Transport::Udp) {
        if existing_udp.contains(&port.as_str()) {
            return Err(Error::Conflict(
                binding.identifier().clone(),
                format!("udp port {port:?} already mapped on {}", binding.address_group_ref),
            ));
        }
    }
    Ok(())
}

async fn check(resource: &AnyResource, reader: &dyn Reader) -> Result<()> {
    match resource {
        AnyResource::Service(service) => validate_no_self_overlap(service.identifier(), service),
        AnyResource::AddressGroup(_) => Ok(()),
        AnyResource::AddressGroupBinding(binding) => {
            require_service(reader, &binding.service_ref).await?;
            require_address_group(reader, &binding.address_group_ref).await?;
            validate_binding_port_overlap(binding, reader).await
        }
        AnyResource::AddressGroupBindingPolicy(policy) => {
            require_service(reader, &policy.service_ref).await?;
            require_address_group(reader, &policy.address_group_ref).await
        }
        AnyResource::AddressGroupPortMapping(_) => Ok(()),
        AnyResource::ServiceAlias(alias) => require_service(reader, &alias.service_ref).await,
        AnyResource::RuleS2S(rule) => {
            require_service_or_alias(reader, &rule.service_local_ref).await?;
            require_service_or_alias(reader, &rule.service_ref).await
        }
        AnyResource::IEAgAgRule(_) => Ok(()),
        AnyResource::Network(network) => validate_cidr(network.identifier(), &network.cidr),
        AnyResource::NetworkBinding(binding) => {
            require_network(reader, &binding.network_ref).await?;
            require_address_group(reader, &binding.address_group_ref).await
        }
        AnyResource::Policy(_) => Ok(()),
    }
}

#[async_trait]
impl Validator for DefaultValidator {
    async fn validate_for_creation(&self, resource: &AnyResource, reader: &dyn Reader) -> Result<()> {
        check(resource, reader).await
    }

    async fn validate_for_update(&self, resource: &AnyResource, reader: &dyn Reader) -> Result<()> {
        check(resource, reader).await
    }

    /// The reference implementation defers all blocking-delete policy to
    /// the orchestrator's explicit cascade order; it has no rules of its
    /// own that would refuse a delete outright.
    async fn check_dependencies(&self, _resource: &AnyResource, _reader: &dyn Reader) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressGroup, AddressGroupBinding, Service};
    use crate::registry::{MemoryRegistry, Registry, Scope, SyncOp};

    #[tokio::test]
    async fn rejects_binding_to_missing_address_group() {
        let registry = MemoryRegistry::new();
        let svc_id = Identifier::new("default", "svc1");
        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![Service::new(svc_id.clone())], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let binding = AddressGroupBinding::new(
            Identifier::new("default", "bind1"),
            svc_id,
            Identifier::new("default", "missing-ag"),
        );
        let validator = DefaultValidator;
        let err = validator
            .validate_for_creation(&AnyResource::from(binding), reader.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(..)));
    }

    #[test]
    fn rejects_malformed_cidr() {
        let id = Identifier::new("default", "net1");
        assert!(validate_cidr(&id, "10.0.0.0/24").is_ok());
        assert!(validate_cidr(&id, "10.0.0.0/99").is_err());
        assert!(validate_cidr(&id, "not-a-cidr").is_err());
    }

    #[tokio::test]
    async fn rejects_overlapping_ports_on_same_address_group() {
        let registry = MemoryRegistry::new();
        let ag_id = Identifier::new("default", "ag1");
        let mut mapping = crate::model::AddressGroupPortMapping::new(ag_id.clone());
        mapping.access_ports.insert(
            Identifier::new("default", "other-svc"),
            crate::model::ProtocolPorts {
                tcp: vec!["443".to_string()],
                udp: vec![],
            },
        );
        let mut svc = Service::new(Identifier::new("default", "svc1"));
        svc.ingress_ports
            .push(crate::model::IngressPort::new(crate::model::Protocol::Tcp, "443"));

        let mut writer = registry.writer().await.unwrap();
        writer
            .sync_services(vec![svc.clone()], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer
            .sync_address_groups(vec![AddressGroup::new(ag_id.clone())], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer
            .sync_address_group_port_mappings(vec![mapping], Scope::All, SyncOp::Upsert)
            .await
            .unwrap();
        writer.commit().await.unwrap();

        let reader = registry.reader().await.unwrap();
        let binding = AddressGroupBinding::new(Identifier::new("default", "bind1"), svc.identifier().clone(), ag_id);
        let validator = DefaultValidator;
        let err = validator
            .validate_for_creation(&AnyResource::from(binding), reader.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(..)));
    }
}
