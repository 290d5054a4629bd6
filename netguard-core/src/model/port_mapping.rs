use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

/// The TCP/UDP port lists a single service contributes to an AddressGroup's
/// mapping, grouped by protocol, raw strings preserved in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolPorts {
    pub tcp: Vec<String>,
    pub udp: Vec<String>,
}

impl ProtocolPorts {
    pub fn is_empty(&self) -> bool {
        self.tcp.is_empty() && self.udp.is_empty()
    }
}

/// Derived, AG-indexed view of all `(service → ports)` entries produced by
/// bindings. Exclusively derived from Bindings +
/// Services — never written directly by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressGroupPortMapping {
    pub metadata: Metadata,
    pub address_group: Identifier,
    pub access_ports: BTreeMap<Identifier, ProtocolPorts>,
}

impl AddressGroupPortMapping {
    pub fn new(address_group: Identifier) -> Self {
        Self {
            metadata: Metadata::new(address_group.clone()),
            address_group,
            access_ports: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }

    pub fn is_empty(&self) -> bool {
        self.access_ports.values().all(ProtocolPorts::is_empty) || self.access_ports.is_empty()
    }

    /// Every `(protocol, port)` pair currently mapped, across all services,
    /// for the overlap check.
    pub fn all_tcp_ports(&self) -> Vec<&str> {
        self.access_ports
            .values()
            .flat_map(|p| p.tcp.iter().map(String::as_str))
            .collect()
    }

    pub fn all_udp_ports(&self) -> Vec<&str> {
        self.access_ports
            .values()
            .flat_map(|p| p.udp.iter().map(String::as_str))
            .collect()
    }

    /// Same as [`Self::all_tcp_ports`]/[`Self::all_udp_ports`] but with one
    /// service's own entry left out — what a binding's overlap check must
    /// compare against so re-applying that same binding doesn't collide
    /// with the ports it itself already contributed.
    pub fn all_tcp_ports_excluding(&self, exclude: &Identifier) -> Vec<&str> {
        self.access_ports
            .iter()
            .filter(|(service, _)| *service != exclude)
            .flat_map(|(_, p)| p.tcp.iter().map(String::as_str))
            .collect()
    }

    pub fn all_udp_ports_excluding(&self, exclude: &Identifier) -> Vec<&str> {
        self.access_ports
            .iter()
            .filter(|(service, _)| *service != exclude)
            .flat_map(|(_, p)| p.udp.iter().map(String::as_str))
            .collect()
    }
}
