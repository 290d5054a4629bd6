use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::metadata::Metadata;

/// Transport protocol as carried on a raw ingress port spec. Anything other
/// than TCP/UDP is accepted here (clients may write whatever they like) but
/// is dropped silently by the IEAgAgRule generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Other,
}

impl Protocol {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Protocol::Tcp,
            "udp" => Protocol::Udp,
            _ => Protocol::Other,
        }
    }
}

/// A single raw ingress port entry as written by the client: protocol plus
/// an unparsed port/range string (e.g. `"80"`, `"8000-9000"`). This is left
/// unparsed/uncanonicalized end to end; see DESIGN.md for the rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPort {
    pub protocol: Protocol,
    pub port: String,
}

impl IngressPort {
    pub fn new(protocol: Protocol, port: impl Into<String>) -> Self {
        Self {
            protocol,
            port: port.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub metadata: Metadata,
    pub ingress_ports: Vec<IngressPort>,
    pub address_groups: Vec<Identifier>,
    pub description: String,
}

impl Service {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            metadata: Metadata::new(identifier),
            ingress_ports: Vec::new(),
            address_groups: Vec::new(),
            description: String::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.metadata.identifier
    }

    /// Ports of a given transport, in source order, raw strings preserved.
    pub fn ports_for_transport(&self, transport: super::ieagag_rule::Transport) -> Vec<String> {
        self.ingress_ports
            .iter()
            .filter(|p| match transport {
                super::ieagag_rule::Transport::Tcp => p.protocol == Protocol::Tcp,
                super::ieagag_rule::Transport::Udp => p.protocol == Protocol::Udp,
            })
            .map(|p| p.port.clone())
            .collect()
    }
}
