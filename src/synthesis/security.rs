// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Policy Builder
//!
//! Three fixed-purpose rule groups. They stay separate resources so an
//! instance references each independently; rules are never merged.

use serde::Serialize;
use std::fmt;

use crate::domain::{singleton, Ipv4Cidr, NetworkError, Port, ResourceName, Singleton};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

use super::network::NetworkNode;

/// IP protocol of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    Tcp,
    /// Every protocol, as used by allow-all egress
    All,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (protocol, port range, source range) rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr: Ipv4Cidr,
}

impl Rule {
    /// Single TCP port open to the world
    pub fn tcp_from_anywhere(port: Port) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from_port: port.value(),
            to_port: port.value(),
            cidr: Ipv4Cidr::ANY,
        }
    }

    /// Every protocol and port to anywhere
    pub fn allow_all() -> Self {
        Self {
            protocol: Protocol::All,
            from_port: 0,
            to_port: 0,
            cidr: Ipv4Cidr::ANY,
        }
    }

    fn validate(&self) -> Result<(), NetworkError> {
        match self.protocol {
            Protocol::All if self.from_port == 0 && self.to_port == 0 => Ok(()),
            _ => {
                Port::new(self.from_port)?;
                Port::new(self.to_port)?;
                if self.from_port > self.to_port {
                    return Err(NetworkError::InvalidPortRange {
                        from: self.from_port,
                        to: self.to_port,
                    });
                }
                Ok(())
            }
        }
    }

    fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "protocol": self.protocol.as_str(),
            "from_port": self.from_port,
            "to_port": self.to_port,
            "cidr_blocks": [self.cidr.to_string()],
        })
    }
}

/// What a rule group is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PolicyPurpose {
    Administrative,
    Web,
    ControlPlane,
}

impl PolicyPurpose {
    fn resource(&self) -> Singleton {
        match self {
            PolicyPurpose::Administrative => Singleton::AdminSecurityGroup,
            PolicyPurpose::Web => Singleton::WebSecurityGroup,
            PolicyPurpose::ControlPlane => Singleton::ControlPlaneSecurityGroup,
        }
    }
}

/// Ingress list plus egress list for one purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleGroup {
    pub purpose: PolicyPurpose,
    /// Display label, unique across the three groups
    pub label: String,
    pub description: String,
    pub ingress: Vec<Rule>,
    pub egress: Vec<Rule>,
}

impl RuleGroup {
    pub fn validate(&self) -> Result<(), NetworkError> {
        self.ingress
            .iter()
            .chain(self.egress.iter())
            .try_for_each(Rule::validate)
    }
}

/// The three rule groups every node is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityPolicySet {
    pub administrative: RuleGroup,
    pub web: RuleGroup,
    pub control_plane: RuleGroup,
}

impl SecurityPolicySet {
    /// Remote shell, plaintext + secure web, cluster API; all world-sourced
    pub fn standard() -> Self {
        Self {
            administrative: RuleGroup {
                purpose: PolicyPurpose::Administrative,
                label: "ALL-ssh".to_string(),
                description: "Remote shell access".to_string(),
                ingress: vec![Rule::tcp_from_anywhere(Port::SSH)],
                egress: vec![Rule::allow_all()],
            },
            web: RuleGroup {
                purpose: PolicyPurpose::Web,
                label: "ALL-http-https".to_string(),
                description: "Public web traffic".to_string(),
                ingress: vec![
                    Rule::tcp_from_anywhere(Port::HTTP),
                    Rule::tcp_from_anywhere(Port::HTTPS),
                ],
                egress: vec![Rule::allow_all()],
            },
            control_plane: RuleGroup {
                purpose: PolicyPurpose::ControlPlane,
                label: "ALL-k8s-api".to_string(),
                description: "Cluster API access".to_string(),
                ingress: vec![Rule::tcp_from_anywhere(Port::CLUSTER_API)],
                egress: vec![Rule::allow_all()],
            },
        }
    }

    pub fn groups(&self) -> [&RuleGroup; 3] {
        [&self.administrative, &self.web, &self.control_plane]
    }

    /// Structural validation: port ranges and distinct labels
    pub fn validate(&self) -> SynthesisResult<()> {
        for group in self.groups() {
            group.validate()?;
        }

        let mut labels: Vec<&str> = self.groups().iter().map(|g| g.label.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() != 3 {
            return Err(SynthesisError::StructuralValidation(
                "security group labels must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Declared security groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroups {
    pub administrative: ResourceName,
    pub web: ResourceName,
    pub control_plane: ResourceName,
}

impl SecurityGroups {
    /// All three, in attachment order
    pub fn refs(&self) -> Vec<ResourceRef> {
        [&self.administrative, &self.web, &self.control_plane]
            .into_iter()
            .map(ResourceRef::id)
            .collect()
    }
}

fn declare_group(
    graph: &mut GraphBuilder,
    network: &NetworkNode,
    group: &RuleGroup,
) -> SynthesisResult<ResourceName> {
    let declaration = ResourceDeclaration::new(
        ResourceKind::SecurityGroup,
        singleton(group.purpose.resource()),
    )
    .reference("vpc_id", ResourceRef::id(&network.network))
    .property("name", group.label.as_str())
    .property("description", group.description.as_str())
    .property(
        "ingress",
        group.ingress.iter().map(Rule::to_value).collect::<Vec<_>>(),
    )
    .property(
        "egress",
        group.egress.iter().map(Rule::to_value).collect::<Vec<_>>(),
    )
    .tags([("Name", group.label.as_str())]);

    Ok(graph.declare(declaration)?)
}

/// Declare the three groups inside the network
pub fn build_security_groups(
    graph: &mut GraphBuilder,
    network: &NetworkNode,
    policies: &SecurityPolicySet,
) -> SynthesisResult<SecurityGroups> {
    policies.validate()?;

    Ok(SecurityGroups {
        administrative: declare_group(graph, network, &policies.administrative)?,
        web: declare_group(graph, network, &policies.web)?,
        control_plane: declare_group(graph, network, &policies.control_plane)?,
    })
}
