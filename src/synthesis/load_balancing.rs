// Copyright (c) 2025 - Cowboy AI, Inc.
//! Load-Balancing Wiring
//!
//! One internet-facing network balancer across every subnet. Per listener
//! port: a TCP target group, a listener forwarding to it, and attachment
//! edges chosen by an [`AttachmentPolicy`]. Groups and listeners are named
//! by port, so a listener can only ever forward to the group of its port.

use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::{name, singleton, DnsLabel, Port, ResourceName, ResourceRole, Singleton};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

use super::compute::{InstanceNode, InstanceSet};
use super::network::NetworkNode;

/// Target-group health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub port: Port,
    pub interval_seconds: u32,
}

impl HealthCheck {
    pub const DEFAULT_INTERVAL_SECONDS: u32 = 30;

    /// TCP check on the listener's own port
    pub fn tcp(port: Port) -> Self {
        Self {
            port,
            interval_seconds: Self::DEFAULT_INTERVAL_SECONDS,
        }
    }

    fn to_value(self) -> serde_json::Value {
        json!({
            "protocol": "TCP",
            "port": self.port.value().to_string(),
            "interval": self.interval_seconds,
        })
    }
}

/// Reject a port list containing the same port twice
pub fn validate_ports(ports: &[Port]) -> SynthesisResult<()> {
    let mut seen = BTreeSet::new();
    match ports.iter().find(|port| !seen.insert(**port)) {
        Some(duplicate) => Err(SynthesisError::DuplicateListenerPort(*duplicate)),
        None => Ok(()),
    }
}

/// Decides which instances join the target group of a port
pub trait AttachmentPolicy: Send + Sync {
    fn targets<'a>(&self, port: Port, instances: &'a InstanceSet) -> Vec<&'a InstanceNode>;
}

/// Every instance in every group
#[derive(Debug, Clone, Copy, Default)]
pub struct FullMesh;

impl AttachmentPolicy for FullMesh {
    fn targets<'a>(&self, _port: Port, instances: &'a InstanceSet) -> Vec<&'a InstanceNode> {
        instances.instances.iter().collect()
    }
}

/// Target group and listener of one port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortBinding {
    pub target_group: ResourceName,
    pub listener: ResourceName,
}

/// (target group, instance) membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentEdge {
    pub port: Port,
    pub target_group: ResourceName,
    pub instance: ResourceName,
    pub attachment: ResourceName,
}

/// Output of the load-balancing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadBalancingGraph {
    pub balancer: ResourceName,
    pub listeners: BTreeMap<Port, PortBinding>,
    pub attachments: Vec<AttachmentEdge>,
}

impl LoadBalancingGraph {
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn target_group_for(&self, port: Port) -> Option<&ResourceName> {
        self.listeners.get(&port).map(|binding| &binding.target_group)
    }

    /// Every (port, instance) pair has exactly one edge
    pub fn is_full_mesh(&self, instances: &InstanceSet) -> bool {
        let edges: BTreeSet<(Port, &ResourceName)> = self
            .attachments
            .iter()
            .map(|edge| (edge.port, &edge.instance))
            .collect();

        edges.len() == self.attachments.len()
            && self.listeners.keys().all(|port| {
                instances
                    .names()
                    .all(|instance| edges.contains(&(*port, instance)))
            })
    }
}

/// Declare balancer, target groups, attachments and listeners
pub fn wire_load_balancer(
    graph: &mut GraphBuilder,
    cluster_name: &DnsLabel,
    environment: &str,
    ports: &[Port],
    network: &NetworkNode,
    instances: &InstanceSet,
    policy: &dyn AttachmentPolicy,
) -> SynthesisResult<LoadBalancingGraph> {
    validate_ports(ports)?;

    let balancer_tag = format!("{cluster_name}-nlb");
    let balancer = graph.declare(
        ResourceDeclaration::new(ResourceKind::LoadBalancer, singleton(Singleton::LoadBalancer))
            .property("name", balancer_tag.as_str())
            .property("load_balancer_type", "network")
            .property("internal", false)
            .references("subnets", network.subnet_refs())
            .tags([("Name", balancer_tag.as_str()), ("env", environment)]),
    )?;

    let mut listeners = BTreeMap::new();
    let mut attachments = Vec::new();

    for &port in ports {
        let group_tag = format!("{cluster_name}-tg-{port}");
        let target_group = graph.declare(
            ResourceDeclaration::new(
                ResourceKind::TargetGroup,
                name(ResourceRole::TargetGroup { port }, 0),
            )
            .property("name", group_tag.as_str())
            .property("port", port.value())
            .property("protocol", "TCP")
            .property("target_type", "instance")
            .reference("vpc_id", ResourceRef::id(&network.network))
            .property("health_check", HealthCheck::tcp(port).to_value())
            .tags([("Name", group_tag.as_str()), ("env", environment)]),
        )?;

        for node in policy.targets(port, instances) {
            let attachment = graph.declare(
                ResourceDeclaration::new(
                    ResourceKind::TargetGroupAttachment,
                    name(ResourceRole::TargetAttachment { port }, node.index),
                )
                .reference("target_group_arn", ResourceRef::arn(&target_group))
                .reference("target_id", ResourceRef::id(&node.instance))
                .property("port", port.value()),
            )?;

            attachments.push(AttachmentEdge {
                port,
                target_group: target_group.clone(),
                instance: node.instance.clone(),
                attachment,
            });
        }

        let listener = graph.declare(
            ResourceDeclaration::new(ResourceKind::Listener, name(ResourceRole::Listener { port }, 0))
                .reference("load_balancer_arn", ResourceRef::arn(&balancer))
                .property("port", port.value())
                .property("protocol", "TCP")
                .property(
                    "default_action",
                    json!({
                        "type": "forward",
                        "target_group_arn": ResourceRef::arn(&target_group).to_value(),
                    }),
                )
                .after(&target_group),
        )?;

        debug!(%port, target_group = %target_group, listener = %listener, "Wired listener");
        listeners.insert(
            port,
            PortBinding {
                target_group,
                listener,
            },
        );
    }

    Ok(LoadBalancingGraph {
        balancer,
        listeners,
        attachments,
    })
}
