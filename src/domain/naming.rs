// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deterministic Resource Naming
//!
//! Every logical resource name in a synthesized graph comes from this module.
//! Names depend only on the resource role and its index (zone index, or the
//! listener port for port-keyed roles), never on iteration order or input
//! strings, so re-synthesizing the same input yields the same names and the
//! provisioning engine converges instead of replacing resources.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Port;

/// Logical name of a declared resource, unique within one graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resources declared exactly once per graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Singleton {
    Network,
    Gateway,
    AdminSecurityGroup,
    WebSecurityGroup,
    ControlPlaneSecurityGroup,
    Role,
    InstanceProfile,
    KeyPair,
    LoadBalancer,
    AliasRecord,
    ArtifactBucket,
}

impl Singleton {
    fn as_str(&self) -> &'static str {
        match self {
            Singleton::Network => "vpc",
            Singleton::Gateway => "internet-gateway",
            Singleton::AdminSecurityGroup => "sg-admin",
            Singleton::WebSecurityGroup => "sg-web",
            Singleton::ControlPlaneSecurityGroup => "sg-control-plane",
            Singleton::Role => "node-role",
            Singleton::InstanceProfile => "node-profile",
            Singleton::KeyPair => "admin-keypair",
            Singleton::LoadBalancer => "cluster-nlb",
            Singleton::AliasRecord => "alias-record",
            Singleton::ArtifactBucket => "artifact-bucket",
        }
    }
}

/// Resources declared once per index
///
/// `TargetGroup` and `Listener` are keyed by listener port. Keying them by
/// loop position would let two listeners share one group when ports repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRole {
    Subnet,
    RouteTable,
    RouteTableAssociation,
    DefaultRoute,
    PermissionPolicy,
    PolicyAttachment,
    Instance,
    AddressRecord,
    TargetGroup { port: Port },
    Listener { port: Port },
    TargetAttachment { port: Port },
}

impl ResourceRole {
    fn prefix(&self) -> &'static str {
        match self {
            ResourceRole::Subnet => "subnet",
            ResourceRole::RouteTable => "rtable",
            ResourceRole::RouteTableAssociation => "rtable-assoc",
            ResourceRole::DefaultRoute => "route",
            ResourceRole::PermissionPolicy => "node-policy",
            ResourceRole::PolicyAttachment => "node-policy-attachment",
            ResourceRole::Instance => "instance",
            ResourceRole::AddressRecord => "a-record",
            ResourceRole::TargetGroup { .. } => "targetgroup",
            ResourceRole::Listener { .. } => "listener",
            ResourceRole::TargetAttachment { .. } => "target",
        }
    }
}

/// Name of a singleton resource
pub fn singleton(resource: Singleton) -> ResourceName {
    ResourceName(resource.as_str().to_string())
}

/// Name of the `index`-th resource playing `role`
///
/// Port-keyed roles ignore `index` for the port part of the name:
/// `TargetGroup`/`Listener` are named by port alone, `TargetAttachment` by
/// port and instance index.
pub fn name(role: ResourceRole, index: usize) -> ResourceName {
    let name = match role {
        ResourceRole::TargetGroup { port } | ResourceRole::Listener { port } => {
            format!("{}-{}", role.prefix(), port)
        }
        ResourceRole::TargetAttachment { port } => {
            format!("{}-{}-{}", role.prefix(), port, index)
        }
        _ => format!("{}-{}", role.prefix(), index),
    };
    ResourceName(name)
}
