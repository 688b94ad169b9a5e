// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Input
//!
//! The declarative parameters a synthesis run starts from. Field-level value
//! objects validate on construction (and on deserialization); cross-field
//! preconditions such as address capacity and port uniqueness are checked by
//! the synthesis steps that own them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BootstrapTemplate, DnsLabel, DnsName, ImageFilter, Ipv4Cidr, Port};
use crate::errors::{SynthesisError, SynthesisResult};

/// Availability zone identifier, e.g. `us-east-1a`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Zone(String);

impl Zone {
    pub fn new(zone: impl Into<String>) -> SynthesisResult<Self> {
        let zone = zone.into();
        if zone.trim().is_empty() {
            return Err(SynthesisError::StructuralValidation(
                "zone identifier cannot be empty".to_string(),
            ));
        }
        if zone.chars().any(char::is_whitespace) {
            return Err(SynthesisError::StructuralValidation(format!(
                "zone identifier cannot contain whitespace: {zone:?}"
            )));
        }
        Ok(Self(zone))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Zone {
    type Error = SynthesisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Zone> for String {
    fn from(value: Zone) -> Self {
        value.0
    }
}

/// Root block device attached to every instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootVolume {
    pub volume_type: String,
    pub size_gb: u32,
}

impl Default for RootVolume {
    fn default() -> Self {
        Self {
            volume_type: "gp3".to_string(),
            size_gb: 30,
        }
    }
}

/// Instance type and root volume shared by every node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceShape {
    pub instance_type: String,
    #[serde(default)]
    pub root_volume: RootVolume,
}

impl InstanceShape {
    /// Largest root volume the provider accepts, in GiB
    pub const MAX_VOLUME_GB: u32 = 16_384;

    pub fn validate(&self) -> SynthesisResult<()> {
        if self.instance_type.trim().is_empty() {
            return Err(SynthesisError::StructuralValidation(
                "instance type cannot be empty".to_string(),
            ));
        }
        if self.root_volume.volume_type.trim().is_empty() {
            return Err(SynthesisError::StructuralValidation(
                "root volume type cannot be empty".to_string(),
            ));
        }
        if self.root_volume.size_gb == 0 || self.root_volume.size_gb > Self::MAX_VOLUME_GB {
            return Err(SynthesisError::StructuralValidation(format!(
                "root volume size {} GiB outside 1-{}",
                self.root_volume.size_gb,
                Self::MAX_VOLUME_GB
            )));
        }
        Ok(())
    }
}

impl Default for InstanceShape {
    fn default() -> Self {
        Self {
            instance_type: "t2.micro".to_string(),
            root_volume: RootVolume::default(),
        }
    }
}

/// OpenSSH public key installed on every instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCredential(String);

impl KeyCredential {
    /// Validate `<algorithm> <base64 body> [comment]`
    pub fn new(public_key: impl Into<String>) -> SynthesisResult<Self> {
        let public_key = public_key.into();
        let mut parts = public_key.split_whitespace();

        let algorithm = parts.next().unwrap_or_default();
        if !(algorithm.starts_with("ssh-") || algorithm.starts_with("ecdsa-")) {
            return Err(SynthesisError::StructuralValidation(format!(
                "unsupported public key algorithm: {algorithm:?}"
            )));
        }

        let body = parts.next().unwrap_or_default();
        let is_base64 = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='));
        if !is_base64 {
            return Err(SynthesisError::StructuralValidation(
                "public key body is not base64".to_string(),
            ));
        }

        Ok(Self(public_key.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyCredential {
    type Error = SynthesisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyCredential> for String {
    fn from(value: KeyCredential) -> Self {
        value.0
    }
}

fn default_cluster_name() -> DnsLabel {
    DnsLabel::new_unchecked("k8s-dev")
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_base_block() -> Ipv4Cidr {
    Ipv4Cidr::new_unchecked(std::net::Ipv4Addr::new(10, 92, 0, 0), 16)
}

fn default_listener_ports() -> Vec<Port> {
    vec![Port::HTTP, Port::HTTPS, Port::CLUSTER_API]
}

/// Everything one synthesis run is computed from
///
/// # Invariants (checked by synthesis)
/// - `zones` is non-empty
/// - `base_block` admits one disjoint /24 per zone
/// - `listener_ports` holds no duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyInput {
    /// Record label for the cluster endpoint; instance records append `-<index>`
    #[serde(default = "default_cluster_name")]
    pub cluster_name: DnsLabel,

    /// Environment tag applied to taggable resources
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Ordered zones; subnet, instance and record `i` belong to zone `i`
    pub zones: Vec<Zone>,

    #[serde(default = "default_base_block")]
    pub base_block: Ipv4Cidr,

    #[serde(default = "default_listener_ports")]
    pub listener_ports: Vec<Port>,

    #[serde(default)]
    pub instance_shape: InstanceShape,

    pub public_key: KeyCredential,

    /// Hosted zone the records are published into
    pub dns_zone: DnsName,

    #[serde(default)]
    pub image_filter: ImageFilter,

    #[serde(default)]
    pub bootstrap: BootstrapTemplate,
}

impl TopologyInput {
    /// Builder pattern for fluent construction
    pub fn builder(
        zones: Vec<Zone>,
        public_key: KeyCredential,
        dns_zone: DnsName,
    ) -> TopologyInputBuilder {
        TopologyInputBuilder::new(zones, public_key, dns_zone)
    }
}

/// Builder for TopologyInput with fluent API
pub struct TopologyInputBuilder {
    input: TopologyInput,
}

impl TopologyInputBuilder {
    fn new(zones: Vec<Zone>, public_key: KeyCredential, dns_zone: DnsName) -> Self {
        Self {
            input: TopologyInput {
                cluster_name: default_cluster_name(),
                environment: default_environment(),
                zones,
                base_block: default_base_block(),
                listener_ports: default_listener_ports(),
                instance_shape: InstanceShape::default(),
                public_key,
                dns_zone,
                image_filter: ImageFilter::default(),
                bootstrap: BootstrapTemplate::default(),
            },
        }
    }

    pub fn cluster_name(mut self, cluster_name: DnsLabel) -> Self {
        self.input.cluster_name = cluster_name;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.input.environment = environment.into();
        self
    }

    pub fn base_block(mut self, base_block: Ipv4Cidr) -> Self {
        self.input.base_block = base_block;
        self
    }

    pub fn listener_ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.input.listener_ports = ports.into_iter().collect();
        self
    }

    pub fn instance_shape(mut self, shape: InstanceShape) -> Self {
        self.input.instance_shape = shape;
        self
    }

    pub fn image_filter(mut self, filter: ImageFilter) -> Self {
        self.input.image_filter = filter;
        self
    }

    pub fn bootstrap(mut self, bootstrap: BootstrapTemplate) -> Self {
        self.input.bootstrap = bootstrap;
        self
    }

    pub fn build(self) -> TopologyInput {
        self.input
    }
}
