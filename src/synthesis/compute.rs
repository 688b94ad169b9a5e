// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Provisioner
//!
//! One instance per subnet. Every instance runs the same resolved image,
//! shape, security groups, profile, key and bootstrap payload; only the
//! subnet, zone and name differ.

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::{
    name, singleton, BootstrapTemplate, DnsLabel, DnsName, ImageCandidate, ImageFilter, ImageId,
    InstanceShape, KeyCredential, ResourceName, ResourceRole, Singleton, Zone,
};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

use super::identity::IdentityBundle;
use super::network::NetworkNode;
use super::security::SecurityGroups;

/// Image lookup boundary
pub trait ImageCatalog: Send + Sync {
    /// Most recent image matching `filter`, or `NoMatchingImage`
    fn resolve(&self, filter: &ImageFilter) -> SynthesisResult<ImageId>;
}

/// Catalog over a fixed candidate list
#[derive(Debug, Clone, Default)]
pub struct StaticImageCatalog {
    candidates: Vec<ImageCandidate>,
}

impl StaticImageCatalog {
    pub fn new(candidates: impl IntoIterator<Item = ImageCandidate>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
        }
    }

    pub fn candidates(&self) -> &[ImageCandidate] {
        &self.candidates
    }
}

impl ImageCatalog for StaticImageCatalog {
    fn resolve(&self, filter: &ImageFilter) -> SynthesisResult<ImageId> {
        filter
            .select_most_recent(&self.candidates)
            .map(|candidate| candidate.id.clone())
            .ok_or_else(|| SynthesisError::NoMatchingImage {
                owner: filter.owner.clone(),
                pattern: filter.name_pattern.clone(),
            })
    }
}

/// Everything shared by every instance
#[derive(Debug, Clone)]
pub struct ComputeRequest<'a> {
    pub cluster_name: &'a DnsLabel,
    pub environment: &'a str,
    pub dns_zone: &'a DnsName,
    pub shape: &'a InstanceShape,
    pub image: &'a ImageId,
    pub bootstrap: &'a BootstrapTemplate,
}

/// One declared instance and where it lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceNode {
    pub index: usize,
    pub zone: Zone,
    pub subnet: ResourceName,
    pub instance: ResourceName,
}

/// Output of the compute step, ordered by zone index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSet {
    pub key_pair: ResourceName,
    pub instances: Vec<InstanceNode>,
}

impl InstanceSet {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.instances.iter().map(|node| &node.instance)
    }
}

/// Declare the administrative key pair
pub fn declare_key_pair(
    graph: &mut GraphBuilder,
    public_key: &KeyCredential,
) -> SynthesisResult<ResourceName> {
    let key_name = singleton(Singleton::KeyPair);
    Ok(graph.declare(
        ResourceDeclaration::new(ResourceKind::KeyPair, key_name.clone())
            .property("key_name", key_name.as_str())
            .property("public_key", public_key.as_str()),
    )?)
}

fn builtins(request: &ComputeRequest<'_>, zone: &Zone, index: usize) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("clusterName".to_string(), request.cluster_name.to_string()),
        ("dnsZoneName".to_string(), request.dns_zone.to_string()),
        ("environment".to_string(), request.environment.to_string()),
        ("zone".to_string(), zone.to_string()),
        ("nodeIndex".to_string(), index.to_string()),
    ])
}

/// Declare the key pair and one instance per subnet
pub fn provision_instances(
    graph: &mut GraphBuilder,
    request: &ComputeRequest<'_>,
    network: &NetworkNode,
    security: &SecurityGroups,
    identity: &IdentityBundle,
    public_key: &KeyCredential,
) -> SynthesisResult<InstanceSet> {
    let key_pair = declare_key_pair(graph, public_key)?;

    let mut instances = Vec::with_capacity(network.subnets.len());
    for subnet in &network.subnets {
        let node_label = request.cluster_name.indexed(subnet.index)?;
        let user_data = request
            .bootstrap
            .render(&builtins(request, &subnet.zone, subnet.index));

        let instance = graph.declare(
            ResourceDeclaration::new(ResourceKind::Instance, name(ResourceRole::Instance, subnet.index))
                .property("instance_type", request.shape.instance_type.as_str())
                .property("ami", request.image.as_str())
                .reference("subnet_id", ResourceRef::id(&subnet.subnet))
                .references("vpc_security_group_ids", security.refs())
                .reference("iam_instance_profile", ResourceRef::name(&identity.profile))
                .reference("key_name", ResourceRef::name(&key_pair))
                .property(
                    "root_block_device",
                    json!({
                        "volume_type": request.shape.root_volume.volume_type,
                        "volume_size": request.shape.root_volume.size_gb,
                    }),
                )
                .property("user_data", user_data)
                .tags([
                    ("Name", node_label.as_str()),
                    ("env", request.environment),
                ]),
        )?;

        debug!(instance = %instance, zone = %subnet.zone, "Declared instance");
        instances.push(InstanceNode {
            index: subnet.index,
            zone: subnet.zone.clone(),
            subnet: subnet.subnet.clone(),
            instance,
        });
    }

    info!(
        count = instances.len(),
        image = %request.image,
        instance_type = %request.shape.instance_type,
        "Provisioned instances"
    );

    Ok(InstanceSet {
        key_pair,
        instances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candidate(id: &str, name: &str, day: u32) -> ImageCandidate {
        ImageCandidate {
            id: ImageId::new(id),
            name: name.to_string(),
            owner: "099720109477".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_static_catalog_picks_most_recent() {
        let catalog = StaticImageCatalog::new([
            candidate("ami-old", "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-20240101", 1),
            candidate("ami-new", "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-20240120", 20),
            candidate("ami-other", "debian-12-amd64", 28),
        ]);

        let id = catalog.resolve(&ImageFilter::default()).unwrap();
        assert_eq!(id.as_str(), "ami-new");
    }

    #[test]
    fn test_static_catalog_without_match() {
        let catalog = StaticImageCatalog::new([candidate("ami-other", "debian-12-amd64", 1)]);
        let err = catalog.resolve(&ImageFilter::default()).unwrap_err();
        assert!(matches!(err, SynthesisError::NoMatchingImage { .. }));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = StaticImageCatalog::default();
        assert!(catalog.resolve(&ImageFilter::default()).is_err());
    }
}
