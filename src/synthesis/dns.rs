// Copyright (c) 2025 - Cowboy AI, Inc.
//! DNS Publisher
//!
//! A CNAME for the cluster endpoint pointing at the balancer, and one A
//! record per instance pointing at its public address. All records upsert.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{name, singleton, DnsLabel, DnsName, ResourceName, ResourceRole, Singleton};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{Attribute, GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

use super::compute::InstanceSet;
use super::load_balancing::LoadBalancingGraph;

/// Time-to-live of every published record, in seconds
pub const RECORD_TTL: u32 = 300;

/// Provider identifier of a hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostedZoneId(String);

impl HostedZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hosted-zone lookup boundary
pub trait ZoneResolver: Send + Sync {
    /// Zone id for `domain`, or `ZoneNotFound`
    fn resolve(&self, domain: &DnsName) -> SynthesisResult<HostedZoneId>;
}

/// Resolver over a fixed domain → zone table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticZoneResolver {
    zones: BTreeMap<DnsName, HostedZoneId>,
}

impl StaticZoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, domain: DnsName, id: HostedZoneId) -> Self {
        self.zones.insert(domain, id);
        self
    }
}

impl ZoneResolver for StaticZoneResolver {
    fn resolve(&self, domain: &DnsName) -> SynthesisResult<HostedZoneId> {
        self.zones
            .get(domain)
            .cloned()
            .ok_or_else(|| SynthesisError::ZoneNotFound(domain.clone()))
    }
}

/// Record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "CNAME")]
    Cname,
    A,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Cname => "CNAME",
            RecordType::A => "A",
        }
    }
}

/// One declared record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub resource: ResourceName,
    /// Fully qualified record name
    pub fqdn: String,
    pub record_type: RecordType,
    pub ttl: u32,
}

/// Output of the DNS step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecordSet {
    pub zone: HostedZoneId,
    pub alias: DnsRecord,
    pub addresses: Vec<DnsRecord>,
}

impl DnsRecordSet {
    pub fn len(&self) -> usize {
        1 + self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn records(&self) -> impl Iterator<Item = &DnsRecord> {
        std::iter::once(&self.alias).chain(self.addresses.iter())
    }
}

fn declare_record(
    graph: &mut GraphBuilder,
    resource: ResourceName,
    zone: &HostedZoneId,
    fqdn: String,
    record_type: RecordType,
    target: ResourceRef,
) -> SynthesisResult<DnsRecord> {
    let resource = graph.declare(
        ResourceDeclaration::new(ResourceKind::DnsRecord, resource)
            .property("zone_id", zone.as_str())
            .property("name", fqdn.as_str())
            .property("type", record_type.as_str())
            .property("ttl", RECORD_TTL)
            .property("allow_overwrite", true)
            .references("records", [target]),
    )?;

    Ok(DnsRecord {
        resource,
        fqdn,
        record_type,
        ttl: RECORD_TTL,
    })
}

/// Check every record name a run with `instance_count` instances publishes
///
/// The indexed labels must stay within 63 characters and the qualified
/// names within 253.
pub fn validate_record_names(
    dns_zone: &DnsName,
    cluster_name: &DnsLabel,
    instance_count: usize,
) -> SynthesisResult<()> {
    dns_zone.qualify(cluster_name)?;
    for index in 0..instance_count {
        dns_zone.qualify(&cluster_name.indexed(index)?)?;
    }
    Ok(())
}

/// Declare the alias and address records into an already resolved zone
pub fn publish_records(
    graph: &mut GraphBuilder,
    zone: &HostedZoneId,
    dns_zone: &DnsName,
    cluster_name: &DnsLabel,
    balancer: &LoadBalancingGraph,
    instances: &InstanceSet,
) -> SynthesisResult<DnsRecordSet> {
    let alias = declare_record(
        graph,
        singleton(Singleton::AliasRecord),
        zone,
        dns_zone.qualify(cluster_name)?,
        RecordType::Cname,
        ResourceRef::new(&balancer.balancer, Attribute::DnsName),
    )?;

    let addresses = instances
        .instances
        .iter()
        .map(|node| -> SynthesisResult<DnsRecord> {
            let label = cluster_name.indexed(node.index)?;
            declare_record(
                graph,
                name(ResourceRole::AddressRecord, node.index),
                zone,
                dns_zone.qualify(&label)?,
                RecordType::A,
                ResourceRef::new(&node.instance, Attribute::PublicIp),
            )
        })
        .collect::<SynthesisResult<Vec<_>>>()?;

    Ok(DnsRecordSet {
        zone: zone.clone(),
        alias,
        addresses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("k8s-dev", "aws.domain.com", 3 => true; "short names")]
    #[test_case(&"a".repeat(61), "aws.domain.com", 10 => true; "sixty three character label")]
    #[test_case(&"a".repeat(62), "aws.domain.com", 1 => false; "indexed label too long")]
    #[test_case("k8s-dev-cluster", &vec!["a".repeat(60); 4].join("."), 1 => false; "qualified name too long")]
    fn test_validate_record_names(cluster: &str, zone: &str, instances: usize) -> bool {
        let cluster = DnsLabel::new(cluster).unwrap();
        let zone = DnsName::new(zone).unwrap();
        validate_record_names(&zone, &cluster, instances).is_ok()
    }

    #[test]
    fn test_static_resolver() {
        let domain = DnsName::new("aws.domain.com").unwrap();
        let resolver =
            StaticZoneResolver::new().with_zone(domain.clone(), HostedZoneId::new("Z0123456789"));

        assert_eq!(resolver.resolve(&domain).unwrap().as_str(), "Z0123456789");
        assert_eq!(
            resolver.resolve(&DnsName::new("AWS.domain.com.").unwrap()).unwrap(),
            HostedZoneId::new("Z0123456789")
        );

        let missing = DnsName::new("other.com").unwrap();
        assert_eq!(
            resolver.resolve(&missing),
            Err(SynthesisError::ZoneNotFound(missing.clone()))
        );
    }

    #[test]
    fn test_resolver_from_json() {
        let resolver: StaticZoneResolver =
            serde_json::from_str(r#"{"aws.domain.com": "Z1"}"#).unwrap();
        assert!(resolver.resolve(&DnsName::new("aws.domain.com").unwrap()).is_ok());
    }

    #[test]
    fn test_record_type_names() {
        assert_eq!(RecordType::Cname.as_str(), "CNAME");
        assert_eq!(serde_json::to_string(&RecordType::A).unwrap(), "\"A\"");
    }
}
