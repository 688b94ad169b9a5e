// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Synthesis
//!
//! Counts, disjointness and naming invariants that must hold for every zone
//! list and every listener port set.

use proptest::prelude::*;
use std::collections::BTreeSet;

use cim_cluster_topology::domain::{
    DnsName, ImageCandidate, ImageFilter, ImageId, Ipv4Cidr, KeyCredential, Port, TopologyInput,
    Zone,
};
use cim_cluster_topology::graph::ResourceKind;
use cim_cluster_topology::synthesis::{
    synthesize, HostedZoneId, StaticImageCatalog, StaticZoneResolver,
};
use cim_cluster_topology::SynthesisError;

const KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINWO9EKfPEQCbFV9VGl/GCp1cRfEugz/Yr36ch6yKd4p admin";

fn catalog() -> StaticImageCatalog {
    StaticImageCatalog::new([ImageCandidate {
        id: ImageId::new("ami-0c7217cdde317cfec"),
        name: "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-20240120".to_string(),
        owner: ImageFilter::default().owner,
        created_at: chrono::DateTime::parse_from_rfc3339("2024-01-20T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    }])
}

fn resolver() -> StaticZoneResolver {
    StaticZoneResolver::new().with_zone(
        DnsName::new("aws.domain.com").unwrap(),
        HostedZoneId::new("Z0123456789"),
    )
}

fn input(zone_count: usize, ports: Vec<Port>, base_block: Ipv4Cidr) -> TopologyInput {
    let zones = (0..zone_count)
        .map(|i| Zone::new(format!("zone-{i}")).unwrap())
        .collect();
    TopologyInput::builder(
        zones,
        KeyCredential::new(KEY).unwrap(),
        DnsName::new("aws.domain.com").unwrap(),
    )
    .listener_ports(ports)
    .base_block(base_block)
    .build()
}

fn default_block() -> Ipv4Cidr {
    "10.92.0.0/16".parse().unwrap()
}

/// Distinct listener ports, in arbitrary order
fn distinct_ports() -> impl Strategy<Value = Vec<Port>> {
    prop::collection::btree_set(1u16..=65535, 0..6).prop_flat_map(|set| {
        let ports: Vec<Port> = set.into_iter().map(|p| Port::new(p).unwrap()).collect();
        Just(ports).prop_shuffle()
    })
}

proptest! {
    /// Property: z zones yield z subnets, route tables, associations and
    /// default routes, with pairwise disjoint blocks inside the base block
    #[test]
    fn prop_network_scales_with_zones(zone_count in 1usize..12) {
        let topology = synthesize(
            &input(zone_count, vec![Port::HTTP], default_block()),
            &catalog(),
            &resolver(),
        ).unwrap();
        let graph = &topology.graph;

        prop_assert_eq!(graph.count(ResourceKind::Subnet), zone_count);
        prop_assert_eq!(graph.count(ResourceKind::RouteTable), zone_count);
        prop_assert_eq!(graph.count(ResourceKind::RouteTableAssociation), zone_count);
        prop_assert_eq!(graph.count(ResourceKind::Route), zone_count);
        prop_assert_eq!(graph.count(ResourceKind::Instance), zone_count);
        prop_assert_eq!(topology.dns.len(), zone_count + 1);

        let blocks: Vec<Ipv4Cidr> = topology.network.subnets.iter().map(|s| s.cidr).collect();
        for (i, a) in blocks.iter().enumerate() {
            prop_assert!(default_block().contains(a));
            for b in &blocks[i + 1..] {
                prop_assert!(!a.overlaps(b));
            }
        }
    }

    /// Property: k distinct ports and z instances yield k groups, k listeners
    /// and k*z attachment edges
    #[test]
    fn prop_full_mesh_edges(zone_count in 1usize..6, ports in distinct_ports()) {
        let port_count = ports.len();
        let topology = synthesize(
            &input(zone_count, ports, default_block()),
            &catalog(),
            &resolver(),
        ).unwrap();
        let graph = &topology.graph;

        prop_assert_eq!(graph.count(ResourceKind::TargetGroup), port_count);
        prop_assert_eq!(graph.count(ResourceKind::Listener), port_count);
        prop_assert_eq!(graph.count(ResourceKind::TargetGroupAttachment), port_count * zone_count);
        prop_assert!(topology.load_balancing.is_full_mesh(&topology.compute));
    }

    /// Property: any repeated port is rejected, whatever its position
    #[test]
    fn prop_repeated_port_rejected(ports in distinct_ports().prop_filter("non-empty", |p| !p.is_empty()), pick in any::<prop::sample::Index>()) {
        let mut ports = ports;
        let duplicate = ports[pick.index(ports.len())];
        ports.push(duplicate);

        let err = synthesize(&input(2, ports, default_block()), &catalog(), &resolver()).unwrap_err();
        prop_assert_eq!(err, SynthesisError::DuplicateListenerPort(duplicate));
    }

    /// Property: synthesis succeeds exactly when the base block holds one /24
    /// per zone
    #[test]
    fn prop_capacity_boundary(prefix in 16u8..=26, zone_count in 1usize..40) {
        let block = Ipv4Cidr::new(std::net::Ipv4Addr::new(10, 0, 0, 0), prefix).unwrap();
        let capacity: usize = if prefix <= 24 { 1 << (24 - prefix) } else { 0 };

        let result = synthesize(&input(zone_count, vec![], block), &catalog(), &resolver());
        if zone_count <= capacity {
            prop_assert!(result.is_ok());
        } else {
            let is_capacity_error = matches!(result, Err(SynthesisError::CapacityExceeded { .. }));
            prop_assert!(is_capacity_error);
        }
    }

    /// Property: logical names are unique and identical across runs
    #[test]
    fn prop_names_unique_and_stable(zone_count in 1usize..8, ports in distinct_ports()) {
        let run = || synthesize(
            &input(zone_count, ports.clone(), default_block()),
            &catalog(),
            &resolver(),
        ).unwrap();
        let first = run();
        let second = run();

        let names: Vec<_> = first.graph.declarations().iter().map(|d| d.name.clone()).collect();
        let unique: BTreeSet<_> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());
        prop_assert_eq!(first.graph, second.graph);
    }
}
