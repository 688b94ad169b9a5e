// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning engine tests
//!
//! Applies synthesized graphs with the in-memory engine and checks the
//! ordering contract every engine must honour.

mod fixtures;

use pretty_assertions::assert_eq;

use cim_cluster_topology::domain::ResourceName;
use cim_cluster_topology::engine::{ProvisioningEngine, RecordingEngine};
use cim_cluster_topology::graph::{Attribute, ResourceRef};
use cim_cluster_topology::synthesis::{outputs, synthesize};

use fixtures::*;

/// User Story: dependency-ordered provisioning
///
/// As a provisioning engine
/// I want every resource to arrive after the resources it references
/// So that I can apply each wave concurrently without lookups failing
#[tokio::test]
async fn test_every_resource_applied_after_its_dependencies() {
    // Given a synthesized three-zone topology
    let topology = synthesize(&three_zone_input(), &catalog(), &hosted_zones()).unwrap();

    // When it is applied
    let mut engine = RecordingEngine::new();
    let applied = engine.apply(&topology.graph).await.unwrap();

    // Then every dependency precedes its dependent
    assert_eq!(applied.resources.len(), topology.graph.len());
    for declaration in topology.graph.declarations() {
        let position = applied.position(&declaration.name).unwrap();
        let wave = applied.get(&declaration.name).unwrap().wave;
        for dependency in &declaration.depends_on {
            assert!(applied.position(dependency).unwrap() < position);
            assert!(applied.get(dependency).unwrap().wave < wave);
        }
    }
    assert_eq!(engine.history.len(), topology.graph.len());
}

#[tokio::test]
async fn test_outputs_resolve_to_identifiers() {
    let topology = synthesize(&three_zone_input(), &catalog(), &hosted_zones()).unwrap();
    let applied = RecordingEngine::new().apply(&topology.graph).await.unwrap();

    assert_eq!(applied.outputs.len(), 5);
    assert!(applied.output(outputs::VPC_ID).unwrap().starts_with("vpc-"));
    assert!(applied
        .output(outputs::ADMIN_SECURITY_GROUP_ID)
        .unwrap()
        .starts_with("security-group-"));
    assert_ne!(
        applied.output(outputs::ADMIN_SECURITY_GROUP_ID),
        applied.output(outputs::WEB_SECURITY_GROUP_ID)
    );
    assert!(applied.output(outputs::BUCKET_ID).is_some());
    assert!(applied.output(outputs::GATEWAY_ID).is_some());
}

#[tokio::test]
async fn test_record_targets_resolve() {
    let topology = synthesize(&three_zone_input(), &catalog(), &hosted_zones()).unwrap();
    let applied = RecordingEngine::new().apply(&topology.graph).await.unwrap();

    let balancer_dns = applied
        .resolve(&ResourceRef::new(
            &topology.load_balancing.balancer,
            Attribute::DnsName,
        ))
        .unwrap();
    assert!(balancer_dns.ends_with(".elb.recorded.internal"));

    let addresses: Vec<&str> = topology
        .compute
        .instances
        .iter()
        .map(|node| {
            applied
                .resolve(&ResourceRef::new(&node.instance, Attribute::PublicIp))
                .unwrap()
        })
        .collect();
    assert_eq!(addresses, vec!["198.18.0.1", "198.18.0.2", "198.18.0.3"]);
}

#[tokio::test]
async fn test_apply_is_repeatable() {
    let topology = synthesize(&three_zone_input(), &catalog(), &hosted_zones()).unwrap();

    let mut engine = RecordingEngine::new();
    let first = engine.apply(&topology.graph).await.unwrap();
    let second = engine.apply(&topology.graph).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.history.len(), 2 * topology.graph.len());
}

#[tokio::test]
async fn test_waves_run_network_before_instances() {
    let topology = synthesize(&three_zone_input(), &catalog(), &hosted_zones()).unwrap();
    let applied = RecordingEngine::new().apply(&topology.graph).await.unwrap();

    let wave = |name: &ResourceName| applied.get(name).unwrap().wave;
    assert_eq!(wave(&topology.network.network), 0);
    assert_eq!(wave(&topology.bucket), 0);
    assert!(wave(&topology.identity.profile) < wave(&topology.compute.instances[0].instance));
    assert!(
        wave(&topology.compute.instances[0].instance)
            < wave(&topology.dns.addresses[0].resource)
    );
}
