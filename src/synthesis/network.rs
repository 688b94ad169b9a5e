// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Topology Builder
//!
//! One virtual network and internet gateway, then per zone: a subnet carved
//! from the base block by index, its own route table, the association, and
//! a default route to the gateway.

use serde::Serialize;
use tracing::debug;

use crate::domain::{name, singleton, Ipv4Cidr, ResourceName, ResourceRole, Singleton, Zone};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

/// Prefix length of every per-zone subnet
pub const SUBNET_PREFIX: u8 = 24;

/// A subnet's position and address block, before anything is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetPlan {
    pub index: usize,
    pub zone: Zone,
    pub cidr: Ipv4Cidr,
}

/// Declared per-zone network resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetNode {
    pub index: usize,
    pub zone: Zone,
    pub cidr: Ipv4Cidr,
    pub subnet: ResourceName,
    pub route_table: ResourceName,
    pub association: ResourceName,
    pub default_route: ResourceName,
}

/// Output of the network step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkNode {
    pub network: ResourceName,
    pub gateway: ResourceName,
    pub subnets: Vec<SubnetNode>,
}

impl NetworkNode {
    pub fn subnet_refs(&self) -> Vec<ResourceRef> {
        self.subnets
            .iter()
            .map(|node| ResourceRef::id(&node.subnet))
            .collect()
    }
}

/// Partition the base block, one /24 per zone by index
///
/// Fails with `CapacityExceeded` when there are no zones or more zones than
/// /24 blocks; nothing has been declared at that point.
pub fn plan_subnets(zones: &[Zone], base_block: &Ipv4Cidr) -> SynthesisResult<Vec<SubnetPlan>> {
    let capacity = base_block.subnet_capacity(SUBNET_PREFIX);
    let requested = zones.len();

    if requested == 0 || requested as u64 > capacity {
        return Err(SynthesisError::CapacityExceeded {
            requested,
            capacity,
            base_block: base_block.to_string(),
        });
    }

    zones
        .iter()
        .enumerate()
        .map(|(index, zone)| {
            let cidr = base_block
                .subnet(SUBNET_PREFIX, index as u64)
                .ok_or_else(|| SynthesisError::CapacityExceeded {
                    requested,
                    capacity,
                    base_block: base_block.to_string(),
                })?;
            Ok(SubnetPlan {
                index,
                zone: zone.clone(),
                cidr,
            })
        })
        .collect()
}

/// Declare the network, gateway and the per-zone routing subgraphs
pub fn build_network(
    graph: &mut GraphBuilder,
    base_block: &Ipv4Cidr,
    environment: &str,
    plans: &[SubnetPlan],
) -> SynthesisResult<NetworkNode> {
    let vpc_tag = format!("vpc-{environment}");
    let network = graph.declare(
        ResourceDeclaration::new(ResourceKind::Vpc, singleton(Singleton::Network))
            .property("cidr_block", base_block.to_string())
            .tags([("Name", vpc_tag.as_str()), ("env", environment)]),
    )?;

    let gateway_tag = format!("gateway-{environment}");
    let gateway = graph.declare(
        ResourceDeclaration::new(ResourceKind::InternetGateway, singleton(Singleton::Gateway))
            .reference("vpc_id", ResourceRef::id(&network))
            .tags([("Name", gateway_tag.as_str()), ("env", environment)]),
    )?;

    let mut subnets = Vec::with_capacity(plans.len());
    for plan in plans {
        let subnet_tag = format!("subnet-{}", plan.zone);
        let subnet = graph.declare(
            ResourceDeclaration::new(ResourceKind::Subnet, name(ResourceRole::Subnet, plan.index))
                .reference("vpc_id", ResourceRef::id(&network))
                .property("cidr_block", plan.cidr.to_string())
                .property("availability_zone", plan.zone.as_str())
                .property("map_public_ip_on_launch", true)
                .tags([("Name", subnet_tag.as_str()), ("env", environment)]),
        )?;

        let route_table = graph.declare(
            ResourceDeclaration::new(
                ResourceKind::RouteTable,
                name(ResourceRole::RouteTable, plan.index),
            )
            .reference("vpc_id", ResourceRef::id(&network)),
        )?;

        let association = graph.declare(
            ResourceDeclaration::new(
                ResourceKind::RouteTableAssociation,
                name(ResourceRole::RouteTableAssociation, plan.index),
            )
            .reference("subnet_id", ResourceRef::id(&subnet))
            .reference("route_table_id", ResourceRef::id(&route_table)),
        )?;

        let default_route = graph.declare(
            ResourceDeclaration::new(ResourceKind::Route, name(ResourceRole::DefaultRoute, plan.index))
                .reference("route_table_id", ResourceRef::id(&route_table))
                .property("destination_cidr_block", Ipv4Cidr::ANY.to_string())
                .reference("gateway_id", ResourceRef::id(&gateway)),
        )?;

        debug!(zone = %plan.zone, cidr = %plan.cidr, subnet = %subnet, "Declared zone network");

        subnets.push(SubnetNode {
            index: plan.index,
            zone: plan.zone.clone(),
            cidr: plan.cidr,
            subnet,
            route_table,
            association,
            default_route,
        });
    }

    Ok(NetworkNode {
        network,
        gateway,
        subnets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(names: &[&str]) -> Vec<Zone> {
        names.iter().map(|z| Zone::new(*z).unwrap()).collect()
    }

    #[test]
    fn test_plan_is_sequential_by_index() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        let plans = plan_subnets(&zones(&["c", "a", "b"]), &block).unwrap();

        let cidrs: Vec<String> = plans.iter().map(|p| p.cidr.to_string()).collect();
        assert_eq!(cidrs, vec!["10.92.0.0/24", "10.92.1.0/24", "10.92.2.0/24"]);
        assert_eq!(plans[0].zone.as_str(), "c");
    }

    #[test]
    fn test_plan_rejects_empty_zones() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        assert!(matches!(
            plan_subnets(&[], &block),
            Err(SynthesisError::CapacityExceeded { requested: 0, .. })
        ));
    }

    #[test]
    fn test_plan_rejects_over_capacity() {
        let block: Ipv4Cidr = "10.92.0.0/23".parse().unwrap();
        let err = plan_subnets(&zones(&["a", "b", "c"]), &block).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::CapacityExceeded {
                requested: 3,
                capacity: 2,
                base_block: "10.92.0.0/23".to_string(),
            }
        );

        let narrow: Ipv4Cidr = "10.92.0.0/25".parse().unwrap();
        assert!(plan_subnets(&zones(&["a"]), &narrow).is_err());
    }

    #[test]
    fn test_build_network_wires_each_zone() {
        let block: Ipv4Cidr = "10.92.0.0/16".parse().unwrap();
        let plans = plan_subnets(&zones(&["us-east-1a", "us-east-1b"]), &block).unwrap();

        let mut builder = GraphBuilder::new();
        let node = build_network(&mut builder, &block, "dev", &plans).unwrap();
        let graph = builder.finish();

        assert_eq!(node.subnets.len(), 2);
        assert_eq!(graph.count(ResourceKind::Subnet), 2);
        assert_eq!(graph.count(ResourceKind::RouteTable), 2);
        assert_eq!(graph.count(ResourceKind::RouteTableAssociation), 2);
        assert_eq!(graph.count(ResourceKind::Route), 2);

        for subnet in &node.subnets {
            let route = graph.get(&subnet.default_route).unwrap();
            assert_eq!(route.properties["destination_cidr_block"], "0.0.0.0/0");
            assert!(route.depends_on.contains(&node.gateway));
            assert!(route.depends_on.contains(&subnet.route_table));

            let association = graph.get(&subnet.association).unwrap();
            assert!(association.depends_on.contains(&subnet.subnet));
            assert!(association.depends_on.contains(&subnet.route_table));
        }

        let route_tables: std::collections::BTreeSet<_> =
            node.subnets.iter().map(|s| &s.route_table).collect();
        assert_eq!(route_tables.len(), 2);
    }
}
