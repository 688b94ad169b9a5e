// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-cluster-topology
//!
//! Deterministic topology inputs, image catalogs and hosted-zone tables.
//! All timestamps and identifiers are fixed constants.
#![allow(dead_code)]

use chrono::{DateTime, Utc};

use cim_cluster_topology::domain::{
    DnsName, ImageCandidate, ImageFilter, ImageId, KeyCredential, Port, TopologyInput, Zone,
};
use cim_cluster_topology::synthesis::{HostedZoneId, StaticImageCatalog, StaticZoneResolver};

pub const ADMIN_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINWO9EKfPEQCbFV9VGl/GCp1cRfEugz/Yr36ch6yKd4p admin";

pub const DNS_ZONE: &str = "aws.domain.com";
pub const HOSTED_ZONE_ID: &str = "Z0123456789ABCDEFGHIJ";

pub const CURRENT_IMAGE: &str = "ami-0c7217cdde317cfec";
pub const PREVIOUS_IMAGE: &str = "ami-0a0e5d9c7acc336f1";

// Fixed image build dates
pub const CURRENT_BUILD: &str = "2024-01-20T10:00:00Z";
pub const PREVIOUS_BUILD: &str = "2023-12-07T10:00:00Z";

pub const THREE_ZONES: [&str; 3] = ["us-east-1a", "us-east-1b", "us-east-1c"];

fn timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn zones(names: &[&str]) -> Vec<Zone> {
    names
        .iter()
        .map(|z| Zone::new(*z).expect("Invalid zone in test fixture"))
        .collect()
}

pub fn ports(values: &[u16]) -> Vec<Port> {
    values
        .iter()
        .map(|p| Port::new(*p).expect("Invalid port in test fixture"))
        .collect()
}

/// Input with the given zones and every other field defaulted
pub fn input(zone_names: &[&str]) -> TopologyInput {
    TopologyInput::builder(
        zones(zone_names),
        KeyCredential::new(ADMIN_KEY).expect("Invalid key in test fixture"),
        DnsName::new(DNS_ZONE).expect("Invalid zone name in test fixture"),
    )
    .build()
}

/// Three zones, `10.92.0.0/16`, ports 80/443/16443
pub fn three_zone_input() -> TopologyInput {
    input(&THREE_ZONES)
}

fn ubuntu(id: &str, build: &str, created_at: &str) -> ImageCandidate {
    ImageCandidate {
        id: ImageId::new(id),
        name: format!("ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-{build}"),
        owner: ImageFilter::default().owner,
        created_at: timestamp(created_at),
    }
}

/// Two matching Ubuntu builds and one unrelated image
pub fn catalog() -> StaticImageCatalog {
    StaticImageCatalog::new([
        ubuntu(PREVIOUS_IMAGE, "20231207", PREVIOUS_BUILD),
        ubuntu(CURRENT_IMAGE, "20240120", CURRENT_BUILD),
        ImageCandidate {
            id: ImageId::new("ami-0fedcba9876543210"),
            name: "debian-12-amd64-20240201".to_string(),
            owner: "136693071363".to_string(),
            created_at: timestamp("2024-02-01T00:00:00Z"),
        },
    ])
}

pub fn empty_catalog() -> StaticImageCatalog {
    StaticImageCatalog::default()
}

pub fn hosted_zones() -> StaticZoneResolver {
    StaticZoneResolver::new().with_zone(
        DnsName::new(DNS_ZONE).expect("Invalid zone name in test fixture"),
        HostedZoneId::new(HOSTED_ZONE_ID),
    )
}
