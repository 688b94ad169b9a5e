// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Value objects a synthesis run is computed from. Each validates on
//! construction and on deserialization, so the synthesis steps only check
//! cross-field preconditions.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - canonical IPv4 network block with /24 partitioning
//! - [`Port`] - listener and rule ports (1-65535)
//! - [`DnsName`] / [`DnsLabel`] - RFC 1123 zone names and record labels
//! - [`Zone`] - availability zone identifier
//! - [`KeyCredential`] - OpenSSH public key
//! - [`ImageFilter`] - owner + name pattern image query
//! - [`BootstrapTemplate`] - opaque, parameterised node bootstrap payload
//!
//! # Naming
//!
//! [`naming`] is the single source of logical resource names.

pub mod bootstrap;
pub mod dns_name;
pub mod image;
pub mod input;
pub mod naming;
pub mod network;

pub use bootstrap::BootstrapTemplate;
pub use dns_name::{DnsLabel, DnsName, DnsNameError};
pub use image::{ImageCandidate, ImageFilter, ImageId};
pub use input::{
    InstanceShape, KeyCredential, RootVolume, TopologyInput, TopologyInputBuilder, Zone,
};
pub use naming::{name, singleton, ResourceName, ResourceRole, Singleton};
pub use network::{Ipv4Cidr, NetworkError, Port};
