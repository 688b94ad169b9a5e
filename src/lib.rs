//! Multi-zone cluster topology synthesis
//!
//! Computes, from a small declarative input, the complete resource graph of
//! a highly-available compute cluster: network and per-zone routing, security
//! groups, node identity, one instance per zone, a network load balancer with
//! full-mesh target membership, and DNS records. The graph is handed to a
//! provisioning engine that applies it wave by wave.
//!
//! ```text
//! TopologyInput ─▶ synthesize() ─▶ ResourceGraph ─▶ ProvisioningEngine
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod nats;
pub mod subjects;
pub mod synthesis;

// Re-export commonly used types
pub use config::{EngineConfig, SynthesisManifest};
pub use domain::TopologyInput;
pub use engine::{AppliedGraph, NatsEngine, ProvisioningEngine, RecordingEngine};
pub use errors::{EngineError, EngineResult, SynthesisError, SynthesisResult};
pub use graph::{ResourceDeclaration, ResourceGraph, ResourceKind, ResourceRef};
pub use nats::{NatsClient, NatsConfig};
pub use synthesis::{synthesize, synthesize_with, SynthesizedTopology};
