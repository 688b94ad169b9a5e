// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster Synthesizer
//!
//! Reads a synthesis manifest, computes the cluster resource graph and prints
//! it as JSON. When `NATS_URL` is set the graph is also published for a
//! provisioning engine to apply.
//!
//! Run with: cargo run --bin cluster-synth -- manifest.json
//!
//! Environment:
//! - `TOPOLOGY_FILE` manifest path (the first argument wins)
//! - `NATS_URL` publish target, optional
//! - `TOPOLOGY_SUBJECT_ROOT` subject root, default `topology`

use anyhow::{Context, Result};
use cim_cluster_topology::{
    config::{EngineConfig, SynthesisManifest},
    engine::{NatsEngine, ProvisioningEngine},
    nats::NatsClient,
    synthesis::synthesize,
};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.topology_file.clone())
        .context("No manifest given. Pass a path or set TOPOLOGY_FILE")?;

    info!("Reading manifest from {}", path.display());
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest = SynthesisManifest::from_json(&raw).context("Failed to parse manifest")?;

    let topology = synthesize(&manifest.input, &manifest.catalog(), manifest.zones())
        .context("Synthesis failed")?;

    println!("{}", serde_json::to_string_pretty(&topology.graph)?);

    if let Some(nats) = config.nats() {
        info!("Connecting to NATS at {:?}", nats.servers);
        let client = NatsClient::new(nats)
            .await
            .context("Failed to connect to NATS")?;

        let mut engine = NatsEngine::new(client, config.subject_root.clone());
        let applied = engine
            .apply(&topology.graph)
            .await
            .context("Failed to publish topology")?;
        info!(
            "Published {} resources under {} (run {})",
            applied.resources.len(),
            config.subject_root,
            applied.run_id
        );
    }

    Ok(())
}
