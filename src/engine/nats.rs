// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS engine - hands a graph to a remote provisioning engine
//!
//! Each declaration is published on `{root}.{kind}.declared` in wave order,
//! followed by one `{root}.graph.synthesized` summary. The remote side owns
//! resolution, so the returned [`AppliedGraph`] carries waves but no
//! attributes or outputs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::{AppliedGraph, ProvisioningEngine, ResolvedResource};
use crate::errors::EngineResult;
use crate::graph::{ResourceDeclaration, ResourceGraph, ResourceRef};
use crate::nats::NatsClient;
use crate::subjects::subjects;

/// Payload of a `declared` message
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationEnvelope<'a> {
    pub run_id: Uuid,
    pub wave: usize,
    pub declaration: &'a ResourceDeclaration,
}

/// Payload of the `graph.synthesized` message
#[derive(Debug, Clone, Serialize)]
pub struct GraphSynthesized<'a> {
    pub run_id: Uuid,
    pub synthesized_at: DateTime<Utc>,
    pub resources: usize,
    pub waves: usize,
    pub exports: &'a BTreeMap<String, ResourceRef>,
}

/// Publishes graphs over NATS
pub struct NatsEngine {
    client: NatsClient,
    root: String,
}

impl NatsEngine {
    pub fn new(client: NatsClient, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    /// Every message of one run, as (subject, payload) in publish order
    pub fn messages(
        root: &str,
        graph: &ResourceGraph,
        run_id: Uuid,
        synthesized_at: DateTime<Utc>,
    ) -> EngineResult<Vec<(String, serde_json::Value)>> {
        let waves = graph.waves();
        let mut messages = Vec::with_capacity(graph.len() + 1);

        for (wave, declarations) in waves.iter().enumerate() {
            for declaration in declarations {
                let envelope = DeclarationEnvelope {
                    run_id,
                    wave,
                    declaration,
                };
                messages.push((
                    subjects::resource_declared(root, declaration.kind),
                    serde_json::to_value(&envelope)?,
                ));
            }
        }

        let summary = GraphSynthesized {
            run_id,
            synthesized_at,
            resources: graph.len(),
            waves: waves.len(),
            exports: graph.exports(),
        };
        messages.push((subjects::graph_synthesized(root), serde_json::to_value(&summary)?));

        Ok(messages)
    }
}

#[async_trait]
impl ProvisioningEngine for NatsEngine {
    async fn apply(&mut self, graph: &ResourceGraph) -> EngineResult<AppliedGraph> {
        let run_id = Uuid::now_v7();
        let messages = Self::messages(&self.root, graph, run_id, Utc::now())?;

        let published = self.client.publish_batch(&messages).await?;

        info!(%run_id, messages = published, root = %self.root, "Published topology graph");

        let wave_of = graph.wave_of();
        let resources = graph
            .declarations()
            .iter()
            .map(|declaration| ResolvedResource {
                name: declaration.name.clone(),
                kind: declaration.kind,
                wave: wave_of.get(&declaration.name).copied().unwrap_or_default(),
                attributes: BTreeMap::new(),
            })
            .collect();

        Ok(AppliedGraph {
            run_id,
            resources,
            outputs: BTreeMap::new(),
        })
    }
}
