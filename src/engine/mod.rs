// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Engines
//!
//! Synthesis stops at a [`ResourceGraph`]. An engine is what turns the graph
//! into live resources: it walks the waves, creates each declaration once its
//! dependencies exist, and reports the identifiers and attributes it resolved.
//!
//! # Architecture
//!
//! ```text
//! Pure synthesis              Engine
//! ──────────────             ────────
//!
//! TopologyInput              ResourceGraph
//!      │                          │
//!      ▼                          ▼
//! ┌──────────────┐ graph  ┌──────────────┐
//! │ synthesize() │ ─────> │   apply()    │
//! │ (pure func)  │        │ (async I/O)  │
//! └──────────────┘        └──────────────┘
//!                                 │
//!                                 ▼
//!                           AppliedGraph
//! ```
//!
//! Engines shipped here:
//! - [`RecordingEngine`] resolves deterministic fake identifiers in memory
//! - [`NatsEngine`] hands every declaration to a remote engine over NATS

pub mod nats;
pub mod recording;

pub use nats::NatsEngine;
pub use recording::RecordingEngine;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::ResourceName;
use crate::errors::EngineResult;
use crate::graph::{Attribute, ResourceGraph, ResourceKind, ResourceRef};

/// Applies a synthesized graph
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Apply every declaration, wave by wave
    ///
    /// A declaration is only applied once every dependency has been.
    async fn apply(&mut self, graph: &ResourceGraph) -> EngineResult<AppliedGraph>;
}

/// One applied resource and what the engine resolved for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResource {
    pub name: ResourceName,
    pub kind: ResourceKind,
    pub wave: usize,
    pub attributes: BTreeMap<Attribute, String>,
}

/// Outcome of one `apply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedGraph {
    pub run_id: Uuid,
    /// Resources in application order
    pub resources: Vec<ResolvedResource>,
    /// Export keys resolved to attribute values
    pub outputs: BTreeMap<String, String>,
}

impl AppliedGraph {
    pub fn get(&self, name: &ResourceName) -> Option<&ResolvedResource> {
        self.resources.iter().find(|resource| &resource.name == name)
    }

    /// Resolved value of a reference
    pub fn resolve(&self, reference: &ResourceRef) -> Option<&str> {
        self.get(&reference.resource)?
            .attributes
            .get(&reference.attribute)
            .map(String::as_str)
    }

    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }

    /// Position of a resource in application order
    pub fn position(&self, name: &ResourceName) -> Option<usize> {
        self.resources.iter().position(|resource| &resource.name == name)
    }
}
