// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject hierarchy for topology events
//!
//! # Subject Pattern
//!
//! ```text
//! {root}.{aggregate}.{operation}
//! ```
//!
//! The aggregate is either a resource kind (`vpc`, `instance`, ...) or
//! `graph` for whole-run events. This allows for:
//! - Precise subscriptions (`topology.instance.declared`)
//! - Kind-level wildcards (`topology.listener.>`)
//! - Global subscriptions (`topology.>`)
//!
//! # Examples
//!
//! ```rust
//! use cim_cluster_topology::graph::ResourceKind;
//! use cim_cluster_topology::subjects::{Aggregate, Operation, SubjectBuilder};
//!
//! let subject = SubjectBuilder::new(Aggregate::Resource(ResourceKind::Instance))
//!     .build(Operation::Declared);
//! assert_eq!(subject, "topology.instance.declared");
//!
//! let wildcard = SubjectBuilder::new(Aggregate::Graph).build_wildcard();
//! assert_eq!(wildcard, "topology.graph.>");
//! ```

use std::fmt;

use crate::graph::ResourceKind;

/// Default root namespace for topology subjects
pub const TOPOLOGY_ROOT: &str = "topology";

/// What an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    /// A single declared resource
    Resource(ResourceKind),
    /// A whole synthesized graph
    Graph,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Resource(kind) => write!(f, "{}", kind),
            Aggregate::Graph => write!(f, "graph"),
        }
    }
}

/// Topology operations (event types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A resource declaration was handed to the engine
    Declared,
    /// A graph was synthesized
    Synthesized,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Declared => write!(f, "declared"),
            Operation::Synthesized => write!(f, "synthesized"),
        }
    }
}

/// Builder for topology NATS subjects
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    root: String,
    aggregate: Aggregate,
}

impl SubjectBuilder {
    /// Builder under the default root
    pub fn new(aggregate: Aggregate) -> Self {
        Self::with_root(TOPOLOGY_ROOT, aggregate)
    }

    /// Builder under a custom root, e.g. `prod.topology`
    pub fn with_root(root: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            root: root.into(),
            aggregate,
        }
    }

    /// Build the complete subject string
    pub fn build(&self, operation: Operation) -> String {
        format!("{}.{}.{}", self.root, self.aggregate, operation)
    }

    /// Build a wildcard subscription for all operations on this aggregate
    ///
    /// Returns: `{root}.{aggregate}.>`
    pub fn build_wildcard(&self) -> String {
        format!("{}.{}.>", self.root, self.aggregate)
    }

    /// Build a subscription for every topology event under `root`
    pub fn build_all(root: &str) -> String {
        format!("{}.>", root)
    }
}

/// Check that a root is usable as a subject prefix
///
/// Tokens are dot-separated, non-empty, and contain no whitespace or
/// wildcards.
pub fn is_valid_root(root: &str) -> bool {
    !root.is_empty()
        && root.split('.').all(|token| {
            !token.is_empty()
                && !token
                    .chars()
                    .any(|c| c.is_whitespace() || c == '*' || c == '>')
        })
}

/// Convenience functions for common subject patterns
pub mod subjects {
    use super::*;

    pub fn resource_declared(root: &str, kind: ResourceKind) -> String {
        SubjectBuilder::with_root(root, Aggregate::Resource(kind)).build(Operation::Declared)
    }

    pub fn graph_synthesized(root: &str) -> String {
        SubjectBuilder::with_root(root, Aggregate::Graph).build(Operation::Synthesized)
    }

    pub fn all_topology_events(root: &str) -> String {
        SubjectBuilder::build_all(root)
    }
}
