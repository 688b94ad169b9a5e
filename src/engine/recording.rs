// Copyright (c) 2025 - Cowboy AI, Inc.
//! Recording engine - applies a graph in memory
//!
//! Every resource gets identifiers derived from its kind and logical name
//! (UUID v5), so applying the same graph twice yields the same values.
//! Useful for tests and dry runs: it enforces the same ordering contract a
//! real engine must honour, without touching a provider.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::debug;
use uuid::Uuid;

use super::{AppliedGraph, ProvisioningEngine, ResolvedResource};
use crate::domain::ResourceName;
use crate::errors::{EngineError, EngineResult};
use crate::graph::{Attribute, ResourceDeclaration, ResourceGraph, ResourceKind};

/// First address handed out to instances (198.18.0.0/15 benchmarking range)
const FIRST_PUBLIC_IP: Ipv4Addr = Ipv4Addr::new(198, 18, 0, 1);

/// In-memory engine with deterministic identifiers
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    /// Logical names in the order they were applied, across runs
    pub history: Vec<ResourceName>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget previously applied runs
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Apply explicit waves
    ///
    /// Dependencies must lie in an earlier wave; a dependency in the same
    /// wave or a later one fails with `UnresolvedReference`.
    pub fn apply_waves(
        &mut self,
        waves: &[Vec<&ResourceDeclaration>],
    ) -> EngineResult<Vec<ResolvedResource>> {
        let mut resolved: BTreeMap<ResourceName, ResolvedResource> = BTreeMap::new();
        let mut order = Vec::new();
        let mut instances = 0u32;

        for (wave, declarations) in waves.iter().enumerate() {
            let mut applied = Vec::with_capacity(declarations.len());

            for declaration in declarations {
                check_dependencies(declaration, &resolved)?;

                let public_ip = (declaration.kind == ResourceKind::Instance).then(|| {
                    instances += 1;
                    Ipv4Addr::from(u32::from(FIRST_PUBLIC_IP) + instances - 1)
                });
                applied.push(resolve(declaration, wave, public_ip));
            }

            debug!(wave, resources = applied.len(), "Applied wave");
            for resource in applied {
                self.history.push(resource.name.clone());
                order.push(resource.name.clone());
                resolved.insert(resource.name.clone(), resource);
            }
        }

        Ok(order
            .iter()
            .filter_map(|name| resolved.remove(name))
            .collect())
    }
}

fn check_dependencies(
    declaration: &ResourceDeclaration,
    resolved: &BTreeMap<ResourceName, ResolvedResource>,
) -> EngineResult<()> {
    if let Some(missing) = declaration
        .depends_on
        .iter()
        .find(|dependency| !resolved.contains_key(*dependency))
    {
        return Err(EngineError::UnresolvedReference {
            resource: declaration.name.clone(),
            dependency: missing.clone(),
        });
    }

    for reference in declaration.property_refs() {
        let target = resolved.get(&reference.resource).ok_or_else(|| {
            EngineError::UnresolvedReference {
                resource: declaration.name.clone(),
                dependency: reference.resource.clone(),
            }
        })?;
        if !target.attributes.contains_key(&reference.attribute) {
            return Err(EngineError::UnavailableAttribute {
                resource: declaration.name.clone(),
                reference,
            });
        }
    }
    Ok(())
}

fn resolve(
    declaration: &ResourceDeclaration,
    wave: usize,
    public_ip: Option<Ipv4Addr>,
) -> ResolvedResource {
    let uuid = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{}/{}", declaration.kind, declaration.name).as_bytes(),
    );
    let hex = uuid.simple().to_string();
    let id = format!("{}-{}", declaration.kind, &hex[..17]);

    let name = ["name", "key_name"]
        .iter()
        .find_map(|key| declaration.properties.get(*key)?.as_str())
        .unwrap_or(declaration.name.as_str())
        .to_string();

    let mut attributes = BTreeMap::from([
        (Attribute::Arn, format!("arn:recorded:{}/{}", declaration.kind, id)),
        (Attribute::Id, id),
        (Attribute::Name, name.clone()),
    ]);
    if declaration.kind == ResourceKind::LoadBalancer {
        attributes.insert(
            Attribute::DnsName,
            format!("{}-{}.elb.recorded.internal", name, &hex[..8]),
        );
    }
    if let Some(ip) = public_ip {
        attributes.insert(Attribute::PublicIp, ip.to_string());
    }

    ResolvedResource {
        name: declaration.name.clone(),
        kind: declaration.kind,
        wave,
        attributes,
    }
}

#[async_trait]
impl ProvisioningEngine for RecordingEngine {
    async fn apply(&mut self, graph: &ResourceGraph) -> EngineResult<AppliedGraph> {
        let resources = self.apply_waves(&graph.waves())?;

        let run_id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            resources
                .iter()
                .map(|resource| resource.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
                .as_bytes(),
        );

        let mut applied = AppliedGraph {
            run_id,
            resources,
            outputs: BTreeMap::new(),
        };
        let outputs = graph
            .exports()
            .iter()
            .filter_map(|(key, reference)| {
                applied
                    .resolve(reference)
                    .map(|value| (key.clone(), value.to_string()))
            })
            .collect();
        applied.outputs = outputs;

        Ok(applied)
    }
}
