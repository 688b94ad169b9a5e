// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Dependency Graph
//!
//! The output of synthesis: an ordered list of resource declarations, each a
//! (kind, logical name, property bag, dependency set), plus named exports.
//!
//! # Construction
//!
//! ```text
//! GraphBuilder (append-only)          ResourceGraph (immutable)
//! ──────────────────────────          ─────────────────────────
//!
//!  declare(decl) ──┐
//!                  │ every dependency must already be declared
//!                  ▼
//!  declarations[] in declaration order ──finish()──▶ waves(), exports()
//! ```
//!
//! A declaration can only reference resources declared before it, so the
//! declaration order is a topological order and the graph is a DAG by
//! construction. There is no way to remove or edit a declaration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::domain::ResourceName;
use crate::errors::SynthesisError;

/// Provider resource types the synthesizer declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Vpc,
    InternetGateway,
    Subnet,
    RouteTable,
    RouteTableAssociation,
    Route,
    SecurityGroup,
    IamRole,
    IamPolicy,
    IamRolePolicyAttachment,
    IamInstanceProfile,
    KeyPair,
    Instance,
    LoadBalancer,
    TargetGroup,
    TargetGroupAttachment,
    Listener,
    DnsRecord,
    Bucket,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::InternetGateway => "internet-gateway",
            ResourceKind::Subnet => "subnet",
            ResourceKind::RouteTable => "route-table",
            ResourceKind::RouteTableAssociation => "route-table-association",
            ResourceKind::Route => "route",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::IamRole => "iam-role",
            ResourceKind::IamPolicy => "iam-policy",
            ResourceKind::IamRolePolicyAttachment => "iam-role-policy-attachment",
            ResourceKind::IamInstanceProfile => "iam-instance-profile",
            ResourceKind::KeyPair => "key-pair",
            ResourceKind::Instance => "instance",
            ResourceKind::LoadBalancer => "load-balancer",
            ResourceKind::TargetGroup => "target-group",
            ResourceKind::TargetGroupAttachment => "target-group-attachment",
            ResourceKind::Listener => "listener",
            ResourceKind::DnsRecord => "dns-record",
            ResourceKind::Bucket => "bucket",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attributes the provisioning engine resolves once a resource exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Id,
    Arn,
    Name,
    DnsName,
    PublicIp,
}

/// Opaque reference to an attribute of another declared resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource: ResourceName,
    pub attribute: Attribute,
}

impl ResourceRef {
    pub fn new(resource: &ResourceName, attribute: Attribute) -> Self {
        Self {
            resource: resource.clone(),
            attribute,
        }
    }

    pub fn id(resource: &ResourceName) -> Self {
        Self::new(resource, Attribute::Id)
    }

    pub fn arn(resource: &ResourceName) -> Self {
        Self::new(resource, Attribute::Arn)
    }

    pub fn name(resource: &ResourceName) -> Self {
        Self::new(resource, Attribute::Name)
    }

    /// Property-bag encoding understood by engines
    pub fn to_value(&self) -> Value {
        json!({ "$ref": self.resource, "attribute": self.attribute })
    }

    /// Decode a property value produced by [`ResourceRef::to_value`]
    pub fn from_value(value: &Value) -> Option<Self> {
        let resource = value.get("$ref")?.as_str()?;
        let attribute = serde_json::from_value(value.get("attribute")?.clone()).ok()?;
        Some(Self {
            resource: serde_json::from_value(Value::String(resource.to_string())).ok()?,
            attribute,
        })
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attribute = serde_json::to_value(self.attribute)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        write!(f, "{}.{}", self.resource, attribute)
    }
}

/// One resource the engine must create or converge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDeclaration {
    pub kind: ResourceKind,
    pub name: ResourceName,
    pub properties: BTreeMap<String, Value>,
    pub depends_on: BTreeSet<ResourceName>,
}

impl ResourceDeclaration {
    pub fn new(kind: ResourceKind, name: ResourceName) -> Self {
        Self {
            kind,
            name,
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Set a literal property
    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Set a property to another resource's attribute and depend on it
    pub fn reference(mut self, key: &str, target: ResourceRef) -> Self {
        self.properties.insert(key.to_string(), target.to_value());
        self.depends_on.insert(target.resource);
        self
    }

    /// Set a list property of references and depend on each
    pub fn references(mut self, key: &str, targets: impl IntoIterator<Item = ResourceRef>) -> Self {
        let values = targets
            .into_iter()
            .map(|target| {
                let value = target.to_value();
                self.depends_on.insert(target.resource);
                value
            })
            .collect::<Vec<_>>();
        self.properties.insert(key.to_string(), Value::Array(values));
        self
    }

    /// Order-only dependency with no property
    pub fn after(mut self, resource: &ResourceName) -> Self {
        self.depends_on.insert(resource.clone());
        self
    }

    /// Provider tags
    pub fn tags<'a>(mut self, tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let tags: serde_json::Map<String, Value> = tags
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        self.properties.insert("tags".to_string(), Value::Object(tags));
        self
    }

    /// Every reference held in the property bag, including inside lists
    pub fn property_refs(&self) -> Vec<ResourceRef> {
        fn collect(value: &Value, out: &mut Vec<ResourceRef>) {
            if let Some(r) = ResourceRef::from_value(value) {
                out.push(r);
                return;
            }
            match value {
                Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
                Value::Object(map) => map.values().for_each(|item| collect(item, out)),
                _ => {}
            }
        }

        let mut refs = Vec::new();
        self.properties.values().for_each(|v| collect(v, &mut refs));
        refs
    }
}

/// Graph construction errors
///
/// These indicate a wiring bug in a synthesis step, never bad user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Resource declared twice: {0}")]
    DuplicateName(ResourceName),

    #[error("Resource {resource} depends on undeclared {dependency}")]
    UnknownDependency {
        resource: ResourceName,
        dependency: ResourceName,
    },

    #[error("Export {key} references undeclared {resource}")]
    UnknownExport { key: String, resource: ResourceName },
}

impl From<GraphError> for SynthesisError {
    fn from(err: GraphError) -> Self {
        SynthesisError::StructuralValidation(err.to_string())
    }
}

/// Append-only graph builder
#[derive(Debug, Default)]
pub struct GraphBuilder {
    declarations: Vec<ResourceDeclaration>,
    index: BTreeMap<ResourceName, usize>,
    exports: BTreeMap<String, ResourceRef>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration
    ///
    /// # Invariants
    /// - Logical names are unique
    /// - Every dependency is already declared
    pub fn declare(&mut self, declaration: ResourceDeclaration) -> Result<ResourceName, GraphError> {
        if self.index.contains_key(&declaration.name) {
            return Err(GraphError::DuplicateName(declaration.name));
        }

        if let Some(missing) = declaration
            .depends_on
            .iter()
            .find(|dependency| !self.index.contains_key(*dependency))
        {
            return Err(GraphError::UnknownDependency {
                resource: declaration.name.clone(),
                dependency: missing.clone(),
            });
        }

        let name = declaration.name.clone();
        self.index.insert(name.clone(), self.declarations.len());
        self.declarations.push(declaration);
        Ok(name)
    }

    /// Publish a reference under an output key
    pub fn export(&mut self, key: impl Into<String>, target: ResourceRef) -> Result<(), GraphError> {
        let key = key.into();
        if !self.index.contains_key(&target.resource) {
            return Err(GraphError::UnknownExport {
                key,
                resource: target.resource,
            });
        }
        self.exports.insert(key, target);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn finish(self) -> ResourceGraph {
        ResourceGraph {
            declarations: self.declarations,
            index: self.index,
            exports: self.exports,
        }
    }
}

/// Immutable, fully wired resource graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceGraph {
    declarations: Vec<ResourceDeclaration>,
    #[serde(skip)]
    index: BTreeMap<ResourceName, usize>,
    exports: BTreeMap<String, ResourceRef>,
}

impl ResourceGraph {
    /// Declarations in declaration (topological) order
    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    pub fn get(&self, name: &ResourceName) -> Option<&ResourceDeclaration> {
        self.index.get(name).map(|&i| &self.declarations[i])
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceDeclaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn exports(&self) -> &BTreeMap<String, ResourceRef> {
        &self.exports
    }

    pub fn export(&self, key: &str) -> Option<&ResourceRef> {
        self.exports.get(key)
    }

    /// Check whether `later` transitively depends on `earlier`
    pub fn happens_after(&self, later: &ResourceName, earlier: &ResourceName) -> bool {
        let mut stack: Vec<&ResourceName> = vec![later];
        let mut visited = BTreeSet::new();

        while let Some(current) = stack.pop() {
            let Some(declaration) = self.get(current) else {
                continue;
            };
            for dependency in &declaration.depends_on {
                if dependency == earlier {
                    return true;
                }
                if visited.insert(dependency) {
                    stack.push(dependency);
                }
            }
        }
        false
    }

    /// Wave number per declaration
    ///
    /// Wave 0 holds resources without dependencies; every other resource sits
    /// one wave after its latest dependency. Resources within a wave are
    /// independent and may be applied concurrently.
    pub fn wave_of(&self) -> BTreeMap<&ResourceName, usize> {
        let mut waves: BTreeMap<&ResourceName, usize> = BTreeMap::new();
        for declaration in &self.declarations {
            let wave = declaration
                .depends_on
                .iter()
                .filter_map(|dependency| waves.get(dependency))
                .map(|w| w + 1)
                .max()
                .unwrap_or(0);
            waves.insert(&declaration.name, wave);
        }
        waves
    }

    /// Declarations grouped by wave, each wave in declaration order
    pub fn waves(&self) -> Vec<Vec<&ResourceDeclaration>> {
        let wave_of = self.wave_of();
        let depth = wave_of.values().max().map_or(0, |max| max + 1);

        let mut waves: Vec<Vec<&ResourceDeclaration>> = vec![Vec::new(); depth];
        for declaration in &self.declarations {
            if let Some(&wave) = wave_of.get(&declaration.name) {
                waves[wave].push(declaration);
            }
        }
        waves
    }
}
