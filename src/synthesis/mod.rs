// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Synthesis
//!
//! Computes the complete resource graph for a multi-zone cluster from a
//! [`TopologyInput`]. Synthesis is pure: the same input, catalog and zone
//! table always produce the same graph, and nothing is provisioned here.
//!
//! # Pipeline
//!
//! ```text
//! preflight (no declarations yet)
//!   capacity → record names → listener ports → security rules → identity documents
//!   → key credential / shape → image → DNS zone
//!        │
//!        ▼
//! network ─▶ security ─▶ identity ─▶ compute ─▶ load balancing ─▶ dns
//!        │
//!        ▼
//! bucket, exports ─▶ ResourceGraph
//! ```
//!
//! Every precondition is checked before the first declaration, so a failed
//! run returns exactly one error and no partial graph.

pub mod compute;
pub mod dns;
pub mod identity;
pub mod load_balancing;
pub mod network;
pub mod security;

pub use compute::{ImageCatalog, InstanceNode, InstanceSet, StaticImageCatalog};
pub use dns::{DnsRecord, DnsRecordSet, HostedZoneId, RecordType, StaticZoneResolver, ZoneResolver};
pub use identity::{IdentityBundle, IdentitySpec, PolicyBinding, PolicyDocument, PolicyStatement};
pub use load_balancing::{AttachmentPolicy, FullMesh, LoadBalancingGraph, PortBinding};
pub use network::{NetworkNode, SubnetNode, SubnetPlan};
pub use security::{SecurityGroups, SecurityPolicySet};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{singleton, ImageId, ResourceName, Singleton, TopologyInput};
use crate::errors::SynthesisResult;
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceGraph, ResourceKind, ResourceRef};

/// Export keys published with every graph
pub mod outputs {
    pub const VPC_ID: &str = "vpc_id";
    pub const ADMIN_SECURITY_GROUP_ID: &str = "admin_security_group_id";
    pub const WEB_SECURITY_GROUP_ID: &str = "web_security_group_id";
    pub const BUCKET_ID: &str = "bucket_id";
    pub const GATEWAY_ID: &str = "gateway_id";
}

/// Policies a run is synthesized with
pub struct SynthesisPolicies {
    pub security: SecurityPolicySet,
    pub identity: IdentitySpec,
    pub attachment: Box<dyn AttachmentPolicy>,
}

impl Default for SynthesisPolicies {
    fn default() -> Self {
        Self {
            security: SecurityPolicySet::standard(),
            identity: IdentitySpec::standard(),
            attachment: Box::new(FullMesh),
        }
    }
}

/// Published outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterOutputs {
    pub vpc_id: ResourceRef,
    pub admin_security_group_id: ResourceRef,
    pub web_security_group_id: ResourceRef,
    pub bucket_id: ResourceRef,
    pub gateway_id: ResourceRef,
}

impl ClusterOutputs {
    fn entries(&self) -> [(&'static str, &ResourceRef); 5] {
        [
            (outputs::VPC_ID, &self.vpc_id),
            (outputs::ADMIN_SECURITY_GROUP_ID, &self.admin_security_group_id),
            (outputs::WEB_SECURITY_GROUP_ID, &self.web_security_group_id),
            (outputs::BUCKET_ID, &self.bucket_id),
            (outputs::GATEWAY_ID, &self.gateway_id),
        ]
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesizedTopology {
    pub graph: ResourceGraph,
    pub network: NetworkNode,
    pub security: SecurityGroups,
    pub identity: IdentityBundle,
    pub compute: InstanceSet,
    pub load_balancing: LoadBalancingGraph,
    pub dns: DnsRecordSet,
    pub bucket: ResourceName,
    pub outputs: ClusterOutputs,
}

/// Synthesize with the standard policies and full-mesh attachment
pub fn synthesize(
    input: &TopologyInput,
    catalog: &dyn ImageCatalog,
    zones: &dyn ZoneResolver,
) -> SynthesisResult<SynthesizedTopology> {
    synthesize_with(input, catalog, zones, &SynthesisPolicies::default())
}

/// Synthesize with explicit policies
pub fn synthesize_with(
    input: &TopologyInput,
    catalog: &dyn ImageCatalog,
    zones: &dyn ZoneResolver,
    policies: &SynthesisPolicies,
) -> SynthesisResult<SynthesizedTopology> {
    info!(
        cluster = %input.cluster_name,
        zones = input.zones.len(),
        base_block = %input.base_block,
        ports = ?input.listener_ports,
        "Synthesizing topology"
    );

    let preflight = preflight(input, catalog, zones, policies).map_err(|err| {
        warn!(error = %err, "Preflight failed");
        err
    })?;

    let mut graph = GraphBuilder::new();

    let network = network::build_network(
        &mut graph,
        &input.base_block,
        &input.environment,
        &preflight.plans,
    )?;
    let security = security::build_security_groups(&mut graph, &network, &policies.security)?;
    let identity = identity::assemble_identity(&mut graph, &policies.identity)?;

    let request = compute::ComputeRequest {
        cluster_name: &input.cluster_name,
        environment: &input.environment,
        dns_zone: &input.dns_zone,
        shape: &input.instance_shape,
        image: &preflight.image,
        bootstrap: &input.bootstrap,
    };
    let compute = compute::provision_instances(
        &mut graph,
        &request,
        &network,
        &security,
        &identity,
        &input.public_key,
    )?;

    let load_balancing = load_balancing::wire_load_balancer(
        &mut graph,
        &input.cluster_name,
        &input.environment,
        &input.listener_ports,
        &network,
        &compute,
        policies.attachment.as_ref(),
    )?;

    let dns = dns::publish_records(
        &mut graph,
        &preflight.zone,
        &input.dns_zone,
        &input.cluster_name,
        &load_balancing,
        &compute,
    )?;

    let bucket = graph.declare(
        ResourceDeclaration::new(ResourceKind::Bucket, singleton(Singleton::ArtifactBucket))
            .tags([("Name", "artifact-bucket"), ("env", input.environment.as_str())]),
    )?;

    let outputs = ClusterOutputs {
        vpc_id: ResourceRef::id(&network.network),
        admin_security_group_id: ResourceRef::id(&security.administrative),
        web_security_group_id: ResourceRef::id(&security.web),
        bucket_id: ResourceRef::id(&bucket),
        gateway_id: ResourceRef::id(&network.gateway),
    };
    for (key, target) in outputs.entries() {
        graph.export(key, target.clone())?;
    }

    let graph = graph.finish();
    info!(
        resources = graph.len(),
        waves = graph.waves().len(),
        instances = compute.len(),
        attachments = load_balancing.attachment_count(),
        records = dns.len(),
        "Topology synthesized"
    );

    Ok(SynthesizedTopology {
        graph,
        network,
        security,
        identity,
        compute,
        load_balancing,
        dns,
        bucket,
        outputs,
    })
}

/// Values resolved before the first declaration
struct Preflight {
    plans: Vec<SubnetPlan>,
    image: ImageId,
    zone: HostedZoneId,
}

/// Precondition checks, in reporting order
fn preflight(
    input: &TopologyInput,
    catalog: &dyn ImageCatalog,
    zones: &dyn ZoneResolver,
    policies: &SynthesisPolicies,
) -> SynthesisResult<Preflight> {
    let plans = network::plan_subnets(&input.zones, &input.base_block)?;
    dns::validate_record_names(&input.dns_zone, &input.cluster_name, plans.len())?;
    load_balancing::validate_ports(&input.listener_ports)?;
    policies.security.validate()?;
    policies.identity.validate()?;
    // KeyCredential is validated on construction; the shape is not.
    input.instance_shape.validate()?;
    let image = catalog.resolve(&input.image_filter)?;
    let zone = zones.resolve(&input.dns_zone)?;

    Ok(Preflight { plans, image, zone })
}
