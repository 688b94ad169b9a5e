// Copyright (c) 2025 - Cowboy AI, Inc.
//! Run configuration
//!
//! A [`SynthesisManifest`] bundles everything `synthesize` needs in one JSON
//! document: the topology input, the image candidates the catalog offers,
//! and the hosted zones the DNS step may publish into. [`EngineConfig`]
//! carries where the result goes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{ImageCandidate, TopologyInput};
use crate::errors::{EngineError, EngineResult, SynthesisResult};
use crate::nats::NatsConfig;
use crate::subjects::{is_valid_root, TOPOLOGY_ROOT};
use crate::synthesis::{StaticImageCatalog, StaticZoneResolver};

/// Self-contained synthesis request
///
/// ```json
/// {
///   "input": { "zones": ["us-east-1a"], "public_key": "ssh-ed25519 ...", "dns_zone": "aws.domain.com" },
///   "images": [{ "id": "ami-1", "name": "ubuntu/...", "owner": "099720109477", "created_at": "2024-01-01T00:00:00Z" }],
///   "hosted_zones": { "aws.domain.com": "Z0123456789" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisManifest {
    pub input: TopologyInput,
    #[serde(default)]
    pub images: Vec<ImageCandidate>,
    #[serde(default)]
    pub hosted_zones: StaticZoneResolver,
}

impl SynthesisManifest {
    /// Parse a manifest; malformed documents are structural errors
    pub fn from_json(json: &str) -> SynthesisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn catalog(&self) -> StaticImageCatalog {
        StaticImageCatalog::new(self.images.iter().cloned())
    }

    pub fn zones(&self) -> &StaticZoneResolver {
        &self.hosted_zones
    }
}

/// Where synthesized graphs are read from and sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// NATS server URL; publishing is skipped when unset
    pub nats_url: Option<String>,
    /// Subject root for published events
    pub subject_root: String,
    /// Manifest path
    pub topology_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nats_url: None,
            subject_root: TOPOLOGY_ROOT.to_string(),
            topology_file: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// `NATS_URL`, `TOPOLOGY_SUBJECT_ROOT` (default `topology`) and
    /// `TOPOLOGY_FILE`.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let subject_root =
            non_empty("TOPOLOGY_SUBJECT_ROOT").unwrap_or_else(|| TOPOLOGY_ROOT.to_string());
        if !is_valid_root(&subject_root) {
            return Err(EngineError::Configuration(format!(
                "TOPOLOGY_SUBJECT_ROOT is not a valid subject prefix: {subject_root:?}"
            )));
        }

        Ok(Self {
            nats_url: non_empty("NATS_URL"),
            subject_root,
            topology_file: non_empty("TOPOLOGY_FILE").map(PathBuf::from),
        })
    }

    /// NATS connection settings, when publishing is enabled
    pub fn nats(&self) -> Option<NatsConfig> {
        self.nats_url.as_deref().map(NatsConfig::for_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::{ImageCatalog, ZoneResolver};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.nats().is_none());
    }

    #[test]
    fn test_reads_variables() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("NATS_URL", "nats://10.0.0.5:4222"),
            ("TOPOLOGY_SUBJECT_ROOT", "prod.topology"),
            ("TOPOLOGY_FILE", "/etc/cluster.json"),
        ]))
        .unwrap();

        assert_eq!(config.subject_root, "prod.topology");
        assert_eq!(config.topology_file, Some(PathBuf::from("/etc/cluster.json")));
        assert_eq!(config.nats().unwrap().servers, vec!["nats://10.0.0.5:4222"]);
    }

    #[test]
    fn test_rejects_wildcard_root() {
        let err = EngineConfig::from_lookup(lookup(&[("TOPOLOGY_SUBJECT_ROOT", "topology.>")]));
        assert!(matches!(err, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_manifest_from_json() {
        let manifest = SynthesisManifest::from_json(
            r#"{
                "input": {
                    "zones": ["us-east-1a", "us-east-1b"],
                    "public_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINWO9EKfPEQCbFV9VGl/GCp1cRfEugz/Yr36ch6yKd4p admin",
                    "dns_zone": "aws.domain.com"
                },
                "images": [{
                    "id": "ami-0123",
                    "name": "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-20240101",
                    "owner": "099720109477",
                    "created_at": "2024-01-01T00:00:00Z"
                }],
                "hosted_zones": { "aws.domain.com": "Z0123456789" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.input.zones.len(), 2);
        assert_eq!(
            manifest.catalog().resolve(&manifest.input.image_filter).unwrap().as_str(),
            "ami-0123"
        );
        assert!(manifest.zones().resolve(&manifest.input.dns_zone).is_ok());
    }

    #[test]
    fn test_manifest_rejects_malformed_json() {
        assert!(SynthesisManifest::from_json("{").is_err());
        assert!(SynthesisManifest::from_json(r#"{"input": {"zones": []}}"#).is_err());
    }
}
