// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Bootstrap Payload
//!
//! The bootstrap script is opaque to synthesis. The only operation on it is
//! `${name}` parameter substitution before it is attached to an instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_SCRIPT: &str = r#"#!/bin/bash
sudo DEBIAN_FRONTEND=noninteractive apt-get update -y
sudo DEBIAN_FRONTEND=noninteractive apt-get upgrade -y
mkdir -p /var/snap/microk8s/common/
cat <<EOT >> /var/snap/microk8s/common/.microk8s.yaml
---
version: 0.1.0
addons:
  - name: dns
  - name: rbac
  - name: ingress
  - name: cert-manager
extraSANs:
  - ${clusterName}.${dnsZoneName}
EOT
snap install microk8s --classic --channel=1.28
snap install aws-cli --classic
usermod -a -G microk8s ubuntu
chown -f -R ubuntu /home/ubuntu/.kube
"#;

/// Templated bootstrap script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapTemplate {
    pub script: String,

    /// Caller-supplied parameters; they take precedence over the values
    /// synthesis supplies (`clusterName`, `dnsZoneName`, `environment`,
    /// `zone`, `nodeIndex`)
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Default for BootstrapTemplate {
    fn default() -> Self {
        Self {
            script: DEFAULT_SCRIPT.to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

impl BootstrapTemplate {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Substitute `${key}` placeholders
    ///
    /// One left-to-right pass: substituted values are never scanned again.
    /// Placeholders without a value are left verbatim; the payload is not
    /// interpreted any further.
    pub fn render(&self, builtins: &BTreeMap<String, String>) -> String {
        let lookup = |key: &str| self.parameters.get(key).or_else(|| builtins.get(key));

        let mut rendered = String::with_capacity(self.script.len());
        let mut rest = self.script.as_str();

        while let Some(start) = rest.find("${") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match lookup(key) {
                        Some(value) => rendered.push_str(value),
                        None => rendered.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    rendered.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}
