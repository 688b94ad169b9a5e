// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Assembler
//!
//! One role the compute service may assume, a permission policy per
//! capability with exactly one attachment each, and an instance profile
//! wrapping the role. The profile waits on every attachment, so an instance
//! referencing it never boots without its permissions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{name, singleton, ResourceName, ResourceRole, Singleton};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::graph::{GraphBuilder, ResourceDeclaration, ResourceKind, ResourceRef};

/// Policy language version every document is written in
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Service principal a trust statement names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "Service")]
    pub service: String,
}

/// One statement of a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub resource: Vec<String>,
}

impl PolicyStatement {
    /// Allow `service` to assume the role
    pub fn trust(service: impl Into<String>) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            action: vec!["sts:AssumeRole".to_string()],
            principal: Some(Principal {
                service: service.into(),
            }),
            resource: Vec::new(),
        }
    }

    /// Allow `action` on every resource
    pub fn allow_all(action: impl Into<String>) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            action: vec![action.into()],
            principal: None,
            resource: vec!["*".to_string()],
        }
    }
}

/// What a document is used for; decides which fields are mandatory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Trust,
    Permission,
}

/// A trust or permission document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Structural validation
    ///
    /// Trust statements need a non-empty principal; permission statements
    /// need at least one resource. Both need at least one action.
    pub fn validate(&self, kind: DocumentKind) -> SynthesisResult<()> {
        let invalid = |reason: &str| Err(SynthesisError::StructuralValidation(reason.to_string()));

        if self.version != POLICY_VERSION {
            return invalid("unsupported policy version");
        }
        if self.statement.is_empty() {
            return invalid("policy document has no statements");
        }

        for statement in &self.statement {
            if statement.action.is_empty() || statement.action.iter().any(|a| a.trim().is_empty()) {
                return invalid("policy statement has an empty action list");
            }
            match kind {
                DocumentKind::Trust => match &statement.principal {
                    Some(principal) if !principal.service.trim().is_empty() => {}
                    _ => return invalid("trust statement has an empty principal"),
                },
                DocumentKind::Permission => {
                    if statement.resource.is_empty()
                        || statement.resource.iter().any(|r| r.trim().is_empty())
                    {
                        return invalid("permission statement has an empty resource list");
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> SynthesisResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A named permission granted to every node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub label: String,
    pub description: String,
    pub document: PolicyDocument,
}

/// Trust document plus the permission grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySpec {
    pub trust: PolicyDocument,
    pub grants: Vec<PermissionGrant>,
}

impl IdentitySpec {
    /// Compute service trust; full object-store and image-registry access
    pub fn standard() -> Self {
        Self {
            trust: PolicyDocument::new(vec![PolicyStatement::trust("ec2.amazonaws.com")]),
            grants: vec![
                PermissionGrant {
                    label: "object-store".to_string(),
                    description: "Full object storage access".to_string(),
                    document: PolicyDocument::new(vec![PolicyStatement::allow_all("s3:*")]),
                },
                PermissionGrant {
                    label: "image-registry".to_string(),
                    description: "Full container registry access".to_string(),
                    document: PolicyDocument::new(vec![PolicyStatement::allow_all("ecr:*")]),
                },
            ],
        }
    }

    pub fn validate(&self) -> SynthesisResult<()> {
        self.trust.validate(DocumentKind::Trust)?;
        for grant in &self.grants {
            grant.document.validate(DocumentKind::Permission)?;
        }
        Ok(())
    }
}

/// A declared policy and its single attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyBinding {
    pub policy: ResourceName,
    pub attachment: ResourceName,
}

/// Output of the identity step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityBundle {
    pub role: ResourceName,
    pub policies: Vec<PolicyBinding>,
    pub profile: ResourceName,
}

/// Declare role, policies, attachments and the profile
///
/// Documents are validated before anything is declared.
pub fn assemble_identity(
    graph: &mut GraphBuilder,
    spec: &IdentitySpec,
) -> SynthesisResult<IdentityBundle> {
    spec.validate()?;

    let role_name = singleton(Singleton::Role);
    let role = graph.declare(
        ResourceDeclaration::new(ResourceKind::IamRole, role_name.clone())
            .property("name", role_name.as_str())
            .property("assume_role_policy", spec.trust.to_json()?),
    )?;

    let mut policies = Vec::with_capacity(spec.grants.len());
    for (index, grant) in spec.grants.iter().enumerate() {
        let policy_name = name(ResourceRole::PermissionPolicy, index);
        let policy = graph.declare(
            ResourceDeclaration::new(ResourceKind::IamPolicy, policy_name.clone())
                .property("name", format!("{}-{}", policy_name, grant.label))
                .property("description", grant.description.as_str())
                .property("policy", grant.document.to_json()?),
        )?;

        let attachment = graph.declare(
            ResourceDeclaration::new(
                ResourceKind::IamRolePolicyAttachment,
                name(ResourceRole::PolicyAttachment, index),
            )
            .reference("role", ResourceRef::name(&role))
            .reference("policy_arn", ResourceRef::arn(&policy)),
        )?;

        debug!(policy = %policy, grant = %grant.label, "Declared permission policy");
        policies.push(PolicyBinding { policy, attachment });
    }

    let profile_name = singleton(Singleton::InstanceProfile);
    let profile = policies.iter().fold(
        ResourceDeclaration::new(ResourceKind::IamInstanceProfile, profile_name.clone())
            .property("name", profile_name.as_str())
            .reference("role", ResourceRef::name(&role)),
        |declaration, binding| declaration.after(&binding.attachment),
    );
    let profile = graph.declare(profile)?;

    Ok(IdentityBundle {
        role,
        policies,
        profile,
    })
}
