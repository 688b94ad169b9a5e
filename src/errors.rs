//! Error types for topology synthesis and provisioning

use thiserror::Error;

use crate::domain::{DnsName, DnsNameError, NetworkError, Port, ResourceName};
use crate::graph::ResourceRef;

/// Fatal synthesis errors
///
/// Every variant aborts graph construction at first detection. Synthesis
/// returns either a complete graph or exactly one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The zone count cannot be partitioned out of the base address block
    #[error("Capacity exceeded: {requested} zones requested, {base_block} admits {capacity} /24 subnets")]
    CapacityExceeded {
        requested: usize,
        capacity: u64,
        base_block: String,
    },

    /// The image catalog returned no candidate for the filter
    #[error("No image matches owner {owner:?} and name pattern {pattern:?}")]
    NoMatchingImage { owner: String, pattern: String },

    /// The same listener port was declared more than once
    #[error("Duplicate listener port: {0}")]
    DuplicateListenerPort(Port),

    /// The DNS zone reference could not be resolved
    #[error("DNS zone not found: {0}")]
    ZoneNotFound(DnsName),

    /// Malformed rule set, policy document or other structural input
    #[error("Structural validation failed: {0}")]
    StructuralValidation(String),
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl From<NetworkError> for SynthesisError {
    fn from(err: NetworkError) -> Self {
        SynthesisError::StructuralValidation(err.to_string())
    }
}

impl From<DnsNameError> for SynthesisError {
    fn from(err: DnsNameError) -> Self {
        SynthesisError::StructuralValidation(err.to_string())
    }
}

impl From<serde_json::Error> for SynthesisError {
    fn from(err: serde_json::Error) -> Self {
        SynthesisError::StructuralValidation(format!("document serialization: {err}"))
    }
}

/// Errors at the provisioning-engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A resource was reached before one of its dependencies was applied
    #[error("Resource {resource} applied before its dependency {dependency}")]
    UnresolvedReference {
        resource: ResourceName,
        dependency: ResourceName,
    },

    /// A property references an attribute the target never exposes
    #[error("Resource {resource} references unavailable attribute {reference}")]
    UnavailableAttribute {
        resource: ResourceName,
        reference: ResourceRef,
    },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<async_nats::Error> for EngineError {
    fn from(err: async_nats::Error) -> Self {
        EngineError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_block() {
        let err = SynthesisError::CapacityExceeded {
            requested: 3,
            capacity: 1,
            base_block: "10.0.0.0/24".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Capacity exceeded: 3 zones requested, 10.0.0.0/24 admits 1 /24 subnets"
        );
    }

    #[test]
    fn test_network_error_is_structural() {
        let err: SynthesisError = NetworkError::InvalidPort(0).into();
        assert!(matches!(err, SynthesisError::StructuralValidation(_)));
    }

    #[test]
    fn test_engine_error_messages() {
        let err = EngineError::UnresolvedReference {
            resource: crate::domain::singleton(crate::domain::Singleton::Gateway),
            dependency: crate::domain::singleton(crate::domain::Singleton::Network),
        };
        assert_eq!(
            err.to_string(),
            "Resource internet-gateway applied before its dependency vpc"
        );

        let err: EngineError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
