//! NATS transport for handing synthesized graphs to a remote engine
//!
//! A graph goes out as one ordered batch, flushed before `publish_batch`
//! returns.

use async_nats::{Client, ConnectOptions};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{EngineError, EngineResult};

/// Connection settings for the publishing side
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    /// Client name shown in server monitoring
    pub name: String,
    pub connect_timeout: Duration,
}

impl NatsConfig {
    /// Settings for a single server URL
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            servers: vec![url.into()],
            ..Self::default()
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cluster-synth".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Publishing connection
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    pub async fn new(config: NatsConfig) -> EngineResult<Self> {
        let options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.servers.join(","), options)
            .await
            .map_err(|e| EngineError::NatsConnection(e.to_string()))?;

        info!(servers = ?config.servers, name = %config.name, "Connected to NATS");
        Ok(Self { client })
    }

    /// Publish `(subject, payload)` pairs in order, then flush
    ///
    /// Stops at the first failed publish; messages already sent stay sent.
    /// Returns the number of messages published.
    pub async fn publish_batch<T>(&self, messages: &[(String, T)]) -> EngineResult<usize>
    where
        T: Serialize,
    {
        for (sequence, (subject, payload)) in messages.iter().enumerate() {
            let body = serde_json::to_vec(payload)?;

            self.client
                .publish(subject.clone(), body.into())
                .await
                .map_err(|e| EngineError::NatsPublish(format!("{subject}: {e}")))?;
            debug!(%subject, sequence, "Published");
        }

        self.client
            .flush()
            .await
            .map_err(|e| EngineError::NatsPublish(e.to_string()))?;
        Ok(messages.len())
    }
}
