//! Client builder for configuring reconnection and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring a [`Client`]
//! before its first `connect()`. It allows you to:
//! - Pick the reconnection strategy (default: 1 s, 2 s, 4 s, 8 s, 16 s, stop)
//! - Configure observability (OpenTelemetry)
//! - Set the service name for telemetry
//!
//! # Examples
//!
//! ```rust,no_run
//! use clueline_client::{ClientBuilder, FixedDelay};
//! use std::time::Duration;
//!
//! # async fn example() -> clueline_core::Result<()> {
//! // Default backoff, connect immediately
//! let client = ClientBuilder::new().connect("ws://localhost:8080/ws").await?;
//!
//! // Custom strategy and telemetry, connect later
//! let client2 = ClientBuilder::new()
//!     .with_reconnect(Box::new(FixedDelay::new(Duration::from_secs(2)).with_max_attempts(3)))
//!     .with_default_observability()
//!     .service_name("game-room")
//!     .build()?;
//! client2.connect("ws://localhost:8080/ws").await?;
//! # Ok(())
//! # }
//! ```

use crate::reconnect::{ExponentialBackoff, NoReconnect, ReconnectionStrategy};
use crate::{Client, ClientMetrics};
use clueline_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder {
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    enable_reconnect: bool,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    enable_metrics: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Builder with the default exponential backoff
    pub fn new() -> Self {
        Self {
            reconnect_strategy: None,
            enable_reconnect: true,
            observability_config: None,
            service_name: None,
            enable_metrics: false,
        }
    }

    /// Reconnect with the given strategy
    pub fn with_reconnect(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.reconnect_strategy = Some(strategy);
        self.enable_reconnect = true;
        self
    }

    /// Reconnect with the default exponential backoff
    pub fn with_default_reconnect(mut self) -> Self {
        self.reconnect_strategy = Some(Box::new(ExponentialBackoff::default()));
        self.enable_reconnect = true;
        self
    }

    /// Never reconnect; the first unplanned close leaves the client Failed
    pub fn without_reconnect(mut self) -> Self {
        self.enable_reconnect = false;
        self.reconnect_strategy = None;
        self
    }

    /// Initialize OpenTelemetry with a custom configuration on `build()`
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Initialize OpenTelemetry with the default configuration on `build()`
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Service name for telemetry
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record client metrics on the global meter provider
    ///
    /// Implied by `with_observability`; use this alone when the
    /// application installs its own provider.
    pub fn with_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Build an idle client
    pub fn build(self) -> Result<Client> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            clueline_core::init_observability(config.clone())
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else if self.enable_metrics {
            let name = self.service_name.unwrap_or_else(|| "clueline".to_string());
            Some(Arc::new(ClientMetrics::new(name)))
        } else {
            None
        };

        let strategy: Box<dyn ReconnectionStrategy> = if self.enable_reconnect {
            self.reconnect_strategy
                .unwrap_or_else(|| Box::new(ExponentialBackoff::default()))
        } else {
            Box::new(NoReconnect)
        };

        Ok(Client::new(strategy, metrics))
    }

    /// Build the client and connect it to `url`
    pub async fn connect(self, url: impl Into<String>) -> Result<Client> {
        let client = self.build()?;
        client.connect(url).await?;
        Ok(client)
    }
}
