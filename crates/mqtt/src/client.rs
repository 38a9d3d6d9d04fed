//! MQTT client construction.
//!
//! `ClientBuilder` wraps `rumqttc::MqttOptions` with a fluent API and yields
//! the `(AsyncClient, EventLoop)` pair. The client is cheap to clone and is
//! what the publisher holds; the event loop is driven by the connection
//! kernel on its own task.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use validator::Validate;

use super::{config::Config, error::TransferError};

pub struct ClientBuilder {
    opts: MqttOptions,

    /// Request channel capacity handed to `AsyncClient::new`.
    cap: usize,
}

impl ClientBuilder {
    /// Creates a builder with protocol defaults.
    ///
    /// # Errors
    ///
    /// `ClientSetup` if `client_id` is empty or starts with a space;
    /// `rumqttc` would panic on such an identifier.
    pub fn new(
        client_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        cap: usize,
    ) -> Result<Self, TransferError> {
        let client_id = client_id.into();
        if client_id.is_empty() || client_id.starts_with(' ') {
            return Err(TransferError::ClientSetup(format!(
                "Invalid client identity: '{}'",
                client_id
            )));
        }

        Ok(Self {
            opts: MqttOptions::new(client_id, host, port),
            cap,
        })
    }

    /// Creates a builder from validated broker configuration.
    ///
    /// An empty `client_id` is replaced by a random UUID.
    pub fn from_config(config: &Config) -> Result<Self, TransferError> {
        config.validate()?;

        let client_id = if config.client_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            config.client_id.clone()
        };

        let mut builder = Self::new(
            client_id,
            config.host.clone(),
            config.port,
            config.request_channel_capacity,
        )?
        .keep_alive(config.keep_alive)
        .clean_session(config.clean_session);

        if config.has_credentials() {
            builder = builder.credentials(config.username.clone(), config.password.clone());
        }

        Ok(builder)
    }

    pub fn keep_alive(mut self, secs: u64) -> Self {
        self.opts.set_keep_alive(Duration::from_secs(secs));
        self
    }

    pub fn clean_session(mut self, clean: bool) -> Self {
        self.opts.set_clean_session(clean);
        self
    }

    /// Sets username/password for the CONNECT packet.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.opts.set_credentials(username, password);
        self
    }

    pub fn client_id(&self) -> String {
        self.opts.client_id()
    }

    /// Consumes the builder and creates the client and its event loop.
    ///
    /// No network traffic happens here; the first `EventLoop::poll` connects.
    pub fn build(self) -> Result<(AsyncClient, EventLoop), TransferError> {
        Ok(AsyncClient::new(self.opts, self.cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_empty_identity() {
        let result = ClientBuilder::new("", "localhost", 1883, 10);
        assert!(matches!(result, Err(TransferError::ClientSetup(_))));
    }

    #[test]
    fn test_builder_chain_methods() {
        let builder = ClientBuilder::new("station-1", "localhost", 1883, 10)
            .expect("Failed to create ClientBuilder")
            .keep_alive(60)
            .clean_session(true)
            .credentials("user", "pass");

        assert_eq!(builder.cap, 10);
        assert_eq!(builder.client_id(), "station-1");
    }

    #[tokio::test]
    async fn test_build_from_config_generates_identity() {
        let config = Config {
            host: "localhost".into(),
            client_id: String::new(),
            ..Default::default()
        };

        let builder = ClientBuilder::from_config(&config).expect("valid config");
        assert!(!builder.client_id().is_empty());
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_build_from_config_invalid() {
        let config = Config {
            host: String::new(),
            ..Default::default()
        };

        let result = ClientBuilder::from_config(&config);
        assert!(matches!(result, Err(TransferError::ConfigError(_))));
    }
}
