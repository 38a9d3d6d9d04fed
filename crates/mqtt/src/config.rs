//! Broker connection settings.
//!
//! The station fills this struct from its own configuration file; the
//! transport only validates it and turns it into `rumqttc::MqttOptions`.

use std::{fmt, time::Duration};

use validator::Validate;

/// Default broker, matching the ThingSpeak MQTT endpoint.
pub const DEFAULT_HOST: &str = "mqtt.thingspeak.com";
pub const DEFAULT_PORT: u16 = 1883;

/// MQTT connection configuration.
#[derive(Clone, PartialEq, Validate)]
pub struct Config {
    /// Broker hostname or IP address.
    #[validate(length(
        min = 1,
        max = 255,
        message = "Host must be between 1 and 255 characters"
    ))]
    pub host: String,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Broker username. Credentials are only sent when this is non-empty.
    pub username: String,

    pub password: String,

    /// MQTT client identifier. A random UUID is used when empty.
    #[validate(length(max = 256, message = "Client identity must not exceed 256 characters"))]
    pub client_id: String,

    /// Keep-alive interval in seconds.
    #[validate(range(
        min = 5,
        max = 3600,
        message = "Keep alive must be between 5 and 3600 seconds"
    ))]
    pub keep_alive: u64,

    pub clean_session: bool,

    /// How long `connect` waits for the first CONNACK, in seconds.
    #[validate(range(
        min = 1,
        max = 300,
        message = "Connection timeout must be between 1 and 300 seconds"
    ))]
    pub connection_timeout: u64,

    /// Pause between event loop polls after a connection error, in seconds.
    #[validate(range(
        min = 1,
        max = 600,
        message = "Reconnect delay must be between 1 and 600 seconds"
    ))]
    pub reconnect_delay: u64,

    /// Capacity of the client request channel. Publishes beyond this while
    /// the session is down are rejected rather than awaited.
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Request channel capacity must be between 1 and 1000"
    ))]
    pub request_channel_capacity: usize,
}

impl Config {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay)
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            keep_alive: 60,
            clean_session: true,
            connection_timeout: 30,
            reconnect_delay: 5,
            request_channel_capacity: 10,
        }
    }
}

// Hand-written so the password never ends up in debug logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .field("clean_session", &self.clean_session)
            .field("connection_timeout", &self.connection_timeout)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("request_channel_capacity", &self.request_channel_capacity)
            .finish()
    }
}
