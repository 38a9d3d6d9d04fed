//! # weatherstation-mqtt: broker transport for the weatherstation daemon
//!
//! A thin layer over `rumqttc` that gives the station exactly what it needs:
//!
//! - **Startup connect** that waits for CONNACK with a timeout and fails
//!   fast, so the daemon can exit instead of sampling into the void
//! - **Connection kernel** on a background task that keeps the session alive
//!   (keep-alive pings, transport reconnects) and reports state changes
//! - **Fire-and-forget publisher** for plain-text payloads at QoS 0
//!
//! ```ignore
//! use weatherstation_mqtt::{Config, MqttManager, Publisher};
//!
//! let instance = MqttManager::from_config(Config::default())?.connect().await?;
//! let publisher = Publisher::new(&instance);
//! publisher.send("channels/42/publish/fields/field2/KEY", "21.4".into())?;
//! ```
//!
//! # Connection lifecycle
//!
//! ```text
//! connect() ── CONNACK ──> Connected ── error ──> Disconnected
//!                              ^                      │
//!                              └──── Reconnecting <───┘
//! ```
//!
//! Fatal errors (bad credentials, protocol violations) move the kernel to
//! `Stopped`; later publishes fail and are reported to the caller.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod publisher;
pub mod state;

pub use client::ClientBuilder;
pub use config::Config;
pub use connection::ConnectionKernel;
pub use error::TransferError;
pub use manager::{MqttInstance, MqttManager};
pub use publisher::Publisher;
pub use state::ConnectionState;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransferError>;
