//! Channel-addressed publishing on top of the broker transport.

use std::sync::Arc;

use tracing::debug;
use weatherstation_mqtt::TransferError;

use crate::config::station::ChannelConfig;

/// Something that can deliver a payload to a topic.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, topic: &str, payload: String) -> Result<(), TransferError>;
}

#[async_trait::async_trait]
impl Transport for weatherstation_mqtt::Publisher {
    async fn send(&self, topic: &str, payload: String) -> Result<(), TransferError> {
        weatherstation_mqtt::Publisher::send(self, topic, payload)
    }
}

/// `channels/{channel}/publish/fields/field{N}/{writeKey}`
pub fn field_topic(channel: &str, field: u8, write_key: &str) -> String {
    format!(
        "channels/{}/publish/fields/field{}/{}",
        channel, field, write_key
    )
}

/// Publishes field values for one channel.
#[derive(Clone)]
pub struct TelemetryPublisher {
    transport: Arc<dyn Transport>,
    channel: String,
    write_key: String,
}

impl TelemetryPublisher {
    pub fn new(transport: Arc<dyn Transport>, channel: &ChannelConfig) -> Self {
        Self {
            transport,
            channel: channel.channel.clone(),
            write_key: channel.write_key.clone(),
        }
    }

    pub fn topic(&self, field: u8) -> String {
        field_topic(&self.channel, field, &self.write_key)
    }

    /// Sends `payload` as the value of field `field`. The message is only
    /// enqueued; a failure means it was dropped.
    pub async fn publish(&self, field: u8, payload: String) -> Result<(), TransferError> {
        let topic = self.topic(field);
        debug!("Publishing field{} = {}", field, payload);
        self.transport.send(&topic, payload).await
    }
}
