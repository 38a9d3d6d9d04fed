//! Fire-and-forget publishing of plain-text payloads.

use rumqttc::{AsyncClient, QoS};
use tracing::trace;

use super::{manager::MqttInstance, TransferError};

/// Sends payloads on the session owned by an `MqttInstance`.
///
/// Messages go out at QoS 0 without retain. `send` never waits for the
/// broker: it only enqueues on the client's request channel, so a full
/// channel (e.g. during a long outage) is reported as an error instead of
/// blocking the caller.
#[derive(Clone)]
pub struct Publisher {
    client: AsyncClient,
}

impl Publisher {
    pub fn new(instance: &MqttInstance) -> Self {
        Self::from_client(instance.client().clone())
    }

    pub fn from_client(client: AsyncClient) -> Self {
        Self { client }
    }

    pub fn send(&self, topic: &str, payload: String) -> Result<(), TransferError> {
        trace!("Enqueue {} bytes for '{}'", payload.len(), topic);
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.into_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::MqttOptions;

    use super::*;

    #[test]
    fn test_send_enqueues_without_blocking() {
        let opts = MqttOptions::new("publisher-test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(opts, 4);
        let publisher = Publisher::from_client(client);

        for value in ["21.5", "48.0", "412"] {
            assert!(publisher
                .send("channels/1/publish/fields/field1/KEY", value.into())
                .is_ok());
        }
    }

    #[test]
    fn test_send_fails_when_channel_full() {
        let opts = MqttOptions::new("publisher-full", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(opts, 1);
        let publisher = Publisher::from_client(client);

        publisher.send("t", "1".into()).unwrap();
        let second = publisher.send("t", "2".into());
        assert!(matches!(second, Err(TransferError::ClientTransfer(_))));
    }
}
