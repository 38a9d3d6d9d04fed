//! Entry point: turn a `Config` into a live broker session.
//!
//! ```ignore
//! let instance = MqttManager::from_config(config)?.connect().await?;
//! let publisher = Publisher::new(&instance);
//! publisher.send("channels/1/publish/fields/field1/KEY", "21.5".into())?;
//! ```

use rumqttc::AsyncClient;
use tokio::sync::watch;
use tracing::{error, info};
use validator::Validate;

use super::{
    client::ClientBuilder, config::Config, connection::ConnectionKernel, error::TransferError,
    state::ConnectionState,
};

pub struct MqttManager {
    config: Config,
}

impl MqttManager {
    /// Validates the configuration and prepares a manager.
    pub fn from_config(config: Config) -> Result<Self, TransferError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Connects to the broker and hands the event loop to a background kernel.
    ///
    /// Waits for the first CONNACK for at most `connection_timeout`. There is
    /// no retry: any failure here is returned to the caller, which treats it
    /// as fatal.
    pub async fn connect(self) -> Result<MqttInstance, TransferError> {
        info!(
            "Connecting to {}:{} (keep alive {}s)",
            self.config.host, self.config.port, self.config.keep_alive
        );

        let builder = ClientBuilder::from_config(&self.config)?;
        let client_id = builder.client_id();
        let (client, event_loop) = builder.build()?;

        let mut kernel = ConnectionKernel::new(event_loop, self.config.reconnect_delay());
        let state_rx = kernel.subscribe_state();

        let timeout = self.config.connection_timeout();
        match tokio::time::timeout(timeout, kernel.wait_for_connack()).await {
            Ok(result) => result?,
            Err(_) => return Err(TransferError::Timeout(timeout)),
        }

        info!("Connected to broker as '{}'", client_id);

        tokio::spawn(async move {
            if let Err(e) = kernel.run().await {
                error!("Connection kernel terminated: {}", e);
            }
        });

        Ok(MqttInstance {
            client,
            client_id,
            state_rx,
        })
    }
}

/// A connected session. The kernel task driving it runs detached and
/// reports through the state channel.
pub struct MqttInstance {
    client: AsyncClient,
    client_id: String,
    state_rx: watch::Receiver<ConnectionState>,
}

impl MqttInstance {
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Receiver for connection state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    #[test]
    fn test_manager_rejects_invalid_config() {
        let config = Config {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(
            MqttManager::from_config(config),
            Err(TransferError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_error() {
        // Bind then drop to get a local port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = Config {
            host: "127.0.0.1".into(),
            port,
            client_id: "refused-test".into(),
            connection_timeout: 5,
            ..Default::default()
        };

        let result = MqttManager::from_config(config).unwrap().connect().await;
        assert!(matches!(result, Err(TransferError::ClientConnection(_))));
    }

    #[tokio::test]
    async fn test_connect_times_out_without_connack() {
        // A listener that accepts but never answers CONNECT.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _silent = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = Config {
            host: "127.0.0.1".into(),
            port,
            client_id: "timeout-test".into(),
            connection_timeout: 1,
            ..Default::default()
        };

        let result = MqttManager::from_config(config).unwrap().connect().await;
        assert!(matches!(result, Err(TransferError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_connect_reports_connected_state() {
        // Minimal broker: swallow CONNECT, answer with an accepting CONNACK.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _broker = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = Config {
            host: "127.0.0.1".into(),
            port,
            client_id: "state-test".into(),
            connection_timeout: 5,
            ..Default::default()
        };

        let instance = MqttManager::from_config(config)
            .unwrap()
            .connect()
            .await
            .unwrap();
        assert_eq!(instance.client_id(), "state-test");
        assert!(instance.state_receiver().borrow().is_connected());
    }
}
