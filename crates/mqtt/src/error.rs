//! Error type for the broker transport.
//!
//! Startup errors (`ClientSetup`, `ConfigError`, `ClientConnection`,
//! `Timeout`) are fatal for the station; `ClientTransfer` is returned per
//! publish and is only logged by the caller.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// The client could not be constructed from the configuration.
    #[error("Client setup error: {0}")]
    ClientSetup(String),

    /// Broker configuration failed validation.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] validator::ValidationErrors),

    /// The request could not be queued on the client (channel full or the
    /// event loop is gone).
    #[error("Client transfer error: {0}")]
    ClientTransfer(#[from] rumqttc::ClientError),

    /// Network or protocol failure while talking to the broker.
    ///
    /// Boxed to keep the enum small.
    #[error("Client connection error: {0}")]
    ClientConnection(#[from] Box<rumqttc::ConnectionError>),

    /// The broker answered CONNECT with something other than success.
    #[error("Connection refused by broker: {0:?}")]
    Refused(rumqttc::ConnectReturnCode),

    /// No CONNACK arrived within the configured connection timeout.
    #[error("No CONNACK from broker within {0:?}")]
    Timeout(Duration),
}

impl From<rumqttc::ConnectionError> for TransferError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        TransferError::ClientConnection(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = TransferError::ClientSetup("empty host".into());
        assert_eq!(err.to_string(), "Client setup error: empty host");
    }

    #[test]
    fn test_timeout_display() {
        let err = TransferError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "No CONNACK from broker within 30s");
    }

    #[test]
    fn test_from_connection_error_is_boxed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: TransferError = rumqttc::ConnectionError::Io(io).into();
        assert!(matches!(err, TransferError::ClientConnection(_)));
        assert!(err.to_string().contains("refused"));
    }
}
