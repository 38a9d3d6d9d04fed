//! Broker session state as observed by the connection kernel.
//!
//! The kernel publishes every transition on a `watch` channel so the station
//! can tell whether a publish has a chance of reaching the broker.

use std::{fmt, time::Duration};

/// Lifecycle of the broker session.
///
/// ```text
/// Connecting ──(CONNACK)──> Connected ──(error)──> Disconnected
///      ^                                               │
///      └──────────── Reconnecting { attempt, delay } <─┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// CONNECT sent, waiting for CONNACK.
    Connecting,

    /// CONNACK accepted; publishes reach the broker.
    Connected,

    /// Session lost. Carries the root cause as reported by the transport.
    Disconnected(String),

    /// Waiting `delay` before poll attempt number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },

    /// The kernel stopped polling after an unrecoverable error.
    Stopped(String),
}

impl ConnectionState {
    /// Short identifier, suitable for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected(_) => "Disconnected",
            ConnectionState::Reconnecting { .. } => "Reconnecting",
            ConnectionState::Stopped(_) => "Stopped",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True once the kernel has given up; the session will not come back.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Stopped(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected(reason) | ConnectionState::Stopped(reason) => {
                write!(f, "{} ({})", self.as_str(), reason)
            }
            ConnectionState::Reconnecting { attempt, delay } => write!(
                f,
                "Reconnecting (attempt {} in {:.1}s)",
                attempt,
                delay.as_secs_f64()
            ),
            _ => f.write_str(self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_as_str() {
        assert_eq!(ConnectionState::Connecting.as_str(), "Connecting");
        assert_eq!(ConnectionState::Connected.as_str(), "Connected");
        assert_eq!(
            ConnectionState::Disconnected("eof".into()).as_str(),
            "Disconnected"
        );
        assert_eq!(
            ConnectionState::Stopped("refused".into()).as_str(),
            "Stopped"
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(
            ConnectionState::Disconnected("broker closed".into()).to_string(),
            "Disconnected (broker closed)"
        );
        assert_eq!(
            ConnectionState::Reconnecting {
                attempt: 3,
                delay: Duration::from_millis(5_000),
            }
            .to_string(),
            "Reconnecting (attempt 3 in 5.0s)"
        );
    }

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(ConnectionState::Stopped("x".into()).is_terminal());
        assert!(!ConnectionState::Disconnected("x".into()).is_terminal());
    }
}
