//! Connection kernel: the task that drives the `rumqttc` event loop.
//!
//! `rumqttc` only makes progress (CONNECT, keep-alive pings, outgoing
//! publishes, reconnection) while `EventLoop::poll` is being called. The
//! kernel does that in a loop, sleeps `reconnect_delay` after transient
//! errors, stops on fatal ones, and reports every transition on a `watch`
//! channel.

use std::time::Duration;

use rumqttc::{ConnectReturnCode, ConnectionError, Event, EventLoop, Packet};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use super::{error::TransferError, state::ConnectionState};

pub struct ConnectionKernel {
    event_loop: EventLoop,
    reconnect_delay: Duration,
    attempts: u32,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionKernel {
    pub fn new(event_loop: EventLoop, reconnect_delay: Duration) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        Self {
            event_loop,
            reconnect_delay,
            attempts: 0,
            state_tx,
            state_rx,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Broadcasts `state` if it differs from the current one.
    fn update_state(&self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current != state {
                *current = state.clone();
                true
            } else {
                false
            }
        });

        if changed {
            info!("Broker connection: {}", state);
        }
    }

    /// Polls until the broker accepts the session.
    ///
    /// Used once at startup. Any error here is returned to the caller rather
    /// than retried.
    pub async fn wait_for_connack(&mut self) -> Result<(), TransferError> {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        self.attempts = 0;
                        self.update_state(ConnectionState::Connected);
                        return Ok(());
                    }
                    self.update_state(ConnectionState::Stopped(format!("{:?}", ack.code)));
                    return Err(TransferError::Refused(ack.code));
                }
                Ok(event) => trace!("Event before CONNACK: {:?}", event),
                Err(ConnectionError::ConnectionRefused(code)) => {
                    self.update_state(ConnectionState::Stopped(format!("{:?}", code)));
                    return Err(TransferError::Refused(code));
                }
                Err(e) => {
                    self.update_state(ConnectionState::Stopped(root_cause(&e)));
                    return Err(e.into());
                }
            }
        }
    }

    /// Drives the event loop until a fatal error occurs.
    ///
    /// Transient failures are followed by a fixed `reconnect_delay`; the next
    /// poll makes `rumqttc` reconnect on its own.
    pub async fn run(mut self) -> Result<(), TransferError> {
        debug!("Connection kernel running");
        loop {
            match self.event_loop.poll().await {
                Ok(event) => self.handle_event(event),
                Err(e) => {
                    let reason = root_cause(&e);
                    if is_fatal_error(&e) {
                        error!("Fatal broker connection error, kernel stopping: {}", reason);
                        self.update_state(ConnectionState::Stopped(reason));
                        return Err(e.into());
                    }

                    self.update_state(ConnectionState::Disconnected(reason));
                    self.attempts = self.attempts.saturating_add(1);
                    self.update_state(ConnectionState::Reconnecting {
                        attempt: self.attempts,
                        delay: self.reconnect_delay,
                    });
                    tokio::time::sleep(self.reconnect_delay).await;
                    self.update_state(ConnectionState::Connecting);
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    self.attempts = 0;
                    self.update_state(ConnectionState::Connected);
                } else {
                    warn!("Broker rejected session: {:?}", ack.code);
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("Disconnected by broker");
                self.update_state(ConnectionState::Disconnected(
                    "Disconnected by broker".into(),
                ));
            }
            Event::Incoming(Packet::PingResp) => {}
            Event::Incoming(packet) => trace!("Incoming packet: {:?}", packet),
            Event::Outgoing(outgoing) => trace!("Outgoing packet: {:?}", outgoing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    // Retrying cannot succeed without a configuration change
    Fatal,
    Reconnect,
}

fn classify_connection_error(err: &ConnectionError) -> Disposition {
    use Disposition::*;

    match err {
        ConnectionError::MqttState(_) => Fatal,
        ConnectionError::NotConnAck(_) => Fatal,
        ConnectionError::RequestsDone => Fatal,

        ConnectionError::Io(e) => match e.kind() {
            std::io::ErrorKind::AddrInUse
            | std::io::ErrorKind::PermissionDenied
            | std::io::ErrorKind::InvalidInput => Fatal,
            _ => Reconnect,
        },

        ConnectionError::NetworkTimeout | ConnectionError::FlushTimeout => Reconnect,

        ConnectionError::ConnectionRefused(code) => match code {
            ConnectReturnCode::RefusedProtocolVersion
            | ConnectReturnCode::BadClientId
            | ConnectReturnCode::BadUserNamePassword
            | ConnectReturnCode::NotAuthorized => Fatal,
            _ => Reconnect,
        },

        #[allow(unreachable_patterns)]
        _ => Reconnect,
    }
}

fn is_fatal_error(err: &ConnectionError) -> bool {
    matches!(classify_connection_error(err), Disposition::Fatal)
}

/// Innermost message of an error chain, without surrounding quotes.
fn root_cause(e: &dyn std::error::Error) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string().trim_matches('"').to_string()
}
