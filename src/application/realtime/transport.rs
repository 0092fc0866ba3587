use super::protocol::ServerMessage;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Client is not keeping up with outbound traffic")]
    Backpressure,
    #[error("Connection closed")]
    Closed,
}

/// Outbound half of one client connection.
///
/// Sends must not block: the hub calls them while holding its registry lock.
pub trait SessionTransport: Send + Sync {
    fn send(&self, message: &ServerMessage) -> Result<(), TransportError>;

    /// Asks the connection to close; a no-op when it already is
    fn close(&self);
}

/// Frames queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(String),
    Close,
}

/// Transport backed by a bounded channel drained by a per-connection writer.
/// A full channel means a stalled client and fails the send.
pub struct ChannelTransport {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl SessionTransport for ChannelTransport {
    fn send(&self, message: &ServerMessage) -> Result<(), TransportError> {
        self.tx
            .try_send(Outbound::Frame(message.to_json()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    fn close(&self) {
        // A full queue is fine; dropping the sender ends the writer as well
        let _ = self.tx.try_send(Outbound::Close);
    }
}
