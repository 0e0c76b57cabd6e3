use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::RealtimeEvent;

/// Errors raised while opening or holding the push connection.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
}

/// One signal from the underlying event-stream connection.
#[derive(Debug, Clone)]
pub enum TransportSignal {
    Connected,
    Disconnected,
    /// A transient transport problem. Logged by the channel; does not itself
    /// change connection state.
    ConnectError(String),
    /// A named server event carrying a payload.
    Event {
        name: String,
        event: RealtimeEvent,
    },
}

/// A server-to-client event stream from the push origin.
///
/// The core only depends on signals being deliverable as they happen and on
/// the connection being reopenable; everything else (protocol, auth, framing)
/// belongs to the implementation.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open the stream. Signals arrive on the returned receiver until the
    /// stream ends; a closed receiver counts as a disconnect.
    async fn open(&self) -> Result<mpsc::UnboundedReceiver<TransportSignal>, ChannelError>;
}
