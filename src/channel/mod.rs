//! Realtime push channel shared by the whole console.
//!
//! The channel provides:
//! - A singleton long-lived connection to the push origin
//! - A reconnection state machine with a fixed delay and a fixed attempt cap
//! - Per-event listener registration with idempotent removal
//!
//! # Architecture
//!
//! Events flow from the transport to listeners through a spawned drive loop:
//! `RealtimeTransport` -> `RealtimeChannel` -> registered listeners. The
//! channel never tears itself down; once the reconnection budget is exhausted
//! it parks in `Failed` until a new acquisition or page reload.

mod event;
mod realtime;
mod sse;
mod transport;

pub use event::{RealtimeEvent, Severity};
pub use realtime::{
    ChannelState, ListenerId, RealtimeChannel, ReconnectPolicy, EVENT_CONNECT,
    EVENT_CONNECT_ERROR, EVENT_DISCONNECT, EVENT_NOTIFICATION,
};
pub use sse::SseTransport;
pub use transport::{ChannelError, RealtimeTransport, TransportSignal};
