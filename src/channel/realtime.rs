use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use super::event::{RealtimeEvent, Severity};
use super::transport::{RealtimeTransport, TransportSignal};
use super::SseTransport;

/// Built-in lifecycle event names.
pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";
pub const EVENT_CONNECT_ERROR: &str = "connect_error";
/// Domain event carrying server-pushed notifications.
pub const EVENT_NOTIFICATION: &str = "notification";

/// Push origin used by the shared connection when not overridden.
const DEFAULT_ORIGIN: &str = "http://localhost:8080/realtime";

/// Connection state of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Disconnected => write!(f, "disconnected"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Connected => write!(f, "connected"),
            ChannelState::Reconnecting => write!(f, "reconnecting"),
            ChannelState::Failed => write!(f, "failed"),
        }
    }
}

/// Fixed-delay, fixed-cap reconnection policy. No backoff growth.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

pub type ListenerId = Uuid;

type EventListener = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

static SHARED: OnceLock<Arc<RealtimeChannel>> = OnceLock::new();

/// Long-lived push connection with a reconnection state machine.
///
/// The deployed console holds exactly one of these per process: independent
/// connections would duplicate every pushed event across listeners, so
/// [`RealtimeChannel::acquire`] lazily creates the shared instance and every
/// later acquisition returns the same connection. The channel is never
/// explicitly torn down.
pub struct RealtimeChannel {
    state: Mutex<ChannelState>,
    listeners: DashMap<String, Vec<(ListenerId, EventListener)>>,
}

impl RealtimeChannel {
    /// Get the process-wide shared channel, creating and connecting it on
    /// first use. Must be called from within a tokio runtime.
    ///
    /// The push origin comes from `OPSDESK_REALTIME_ORIGIN` when set.
    pub fn acquire() -> Arc<RealtimeChannel> {
        SHARED
            .get_or_init(|| {
                let origin = std::env::var("OPSDESK_REALTIME_ORIGIN")
                    .unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
                Self::connect(Arc::new(SseTransport::new(origin)), ReconnectPolicy::default())
            })
            .clone()
    }

    /// Create a channel over `transport` and start its drive loop.
    ///
    /// Used directly by tests and embedded setups; production code goes
    /// through [`RealtimeChannel::acquire`].
    pub fn connect(
        transport: Arc<dyn RealtimeTransport>,
        policy: ReconnectPolicy,
    ) -> Arc<RealtimeChannel> {
        let channel = Arc::new(RealtimeChannel {
            state: Mutex::new(ChannelState::Connecting),
            listeners: DashMap::new(),
        });

        let driver = channel.clone();
        tokio::spawn(async move {
            drive(driver, transport, policy).await;
        });

        channel
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock().expect("channel state mutex poisoned")
    }

    fn set_state(&self, next: ChannelState) {
        let mut state = self.state.lock().expect("channel state mutex poisoned");
        if *state != next {
            tracing::debug!("realtime channel {} -> {}", *state, next);
            *state = next;
        }
    }

    /// Register a listener for a named event. Multiple independent listeners
    /// per event are supported.
    pub fn on(
        &self,
        event: &str,
        listener: impl Fn(&RealtimeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener. Idempotent: removing an unknown or already
    /// detached listener is a no-op and never disturbs other listeners.
    pub fn off(&self, event: &str, id: ListenerId) {
        if let Some(mut entry) = self.listeners.get_mut(event) {
            entry.retain(|(listener_id, _)| *listener_id != id);
        }
    }

    pub(crate) fn emit(&self, event: &str, payload: &RealtimeEvent) {
        // Snapshot so a listener may (un)register without deadlocking the map.
        let snapshot = self.listeners.get(event).map(|entry| entry.clone());
        if let Some(listeners) = snapshot {
            for (_, listener) in &listeners {
                listener(payload);
            }
        }
    }
}

/// Drive loop: owns the transport and applies the reconnection policy.
async fn drive(
    channel: Arc<RealtimeChannel>,
    transport: Arc<dyn RealtimeTransport>,
    policy: ReconnectPolicy,
) {
    let mut attempts: u32 = 0;

    loop {
        match transport.open().await {
            Ok(mut rx) => {
                while let Some(signal) = rx.recv().await {
                    match signal {
                        TransportSignal::Connected => {
                            channel.set_state(ChannelState::Connected);
                            attempts = 0;
                            channel.emit(EVENT_CONNECT, &lifecycle_event("connected"));
                        }
                        TransportSignal::ConnectError(message) => {
                            // Logged only; the reconnection loop governs state.
                            tracing::warn!("realtime connect error: {message}");
                            channel.emit(EVENT_CONNECT_ERROR, &lifecycle_event(&message));
                        }
                        TransportSignal::Disconnected => {
                            channel.emit(EVENT_DISCONNECT, &lifecycle_event("disconnected"));
                            break;
                        }
                        TransportSignal::Event { name, event } => {
                            channel.emit(&name, &event);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("realtime transport open failed: {e}");
                channel.emit(EVENT_CONNECT_ERROR, &lifecycle_event(&e.to_string()));
            }
        }

        attempts += 1;
        if attempts > policy.max_attempts {
            channel.set_state(ChannelState::Failed);
            tracing::warn!(
                "realtime channel failed after {} reconnect attempts",
                policy.max_attempts
            );
            return;
        }

        channel.set_state(ChannelState::Reconnecting);
        tracing::debug!(
            "realtime reconnect attempt {attempts}/{} in {:?}",
            policy.max_attempts,
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
    }
}

fn lifecycle_event(message: &str) -> RealtimeEvent {
    RealtimeEvent::new(Severity::Default, message)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::channel::ChannelError;

    use super::*;

    /// Transport whose `open` calls replay pre-scripted signal batches.
    ///
    /// Senders are kept alive so a session only ends through an explicit
    /// `Disconnected` signal, matching a held-open stream.
    struct ScriptedTransport {
        scripts: Mutex<Vec<Vec<TransportSignal>>>,
        held_open: Mutex<Vec<mpsc::UnboundedSender<TransportSignal>>>,
    }

    impl ScriptedTransport {
        fn new(scripts: Vec<Vec<TransportSignal>>) -> Self {
            Self {
                scripts: Mutex::new(scripts),
                held_open: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RealtimeTransport for ScriptedTransport {
        async fn open(&self) -> Result<mpsc::UnboundedReceiver<TransportSignal>, ChannelError> {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                return Err(ChannelError::Connect("no more scripted sessions".to_string()));
            }
            let signals = scripts.remove(0);
            let (tx, rx) = mpsc::unbounded_channel();
            for signal in signals {
                let _ = tx.send(signal);
            }
            self.held_open.lock().unwrap().push(tx);
            Ok(rx)
        }
    }

    fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            delay: Duration::from_millis(5),
        }
    }

    async fn wait_for_state(channel: &RealtimeChannel, expected: ChannelState) {
        for _ in 0..200 {
            if channel.state() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("channel never reached {expected}, stuck at {}", channel.state());
    }

    #[tokio::test]
    async fn connects_and_delivers_events() {
        let hits = Arc::new(AtomicUsize::new(0));
        let transport = ScriptedTransport::new(vec![vec![
            TransportSignal::Connected,
            TransportSignal::Event {
                name: EVENT_NOTIFICATION.to_string(),
                event: RealtimeEvent::new(Severity::Info, "first"),
            },
        ]]);

        let channel = RealtimeChannel::connect(Arc::new(transport), fast_policy(0));
        let seen = hits.clone();
        channel.on(EVENT_NOTIFICATION, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        wait_for_state(&channel, ChannelState::Connected).await;
        // The notification may land just after the state flip.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_parks_in_failed() {
        // Every session disconnects immediately; the cap is 2 attempts.
        let transport = ScriptedTransport::new(vec![
            vec![TransportSignal::Connected, TransportSignal::Disconnected],
            vec![TransportSignal::Disconnected],
            vec![TransportSignal::Disconnected],
        ]);

        let channel = RealtimeChannel::connect(Arc::new(transport), fast_policy(2));
        wait_for_state(&channel, ChannelState::Failed).await;
    }

    #[tokio::test]
    async fn reconnects_after_disconnect_within_budget() {
        let transport = ScriptedTransport::new(vec![
            vec![TransportSignal::Connected, TransportSignal::Disconnected],
            vec![TransportSignal::Connected],
        ]);

        let channel = RealtimeChannel::connect(Arc::new(transport), fast_policy(3));
        wait_for_state(&channel, ChannelState::Connected).await;
    }

    #[tokio::test]
    async fn connect_error_does_not_change_state() {
        let transport = ScriptedTransport::new(vec![vec![
            TransportSignal::Connected,
            TransportSignal::ConnectError("blip".to_string()),
        ]]);

        let channel = RealtimeChannel::connect(Arc::new(transport), fast_policy(1));
        wait_for_state(&channel, ChannelState::Connected).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(channel.state(), ChannelState::Connected);
    }

    #[tokio::test]
    async fn off_is_idempotent_and_listener_scoped() {
        let transport = ScriptedTransport::new(vec![vec![TransportSignal::Connected]]);
        let channel = RealtimeChannel::connect(Arc::new(transport), fast_policy(0));

        let a_hits = Arc::new(AtomicUsize::new(0));
        let b_hits = Arc::new(AtomicUsize::new(0));

        let a_seen = a_hits.clone();
        let a = channel.on(EVENT_NOTIFICATION, move |_| {
            a_seen.fetch_add(1, Ordering::SeqCst);
        });
        let b_seen = b_hits.clone();
        let _b = channel.on(EVENT_NOTIFICATION, move |_| {
            b_seen.fetch_add(1, Ordering::SeqCst);
        });

        channel.off(EVENT_NOTIFICATION, a);
        channel.off(EVENT_NOTIFICATION, a);

        channel.emit(
            EVENT_NOTIFICATION,
            &RealtimeEvent::new(Severity::Info, "still here"),
        );
        assert_eq!(a_hits.load(Ordering::SeqCst), 0);
        assert_eq!(b_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn acquire_returns_the_same_connection() {
        let first = RealtimeChannel::acquire();
        let second = RealtimeChannel::acquire();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
