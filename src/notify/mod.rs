//! Notification emission: realtime events become transient UI surfaces.
//!
//! The adapter is a pure mapping from a pushed [`RealtimeEvent`] to a
//! severity-styled, auto-dismissing [`Notification`]. There is deliberately no
//! deduplication, batching, or rate limiting: repeated identical events each
//! produce a separate notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::bus::CommandKey;
use crate::channel::{ListenerId, RealtimeChannel, RealtimeEvent, Severity, EVENT_NOTIFICATION};

/// How long each severity stays on screen.
pub fn display_duration(severity: Severity) -> Duration {
    match severity {
        Severity::Success | Severity::Info | Severity::Default => Duration::from_secs(4),
        Severity::Warning => Duration::from_secs(6),
        Severity::Error => Duration::from_secs(8),
    }
}

/// An optional action rendered on the notification surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub label: String,
    pub command: CommandKey,
}

/// A transient, auto-dismissing UI notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    /// Display duration in milliseconds.
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
    pub created_at: String,
}

impl Notification {
    /// Build a notification from a pushed event.
    pub fn from_event(event: &RealtimeEvent) -> Self {
        Self::new(event.severity, event.message.clone())
    }

    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            severity,
            message: message.into(),
            duration_ms: display_duration(severity).as_millis() as u64,
            action: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_action(mut self, label: impl Into<String>, command: CommandKey) -> Self {
        self.action = Some(NotificationAction {
            label: label.into(),
            command,
        });
        self
    }
}

/// Forwards the channel's `notification` events into a queue the UI drains.
///
/// Attach on mount, drop (or detach) on unmount; detaching never disturbs
/// other listeners on the same event.
pub struct NotificationAdapter {
    tx: mpsc::UnboundedSender<Notification>,
    listener: ListenerId,
    channel: Arc<RealtimeChannel>,
}

impl NotificationAdapter {
    /// Attach to the channel and return the adapter plus the receiving end of
    /// the notification queue.
    pub fn attach(
        channel: &Arc<RealtimeChannel>,
    ) -> (NotificationAdapter, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let forward = tx.clone();
        let listener = channel.on(EVENT_NOTIFICATION, move |event| {
            // UI gone means the queue is closed; nothing to do but drop.
            let _ = forward.send(Notification::from_event(event));
        });

        (
            NotificationAdapter {
                tx,
                listener,
                channel: channel.clone(),
            },
            rx,
        )
    }

    /// Sender other producers (view controllers) use to surface outcomes on
    /// the same queue.
    pub fn sender(&self) -> mpsc::UnboundedSender<Notification> {
        self.tx.clone()
    }

    /// Detach from the channel. Idempotent.
    pub fn detach(&self) {
        self.channel.off(EVENT_NOTIFICATION, self.listener);
    }
}

impl Drop for NotificationAdapter {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use crate::channel::{ReconnectPolicy, TransportSignal};

    use super::*;

    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct IdleTransport {
        held_open: std::sync::Mutex<Vec<mpsc::UnboundedSender<TransportSignal>>>,
    }

    #[async_trait]
    impl crate::channel::RealtimeTransport for IdleTransport {
        async fn open(
            &self,
        ) -> Result<UnboundedReceiver<TransportSignal>, crate::channel::ChannelError> {
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(TransportSignal::Connected);
            self.held_open.lock().unwrap().push(tx);
            Ok(rx)
        }
    }

    fn idle_channel() -> Arc<RealtimeChannel> {
        RealtimeChannel::connect(
            Arc::new(IdleTransport {
                held_open: std::sync::Mutex::new(Vec::new()),
            }),
            ReconnectPolicy::default(),
        )
    }

    #[test]
    fn durations_scale_with_severity() {
        assert_eq!(display_duration(Severity::Success), Duration::from_secs(4));
        assert_eq!(display_duration(Severity::Default), Duration::from_secs(4));
        assert_eq!(display_duration(Severity::Warning), Duration::from_secs(6));
        assert_eq!(display_duration(Severity::Error), Duration::from_secs(8));
    }

    #[test]
    fn from_event_keeps_severity_and_message() {
        let event = RealtimeEvent::new(Severity::Error, "Import failed");
        let notification = Notification::from_event(&event);
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, "Import failed");
        assert_eq!(notification.duration_ms, 8_000);
        assert!(notification.action.is_none());
    }

    #[tokio::test]
    async fn repeated_identical_events_each_produce_a_notification() {
        let channel = idle_channel();
        let (_adapter, mut rx) = NotificationAdapter::attach(&channel);

        let event = RealtimeEvent::new(Severity::Success, "Order #42 updated");
        for _ in 0..3 {
            channel.emit(EVENT_NOTIFICATION, &event);
        }

        let mut received = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            received.push(notification);
        }
        assert_eq!(received.len(), 3, "no deduplication is applied");
        assert!(received.iter().all(|n| n.message == "Order #42 updated"));
    }

    #[tokio::test]
    async fn detached_adapter_stops_receiving() {
        let channel = idle_channel();
        let (adapter, mut rx) = NotificationAdapter::attach(&channel);

        adapter.detach();
        adapter.detach();

        channel.emit(EVENT_NOTIFICATION, &RealtimeEvent::new(Severity::Info, "late"));
        assert!(rx.try_recv().is_err());
    }
}
