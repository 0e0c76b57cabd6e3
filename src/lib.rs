//! Management console core.
//!
//! This crate is the state and lifecycle layer shared by every list view of a
//! browser-resident management console (tasks, contacts, orders, quotes). It
//! covers:
//! - Command routing from a page-agnostic toolbar to the mounted view
//! - Derived view state (search, sort, pagination, column visibility)
//! - Durable per-view preferences
//! - A reconnecting realtime push channel and notification emission
//!
//! # Architecture
//!
//! The crate follows a modular architecture:
//! - `bus`: Command bus (synchronous publish/subscribe of toolbar commands)
//! - `view`: Generic list view engine, controller, and mount lifecycle
//! - `prefs`: Durable per-view settings storage with SQLite
//! - `channel`: Singleton realtime push connection with reconnection
//! - `notify`: Realtime event to transient notification mapping
//! - `source`: External data source seam (fetch/create/import)
//!
//! Everything above the core (markup, routing, styling, form fields) is a
//! thin consumer and lives outside this crate.

pub mod bus;
pub mod channel;
pub mod notify;
pub mod prefs;
pub mod source;
pub mod view;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Prefs(#[from] prefs::PrefError),
    #[error("{0}")]
    Source(#[from] source::SourceError),
    #[error("{0}")]
    Channel(#[from] channel::ChannelError),
    #[error("{0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set; defaults to debug output for this crate and
/// info elsewhere. Call once at application startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk=debug,info".parse().expect("valid env filter")),
        )
        .init();
}
