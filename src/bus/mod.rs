//! Command routing between the toolbar and the mounted list view.
//!
//! The command bus provides:
//! - A typed command vocabulary shared with the toolbar
//! - Synchronous publish/subscribe with registration-order delivery
//! - Unsubscribe handles tied to view mount/unmount

mod command;
mod command_bus;

pub use command::CommandKey;
pub use command_bus::{CommandBus, Subscription};
