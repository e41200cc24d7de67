//! Raven State - the host/child global-state bridge
//!
//! A host process and N independently-mounted child applications share
//! one view of "who is logged in, which session is active, and how many
//! unread items exist". This crate carries that view:
//!
//! - [`GlobalState`] / [`StatePatch`]: the typed shared state and the
//!   partial updates merged into it
//! - [`GlobalStateChannel`]: ordered, per-subscriber-isolated pub/sub
//!   over state patches
//! - [`IdentityContext`] / [`ConfigBridge`]: the live identity/session
//!   and presentation config a child reads everywhere
//! - [`HostBinding`]: embedded-vs-standalone strategy chosen once at
//!   startup
//! - [`LocalEventBus`] / [`HostNotifier`]: the outbound side, closing
//!   the loop back to the host and to same-process listeners

#![forbid(unsafe_code)]

/// Shared state shape and partial patches
pub mod state;

/// Ordered pub/sub channel over state patches
pub mod channel;

/// Live identity and session context
pub mod identity;

/// Presentation config bridge
pub mod config;

/// Durable session slot
pub mod session_store;

/// Embedded / standalone host strategy
pub mod binding;

/// Same-process typed event bus
pub mod events;

/// Outbound unread publication
pub mod notifier;

pub use binding::HostBinding;
pub use channel::{GlobalStateChannel, Subscription};
pub use config::ConfigBridge;
pub use events::{LocalEvent, LocalEventBus};
pub use identity::IdentityContext;
pub use notifier::HostNotifier;
pub use session_store::{MemorySessionStore, SessionStore};
pub use state::{ChildConfig, ConfigPatch, GlobalState, StatePatch};
