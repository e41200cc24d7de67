//! Raven App - the headless child-application core
//!
//! Wires the pieces into the closed synchronization loop: host patch →
//! child state → notification stream events → unread aggregation →
//! host notifier → host patch. A micro-frontend shell calls
//! [`ChildCore::mount`] from its mount hook and [`ChildCore::unmount`]
//! from its unmount hook; everything in between is event-driven.

#![forbid(unsafe_code)]

/// Per-channel unread counters
pub mod unread;

/// Injected directory and summary capabilities
pub mod capabilities;

/// Child application lifecycle and event routing
pub mod core;

pub use capabilities::{DirectoryProvider, SummarySource};
pub use self::core::{ChildCore, ChildCoreConfig, MountProps};
pub use unread::{UnreadAggregator, UnreadState};
