//! Scripted transport for tests
//!
//! Deterministic [`EventTransport`] double: each `connect` call
//! consumes the next script entry, and the total number of attempts is
//! observable. Used by this crate's tests and by downstream crates
//! exercising the full synchronization loop.

use crate::transport::{EventTransport, FrameStream};
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use parking_lot::Mutex;
use raven_core::{RavenError, SessionId, UserId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What one connect attempt should do
pub enum Script {
    /// Fail the connect attempt itself
    Fail,
    /// Connect, yield these frames, then end (peer close)
    Frames(Vec<Result<String, RavenError>>),
    /// Connect, yield these frames, then stay open forever
    FramesThenPending(Vec<Result<String, RavenError>>),
}

/// Scripted [`EventTransport`] double
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    attempts: AtomicUsize,
}

impl ScriptedTransport {
    /// Create a transport that plays the given scripts in order.
    ///
    /// Once the scripts are exhausted, further connects succeed with a
    /// stream that never yields (quiet open connection).
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Total connect attempts observed so far
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn connect(
        &self,
        _session: &SessionId,
        _viewer: Option<&UserId>,
    ) -> Result<FrameStream, RavenError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().pop_front();
        match script {
            Some(Script::Fail) => Err(RavenError::transport("scripted connect failure")),
            Some(Script::Frames(frames)) => Ok(stream::iter(frames).boxed()),
            Some(Script::FramesThenPending(frames)) => {
                Ok(stream::iter(frames).chain(stream::pending()).boxed())
            }
            None => Ok(stream::pending().boxed()),
        }
    }
}
