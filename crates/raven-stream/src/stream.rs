//! Connection state machine and event fan-out
//!
//! `Closed → Connecting → Open → (Error → Connecting after delay) | Closed`
//!
//! One connection at a time: `start()` is idempotent while a task is
//! running, and every transport failure schedules exactly one reconnect
//! after a fixed delay. Reconnection is unbounded by design — the
//! stream talks to a trusted internal peer, and the worst failure mode
//! is a stale unread count corrected by the next summary fetch.
//! `stop()` cancels any pending reconnect timer, so no zombie timer can
//! reopen a stream after unmount.

use crate::parser::{parse_event, ParseOutcome};
use crate::transport::EventTransport;
use futures::StreamExt;
use parking_lot::Mutex;
use raven_core::{ChatMessage, MailNotice, NotificationEvent, UserId};
use raven_state::IdentityContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

/// Fixed delay between a transport failure and the next connect attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 256;

/// Connection state, observable via [`NotificationStream::state_watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Not running
    Closed,
    /// Connect attempt in flight (or scheduled reconnect elapsed)
    Connecting,
    /// Frames are flowing
    Open,
    /// Transport failed; reconnect pending
    Error,
}

/// A typed, filtered notification delivered to subscribers
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Structured mail notification
    Mail(MailNotice),
    /// Legacy plaintext mail line (no preview payload)
    LegacyMail {
        /// Targeted recipients from the legacy line
        targets: Vec<UserId>,
    },
    /// Chat message delivery
    Chat(ChatMessage),
}

struct TaskHandle {
    join: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Resilient server-push notification client
pub struct NotificationStream {
    transport: Arc<dyn EventTransport>,
    identity: Arc<IdentityContext>,
    events: broadcast::Sender<StreamEvent>,
    state_tx: watch::Sender<StreamState>,
    task: Mutex<Option<TaskHandle>>,
}

impl NotificationStream {
    /// Create a stream client over the given transport, scoped to the
    /// live identity context.
    pub fn new(transport: Arc<dyn EventTransport>, identity: Arc<IdentityContext>) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, _state_rx) = watch::channel(StreamState::Closed);
        Self {
            transport,
            identity,
            events,
            state_tx,
            task: Mutex::new(None),
        }
    }

    /// Begin (or resume) the connection loop.
    ///
    /// Idempotent: a no-op while the stream is already `Connecting` or
    /// `Open`, so duplicate calls can never produce duplicate
    /// concurrent connections.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some()
            && matches!(
                *self.state_tx.borrow(),
                StreamState::Connecting | StreamState::Open | StreamState::Error
            )
        {
            debug!("notification stream already running; start ignored");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let _ = self.state_tx.send(StreamState::Connecting);

        let this = Arc::clone(self);
        let join = tokio::spawn(async move {
            this.run(shutdown_rx).await;
        });
        *task = Some(TaskHandle {
            join,
            shutdown: shutdown_tx,
        });
    }

    /// Tear down the connection and cancel any pending reconnect.
    ///
    /// Legal in every state; a later `start()` reinitializes cleanly.
    pub async fn stop(&self) {
        let handle = { self.task.lock().take() };
        if let Some(TaskHandle { join, shutdown }) = handle {
            let _ = shutdown.send(true);
            let _ = join.await;
        }
        let _ = self.state_tx.send(StreamState::Closed);
        info!("notification stream stopped");
    }

    /// Subscribe to filtered, typed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    /// Current connection state
    pub fn state(&self) -> StreamState {
        *self.state_tx.borrow()
    }

    /// Watch connection state transitions
    pub fn state_watch(&self) -> watch::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let session = self.identity.session_id();
            let viewer = self.identity.user_id();

            let connected = tokio::select! {
                _ = shutdown.changed() => return,
                result = self.transport.connect(&session, viewer.as_ref()) => result,
            };

            match connected {
                Ok(mut frames) => {
                    let _ = self.state_tx.send(StreamState::Open);
                    info!(session = %session, "notification stream open");

                    loop {
                        tokio::select! {
                            _ = shutdown.changed() => return,
                            frame = frames.next() => match frame {
                                Some(Ok(raw)) => self.handle_frame(&raw),
                                Some(Err(error)) => {
                                    warn!(%error, "notification stream transport error");
                                    break;
                                }
                                None => {
                                    warn!("notification stream closed by peer");
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, session = %session, "notification stream connect failed");
                }
            }

            // Connection is gone. Schedule exactly one reconnect after
            // the fixed delay; stop() cancels it through the shutdown
            // signal.
            let _ = self.state_tx.send(StreamState::Error);
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = sleep(RECONNECT_DELAY) => {}
            }
            let _ = self.state_tx.send(StreamState::Connecting);
            debug!(delay_secs = RECONNECT_DELAY.as_secs(), "reconnecting notification stream");
        }
    }

    fn handle_frame(&self, raw: &str) {
        let event = match parse_event(raw) {
            ParseOutcome::Parsed(event) => event,
            ParseOutcome::Unrecognized => {
                trace!("unrecognized frame discarded");
                return;
            }
        };

        let session = self.identity.session_id();
        let Some(viewer) = self.identity.user_id() else {
            debug!("no active user; notification dropped");
            return;
        };
        if !event.is_actionable_for(&viewer, &session) {
            debug!(event_session = %event.session_id(), session = %session,
                   "notification not actionable for viewer");
            return;
        }

        let stream_event = match event {
            NotificationEvent::Mail { notice, .. } => StreamEvent::Mail(notice),
            NotificationEvent::Chat { message, .. } => StreamEvent::Chat(message),
            NotificationEvent::LegacyMail { targets, .. } => StreamEvent::LegacyMail { targets },
        };
        // No receivers is fine; the event is simply dropped.
        let _ = self.events.send(stream_event);
    }
}
