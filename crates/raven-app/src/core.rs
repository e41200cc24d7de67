//! Child application lifecycle and event routing
//!
//! [`ChildCore`] is the headless heart of one mounted child: it owns the
//! identity context, the notification stream, and the unread
//! aggregator, and runs the router task that turns inbound stream
//! events into counter updates, local events, and upstream patches.
//!
//! Mount wiring, in order: resolve the initial session and user, build
//! the shared contexts, spawn the router, subscribe to the host channel
//! (embedded only, fired immediately), then start the stream. Unmount
//! reverses it: stop the router, stop the stream, drop the host
//! subscription.

use crate::capabilities::{DirectoryProvider, SummarySource};
use crate::unread::{UnreadAggregator, UnreadState};
use parking_lot::Mutex;
use raven_core::{
    filter_directory, ChatMessage, DirectoryEntry, Identity, RavenError, SessionId, UserId,
};
use raven_state::{
    ConfigBridge, ConfigPatch, HostBinding, HostNotifier, IdentityContext, LocalEvent,
    LocalEventBus, SessionStore, StatePatch, Subscription,
};
use raven_stream::{EventTransport, NotificationStream, StreamEvent, StreamState};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything the host (or the standalone bootstrap) injects at mount
pub struct ChildCoreConfig {
    /// Embedded or standalone attachment
    pub binding: HostBinding,
    /// Server-push transport
    pub transport: Arc<dyn EventTransport>,
    /// Durable session slot
    pub session_store: Arc<dyn SessionStore>,
    /// Directory lookup, when the host grants it
    pub directory: Option<Arc<dyn DirectoryProvider>>,
    /// Unread summary fetch, when the host grants it
    pub summary: Option<Arc<dyn SummarySource>>,
}

/// Initial values handed down by the host at mount
#[derive(Default)]
pub struct MountProps {
    /// Authenticated user, when already known
    pub user: Option<Identity>,
    /// Session to mount into; overrides every other source
    pub session_id: Option<SessionId>,
    /// Presentation overrides
    pub config: Option<ConfigPatch>,
}

/// Messages to the router task
enum Control {
    /// Fetch and apply the server unread summary
    Resync,
    /// Restart the stream (identity or session changed), then resync
    /// via the resulting open transition
    Rebind,
}

struct RouterHandle {
    join: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// The headless core of one mounted child application
pub struct ChildCore {
    identity: Arc<IdentityContext>,
    config: Arc<ConfigBridge>,
    binding: Arc<HostBinding>,
    bus: LocalEventBus,
    notifier: Arc<HostNotifier>,
    stream: Arc<NotificationStream>,
    aggregator: Arc<Mutex<UnreadAggregator>>,
    directory: Option<Arc<dyn DirectoryProvider>>,
    session_store: Arc<dyn SessionStore>,
    control_tx: mpsc::UnboundedSender<Control>,
    state_sub: Mutex<Option<Subscription>>,
    router: Mutex<Option<RouterHandle>>,
}

impl ChildCore {
    /// Mount the child and start its event loop.
    ///
    /// Embedded mounts take the host snapshot as the authoritative
    /// starting point (props still win for the session); standalone
    /// mounts fall back to the persisted session slot.
    pub async fn mount(
        config: ChildCoreConfig,
        props: MountProps,
    ) -> Result<Arc<Self>, RavenError> {
        let ChildCoreConfig {
            binding,
            transport,
            session_store,
            directory,
            summary,
        } = config;
        let binding = Arc::new(binding);

        let snapshot = binding.channel().map(|c| c.snapshot());

        let session_id = match (props.session_id, &snapshot) {
            (Some(session), _) => session,
            (None, Some(snap)) => snap.session_id.clone(),
            (None, None) => session_store.load()?.unwrap_or_default(),
        };
        session_store.store(&session_id)?;

        let user = props
            .user
            .or_else(|| snapshot.as_ref().and_then(|s| s.user.clone()));

        let identity = Arc::new(IdentityContext::new(session_id));
        if let Some(user) = user {
            identity.set_user(user)?;
        }

        let config_bridge = Arc::new(ConfigBridge::new());
        if let Some(patch) = &props.config {
            config_bridge.apply(patch);
        }
        if let Some(snap) = &snapshot {
            config_bridge.apply(&full_config_patch(&snap.config));
        }

        let bus = LocalEventBus::new();
        let notifier = Arc::new(HostNotifier::new(bus.clone(), Arc::clone(&binding)));

        let viewer = identity.user_id().unwrap_or_else(|| UserId::new(""));
        let aggregator = Arc::new(Mutex::new(UnreadAggregator::new(viewer)));

        let stream = Arc::new(NotificationStream::new(transport, Arc::clone(&identity)));
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let core = Arc::new(Self {
            identity,
            config: config_bridge,
            binding,
            bus,
            notifier,
            stream,
            aggregator,
            directory,
            session_store,
            control_tx,
            state_sub: Mutex::new(None),
            router: Mutex::new(None),
        });

        core.spawn_router(summary, control_rx);

        if let Some(channel) = core.binding.channel() {
            // Props win for the session: push the resolved session to
            // the host before subscribing, so the immediate fire below
            // cannot revert it to the snapshot value. A no-op when the
            // two already agree.
            channel.set_state(StatePatch::new().with_session(core.identity.session_id()));
            let sub = channel.subscribe_with(core.host_state_callback(), true);
            *core.state_sub.lock() = Some(sub);
        }

        core.stream.start();
        info!(
            session = %core.identity.session_id(),
            embedded = core.binding.is_embedded(),
            "child core mounted"
        );
        Ok(core)
    }

    /// Tear the child down: router first so nothing restarts the
    /// stream, then the stream, then the host subscription.
    pub async fn unmount(&self) {
        let handle = { self.router.lock().take() };
        if let Some(RouterHandle { join, shutdown }) = handle {
            let _ = shutdown.send(true);
            let _ = join.await;
        }
        self.stream.stop().await;
        drop(self.state_sub.lock().take());
        info!("child core unmounted");
    }

    /// Search the directory, filtered by the viewer's faction.
    ///
    /// Errors with [`RavenError::CapabilityNotBound`] when the host did
    /// not grant directory access.
    pub async fn search_directory(
        &self,
        query: &str,
    ) -> Result<Vec<DirectoryEntry>, RavenError> {
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| RavenError::capability("fetch_users"))?;
        let entries = directory.fetch_users(query).await?;
        Ok(filter_directory(self.identity.role(), entries))
    }

    /// Switch to another session: persist it, tell the host, and have
    /// the router rebind the stream against the new session.
    pub fn switch_session(&self, session_id: SessionId) -> Result<(), RavenError> {
        self.identity.set_session(session_id.clone())?;
        self.session_store.store(&session_id)?;
        self.binding
            .publish(StatePatch::new().with_session(session_id));
        let _ = self.control_tx.send(Control::Rebind);
        Ok(())
    }

    /// Mark the conversation with `peer` as read and republish the
    /// combined count.
    pub fn mark_chat_read(&self, peer: &UserId) {
        let combined = self.aggregator.lock().mark_read(peer);
        if let Some(user) = self.identity.user_id() {
            self.notifier.publish(combined, &user);
        }
    }

    /// Ask the router to refetch the authoritative unread summary.
    pub fn resync(&self) {
        let _ = self.control_tx.send(Control::Resync);
    }

    /// Current unread counters
    pub fn unread(&self) -> UnreadState {
        self.aggregator.lock().snapshot()
    }

    /// Messages exchanged with `peer`, in arrival order
    pub fn conversation(&self, peer: &UserId) -> Vec<ChatMessage> {
        self.aggregator.lock().conversation(peer).to_vec()
    }

    /// Subscribe to the same-process event bus
    pub fn local_events(&self) -> broadcast::Receiver<LocalEvent> {
        self.bus.subscribe()
    }

    /// Live identity context
    pub fn identity(&self) -> &Arc<IdentityContext> {
        &self.identity
    }

    /// Live presentation config
    pub fn config(&self) -> &Arc<ConfigBridge> {
        &self.config
    }

    /// Current notification stream state
    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    /// Whether a host channel is bound
    pub fn is_embedded(&self) -> bool {
        self.binding.is_embedded()
    }

    /// Subscriber applied to every host state delivery (and once
    /// immediately at registration). Must stay synchronous and must not
    /// publish back into the channel.
    fn host_state_callback(
        self: &Arc<Self>,
    ) -> impl Fn(&raven_state::GlobalState, &raven_state::GlobalState) -> Result<(), RavenError>
    + Send
    + Sync
    + 'static {
        let identity = Arc::clone(&self.identity);
        let config = Arc::clone(&self.config);
        let aggregator = Arc::clone(&self.aggregator);
        let session_store = Arc::clone(&self.session_store);
        let control_tx = self.control_tx.clone();

        // User, session, and config are applied independently: one bad
        // key in a delivery must not stop the others from landing. The
        // first error is still reported back to the channel.
        move |state, _prev| {
            let mut outcome = Ok(());

            if let Some(user) = &state.user {
                let user_changed = identity.user_id().as_ref() != Some(&user.id);
                match identity.set_user(user.clone()) {
                    Ok(()) if user_changed => {
                        aggregator.lock().reset_for(user.id.clone());
                        let _ = control_tx.send(Control::Rebind);
                    }
                    Ok(()) => {}
                    Err(error) => {
                        warn!(%error, "host delivered an unusable user; keeping the current one");
                        outcome = Err(error);
                    }
                }
            }

            let session_changed = identity.session_id() != state.session_id;
            match identity.set_session(state.session_id.clone()) {
                Ok(()) if session_changed => {
                    if let Err(error) = session_store.store(&state.session_id) {
                        warn!(%error, "session slot write failed");
                        outcome = outcome.and(Err(error));
                    }
                    let _ = control_tx.send(Control::Rebind);
                }
                Ok(()) => {}
                Err(error) => {
                    warn!(%error, "host delivered an unusable session; keeping the current one");
                    outcome = outcome.and(Err(error));
                }
            }

            config.apply(&full_config_patch(&state.config));
            outcome
        }
    }

    fn spawn_router(
        self: &Arc<Self>,
        summary: Option<Arc<dyn SummarySource>>,
        control_rx: mpsc::UnboundedReceiver<Control>,
    ) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = Router {
            identity: Arc::clone(&self.identity),
            aggregator: Arc::clone(&self.aggregator),
            bus: self.bus.clone(),
            notifier: Arc::clone(&self.notifier),
            stream: Arc::clone(&self.stream),
            summary,
        };
        let events = self.stream.subscribe();
        let states = self.stream.state_watch();

        let join = tokio::spawn(async move {
            router.run(events, control_rx, states, shutdown_rx).await;
        });
        *self.router.lock() = Some(RouterHandle {
            join,
            shutdown: shutdown_tx,
        });
    }
}

/// Expand a full config into a patch carrying every key, for
/// host-authoritative overwrites.
fn full_config_patch(config: &raven_state::ChildConfig) -> ConfigPatch {
    ConfigPatch {
        show_reset: Some(config.show_reset),
        show_sidebar: Some(config.show_sidebar),
        primary_color: Some(config.primary_color.clone()),
    }
}

/// Turns stream events and control messages into counter updates and
/// outbound publications. Runs until shutdown.
struct Router {
    identity: Arc<IdentityContext>,
    aggregator: Arc<Mutex<UnreadAggregator>>,
    bus: LocalEventBus,
    notifier: Arc<HostNotifier>,
    stream: Arc<NotificationStream>,
    summary: Option<Arc<dyn SummarySource>>,
}

impl Router {
    async fn run(
        self,
        mut events: broadcast::Receiver<StreamEvent>,
        mut control: mpsc::UnboundedReceiver<Control>,
        mut states: watch::Receiver<StreamState>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                Some(message) = control.recv() => match message {
                    Control::Resync => self.reconcile().await,
                    Control::Rebind => {
                        debug!("rebinding notification stream");
                        self.stream.stop().await;
                        self.stream.start();
                    }
                },
                changed = states.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Every (re)connect gets a fresh authoritative
                    // summary; local counters may have drifted while
                    // the stream was down.
                    if *states.borrow_and_update() == StreamState::Open {
                        self.reconcile().await;
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => self.route(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "router lagged behind the stream; next summary corrects the counters");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }

    fn route(&self, event: StreamEvent) {
        let Some(user) = self.identity.user_id() else {
            return;
        };
        match event {
            StreamEvent::Mail(notice) => {
                let combined = self.aggregator.lock().on_mail_event();
                self.bus.emit(LocalEvent::MailUpdated { notice });
                self.notifier.publish(combined, &user);
            }
            StreamEvent::LegacyMail { .. } => {
                // No preview payload on the legacy line; only the
                // counter moves.
                let combined = self.aggregator.lock().on_mail_event();
                self.notifier.publish(combined, &user);
            }
            StreamEvent::Chat(message) => {
                let combined = self.aggregator.lock().on_chat_event(message.clone());
                self.bus.emit(LocalEvent::ImReceived { message });
                self.notifier.publish(combined, &user);
            }
        }
    }

    async fn reconcile(&self) {
        let Some(source) = &self.summary else {
            debug!("no summary source bound; reconciliation skipped");
            return;
        };
        let Some(user) = self.identity.user_id() else {
            return;
        };
        let session = self.identity.session_id();
        match source.fetch_summary(&session, &user).await {
            Ok(summary) => {
                let combined = self.aggregator.lock().apply_summary(&summary);
                self.notifier.publish(combined, &user);
            }
            Err(error) => {
                warn!(%error, session = %session, "unread summary fetch failed");
            }
        }
    }
}
