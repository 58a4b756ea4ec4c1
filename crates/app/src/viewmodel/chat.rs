//! Chat view model
//!
//! Keeps the presented timeline of one open conversation in step with the
//! remote message log. The log is polled on a fixed interval and on every
//! successful send; each poll replaces the whole timeline. Consumers watch
//! a [`ChatView`] snapshot and jump to the newest entry whenever its
//! `scroll_pulses` counter moves.
//!
//! Every state change that follows an `.await` is made under the session
//! lock and only while the session is open, so results that arrive after
//! [`ChatSession::close`] are dropped. Fetches carry a sequence number; a
//! response older than the last applied successful fetch is dropped too.
//! Failed fetches never move that mark.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use stayspot_core::{
    build_timeline, last_message_id, sort_for_timeline, Error, IdentityProvider, Message,
    MessageGateway, Result, TimelineEntry,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between two polls of the message log
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing loaded yet and no fetch running
    Uninitialized,
    /// A fetch is in flight; any earlier timeline stays visible
    Loading,
    /// At least one fetch succeeded
    Ready,
    /// The session was closed
    Closed,
}

/// Snapshot handed to the UI
#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub phase: SyncPhase,
    pub entries: Vec<TimelineEntry>,
    pub loading: bool,
    /// Last fetch failure, cleared by the next successful fetch
    pub error: Option<String>,
    pub sending: bool,
    /// Bumped once per refresh that brought a new trailing message
    pub scroll_pulses: u64,
    pub current_user_id: Option<i64>,
}

impl ChatView {
    fn initial() -> Self {
        Self {
            phase: SyncPhase::Uninitialized,
            entries: Vec::new(),
            loading: false,
            error: None,
            sending: false,
            scroll_pulses: 0,
            current_user_id: None,
        }
    }

    /// Messages in the timeline, without separators
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(TimelineEntry::message)
    }
}

/// Polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    /// Upper bound for one fetch; never longer than the poll interval
    pub fetch_timeout: Duration,
}

impl SyncConfig {
    pub fn new(poll_interval: Duration, fetch_timeout: Duration) -> Self {
        Self {
            poll_interval,
            fetch_timeout: fetch_timeout.min(poll_interval),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_INTERVAL)
    }
}

/// What a refresh did to the presented timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Timeline replaced; `scrolled` when a scroll pulse was emitted
    Applied { scrolled: bool },
    /// Fetch failed; the previous timeline is kept
    Failed,
    /// A later-started fetch had already been applied
    Stale,
    /// The session was closed
    Cancelled,
}

/// Result of a send request that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Persisted by the server
    Sent(Message),
    /// Nothing but whitespace; nothing was sent
    Empty,
    /// Another send is still pending
    Busy,
}

struct SessionState {
    entries: Vec<TimelineEntry>,
    last_message_id: Option<i64>,
    /// Sequence number of the last successful fetch that was applied
    applied_seq: u64,
    in_flight: usize,
    loaded: bool,
    error: Option<String>,
    sending: bool,
    scroll_pulses: u64,
    current_user_id: Option<i64>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_message_id: None,
            applied_seq: 0,
            in_flight: 0,
            loaded: false,
            error: None,
            sending: false,
            scroll_pulses: 0,
            current_user_id: None,
        }
    }
}

struct Inner {
    conversation_id: i64,
    gateway: Arc<dyn MessageGateway>,
    identity: Arc<dyn IdentityProvider>,
    config: SyncConfig,
    state: Mutex<SessionState>,
    view_tx: watch::Sender<ChatView>,
    next_seq: AtomicU64,
    identity_requested: AtomicBool,
    /// Only written under the state lock
    closed: AtomicBool,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn phase(&self, state: &SessionState) -> SyncPhase {
        if self.is_closed() {
            SyncPhase::Closed
        } else if state.in_flight > 0 {
            SyncPhase::Loading
        } else if state.loaded {
            SyncPhase::Ready
        } else {
            SyncPhase::Uninitialized
        }
    }

    /// Push a snapshot to watchers if anything visible changed
    fn publish(&self, state: &SessionState) {
        let snapshot = ChatView {
            phase: self.phase(state),
            entries: state.entries.clone(),
            loading: state.in_flight > 0 && !self.is_closed(),
            error: state.error.clone(),
            sending: state.sending,
            scroll_pulses: state.scroll_pulses,
            current_user_id: state.current_user_id,
        };
        self.view_tx.send_if_modified(|view| {
            if *view == snapshot {
                false
            } else {
                *view = snapshot;
                true
            }
        });
    }

    async fn resolve_identity(&self) -> Option<i64> {
        if self.identity_requested.swap(true, Ordering::SeqCst) {
            return self.state().current_user_id;
        }

        let result = self.identity.current_user().await;

        let mut state = self.state();
        if self.is_closed() {
            debug!(conversation_id = self.conversation_id, "Identity resolved after close, dropped");
            return None;
        }

        match result {
            Ok(user) => {
                debug!(conversation_id = self.conversation_id, user_id = user.id, "Identity resolved");
                // applied to entries on the next refresh
                state.current_user_id = Some(user.id);
                self.publish(&state);
                Some(user.id)
            }
            Err(Error::NotAuthenticated) => {
                debug!(conversation_id = self.conversation_id, "No session token, ownership unknown");
                None
            }
            Err(e) => {
                warn!(conversation_id = self.conversation_id, error = %e, "Could not resolve current user");
                None
            }
        }
    }

    async fn refresh(&self) -> RefreshOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(ticket) = FetchTicket::enter(self) else {
            return RefreshOutcome::Cancelled;
        };

        let result = match timeout(
            self.config.fetch_timeout,
            self.gateway.list_messages(self.conversation_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Network(format!(
                "fetch timed out after {}s",
                self.config.fetch_timeout.as_secs_f32()
            ))),
        };

        self.apply(ticket, seq, result)
    }

    fn apply(&self, mut ticket: FetchTicket<'_>, seq: u64, result: Result<Vec<Message>>) -> RefreshOutcome {
        let mut state = self.state();
        ticket.done = true;
        if self.is_closed() {
            debug!(conversation_id = self.conversation_id, seq, "Fetch finished after close, dropped");
            return RefreshOutcome::Cancelled;
        }
        state.in_flight -= 1;

        if seq < state.applied_seq {
            debug!(
                conversation_id = self.conversation_id,
                seq,
                applied = state.applied_seq,
                "Out-of-order fetch dropped"
            );
            self.publish(&state);
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(mut messages) => {
                state.applied_seq = seq;
                sort_for_timeline(&mut messages);
                let entries = build_timeline(&messages, state.current_user_id, &Local::now());
                let newest = last_message_id(&entries);
                let scrolled = newest.is_some() && newest != state.last_message_id;

                if scrolled {
                    state.scroll_pulses += 1;
                    debug!(
                        conversation_id = self.conversation_id,
                        message_id = newest,
                        "New trailing message"
                    );
                }
                state.entries = entries;
                state.last_message_id = newest;
                state.loaded = true;
                state.error = None;
                self.publish(&state);
                RefreshOutcome::Applied { scrolled }
            }
            Err(e) => {
                warn!(conversation_id = self.conversation_id, error = %e, "Failed to load messages");
                state.error = Some(e.to_string());
                self.publish(&state);
                RefreshOutcome::Failed
            }
        }
    }

    async fn send(&self, content: &str) -> Result<SendOutcome> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(SendOutcome::Empty);
        }

        let gate = {
            let mut state = self.state();
            if self.is_closed() {
                return Err(Error::ConversationClosed);
            }
            if state.sending {
                return Ok(SendOutcome::Busy);
            }
            state.sending = true;
            self.publish(&state);
            SendingGate { inner: self }
        };

        let result = match timeout(
            self.config.fetch_timeout,
            self.gateway.append_message(self.conversation_id, content),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Network("send timed out".into())),
        };
        drop(gate);

        match result {
            Ok(message) => {
                info!(conversation_id = self.conversation_id, message_id = message.id, "Message sent");
                self.refresh().await;
                Ok(SendOutcome::Sent(message))
            }
            Err(e) => {
                warn!(conversation_id = self.conversation_id, error = %e, "Failed to send message");
                Err(e)
            }
        }
    }

    fn close(&self) {
        let state = self.state();
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.publish(&state);
        info!(conversation_id = self.conversation_id, "Conversation closed");
    }
}

/// Counts a fetch as in flight until it is applied or dropped
struct FetchTicket<'a> {
    inner: &'a Inner,
    done: bool,
}

impl<'a> FetchTicket<'a> {
    fn enter(inner: &'a Inner) -> Option<Self> {
        let mut state = inner.state();
        if inner.is_closed() {
            return None;
        }
        state.in_flight += 1;
        inner.publish(&state);
        Some(Self { inner, done: false })
    }
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self.inner.state();
        state.in_flight = state.in_flight.saturating_sub(1);
        if !self.inner.is_closed() {
            self.inner.publish(&state);
        }
    }
}

/// Clears the sending flag when the append finishes or is abandoned
struct SendingGate<'a> {
    inner: &'a Inner,
}

impl Drop for SendingGate<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state();
        state.sending = false;
        if !self.inner.is_closed() {
            self.inner.publish(&state);
        }
    }
}

/// One open conversation
///
/// Dropping the session closes it.
pub struct ChatSession {
    inner: Arc<Inner>,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ChatSession {
    /// Create a session without starting the poller
    pub fn new(
        conversation_id: i64,
        gateway: Arc<dyn MessageGateway>,
        identity: Arc<dyn IdentityProvider>,
        config: SyncConfig,
    ) -> Self {
        let (view_tx, _) = watch::channel(ChatView::initial());
        let inner = Inner {
            conversation_id,
            gateway,
            identity,
            config,
            state: Mutex::new(SessionState::new()),
            view_tx,
            next_seq: AtomicU64::new(0),
            identity_requested: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        };

        Self {
            inner: Arc::new(inner),
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Create a session and start polling right away
    ///
    /// Must be called from within a tokio runtime. A receiver subscribed
    /// afterwards may already hold the first load as its initial value; use
    /// [`new`](Self::new), [`subscribe`](Self::subscribe), then
    /// [`start`](Self::start) when every change must be observed.
    pub fn open(
        conversation_id: i64,
        gateway: Arc<dyn MessageGateway>,
        identity: Arc<dyn IdentityProvider>,
        config: SyncConfig,
    ) -> Self {
        let session = Self::new(conversation_id, gateway, identity, config);
        session.start();
        session
    }

    /// Resolve identity and start the polling loop
    ///
    /// The first fetch runs immediately. Calling this twice does nothing.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) || self.inner.is_closed() {
            return;
        }
        info!(
            conversation_id = self.inner.conversation_id,
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "Opening conversation"
        );

        let identity_inner = self.inner.clone();
        let identity_task = tokio::spawn(async move {
            identity_inner.resolve_identity().await;
        });

        let poll_inner = self.inner.clone();
        let poll_task = tokio::spawn(poll_loop(poll_inner));

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.push(identity_task);
        tasks.push(poll_task);
    }

    pub fn conversation_id(&self) -> i64 {
        self.inner.conversation_id
    }

    /// Watch the presented view
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.inner.view_tx.subscribe()
    }

    /// Current snapshot
    pub fn view(&self) -> ChatView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn is_sending(&self) -> bool {
        self.inner.state().sending
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Ask the identity provider who we are, once per session
    ///
    /// Ownership flags pick up the result on the next refresh.
    pub async fn resolve_identity(&self) -> Option<i64> {
        self.inner.resolve_identity().await
    }

    /// Fetch the full log and replace the timeline
    pub async fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh().await
    }

    /// Send a message, then refresh
    ///
    /// Whitespace-only content and sends while another one is pending are
    /// refused without contacting the server. Append failures are returned
    /// and leave the timeline untouched.
    pub async fn send(&self, content: &str) -> Result<SendOutcome> {
        self.inner.send(content).await
    }

    /// Stop polling; later results are dropped
    pub fn close(&self) {
        self.inner.close();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Poll until the session closes; cycles never overlap
async fn poll_loop(inner: Arc<Inner>) {
    let mut ticker = tokio::time::interval(inner.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if inner.is_closed() {
            break;
        }
        if inner.refresh().await == RefreshOutcome::Cancelled {
            break;
        }
    }
    debug!(conversation_id = inner.conversation_id, "Poll loop stopped");
}
