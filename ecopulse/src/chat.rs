//! Chat session controller: an append-only transcript and one outstanding
//! analyst request at a time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::api::DashboardApi;

pub const GREETING: &str =
    "Systems online. Accessing logs... Ready. How can I assist you with the infrastructure?";

/// Appended in place of an answer when the chat request fails.
pub const FAILURE_NOTICE: &str = "Error: analyst connection failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }
}

struct Shared {
    transcript: Mutex<Vec<ChatMessage>>,
    draft: Mutex<String>,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    // Completion signal of the most recently started turn
    tail: Mutex<Option<oneshot::Receiver<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn append(&self, msg: ChatMessage) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        lock(&self.transcript).push(msg);
        true
    }
}

/// Handle to one chat session. Clones share the same transcript.
pub struct ChatSession<A> {
    api: Arc<A>,
    shared: Arc<Shared>,
}

impl<A> Clone for ChatSession<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: DashboardApi> ChatSession<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            shared: Arc::new(Shared {
                transcript: Mutex::new(vec![ChatMessage::bot(GREETING)]),
                draft: Mutex::new(String::new()),
                in_flight: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                tail: Mutex::new(None),
            }),
        }
    }

    /// Ask `question` and wait for the reply (or failure notice) to land in
    /// the transcript. Returns `false` when the question was blank and
    /// nothing happened.
    pub async fn send(&self, question: &str) -> bool {
        match self.begin(question) {
            Some(pending) => {
                pending.resolve().await;
                true
            }
            None => false,
        }
    }

    /// First phase of a turn: append the user's message right away and mark
    /// the session as awaiting a reply. Turns started while another is
    /// outstanding are queued behind it, so replies land in the order the
    /// questions were asked.
    pub fn begin(&self, question: &str) -> Option<PendingReply<A>> {
        if question.trim().is_empty() || self.is_closed() {
            return None;
        }
        let (done_tx, done_rx) = oneshot::channel();
        // hold the tail lock across the append so queue order matches
        // transcript order
        let mut tail = lock(&self.shared.tail);
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.shared));
        self.shared.append(ChatMessage::user(question));
        let after = tail.replace(done_rx);
        drop(tail);

        Some(PendingReply {
            api: Arc::clone(&self.api),
            shared: Arc::clone(&self.shared),
            question: question.to_string(),
            after,
            done: done_tx,
            _in_flight: guard,
        })
    }

    /// Interface-level submit: sends the current draft unless a reply is
    /// still outstanding. Clears the draft once the question is accepted.
    pub fn submit(&self) -> Option<PendingReply<A>> {
        if self.is_awaiting_reply() {
            return None;
        }
        let mut draft = lock(&self.shared.draft);
        if draft.trim().is_empty() {
            return None;
        }
        let question = std::mem::take(&mut *draft);
        drop(draft);
        self.begin(&question)
    }

    pub fn push_char(&self, c: char) {
        lock(&self.shared.draft).push(c);
    }

    pub fn backspace(&self) {
        lock(&self.shared.draft).pop();
    }

    pub fn set_draft(&self, text: &str) {
        let mut draft = lock(&self.shared.draft);
        draft.clear();
        draft.push_str(text);
    }

    pub fn draft(&self) -> String {
        lock(&self.shared.draft).clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock(&self.shared.transcript).clone()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Tear the session down. Replies that arrive afterwards are dropped.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

// Decrements the outstanding count however the turn ends, including when
// the pending future is dropped mid-flight.
struct InFlight(Arc<Shared>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Second phase of a turn, produced by [`ChatSession::begin`].
#[must_use = "the reply is only requested when the pending turn is resolved"]
pub struct PendingReply<A> {
    api: Arc<A>,
    shared: Arc<Shared>,
    question: String,
    after: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
    _in_flight: InFlight,
}

impl<A: DashboardApi> PendingReply<A> {
    /// Issue the request and append the answer or the failure notice.
    pub async fn resolve(self) {
        let PendingReply {
            api,
            shared,
            question,
            after,
            done,
            _in_flight: in_flight,
        } = self;

        if let Some(prev) = after {
            // Err only means the previous turn was dropped; carry on
            let _ = prev.await;
        }
        if shared.closed.load(Ordering::SeqCst) {
            debug!("chat session closed before request was sent");
            return;
        }

        let text = match api.ask(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                FAILURE_NOTICE.to_string()
            }
        };
        if !shared.append(ChatMessage::bot(text)) {
            debug!("discarding chat reply after session close");
        }
        let _ = done.send(());
        drop(in_flight);
    }
}
