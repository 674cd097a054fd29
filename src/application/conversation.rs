use crate::domain::conversation::{Author, Correspondent, Message, Presence};
use crate::error::{PortalError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_secs(1);
pub const AUTO_REPLY: &str = "Thanks for reaching out, we will get back to you shortly";

/// Correspondents plus the transcript each one opens with.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    correspondents: Vec<Correspondent>,
    transcripts: HashMap<String, Vec<(Author, String)>>,
}

impl Directory {
    pub fn new(correspondents: Vec<Correspondent>) -> Self {
        Self {
            correspondents,
            transcripts: HashMap::new(),
        }
    }

    pub fn with_transcript<S: Into<String>>(
        mut self,
        correspondent_id: &str,
        lines: impl IntoIterator<Item = (Author, S)>,
    ) -> Self {
        let lines = lines.into_iter().map(|(a, s)| (a, s.into())).collect();
        self.transcripts.insert(correspondent_id.to_string(), lines);
        self
    }

    /// The student-affairs contacts shown on a fresh chat page.
    pub fn demo() -> Self {
        let history = [
            (Author::Counterpart, "Hello, how can I help you?"),
            (Author::Me, "I would like to ask about the final exam dates"),
            (
                Author::Counterpart,
                "Final exams start on June 15 and run for two weeks",
            ),
        ];

        Self::new(vec![
            Correspondent::new("c1", "Admissions and Registration")
                .with_summary("You can visit the office tomorrow at 10")
                .with_unread(2)
                .with_presence(Presence::Online)
                .with_department("Administration"),
            Correspondent::new("c2", "Dr. Mohammed Ali")
                .with_summary("Project received, thank you")
                .with_department("Computer Science"),
            Correspondent::new("c3", "Central Library")
                .with_summary("The requested books are now available")
                .with_presence(Presence::Online)
                .with_department("Library"),
        ])
        .with_transcript("c1", history)
        .with_transcript("c2", history)
        .with_transcript("c3", history)
    }
}

struct SessionInner {
    directory: Directory,
    active: Option<String>,
    log: Vec<Message>,
    /// Bumped on every selection so that replies scheduled for an earlier
    /// selection can tell they are stale.
    generation: u64,
    next_id: u64,
}

impl SessionInner {
    fn message(&mut self, author: Author, body: String) -> Message {
        self.next_id += 1;
        Message {
            id: format!("m{}", self.next_id),
            body,
            sent_at: Utc::now(),
            author,
        }
    }
}

/// Ephemeral message log for the currently selected correspondent.
///
/// Sending appends the local message immediately and schedules one synthetic
/// reply on the Tokio runtime. Cloning yields another handle on the same
/// session.
#[derive(Clone)]
pub struct ConversationSession {
    inner: Arc<Mutex<SessionInner>>,
    appended: Arc<Notify>,
    reply_delay: Duration,
    reply_body: String,
}

impl ConversationSession {
    pub fn new(directory: Directory) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                directory,
                active: None,
                log: Vec::new(),
                generation: 0,
                next_id: 0,
            })),
            appended: Arc::new(Notify::new()),
            reply_delay: DEFAULT_REPLY_DELAY,
            reply_body: AUTO_REPLY.to_string(),
        }
    }

    pub fn with_reply(mut self, delay: Duration, body: impl Into<String>) -> Self {
        self.reply_delay = delay;
        self.reply_body = body.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `id` the active correspondent, loading its transcript and
    /// clearing its unread counter before returning.
    pub fn select_correspondent(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        let Some(correspondent) = inner
            .directory
            .correspondents
            .iter_mut()
            .find(|c| c.id == id)
        else {
            return Err(PortalError::ValidationError(format!(
                "Unknown correspondent: {id}"
            )));
        };
        correspondent.unread_count = 0;

        let seed = inner
            .directory
            .transcripts
            .get(id)
            .cloned()
            .unwrap_or_default();
        inner.log.clear();
        for (author, body) in seed {
            let message = inner.message(author, body);
            inner.log.push(message);
        }
        inner.active = Some(id.to_string());
        inner.generation += 1;
        debug!(correspondent = id, messages = inner.log.len(), "conversation selected");
        Ok(())
    }

    /// Appends a message from the local user and schedules the reply.
    ///
    /// Returns `None` without side effects when `body` is blank, nothing is
    /// selected, or there is no Tokio runtime to schedule the reply on.
    pub fn send(&self, body: &str) -> Option<Message> {
        if body.trim().is_empty() {
            return None;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available, message not sent");
            return None;
        };

        let (sent, generation) = {
            let mut inner = self.lock();
            inner.active.as_ref()?;
            let message = inner.message(Author::Me, body.to_string());
            inner.log.push(message.clone());
            (message, inner.generation)
        };
        debug!(id = %sent.id, "message appended");
        self.appended.notify_waiters();

        let session = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(session.reply_delay).await;
            session.deliver_reply(generation);
        });

        Some(sent)
    }

    fn deliver_reply(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!("dropping reply for a conversation that is no longer selected");
                return;
            }
            let reply = inner.message(Author::Counterpart, self.reply_body.clone());
            debug!(id = %reply.id, "reply appended");
            inner.log.push(reply);
        }
        self.appended.notify_waiters();
    }

    /// Waits until the log holds at least `count` messages.
    ///
    /// Returns `false` if that has not happened within `limit`, which is the
    /// case when the pending reply was dropped by a later selection.
    pub async fn wait_for_messages(&self, count: usize, limit: Duration) -> bool {
        let filled = async {
            loop {
                let notified = self.appended.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                let len = self.lock().log.len();
                if len >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(limit, filled).await.is_ok()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().log.clone()
    }

    pub fn active(&self) -> Option<Correspondent> {
        let inner = self.lock();
        let id = inner.active.as_ref()?;
        inner
            .directory
            .correspondents
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    pub fn correspondents(&self) -> Vec<Correspondent> {
        self.lock().directory.correspondents.clone()
    }

    pub fn correspondent(&self, id: &str) -> Option<Correspondent> {
        self.lock()
            .directory
            .correspondents
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Correspondents whose display name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<Correspondent> {
        self.lock()
            .directory
            .correspondents
            .iter()
            .filter(|c| c.matches(term))
            .cloned()
            .collect()
    }
}
