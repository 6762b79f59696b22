use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::ConversationError;
use crate::events::DialogueEvent;
use crate::models::Session;
use crate::services::{DialogueController, TypingPacer};

/// What the host renders: the session plus whether a reply is in flight.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub typing: bool,
}

struct SessionEntry {
    state: RwLock<Session>,
    // Held for the whole turn; a second event while held is rejected.
    gate: Arc<Mutex<()>>,
    typing: AtomicBool,
    last_active: RwLock<Instant>,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            state: RwLock::new(session),
            gate: Arc::new(Mutex::new(())),
            typing: AtomicBool::new(false),
            last_active: RwLock::new(Instant::now()),
        }
    }

    async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.state.read().await.clone(),
            typing: self.typing.load(Ordering::SeqCst),
        }
    }

    async fn touch(&self) {
        *self.last_active.write().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_active.read().await.elapsed()
    }
}

struct TypingGuard<'a>(&'a AtomicBool);

impl<'a> TypingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// In-memory sessions keyed by id, each driven one turn at a time.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
    controller: Arc<DialogueController>,
    pacer: TypingPacer,
}

impl SessionStore {
    pub fn new(controller: Arc<DialogueController>, pacer: TypingPacer) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            controller,
            pacer,
        }
    }

    pub async fn create(&self) -> SessionSnapshot {
        let session = Session::new();
        let id = session.id();
        let entry = Arc::new(SessionEntry::new(session));
        let snapshot = entry.snapshot().await;

        self.sessions.write().await.insert(id, entry);
        info!("Created chat session {}", id);
        snapshot
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<SessionEntry>, ConversationError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ConversationError::SessionNotFound(id))
    }

    /// Reading a session counts as activity; a host polling it keeps it alive.
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, ConversationError> {
        let entry = self.entry(id).await?;
        entry.touch().await;
        Ok(entry.snapshot().await)
    }

    #[instrument(skip(self, event), fields(event = event.name()))]
    pub async fn dispatch(&self, id: Uuid, event: DialogueEvent) -> Result<SessionSnapshot, ConversationError> {
        self.run_turn(id, |_| Ok(event)).await
    }

    /// Routes input-box text by the stage the session is in when the turn starts.
    #[instrument(skip(self, text))]
    pub async fn dispatch_text(&self, id: Uuid, text: String) -> Result<SessionSnapshot, ConversationError> {
        self.run_turn(id, move |session| {
            DialogueEvent::text_for_stage(session.stage(), text)
                .ok_or(ConversationError::TextNotAccepted(session.stage()))
        })
        .await
    }

    /// Runs one turn on a spawned task. The turn commits even if the caller
    /// stops waiting, and the gate stays held until it does.
    async fn run_turn<F>(&self, id: Uuid, make_event: F) -> Result<SessionSnapshot, ConversationError>
    where
        F: FnOnce(&Session) -> Result<DialogueEvent, ConversationError>,
    {
        let entry = self.entry(id).await?;
        let Ok(turn) = entry.gate.clone().try_lock_owned() else {
            warn!("Rejected event for busy session {}", id);
            return Err(ConversationError::Busy(id));
        };

        let current = entry.state.read().await.clone();
        let event = make_event(&current)?;

        let task_entry = entry.clone();
        let controller = self.controller.clone();
        let pacer = self.pacer.clone();
        let committed = tokio::spawn(async move {
            let _turn = turn;
            let _typing = TypingGuard::raise(&task_entry.typing);
            let next = controller.handle(current, event).await;
            pacer.pause().await;
            *task_entry.state.write().await = next;
            task_entry.touch().await;
        });

        if let Err(e) = committed.await {
            error!("Turn for session {} failed: {}", id, e);
            return Err(ConversationError::TurnFailed(id));
        }

        debug!("Turn complete for session {}", id);
        Ok(entry.snapshot().await)
    }

    /// Drops sessions with no turn or read for at least `max_idle`.
    /// Sessions in the middle of a turn are kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut expired = Vec::new();
        for (id, entry) in sessions.iter() {
            if entry.gate.try_lock().is_err() {
                continue;
            }
            if entry.idle_for().await >= max_idle {
                expired.push(*id);
            }
        }
        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            info!("Evicted {} idle chat sessions", expired.len());
        }
        expired.len()
    }

    /// Periodically evicts idle sessions for as long as the store is alive.
    pub fn spawn_idle_sweeper(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let period = (max_idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else { break };
                store.evict_idle(max_idle).await;
            }
        })
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), ConversationError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("Removed chat session {}", id);
                Ok(())
            }
            None => Err(ConversationError::SessionNotFound(id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
