//! Process-lifetime session map with bounded transcripts.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;

use parley_core::types::Turn;

/// Per-session dialogue state.
#[derive(Debug, Default, Clone)]
struct Session {
    transcript: VecDeque<Turn>,
    current_offer: Option<u64>,
}

/// Owns every session, keyed by an opaque session id.
///
/// Sessions are created lazily on first touch and never destroyed; the
/// transcript is bounded FIFO to the most recent `context_pairs` user/bot
/// pairs. Only the orchestrator mutates sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(context_pairs: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_entries: context_pairs * 2,
        }
    }

    fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => {
                warn!("session store lock poisoned; continuing");
                poisoned.into_inner()
            }
        };
        f(sessions.entry(id).or_default())
    }

    /// Append one turn, evicting the oldest entries past the bound.
    pub fn push_turn(&self, id: Uuid, turn: Turn) {
        let max_entries = self.max_entries;
        self.with_session(id, |session| {
            session.transcript.push_back(turn);
            while session.transcript.len() > max_entries {
                session.transcript.pop_front();
            }
        });
    }

    /// Render the transcript as `User:` / `Bot:` lines for the prompt.
    pub fn history_text(&self, id: Uuid) -> String {
        self.with_session(id, |session| {
            session
                .transcript
                .iter()
                .map(|turn| format!("{}: {}", turn.role.label(), turn.text))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self, id: Uuid) -> Vec<Turn> {
        self.with_session(id, |session| session.transcript.iter().cloned().collect())
    }

    /// Remember the offer currently under discussion.
    pub fn remember_offer(&self, id: Uuid, offer_id: u64) {
        self.with_session(id, |session| session.current_offer = Some(offer_id));
    }

    /// The offer currently under discussion, if any.
    pub fn current_offer(&self, id: Uuid) -> Option<u64> {
        self.with_session(id, |session| session.current_offer)
    }

    /// Number of sessions created so far.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(5)
    }

    // ---- Lazy creation ----

    #[test]
    fn test_session_created_on_first_touch() {
        let s = store();
        assert_eq!(s.session_count(), 0);
        s.push_turn(Uuid::new_v4(), Turn::user("hi"));
        assert_eq!(s.session_count(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let s = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        s.push_turn(a, Turn::user("from a"));
        s.push_turn(b, Turn::user("from b"));
        assert_eq!(s.transcript(a).len(), 1);
        assert_eq!(s.transcript(b).len(), 1);
        assert_eq!(s.transcript(a)[0].text, "from a");
    }

    // ---- Transcript bounding ----

    #[test]
    fn test_transcript_bounded_fifo() {
        let s = SessionStore::new(2); // at most 4 entries
        let id = Uuid::new_v4();
        for i in 0..6 {
            s.push_turn(id, Turn::user(format!("msg {i}")));
        }
        let transcript = s.transcript(id);
        assert_eq!(transcript.len(), 4);
        // Oldest evicted first.
        assert_eq!(transcript[0].text, "msg 2");
        assert_eq!(transcript[3].text, "msg 5");
    }

    #[test]
    fn test_transcript_at_bound_no_eviction() {
        let s = SessionStore::new(2);
        let id = Uuid::new_v4();
        for i in 0..4 {
            s.push_turn(id, Turn::user(format!("msg {i}")));
        }
        assert_eq!(s.transcript(id)[0].text, "msg 0");
    }

    // ---- History rendering ----

    #[test]
    fn test_history_text_format() {
        let s = store();
        let id = Uuid::new_v4();
        s.push_turn(id, Turn::user("where is my reward"));
        s.push_turn(id, Turn::bot("it is on the way"));
        assert_eq!(
            s.history_text(id),
            "User: where is my reward\nBot: it is on the way"
        );
    }

    #[test]
    fn test_history_text_empty_session() {
        let s = store();
        assert_eq!(s.history_text(Uuid::new_v4()), "");
    }

    // ---- Offer context ----

    #[test]
    fn test_offer_context_remembered() {
        let s = store();
        let id = Uuid::new_v4();
        assert_eq!(s.current_offer(id), None);
        s.remember_offer(id, 925599);
        assert_eq!(s.current_offer(id), Some(925599));
    }

    #[test]
    fn test_offer_context_overwritten() {
        let s = store();
        let id = Uuid::new_v4();
        s.remember_offer(id, 1);
        s.remember_offer(id, 2);
        assert_eq!(s.current_offer(id), Some(2));
    }
}
