use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::telemetry;

/// Turns keystrokes into a committed search term after a quiet period.
///
/// Clock-driven rather than timer-driven: the owner feeds it `Instant`s and
/// sleeps until [`QueryDebouncer::deadline`].
#[derive(Debug)]
pub struct QueryDebouncer {
    quiet: Duration,
    draft: String,
    deadline: Option<Instant>,
}

impl QueryDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, draft: String::new(), deadline: None }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Records a keystroke. Clearing the field commits immediately.
    pub fn input(&mut self, text: &str, now: Instant) -> Option<String> {
        self.draft = text.to_string();
        if text.trim().is_empty() {
            self.deadline = None;
            return Some(String::new());
        }
        self.deadline = Some(now + self.quiet);
        None
    }

    /// Enter: commit the draft without waiting.
    pub fn commit_now(&mut self) -> String {
        self.deadline = None;
        self.draft.trim().to_string()
    }

    /// Returns the draft once the quiet period has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(self.draft.trim().to_string())
            }
            _ => None,
        }
    }
}

/// Holds the committed search term; `is_searching` derives from it.
pub struct SearchModeStore {
    term: watch::Sender<String>,
}

impl Default for SearchModeStore {
    fn default() -> Self {
        let (term, _) = watch::channel(String::new());
        Self { term }
    }
}

impl SearchModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the committed term actually changed.
    pub fn commit(&self, term: &str) -> bool {
        let term = term.trim();
        let changed = self.term.send_if_modified(|current| {
            if current == term {
                return false;
            }
            *current = term.to_string();
            true
        });
        if changed {
            telemetry::search().debug_kv("commit", [("term", term.to_string())]);
        }
        changed
    }

    pub fn clear(&self) -> bool {
        self.commit("")
    }

    pub fn term(&self) -> String {
        self.term.borrow().clone()
    }

    pub fn is_searching(&self) -> bool {
        !self.term.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.term.subscribe()
    }
}
