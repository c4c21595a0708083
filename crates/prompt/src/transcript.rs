//! Session transcript: an append-only log of conversation turns.
//!
//! Turns are immutable once created and live for one session only; there
//! is no durable storage. The history window deliberately excludes the
//! most recently appended turn so the in-flight question is never
//! duplicated inside the prompt's history block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversation turn. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Append-only ordered log of turns for one session.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Turns are never edited or removed afterwards.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full ordered sequence of turns.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `n` turns, oldest-first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// The last `n` turns *before* the most recently appended one,
    /// oldest-first.
    ///
    /// Used to build the prompt's history block after the current user
    /// turn has already been appended: history covers prior turns only,
    /// and the current question is passed to the composer separately.
    pub fn history_window(&self, n: usize) -> &[Turn] {
        if self.turns.is_empty() {
            return &[];
        }
        let prior = &self.turns[..self.turns.len() - 1];
        let start = prior.len().saturating_sub(n);
        &prior[start..]
    }

    /// Number of turns in the transcript.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_with_turns(n: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 0..n {
            if i % 2 == 0 {
                transcript.append(Turn::user(format!("question {}", i)));
            } else {
                transcript.append(Turn::assistant(format!("answer {}", i)));
            }
        }
        transcript
    }

    #[test]
    fn test_append_preserves_order() {
        let transcript = transcript_with_turns(4);
        let contents: Vec<&str> = transcript.all().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["question 0", "answer 1", "question 2", "answer 3"]
        );
    }

    #[test]
    fn test_recent_returns_last_n_oldest_first() {
        let transcript = transcript_with_turns(6);
        let recent = transcript.recent(3);
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["answer 3", "question 4", "answer 5"]);
    }

    #[test]
    fn test_recent_with_short_transcript() {
        let transcript = transcript_with_turns(2);
        assert_eq!(transcript.recent(10).len(), 2);
    }

    #[test]
    fn test_history_window_excludes_current_question() {
        // 8 prior turns, then the in-flight question is appended.
        let mut transcript = transcript_with_turns(8);
        transcript.append(Turn::user("current question"));

        let window = transcript.history_window(5);
        assert_eq!(window.len(), 5);
        assert!(window.iter().all(|t| t.content != "current question"));

        // Oldest-first: exactly the last 5 of the 8 prior turns.
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["answer 3", "question 4", "answer 5", "question 6", "answer 7"]
        );
    }

    #[test]
    fn test_history_window_on_first_turn() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::user("opening question"));
        assert!(transcript.history_window(5).is_empty());
    }

    #[test]
    fn test_history_window_empty_transcript() {
        let transcript = Transcript::new();
        assert!(transcript.history_window(5).is_empty());
    }
}
