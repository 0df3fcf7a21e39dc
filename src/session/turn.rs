//! Conversation turns and the append-only turn log

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Opaque turn identifier, sortable by creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    fn now() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One captured utterance or generated reply
///
/// Turns are immutable once created; fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>, latency_ms: Option<u64>) -> Self {
        Self {
            id: TurnId::now(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            latency_ms,
        }
    }

    /// A transcribed user utterance
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    /// An assistant reply with its client-measured relay latency
    #[must_use]
    pub fn assistant(content: impl Into<String>, latency: Duration) -> Self {
        Self::new(Role::Assistant, content, Some(duration_ms(latency)))
    }

    /// A system notice (connection ready, etc)
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, None)
    }

    #[must_use]
    pub const fn id(&self) -> TurnId {
        self.id
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }
}

/// Whole milliseconds in a duration, saturating
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Insertion-ordered log of turns for one session
///
/// Only append and read operations exist.
#[derive(Debug, Clone, Default)]
pub struct TurnLog {
    turns: Vec<Turn>,
}

impl TurnLog {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn, returning a reference to the stored copy
    pub fn append(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Count turns with the given role
    #[must_use]
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_creation_order() {
        let mut log = TurnLog::new();
        log.append(Turn::system("ready"));
        log.append(Turn::user("I have a headache"));
        log.append(Turn::assistant("I'm sorry to hear that.", Duration::from_millis(412)));

        let ids: Vec<TurnId> = log.as_slice().iter().map(Turn::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(log.len(), 3);
        assert_eq!(log.count_role(Role::User), 1);
    }

    #[test]
    fn test_assistant_turn_carries_latency() {
        let turn = Turn::assistant("hello", Duration::from_micros(1_250_900));
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.latency_ms(), Some(1250));

        let user = Turn::user("hi");
        assert_eq!(user.latency_ms(), None);
    }

    #[test]
    fn test_turn_serializes_role_lowercase() {
        let turn = Turn::user("hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
        assert!(json.get("latency_ms").is_none());
    }
}
