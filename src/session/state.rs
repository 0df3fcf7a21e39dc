//! Session phases, the published state record, and session events

use serde::Serialize;

use super::turn::Turn;
use crate::error::{Error, FailureKind};
use crate::journey::Tool;

/// Where the session is in the turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Disconnected,
    Connecting,
    Idle,
    Listening,
    Processing,
    Speaking,
}

/// Display attributes of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub label: &'static str,
    pub indicator: &'static str,
}

static PHASE_INFO: [PhaseInfo; 6] = [
    PhaseInfo {
        label: "Disconnected",
        indicator: "○",
    },
    PhaseInfo {
        label: "Connecting...",
        indicator: "◌",
    },
    PhaseInfo {
        label: "Ready",
        indicator: "●",
    },
    PhaseInfo {
        label: "Listening...",
        indicator: "🎤",
    },
    PhaseInfo {
        label: "Dr. Maya is thinking...",
        indicator: "…",
    },
    PhaseInfo {
        label: "Dr. Maya is speaking...",
        indicator: "🔊",
    },
];

impl SessionPhase {
    #[must_use]
    pub fn info(self) -> &'static PhaseInfo {
        &PHASE_INFO[self as usize]
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// A turn is in flight
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Listening | Self::Processing | Self::Speaking)
    }
}

/// A failure recorded on the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Error> for SessionFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}

/// Observable session record
///
/// Listening, processing and speaking are derived from a single phase, so
/// at most one of them holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub last_latency_ms: Option<u64>,
    pub last_error: Option<SessionFailure>,

    /// Bumped on every connect and disconnect; work started under an older
    /// value belongs to a torn-down connection
    #[serde(skip)]
    pub(crate) epoch: u64,
}

impl SessionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        !matches!(
            self.phase,
            SessionPhase::Disconnected | SessionPhase::Connecting
        )
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, SessionPhase::Idle)
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        matches!(self.phase, SessionPhase::Listening)
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self.phase, SessionPhase::Processing)
    }

    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        matches!(self.phase, SessionPhase::Speaking)
    }
}

/// Something observers may want to react to
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A turn was appended to the log
    TurnAppended(Turn),
    /// The last exchange refers to a journey tool
    ToolSuggested(Tool),
    /// A step failed and the session recovered
    Failed(SessionFailure),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_exclusive() {
        for phase in [
            SessionPhase::Disconnected,
            SessionPhase::Connecting,
            SessionPhase::Idle,
            SessionPhase::Listening,
            SessionPhase::Processing,
            SessionPhase::Speaking,
        ] {
            let state = SessionState {
                phase,
                ..SessionState::default()
            };
            let active = [
                state.is_listening(),
                state.is_processing(),
                state.is_speaking(),
            ]
            .into_iter()
            .filter(|f| *f)
            .count();
            assert!(active <= 1, "{phase:?}");
            assert_eq!(active == 1, phase.is_busy());
        }
    }

    #[test]
    fn test_default_is_disconnected() {
        let state = SessionState::default();
        assert_eq!(state.phase, SessionPhase::Disconnected);
        assert!(!state.is_connected());
        assert_eq!(state.phase.label(), "Disconnected");
    }

    #[test]
    fn test_failure_from_error() {
        let failure = SessionFailure::from(&Error::Relay("timeout".into()));
        assert_eq!(failure.kind, FailureKind::Relay);
        assert_eq!(failure.message, "relay error: timeout");
    }
}
