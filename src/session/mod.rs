//! Voice session state machine
//!
//! `Disconnected → Connecting → Idle ⇄ Listening → Processing → Speaking →
//! Idle`. Any failure inside a turn lands back on `Idle` with the failure
//! recorded. The toggle guard on the state channel is the only thing that
//! keeps turns from overlapping.

mod context;
mod machine;
mod state;
pub mod turn;

pub use context::{PatientContext, RelayContext, SessionExtras};
pub use machine::{SessionOptions, SessionServices, Toggle, TurnHandle, VoiceSession};
pub use state::{PhaseInfo, SessionEvent, SessionFailure, SessionPhase, SessionState};
pub use turn::{Role, Turn, TurnId, TurnLog};
