//! The voice session: one turn at a time through capture, relay,
//! synthesis and playback

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::{AbortHandle, JoinHandle};

use super::context::{PatientContext, RelayContext, SessionExtras};
use super::state::{SessionEvent, SessionFailure, SessionPhase, SessionState};
use super::turn::{Turn, TurnLog};
use crate::journey::detect_tool;
use crate::playback::PlaybackEngine;
use crate::relay::{ChatService, HealthCheck, SpeechSynthesizer};
use crate::speech::{CancelToken, SpeechCapture};
use crate::{Error, Result};

const EVENT_CAPACITY: usize = 64;

const READY_MESSAGE: &str = "Voice system ready (speech capture + chat relay + speech synthesis)";

/// The collaborators a session drives
pub struct SessionServices {
    pub capture: SpeechCapture,
    pub chat: Arc<dyn ChatService>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub health: Arc<dyn HealthCheck>,
    pub playback: PlaybackEngine,
}

/// Per-session settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub patient: PatientContext,
    pub extras: SessionExtras,

    /// Speak a greeting once connected
    pub greet_on_connect: bool,

    /// Pause before the greeting starts
    pub greeting_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            patient: PatientContext::default(),
            extras: SessionExtras::default(),
            greet_on_connect: true,
            greeting_delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of [`VoiceSession::toggle_listening`]
#[derive(Debug)]
pub enum Toggle {
    /// A new turn started listening
    Started(TurnHandle),
    /// The listening turn was asked to stop capturing
    Stopped,
    /// Not idle or listening; nothing happened
    Ignored,
}

/// Handle to a spawned turn
#[derive(Debug)]
pub struct TurnHandle(JoinHandle<()>);

impl TurnHandle {
    /// Wait for the turn to settle back to idle
    pub async fn wait(self) {
        match self.0.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => tracing::debug!("turn aborted by disconnect"),
            Err(e) => tracing::error!(error = %e, "turn task failed"),
        }
    }
}

/// A voice conversation with Dr. Maya
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct VoiceSession {
    inner: Arc<Inner>,
}

struct Inner {
    services: SessionServices,
    patient: PatientContext,
    extras: Mutex<SessionExtras>,
    greet_on_connect: bool,
    greeting_delay: Duration,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    turns: Mutex<TurnLog>,
    capture_cancel: Mutex<Option<CancelToken>>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl VoiceSession {
    #[must_use]
    pub fn new(services: SessionServices, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                services,
                patient: options.patient,
                extras: Mutex::new(options.extras),
                greet_on_connect: options.greet_on_connect,
                greeting_delay: options.greeting_delay,
                state,
                events,
                turns: Mutex::new(TurnLog::new()),
                capture_cancel: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Watch every state transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Receive session events
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of the turn log, oldest first
    #[must_use]
    pub fn turns(&self) -> Vec<Turn> {
        lock(&self.inner.turns).as_slice().to_vec()
    }

    #[must_use]
    pub fn patient(&self) -> &PatientContext {
        &self.inner.patient
    }

    #[must_use]
    pub fn extras(&self) -> SessionExtras {
        lock(&self.inner.extras).clone()
    }

    /// Mark a journey tool as active for later relay calls
    pub fn set_active_tool(&self, tool_id: Option<&str>) {
        let mut extras = lock(&self.inner.extras);
        extras.active_tool = tool_id.map(ToString::to_string);
        extras.demonstration_mode = tool_id.is_some();
        tracing::debug!(active_tool = ?extras.active_tool, "active tool changed");
    }

    /// Check the speech capability and the backend, then go idle
    ///
    /// A no-op if already connected or connecting.
    ///
    /// # Errors
    ///
    /// Returns `SpeechUnavailable` or `ServiceUnavailable`; the session is
    /// left disconnected with the failure recorded
    pub async fn connect(&self) -> Result<()> {
        let mut epoch = 0;
        let started = self.inner.state.send_if_modified(|state| {
            if state.phase != SessionPhase::Disconnected {
                return false;
            }
            epoch = state.epoch + 1;
            *state = SessionState {
                phase: SessionPhase::Connecting,
                epoch,
                ..SessionState::default()
            };
            true
        });
        if !started {
            return Ok(());
        }
        tracing::debug!("connecting voice session");

        if let Err(e) = self.check_services().await {
            tracing::warn!(error = %e, "voice session failed to connect");
            let failure = SessionFailure::from(&e);
            let current = self.inner.state.send_if_modified(|state| {
                if state.epoch != epoch || state.phase != SessionPhase::Connecting {
                    return false;
                }
                state.phase = SessionPhase::Disconnected;
                state.last_error = Some(failure.clone());
                true
            });
            if current {
                self.emit(SessionEvent::Failed(failure));
            }
            return Err(e);
        }

        {
            let mut turns = lock(&self.inner.turns);
            if self.inner.state.borrow().epoch == epoch {
                *turns = TurnLog::new();
            }
        }

        let greet = self.inner.greet_on_connect;
        let connected = self.inner.state.send_if_modified(|state| {
            if state.epoch != epoch || state.phase != SessionPhase::Connecting {
                return false;
            }
            state.phase = if greet {
                SessionPhase::Speaking
            } else {
                SessionPhase::Idle
            };
            true
        });
        if !connected {
            // Torn down while connecting
            return Ok(());
        }

        tracing::info!(patient = %self.inner.patient.patient_name, "voice session connected");
        self.append(epoch, Turn::system(READY_MESSAGE));

        if greet {
            let session = self.clone();
            let task = tokio::spawn(async move { session.greet(epoch).await });
            self.track(task.abort_handle());
        }

        Ok(())
    }

    async fn check_services(&self) -> Result<()> {
        self.inner.services.capture.check_available().await?;
        self.inner
            .services
            .health
            .probe()
            .await
            .map_err(|e| match e {
                Error::ServiceUnavailable(_) => e,
                other => Error::ServiceUnavailable(other.to_string()),
            })?;
        Ok(())
    }

    async fn greet(&self, epoch: u64) {
        tokio::time::sleep(self.inner.greeting_delay).await;
        let greeting = format!(
            "Hello {}, I'm Dr. Maya. How are you feeling today?",
            self.inner.patient.patient_name
        );
        if let Err(e) = self.speak(epoch, &greeting).await {
            self.fail(epoch, &e);
        }
    }

    /// Start listening when idle, stop capture when listening
    ///
    /// Every other phase ignores the toggle, so turns never overlap.
    pub fn toggle_listening(&self) -> Toggle {
        let cancel = CancelToken::new();
        let mut stop = None;
        let mut epoch = 0;

        let started = self.inner.state.send_if_modified(|state| match state.phase {
            SessionPhase::Idle => {
                epoch = state.epoch;
                state.phase = SessionPhase::Listening;
                state.last_error = None;
                *lock(&self.inner.capture_cancel) = Some(cancel.clone());
                true
            }
            SessionPhase::Listening => {
                stop = lock(&self.inner.capture_cancel).take();
                false
            }
            _ => false,
        });

        if started {
            tracing::debug!("listening");
            let session = self.clone();
            let task = tokio::spawn(async move {
                session.run_turn(epoch, cancel).await;
            });
            self.track(task.abort_handle());
            return Toggle::Started(TurnHandle(task));
        }

        match stop {
            Some(token) => {
                tracing::debug!("stopping capture");
                token.cancel();
                Toggle::Stopped
            }
            None => {
                tracing::trace!(phase = ?self.state().phase, "toggle ignored");
                Toggle::Ignored
            }
        }
    }

    async fn run_turn(&self, epoch: u64, cancel: CancelToken) {
        let result = self.pipeline(epoch, &cancel).await;
        self.release_capture(&cancel);
        if let Err(e) = result {
            self.fail(epoch, &e);
        }
    }

    async fn pipeline(&self, epoch: u64, cancel: &CancelToken) -> Result<()> {
        let Some(transcript) = self.inner.services.capture.listen(cancel).await? else {
            self.transition(epoch, SessionPhase::Listening, SessionPhase::Idle);
            return Ok(());
        };

        if !self.transition(epoch, SessionPhase::Listening, SessionPhase::Processing) {
            return Ok(());
        }
        self.release_capture(cancel);

        self.append(epoch, Turn::user(transcript.text.clone()));

        let extras = self.extras();
        let context = RelayContext {
            patient: &self.inner.patient,
            extras: &extras,
        };
        let exchange = self
            .inner
            .services
            .chat
            .send(&transcript.text, &context)
            .await?;

        let latency_ms = exchange.latency_ms();
        let current = self.inner.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.last_latency_ms = Some(latency_ms);
            true
        });
        if !current {
            return Ok(());
        }
        if !self.append(epoch, Turn::assistant(exchange.reply.clone(), exchange.latency)) {
            return Ok(());
        }

        if let Some(tool) = detect_tool(&exchange.reply, &transcript.text) {
            tracing::debug!(tool = tool.id, "reply refers to a journey tool");
            self.emit(SessionEvent::ToolSuggested(*tool));
        }

        self.speak(epoch, &exchange.reply).await
    }

    /// Synthesize and play one utterance, then settle to idle
    async fn speak(&self, epoch: u64, text: &str) -> Result<()> {
        let synthesis = self.inner.services.synthesizer.synthesize(text).await?;

        let speaking = self.inner.state.send_if_modified(|state| match state.phase {
            _ if state.epoch != epoch => false,
            SessionPhase::Processing => {
                state.phase = SessionPhase::Speaking;
                true
            }
            SessionPhase::Speaking => true,
            _ => false,
        });
        if !speaking {
            return Ok(());
        }

        let report = self
            .inner
            .services
            .playback
            .play(&synthesis.audio_base64)
            .await?;
        tracing::debug!(
            completed = report.completed,
            playback_rate = report.playback_rate,
            "reply spoken"
        );

        self.transition(epoch, SessionPhase::Speaking, SessionPhase::Idle);
        Ok(())
    }

    /// Stop the current playback; the turn still completes
    pub fn interrupt(&self) -> bool {
        self.inner.services.playback.stop()
    }

    /// Tear the session down: cancel capture, stop playback, release audio
    ///
    /// Turns and greetings still in flight are aborted; any that already got
    /// past an await point find the epoch moved on and leave the next
    /// connection alone.
    pub async fn disconnect(&self) {
        self.inner.state.send_modify(|state| {
            *state = SessionState {
                epoch: state.epoch + 1,
                ..SessionState::default()
            };
        });
        if let Some(token) = lock(&self.inner.capture_cancel).take() {
            token.cancel();
        }
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
        self.inner.services.playback.close().await;
        tracing::info!("voice session disconnected");
    }

    /// Record a failure and return to idle unless torn down
    fn fail(&self, epoch: u64, err: &Error) {
        let failure = SessionFailure::from(err);

        let recorded = self.inner.state.send_if_modified(|state| {
            if state.epoch != epoch || !state.is_connected() {
                return false;
            }
            state.phase = SessionPhase::Idle;
            state.last_error = Some(failure.clone());
            true
        });
        if !recorded {
            tracing::debug!(error = %err, "dropping failure from a torn-down connection");
            return;
        }
        tracing::warn!(error = %err, "voice turn failed");
        self.emit(SessionEvent::Failed(failure));
    }

    /// Move `from` → `to`; false if the phase had already moved on
    fn transition(&self, epoch: u64, from: SessionPhase, to: SessionPhase) -> bool {
        let moved = self.inner.state.send_if_modified(|state| {
            if state.epoch != epoch || state.phase != from {
                return false;
            }
            state.phase = to;
            true
        });
        if moved {
            tracing::debug!(?from, ?to, "session transition");
        }
        moved
    }

    /// Append to the log of connection `epoch`; false once it is gone
    fn append(&self, epoch: u64, turn: Turn) -> bool {
        {
            let mut turns = lock(&self.inner.turns);
            if self.inner.state.borrow().epoch != epoch {
                return false;
            }
            turns.append(turn.clone());
        }
        self.emit(SessionEvent::TurnAppended(turn));
        true
    }

    /// Drop this turn's capture token unless a newer turn owns the slot
    fn release_capture(&self, cancel: &CancelToken) {
        let mut slot = lock(&self.inner.capture_cancel);
        if slot.as_ref().is_some_and(|token| token.same_as(cancel)) {
            slot.take();
        }
    }

    fn track(&self, task: AbortHandle) {
        let mut tasks = lock(&self.inner.tasks);
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
