//! Shared test utilities: fake recognizers, relays and audio sinks

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use radiant_compass::playback::{AudioSink, PlaybackEngine};
use radiant_compass::relay::{
    ChatExchange, ChatService, HealthCheck, HealthStatus, SpeechSynthesizer, Synthesis,
};
use radiant_compass::session::{RelayContext, SessionExtras, SessionOptions, SessionServices};
use radiant_compass::speech::{
    CancelToken, RecognitionSettings, SpeechCapture, SpeechRecognizer, Transcript,
};
use radiant_compass::{Error, PatientContext, Result, VoiceSession};

/// Recognizer that replays scripted utterances, then waits forever
pub struct ScriptedRecognizer {
    utterances: Mutex<VecDeque<Result<String>>>,
    delay: Duration,
    available: bool,
    pub calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(utterances: &[&str]) -> Self {
        Self {
            utterances: Mutex::new(utterances.iter().map(|u| Ok((*u).to_string())).collect()),
            delay: Duration::from_millis(10),
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: Error) -> Self {
        let recognizer = Self::new(&[]);
        recognizer.utterances.lock().unwrap().push_back(Err(err));
        recognizer
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(&[])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(Error::SpeechUnavailable("speech recognition not supported".into()))
        }
    }

    async fn recognize(
        &self,
        _settings: &RecognitionSettings,
        _cancel: &CancelToken,
    ) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let next = self.utterances.lock().unwrap().pop_front();
        match next {
            Some(utterance) => utterance.map(Transcript::new),
            None => std::future::pending().await,
        }
    }
}

/// Chat service with a fixed reply
pub struct FakeChat {
    reply: String,
    delay: Duration,
    fail: bool,
    pub calls: AtomicUsize,
    pub last_context: Mutex<Option<serde_json::Value>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::from_millis(5),
            fail: false,
            calls: AtomicUsize::new(0),
            last_context: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ChatService for FakeChat {
    async fn send(&self, _transcript: &str, context: &RelayContext<'_>) -> Result<ChatExchange> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = Some(serde_json::to_value(context)?);

        let started = std::time::Instant::now();
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(Error::Relay("chat endpoint returned 502 Bad Gateway".into()));
        }

        Ok(ChatExchange {
            reply: self.reply.clone(),
            latency: started.elapsed(),
            server_latency_ms: Some(1.0),
        })
    }
}

/// Synthesizer that returns a fixed payload
pub struct FakeSynth {
    audio_base64: Option<String>,
    pub calls: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
}

impl FakeSynth {
    pub fn with_audio(audio_base64: String) -> Self {
        Self {
            audio_base64: Some(audio_base64),
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn tone() -> Self {
        Self::with_audio(tone_base64(50))
    }

    pub fn failing() -> Self {
        Self {
            audio_base64: None,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, text: &str) -> Result<Synthesis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        tokio::time::sleep(Duration::from_millis(5)).await;

        match &self.audio_base64 {
            Some(audio) => Ok(Synthesis {
                audio_base64: audio.clone(),
                reported_latency_ms: Some(40.0),
            }),
            None => Err(Error::Synthesis("response missing audio_base64".into())),
        }
    }
}

/// Health check that can be flipped between ready and down
pub struct FakeHealth {
    pub ready: AtomicBool,
}

impl FakeHealth {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
        }
    }
}

#[async_trait]
impl HealthCheck for FakeHealth {
    async fn probe(&self) -> Result<HealthStatus> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(HealthStatus {
                cartesia_available: true,
                ..HealthStatus::default()
            })
        } else {
            Err(Error::ServiceUnavailable("connection refused".into()))
        }
    }
}

/// Audio sink that "plays" by sleeping for the rendered duration
pub struct FakeSink {
    rate: u32,
    hold: Option<Duration>,
    pub played: Mutex<Vec<usize>>,
}

impl FakeSink {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            hold: None,
            played: Mutex::new(Vec::new()),
        }
    }

    /// Keep every playback running for `hold` instead of the audio length
    pub fn holding(rate: u32, hold: Duration) -> Self {
        Self {
            hold: Some(hold),
            ..Self::new(rate)
        }
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    async fn play(&self, samples: Vec<f32>, stop: CancelToken) -> Result<bool> {
        self.played.lock().unwrap().push(samples.len());
        let length = self.hold.unwrap_or_else(|| {
            Duration::from_secs_f64(samples.len() as f64 / f64::from(self.rate))
        });

        tokio::select! {
            () = tokio::time::sleep(length) => Ok(true),
            () = stop.cancelled() => Ok(false),
        }
    }
}

/// Playback engine over a shared fake sink, counting sink opens
pub fn engine_with(sink: Arc<FakeSink>) -> (PlaybackEngine, Arc<AtomicUsize>) {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    let engine = PlaybackEngine::new(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let sink: Arc<dyn AudioSink> = sink.clone();
        Ok(sink)
    }));
    (engine, opened)
}

/// Mono 16-bit WAV of a quiet 440 Hz tone at 22050 Hz
pub fn tone_wav(ms: u32) -> Vec<u8> {
    let rate = 22_050;
    let frames = rate * ms / 1000;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 3000.0;
            writer.write_sample(sample as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn tone_base64(ms: u32) -> String {
    base64::engine::general_purpose::STANDARD.encode(tone_wav(ms))
}

/// Everything a session test wants to poke at afterwards
pub struct Harness {
    pub session: VoiceSession,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub chat: Arc<FakeChat>,
    pub synth: Arc<FakeSynth>,
    pub health: Arc<FakeHealth>,
    pub sink: Arc<FakeSink>,
    pub sink_opens: Arc<AtomicUsize>,
}

pub struct HarnessBuilder {
    recognizer: ScriptedRecognizer,
    chat: FakeChat,
    synth: FakeSynth,
    health: FakeHealth,
    sink: FakeSink,
    greet: bool,
    greeting_delay: Duration,
}

impl HarnessBuilder {
    pub fn new(utterances: &[&str]) -> Self {
        Self {
            recognizer: ScriptedRecognizer::new(utterances),
            chat: FakeChat::replying("I'm here with you."),
            synth: FakeSynth::tone(),
            health: FakeHealth::new(true),
            sink: FakeSink::new(48_000),
            greet: false,
            greeting_delay: Duration::ZERO,
        }
    }

    pub fn recognizer(mut self, recognizer: ScriptedRecognizer) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn chat(mut self, chat: FakeChat) -> Self {
        self.chat = chat;
        self
    }

    pub fn synth(mut self, synth: FakeSynth) -> Self {
        self.synth = synth;
        self
    }

    pub fn health(mut self, health: FakeHealth) -> Self {
        self.health = health;
        self
    }

    pub fn sink(mut self, sink: FakeSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn greet(mut self) -> Self {
        self.greet = true;
        self
    }

    /// Greet on connect after `delay`
    pub fn greet_after(mut self, delay: Duration) -> Self {
        self.greet = true;
        self.greeting_delay = delay;
        self
    }

    pub fn build(self) -> Harness {
        let recognizer = Arc::new(self.recognizer);
        let chat = Arc::new(self.chat);
        let synth = Arc::new(self.synth);
        let health = Arc::new(self.health);
        let sink = Arc::new(self.sink);
        let (playback, sink_opens) = engine_with(Arc::clone(&sink));

        let services = SessionServices {
            capture: SpeechCapture::new(
                recognizer.clone(),
                RecognitionSettings::single_utterance("en-US"),
            ),
            chat: chat.clone(),
            synthesizer: synth.clone(),
            health: health.clone(),
            playback,
        };
        let options = SessionOptions {
            patient: PatientContext::default(),
            extras: SessionExtras::default(),
            greet_on_connect: self.greet,
            greeting_delay: self.greeting_delay,
        };

        Harness {
            session: VoiceSession::new(services, options),
            recognizer,
            chat,
            synth,
            health,
            sink,
            sink_opens,
        }
    }
}

/// Wait (bounded) until the session settles on a phase matching `pred`
pub async fn settle<F>(session: &VoiceSession, pred: F)
where
    F: Fn(&radiant_compass::SessionState) -> bool,
{
    let mut rx = session.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| pred(s)))
        .await
        .expect("session did not settle")
        .expect("session state channel closed");
}
