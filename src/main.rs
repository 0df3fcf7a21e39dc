use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use base64::Engine as _;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use radiant_compass::journey::{JourneyStage, find_tool};
use radiant_compass::playback::PlaybackEngine;
use radiant_compass::relay::{HealthCheck, SpeechSynthesizer};
use radiant_compass::session::{Role, SessionEvent, SessionExtras, SessionOptions, Toggle};
use radiant_compass::speech::{RecognitionSettings, SpeechCapture, SpeechRecognizer, TextRecognizer};
use radiant_compass::symptoms::symptom_tracker_workflow;
use radiant_compass::voice::{CpalSink, MicrophoneRecognizer, SpeechToText, samples_to_wav};
use radiant_compass::{Backend, Config, FailureKind, SessionServices, VoiceSession};

/// Maya - talk to Dr. Maya, the RadiantCompass voice companion
#[derive(Parser)]
#[command(name = "maya", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a voice session (default)
    Chat {
        /// Where utterances come from
        #[arg(short, long, value_enum, default_value_t = Input::Text)]
        input: Input,

        /// Journey tool to mark as active
        #[arg(long)]
        tool: Option<String>,

        /// Skip the spoken greeting
        #[arg(long)]
        no_greeting: bool,
    },
    /// Check that the voice backend is ready
    Probe,
    /// Speak a line through the synthesis service
    Say {
        /// Text to speak
        #[arg(default_value = "Hello, I'm Dr. Maya. How are you feeling today?")]
        text: String,
    },
    /// Print the symptom-tracker workflow for an utterance
    Symptoms {
        /// What the patient said
        text: String,
    },
    /// List the journey stages and their tools
    Stages,
    /// Play a test tone through the playback path
    TestSpeaker,
}

#[derive(Clone, Copy, ValueEnum)]
enum Input {
    /// One typed line per utterance
    Text,
    /// Default microphone with cloud transcription
    Mic,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,radiant_compass=info",
        1 => "info,radiant_compass=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Chat {
        input: Input::Text,
        tool: None,
        no_greeting: false,
    });

    match command {
        Command::Chat {
            input,
            tool,
            no_greeting,
        } => chat(input, tool.as_deref(), no_greeting).await,
        Command::Probe => probe().await,
        Command::Say { text } => say(&text).await,
        Command::Symptoms { text } => symptoms(&text),
        Command::Stages => {
            stages();
            Ok(())
        }
        Command::TestSpeaker => test_speaker().await,
    }
}

fn speaker() -> PlaybackEngine {
    PlaybackEngine::new(Box::new(CpalSink::shared))
}

/// Run a session until input ends or Ctrl-C
async fn chat(input: Input, tool: Option<&str>, no_greeting: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let backend = Backend::new(&config.api)?;

    let recognizer: Arc<dyn SpeechRecognizer> = match input {
        Input::Text => Arc::new(TextRecognizer::stdin()),
        Input::Mic => {
            let key = config.stt_api_key().with_context(|| {
                format!(
                    "no API key configured for {} transcription",
                    config.voice.stt_provider.as_str()
                )
            })?;
            let stt = SpeechToText::new(
                config.voice.stt_provider,
                key,
                config.voice.stt_model.clone(),
                config.voice.locale.clone(),
            )?;
            Arc::new(MicrophoneRecognizer::new(stt))
        }
    };

    if let Some(id) = tool {
        find_tool(id).with_context(|| format!("unknown tool: {id}"))?;
    }

    let services = SessionServices {
        capture: SpeechCapture::new(
            recognizer,
            RecognitionSettings::single_utterance(&config.voice.locale),
        ),
        chat: Arc::new(backend.chat_relay()?),
        synthesizer: Arc::new(backend.synthesis_relay()?),
        health: Arc::new(backend.health_probe()?),
        playback: speaker(),
    };
    let options = SessionOptions {
        patient: config.patient.clone(),
        extras: SessionExtras::default(),
        greet_on_connect: config.voice.greet_on_connect && !no_greeting,
        ..SessionOptions::default()
    };

    let session = VoiceSession::new(services, options);
    session.set_active_tool(tool);

    let printer = tokio::spawn(print_events(session.events()));
    session.connect().await?;

    println!(
        "Connected as {}. {}",
        session.patient().patient_name,
        match input {
            Input::Text => "Type a message and press Enter (Ctrl-D to end).",
            Input::Mic => "Speak after the prompt (Ctrl-C to end).",
        }
    );

    let mut state = session.subscribe();
    loop {
        let settled = tokio::select! {
            settled = state.wait_for(|s| s.is_idle() || !s.is_connected()) => settled.map(|s| s.clone()),
            _ = tokio::signal::ctrl_c() => break,
        };
        let Ok(settled) = settled else { break };
        if !settled.is_connected() {
            break;
        }
        if matches!(input, Input::Text)
            && settled
                .last_error
                .as_ref()
                .is_some_and(|f| f.kind == FailureKind::SpeechUnavailable)
        {
            // Typed input only fails once stdin is closed
            break;
        }

        let Toggle::Started(turn) = session.toggle_listening() else {
            continue;
        };
        print!("you> ");
        std::io::stdout().flush().ok();

        tokio::select! {
            () = turn.wait() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.disconnect().await;
    printer.abort();
    println!("\nSession ended.");
    Ok(())
}

async fn print_events(mut events: tokio::sync::broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::TurnAppended(turn)) => match turn.role() {
                Role::User => {}
                Role::Assistant => match turn.latency_ms() {
                    Some(ms) => println!("maya> {} ({ms} ms)", turn.content()),
                    None => println!("maya> {}", turn.content()),
                },
                Role::System => println!("-- {}", turn.content()),
            },
            Ok(SessionEvent::ToolSuggested(tool)) => {
                println!("   {} {} (stage {})", tool.icon, tool.name, tool.stage.number());
            }
            Ok(SessionEvent::Failed(failure)) => eprintln!("!! {}", failure.message),
            Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn probe() -> anyhow::Result<()> {
    let config = Config::load()?;
    let backend = Backend::new(&config.api)?;

    println!("Probing {} ...", config.api.base_url);
    let health = backend.health_probe()?.probe().await?;

    println!("Backend reachable");
    println!(
        "  cartesia_available: {}",
        if health.cartesia_available { "yes" } else { "no (fallback)" }
    );
    if let Some(groq) = health.groq_available {
        println!("  groq_available:     {}", if groq { "yes" } else { "no" });
    }
    if let Some(status) = health.status {
        println!("  status:             {status}");
    }
    Ok(())
}

async fn say(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let backend = Backend::new(&config.api)?;

    println!("Synthesizing: \"{text}\"");
    let synthesis = backend.synthesis_relay()?.synthesize(text).await?;
    if let Some(ms) = synthesis.reported_latency_ms {
        println!("Synthesis reported {ms:.0} ms");
    }

    let engine = speaker();
    let report = engine.play(&synthesis.audio_base64).await?;
    engine.close().await;

    println!(
        "Played {} frames: decoded at {} Hz, device {} Hz, playback rate {:.6}",
        report.frames, report.decoded_rate, report.device_rate, report.playback_rate
    );
    Ok(())
}

fn symptoms(text: &str) -> anyhow::Result<()> {
    let workflow = symptom_tracker_workflow(text);
    println!("{}", serde_json::to_string_pretty(&workflow)?);
    Ok(())
}

fn stages() {
    for stage in JourneyStage::ALL {
        let info = stage.info();
        println!("Stage {:2}  {} ({})", info.number, info.name, info.slug);
        println!("          {}", info.theme);
        for tool in stage.tools() {
            println!(
                "          {} {:<24} {:<14} {}",
                tool.icon,
                tool.name,
                tool.category.label(),
                tool.description
            );
        }
        println!();
    }
}

/// Play a 440 Hz tone encoded the way the synthesis service encodes speech
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds (slowed by the rate fix)\n");

    let sample_rate = radiant_compass::playback::NOMINAL_SAMPLE_RATE;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    let wav = samples_to_wav(&samples, sample_rate)?;
    let payload = base64::engine::general_purpose::STANDARD.encode(wav);

    let engine = speaker();
    let report = engine.play(&payload).await?;
    engine.close().await;

    println!(
        "Device {} Hz, playback rate {:.6}, {} frames",
        report.device_rate, report.playback_rate, report.frames
    );
    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}
