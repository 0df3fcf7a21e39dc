//! Configuration management for the voice companion

pub mod file;

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::session::PatientContext;
use crate::voice::SttProvider;
use crate::{Error, Result};

/// Default base URL of the ultra-low-latency backend routes
pub const DEFAULT_BASE_URL: &str = "http://localhost:9500/api/v1/ultra-low-latency";

/// Default per-request timeout for relay calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Voice companion configuration
#[derive(Debug)]
pub struct Config {
    /// Backend endpoints
    pub api: ApiConfig,

    /// Patient context sent with every chat relay call
    pub patient: PatientContext,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys for speech-to-text providers
    pub api_keys: ApiKeys,
}

/// Backend endpoint configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the ultra-low-latency routes
    pub base_url: Url,

    /// Per-request timeout (relay calls have no contract timeout of their own)
    pub request_timeout: Duration,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Recognition locale
    pub locale: String,

    /// STT provider used by the microphone recognizer
    pub stt_provider: SttProvider,

    /// STT model identifier
    pub stt_model: String,

    /// Speak the greeting after connecting
    pub greet_on_connect: bool,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper)
    pub openai: Option<SecretString>,

    /// `Deepgram` API key
    pub deepgram: Option<SecretString>,
}

impl ApiConfig {
    /// Endpoint configuration for a base URL with the default timeout
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            stt_provider: SttProvider::Whisper,
            stt_model: SttProvider::Whisper.default_model().to_string(),
            greet_on_connect: true,
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the base URL, timeout, or STT provider is invalid
    pub fn from_sources<F>(fc: file::CompassConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = env("RADIANT_API_URL")
            .or(fc.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let request_timeout = match env("RADIANT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("invalid RADIANT_REQUEST_TIMEOUT_SECS: {raw}"))
            })?,
            None => fc
                .api
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT.as_secs()),
        };
        if request_timeout == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }

        let defaults = PatientContext::default();
        let patient = PatientContext {
            patient_name: env("RADIANT_PATIENT_NAME")
                .or(fc.patient.name)
                .unwrap_or(defaults.patient_name),
            emotional_state: fc
                .patient
                .emotional_state
                .unwrap_or(defaults.emotional_state),
            journey_stage: fc.patient.journey_stage.unwrap_or(defaults.journey_stage),
            patient_id: fc.patient.patient_id.unwrap_or(defaults.patient_id),
            user_role: fc.patient.user_role.unwrap_or(defaults.user_role),
        };

        let stt_provider = match env("RADIANT_STT_PROVIDER").or(fc.voice.stt_provider) {
            Some(name) => name.parse::<SttProvider>()?,
            None => SttProvider::Whisper,
        };
        let stt_model = env("RADIANT_STT_MODEL")
            .or(fc.voice.stt_model)
            .unwrap_or_else(|| stt_provider.default_model().to_string());

        let voice = VoiceConfig {
            locale: env("RADIANT_LOCALE")
                .or(fc.voice.locale)
                .unwrap_or_else(|| "en-US".to_string()),
            stt_provider,
            stt_model,
            greet_on_connect: fc.voice.greet.unwrap_or(true),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(fc.api_keys.deepgram)
                .map(SecretString::from),
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                request_timeout: Duration::from_secs(request_timeout),
            },
            patient,
            voice,
            api_keys,
        })
    }

    /// Key for the configured STT provider, if present
    #[must_use]
    pub const fn stt_api_key(&self) -> Option<&SecretString> {
        match self.voice.stt_provider {
            SttProvider::Whisper => self.api_keys.openai.as_ref(),
            SttProvider::Deepgram => self.api_keys.deepgram.as_ref(),
        }
    }
}

/// Parse and normalize the backend base URL
///
/// A trailing slash is enforced so endpoint names join underneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| Error::Config(format!("invalid base URL {raw}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("base URL cannot be a base: {raw}")));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
