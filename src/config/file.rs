//! TOML configuration file loading
//!
//! Supports `~/.config/radiant/compass/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CompassConfigFile {
    /// Backend endpoint configuration
    #[serde(default)]
    pub api: ApiFileConfig,

    /// Patient context sent with every chat relay call
    #[serde(default)]
    pub patient: PatientFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for speech-to-text providers
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Backend endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// Base URL of the ultra-low-latency routes
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Patient context overrides
#[derive(Debug, Default, Deserialize)]
pub struct PatientFileConfig {
    pub name: Option<String>,
    pub emotional_state: Option<String>,
    pub journey_stage: Option<String>,
    pub patient_id: Option<String>,
    pub user_role: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Recognition locale (e.g. "en-US")
    pub locale: Option<String>,

    /// STT provider for microphone input ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: Option<String>,

    /// Speak the greeting after connecting
    pub greet: Option<bool>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CompassConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CompassConfigFile {
    config_file_path().map_or_else(CompassConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `CompassConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_from(path: &Path) -> CompassConfigFile {
    if !path.exists() {
        return CompassConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CompassConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CompassConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/radiant/compass/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("radiant")
            .join("compass")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "http://clinic.local:9500/api/v1/ultra-low-latency"

[patient]
name = "Sam Rivera"

[voice]
greet = false
"#
        )
        .unwrap();

        let fc = load_config_from(file.path());
        assert_eq!(
            fc.api.base_url.as_deref(),
            Some("http://clinic.local:9500/api/v1/ultra-low-latency")
        );
        assert_eq!(fc.api.request_timeout_secs, None);
        assert_eq!(fc.patient.name.as_deref(), Some("Sam Rivera"));
        assert_eq!(fc.voice.greet, Some(false));
        assert!(fc.api_keys.openai.is_none());
    }

    #[test]
    fn test_unparsable_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();

        let fc = load_config_from(file.path());
        assert!(fc.api.base_url.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let fc = load_config_from(Path::new("/nonexistent/radiant/config.toml"));
        assert!(fc.voice.locale.is_none());
    }
}
