//! TOML configuration file loading
//!
//! Supports `~/.config/souschef/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on
//! top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SousConfigFile {
    /// Default chef identifier (e.g. "gordon")
    #[serde(default)]
    pub chef: Option<String>,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Firebase project settings
    #[serde(default)]
    pub firebase: FirebaseFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Timeout for external calls, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub fish_audio: Option<String>,
    pub spoonacular: Option<String>,
}

/// Firebase project settings
#[derive(Debug, Default, Deserialize)]
pub struct FirebaseFileConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Chat model for replies and recipe generation (e.g. "gpt-4o-mini")
    pub llm_model: Option<String>,

    /// Synthesis output container (e.g. "mp3")
    pub tts_format: Option<String>,
}

/// Load the TOML config file, returning defaults when absent or invalid
#[must_use]
pub fn load_config_file() -> SousConfigFile {
    let Some(path) = config_file_path() else {
        return SousConfigFile::default();
    };

    if !path.exists() {
        return SousConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
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
                SousConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SousConfigFile::default()
        }
    }
}

/// Path of the config file: `~/.config/souschef/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("souschef").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let config: SousConfigFile = toml::from_str(
            r#"
            chef = "mario"

            [api_keys]
            openai = "sk-test"

            [voice]
            llm_model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.chef.as_deref(), Some("mario"));
        assert_eq!(config.api_keys.openai.as_deref(), Some("sk-test"));
        assert!(config.api_keys.fish_audio.is_none());
        assert_eq!(config.voice.llm_model.as_deref(), Some("gpt-4o-mini"));
        assert!(config.voice.stt_model.is_none());
    }

    #[test]
    fn empty_file_is_defaults() {
        let config: SousConfigFile = toml::from_str("").unwrap();
        assert!(config.chef.is_none());
        assert!(config.request_timeout_secs.is_none());
    }
}
