//! Configuration management

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

/// Default chat model for replies and recipe generation
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default transcription model
const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Default synthesis output container
const DEFAULT_TTS_FORMAT: &str = "mp3";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Default chef identifier
    pub chef: String,

    /// API keys
    pub api_keys: ApiKeys,

    /// Firebase project settings
    pub firebase: FirebaseConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Directory for transient audio clips
    pub cache_dir: PathBuf,

    /// Directory for persisted state (session file)
    pub data_dir: PathBuf,

    /// Timeout applied to each external call
    pub request_timeout: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper, chat completions, ingredient vision)
    pub openai: Option<String>,

    /// Fish Audio API key (synthesis and voice training)
    pub fish_audio: Option<String>,

    /// Spoonacular API key (recipe image lookup, optional)
    pub spoonacular: Option<String>,
}

/// Firebase project settings for auth and the document store
#[derive(Debug, Clone, Default)]
pub struct FirebaseConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Chat model (e.g. "gpt-4o-mini")
    pub llm_model: String,

    /// Synthesis output container (e.g. "mp3")
    pub tts_format: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: DEFAULT_STT_MODEL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            tts_format: DEFAULT_TTS_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with env > toml > default precedence
    #[must_use]
    pub fn load() -> Self {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            fish_audio: std::env::var("FISH_AUDIO_API_KEY")
                .ok()
                .or(fc.api_keys.fish_audio),
            spoonacular: std::env::var("SPOONACULAR_API_KEY")
                .ok()
                .or(fc.api_keys.spoonacular),
        };

        let firebase = FirebaseConfig {
            api_key: std::env::var("FIREBASE_API_KEY").ok().or(fc.firebase.api_key),
            project_id: std::env::var("FIREBASE_PROJECT_ID")
                .ok()
                .or(fc.firebase.project_id),
        };

        let voice = VoiceConfig {
            stt_model: std::env::var("SOUS_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            llm_model: std::env::var("SOUS_LLM_MODEL")
                .ok()
                .or(fc.voice.llm_model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            tts_format: fc
                .voice
                .tts_format
                .unwrap_or_else(|| DEFAULT_TTS_FORMAT.to_string()),
        };

        let chef = std::env::var("SOUS_CHEF")
            .ok()
            .or(fc.chef)
            .unwrap_or_else(|| "gordon".to_string());

        let cache_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".cache/souschef"),
            |d| d.cache_dir().join("souschef"),
        );

        // ~/.local/share/souschef on Linux
        let data_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".local/share/souschef"),
            |d| d.data_dir().join("souschef"),
        );

        let request_timeout = Duration::from_secs(
            std::env::var("SOUS_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.request_timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Self {
            chef,
            api_keys,
            firebase,
            voice,
            cache_dir,
            data_dir,
            request_timeout,
        }
    }
}
