//! Sous - a voice-driven cooking assistant
//!
//! Turns a list of ingredients into recipes, then talks you through
//! cooking them in the voice of a chef persona:
//! - Recipe generation from typed or photographed ingredients
//! - Press-and-hold voice questions answered in the chef's voice
//! - Step narration via hosted text-to-speech
//! - Saved recipes, ratings, and custom chef voices per account
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        CLI                           │
//! │   generate │ scan │ cook │ saved │ chef │ account   │
//! └──────────────────────┬───────────────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────────────┐
//! │             ConversationOrchestrator                 │
//! │   Capture │ STT │ Prompt │ Chat │ TTS │ Playback    │
//! └──────────────────────┬───────────────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────────────┐
//! │                 Hosted services                      │
//! │   OpenAI │ Fish Audio │ Spoonacular │ Firebase      │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod generate;
pub mod images;
pub mod orchestrator;
pub mod persona;
pub mod prompt;
pub mod recipe;
pub mod store;
pub mod vision;
pub mod voice;

pub use auth::{AuthClient, AuthSession};
pub use chat::{ChatClient, ChatMessage};
pub use config::Config;
pub use error::{Error, Result};
pub use generate::RecipeGenerator;
pub use images::ImageSearch;
pub use orchestrator::{
    AudioMode, ConversationOrchestrator, TurnOutcome, TurnState,
};
pub use persona::{Persona, PersonaId, PersonaLibrary, builtin_personas};
pub use recipe::{Recipe, RecipeContext, parse_recipes};
pub use store::{Profile, StoreClient};
pub use vision::IngredientScanner;
