//! Chef persona definitions and lookup
//!
//! A persona is a named conversational identity: a fixed behavioral prompt
//! template plus the voice-model identifier the synthesis service uses for
//! it. Built-in chefs are a fixed set loaded at process start; user-created
//! chefs are persisted in the document store and merged in per session.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a persona as either built-in or user-created
///
/// The two kinds live in separate namespaces so a custom chef can never
/// shadow a built-in one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PersonaId {
    /// One of the fixed chefs shipped with the app
    BuiltIn(String),
    /// A user-created chef persisted in the document store
    Custom(String),
}

impl PersonaId {
    /// The raw identifier without the kind tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BuiltIn(id) | Self::Custom(id) => id,
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn(id) => write!(f, "{id}"),
            Self::Custom(id) => write!(f, "custom:{id}"),
        }
    }
}

/// A chef persona
///
/// Invariant: every persona resolves to exactly one voice identifier and
/// one prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier
    pub id: PersonaId,

    /// Display name
    pub name: String,

    /// Opaque voice-model identifier understood by the synthesis service
    pub voice_id: String,

    /// Fixed behavioral prompt template
    pub prompt: String,

    /// Optional portrait image URL
    pub portrait_url: Option<String>,
}

impl Persona {
    /// Create a user-created persona from stored fields
    #[must_use]
    pub fn custom(id: String, name: String, voice_id: String, prompt: String) -> Self {
        Self {
            id: PersonaId::Custom(id),
            name,
            voice_id,
            prompt,
            portrait_url: None,
        }
    }
}

/// The fixed set of built-in chefs
#[must_use]
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: PersonaId::BuiltIn("gordon".to_string()),
            name: "Gordon Ramsay".to_string(),
            voice_id: "e605a2a42b0a44ccb7af2e42e1676c92".to_string(),
            prompt: "You are Gordon Ramsay.\n\
                     You MUST respond in Gordon Ramsay's tone:\n\
                     - direct\n\
                     - helpful\n\
                     - slightly insulting but not abusive\n\
                     - short (1-3 sentences)\n\
                     - extremely clear cooking guidance"
                .to_string(),
            portrait_url: None,
        },
        Persona {
            id: PersonaId::BuiltIn("mario".to_string()),
            name: "Mario".to_string(),
            voice_id: "dcb361299bf540fe897b57494ed4b26b".to_string(),
            prompt: "You are Mario from the Super Mario Bros. franchise.\n\
                     Speak friendly, upbeat, and energetic.\n\
                     Add a little bit of an italian accent.\n\
                     Keep responses 1-3 sentences max."
                .to_string(),
            portrait_url: None,
        },
        Persona {
            id: PersonaId::BuiltIn("guy".to_string()),
            name: "Guy Fieri".to_string(),
            voice_id: "8bffd5a802ea48df8502e8e30cf48c3a".to_string(),
            prompt: "You are Guy Fieri: flamboyant, energetic, fun, entertaining.\n\
                     Keep it 1-3 sentences max."
                .to_string(),
            portrait_url: None,
        },
        Persona {
            id: PersonaId::BuiltIn("anthony".to_string()),
            name: "Anthony Bourdain".to_string(),
            voice_id: "31437b4203d74c9a9b97fffd8bdb9c47".to_string(),
            prompt: "You are Anthony Bourdain: adventurous, candid, gritty, \
                     empathetic, witty, worldly, dry, laid-back.\n\
                     Keep it 1-3 sentences max."
                .to_string(),
            portrait_url: None,
        },
    ]
}

/// O(1) persona lookup over built-in and user-created chefs
#[derive(Debug, Clone)]
pub struct PersonaLibrary {
    personas: HashMap<PersonaId, Persona>,
}

impl PersonaLibrary {
    /// Create a library containing only the built-in chefs
    #[must_use]
    pub fn new() -> Self {
        let personas = builtin_personas()
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self { personas }
    }

    /// Merge user-created chefs loaded from the document store
    ///
    /// Custom ids live in their own namespace, so a custom chef named
    /// "gordon" never replaces the built-in.
    pub fn merge_custom(&mut self, custom: Vec<Persona>) {
        for persona in custom {
            debug_assert!(matches!(persona.id, PersonaId::Custom(_)));
            self.personas.insert(persona.id.clone(), persona);
        }
    }

    /// Look up a persona by id
    #[must_use]
    pub fn get(&self, id: &PersonaId) -> Option<&Persona> {
        self.personas.get(id)
    }

    /// Resolve a persona, failing with `PersonaNotFound`
    ///
    /// # Errors
    ///
    /// Returns `Error::PersonaNotFound` if no persona has the given id
    pub fn resolve(&self, id: &PersonaId) -> crate::Result<&Persona> {
        self.get(id)
            .ok_or_else(|| crate::Error::PersonaNotFound(id.to_string()))
    }

    /// Resolve a built-in persona by raw id
    ///
    /// # Errors
    ///
    /// Returns `Error::PersonaNotFound` if the id is not a built-in chef
    pub fn resolve_builtin(&self, id: &str) -> crate::Result<&Persona> {
        self.resolve(&PersonaId::BuiltIn(id.to_string()))
    }

    /// Resolve a chef the way users name them on the command line
    ///
    /// Tries the built-in id first ("gordon"), then falls back to a
    /// case-insensitive name match so custom chefs are reachable too.
    ///
    /// # Errors
    ///
    /// Returns `Error::PersonaNotFound` if neither lookup matches
    pub fn resolve_named(&self, name: &str) -> crate::Result<&Persona> {
        self.resolve_builtin(name).or_else(|_| {
            self.iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| crate::Error::PersonaNotFound(name.to_string()))
        })
    }

    /// All personas, built-in and custom
    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.values()
    }

    /// Number of personas in the library
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Whether the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaLibrary {
    fn default() -> Self {
        Self::new()
    }
}
