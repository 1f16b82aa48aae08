//! Topic and phrase catalog.
//!
//! The catalog is the read-only collaborator that supplies practice material.
//! It can be loaded from a JSON file at startup or fall back to the built-in
//! demo set.

use crate::phrase::{Level, Phrase};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A practice topic with its phrase pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub level: Level,
    pub description: String,
    pub phrases: Vec<Phrase>,
}

/// The full set of topics available for new sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    /// Loads a catalog from a JSON file containing an array of topics.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file '{}'", path.display()))?;
        let topics: Vec<Topic> = serde_json::from_str(&raw)
            .with_context(|| format!("Catalog file '{}' is not valid JSON", path.display()))?;
        Ok(Self { topics })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Looks a topic up by its exact name.
    pub fn find(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// The built-in demo catalog used when no external catalog is configured.
    pub fn builtin() -> Self {
        let demo_phrases = vec![
            Phrase::new("Hello, how are you today?", "Hola, ¿cómo estás hoy?"),
            Phrase::new("Nice to meet you!", "¡Mucho gusto en conocerte!"),
            Phrase::new(
                "Could you please repeat that?",
                "¿Podrías repetir eso por favor?",
            ),
            Phrase::new(
                "I would like to order a coffee.",
                "Me gustaría pedir un café.",
            ),
            Phrase::new("Thank you very much!", "¡Muchas gracias!"),
        ];

        let topic = |name: &str, level: Level, description: &str| Topic {
            name: name.to_string(),
            level,
            description: description.to_string(),
            phrases: demo_phrases.clone(),
        };

        Self {
            topics: vec![
                topic(
                    "Saludos y Presentaciones",
                    Level::A1,
                    "Aprende a saludar y presentarte en inglés",
                ),
                topic(
                    "En el Restaurante",
                    Level::A2,
                    "Vocabulario para ordenar comida",
                ),
                topic(
                    "Entrevista de Trabajo",
                    Level::B1,
                    "Prepárate para entrevistas laborales",
                ),
                topic(
                    "Viajes y Aeropuerto",
                    Level::B1,
                    "Situaciones comunes al viajar",
                ),
                topic(
                    "Conversación Telefónica",
                    Level::B2,
                    "Habla por teléfono con confianza",
                ),
                topic(
                    "Debate y Opiniones",
                    Level::C1,
                    "Expresa y defiende tus ideas",
                ),
            ],
        }
    }
}
