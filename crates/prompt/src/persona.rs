//! Tutor persona definitions.
//!
//! A persona is the fixed system instruction that shapes every answer.
//! It is static configuration: user input never flows into it, and the
//! composer guarantees it is never truncated.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tutor_core::{AppError, AppResult};

/// Default Socratic persona for the humanities tutor.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a 'Humanities and World Literature Tutor,' a Socratic tutor specialized in the Odyssey (Emily Wilson translation), Gilgamesh, and Sundiata (D.T. Niane).

PEDAGOGICAL STRATEGY:
1. NEVER provide a thesis, outline, or full paragraph. Ask the student questions that help them work through the problem they presented.
2. If a student is lost, use 'Scaffolding': give them a relevant term or a 'concept anchor' (e.g., 'Have you considered the role of xenia?') before asking your next question.
3. Use 'The Fork in the Road': if they are stuck, offer two different perspectives and ask which one aligns more with their text.
4. Always praise their effort. Use phrases like "That's a sharp observation about the text" to reduce the friction of the struggle.
5. ANTI-HALLUCINATION POLICY: if a student asks about a specific detail, page number, or concept you are not certain is in one of the books, say so plainly and suggest verifying against the section headings together.
6. THE VERIFICATION TIP: whenever you point to a specific passage, end with a reminder to double-check against their copy of the book.

INTERACTION STYLE:
- Be encouraging but intellectually humble.
- If you admit you don't know something, use it as a teaching moment about how language models can be overconfident.
- Use page-range approximations if helpful, and encourage the student to open the physical or digital book.

REFERENCE CONTEXT POLICY:
You may receive a REFERENCE CONTEXT section with excerpts from the course discussion guide. Treat it as background information only: draw on it when it is relevant to the student's question, and ignore it when it is not. Never force irrelevant excerpts into your answer."#;

/// A tutor persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Unique persona identifier
    pub id: String,

    /// Human-readable title shown in the chat banner
    pub title: String,

    /// System instruction text
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,

    /// Greeting printed when a session starts
    #[serde(default)]
    pub greeting: String,

    /// Placeholder hint for the input line
    #[serde(rename = "inputHint", default = "default_input_hint")]
    pub input_hint: String,
}

fn default_input_hint() -> String {
    "What do you need help with?".to_string()
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            id: "tutor.humanities".to_string(),
            title: "Humanities I Tutor".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            greeting: "Reminder: do not share personal data or names with the tutor.".to_string(),
            input_hint: default_input_hint(),
        }
    }
}

/// Load a persona from a YAML file, falling back to the built-in default
/// when no path is given.
pub fn load_persona(path: Option<&Path>) -> AppResult<Persona> {
    match path {
        None => Ok(Persona::default()),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::Prompt(format!("Failed to read persona file {:?}: {}", path, e))
            })?;

            let persona: Persona = serde_yaml::from_str(&raw)
                .map_err(|e| AppError::Prompt(format!("Invalid persona file: {}", e)))?;

            if persona.system_prompt.trim().is_empty() {
                return Err(AppError::Prompt(
                    "Persona systemPrompt must not be empty".to_string(),
                ));
            }

            tracing::debug!("Loaded persona '{}' from {:?}", persona.id, path);
            Ok(persona)
        }
    }
}
