//! Prompt system for the tutor CLI.
//!
//! Holds the tutor persona (YAML-loadable, with a built-in default), the
//! session transcript, and the composer that merges persona, retrieved
//! context, and conversation history into a single generation request.

pub mod composer;
pub mod persona;
pub mod transcript;

// Re-export commonly used types
pub use composer::{compose, ComposedPrompt, ComposerConfig};
pub use persona::{load_persona, Persona};
pub use transcript::{Role, Transcript, Turn};
