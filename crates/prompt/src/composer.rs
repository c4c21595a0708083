//! Prompt composition: persona + retrieved context + history + question.
//!
//! The composed request keeps three user-side segments distinct and
//! labeled (reference context, recent conversation, student question)
//! so the generation step can apply the persona's "context is informative
//! only" policy. The persona travels separately as the system instruction
//! and is never truncated; when the character budget is exceeded, whole
//! oldest history turns are dropped first, then the context is cut, and
//! the question always survives intact.

use crate::persona::Persona;
use crate::transcript::Turn;
use handlebars::Handlebars;
use serde_json::json;
use tutor_core::{AppError, AppResult};

/// Template for the user-side prompt text. The current question is its
/// own labeled segment after the history block, never folded into it.
const USER_TEMPLATE: &str = "\
{{#if context}}REFERENCE CONTEXT:
{{context}}

{{/if}}{{#if history}}RECENT CONVERSATION:
{{history}}

{{/if}}STUDENT QUESTION:
{{question}}";

/// Composition knobs.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Number of prior turns folded into the history block
    pub history_turns: usize,

    /// Character budget for the composed user text
    pub max_prompt_chars: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            max_prompt_chars: 24_000,
        }
    }
}

/// A composed generation request: system instruction plus user text.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    /// Persona text, passed as the system instruction
    pub system: String,

    /// Rendered user text with labeled segments
    pub user: String,
}

/// Compose a generation request.
///
/// `history` must already exclude the in-flight question (see
/// `Transcript::history_window`); the question arrives separately.
pub fn compose(
    persona: &Persona,
    context: &str,
    history: &[Turn],
    question: &str,
    config: &ComposerConfig,
) -> AppResult<ComposedPrompt> {
    let window = if history.len() > config.history_turns {
        &history[history.len() - config.history_turns..]
    } else {
        history
    };

    let mut turns: Vec<&Turn> = window.iter().collect();
    let mut context_chars: Vec<char> = context.trim().chars().collect();

    loop {
        let rendered = render(&context_chars, &turns, question)?;
        if rendered.chars().count() <= config.max_prompt_chars {
            tracing::debug!(
                "Composed prompt: {} chars, {} history turns, {} context chars",
                rendered.chars().count(),
                turns.len(),
                context_chars.len()
            );
            return Ok(ComposedPrompt {
                system: persona.system_prompt.clone(),
                user: rendered,
            });
        }

        // Over budget: drop the oldest history turn first, then shrink
        // the context. The question itself is never cut.
        if !turns.is_empty() {
            turns.remove(0);
        } else if !context_chars.is_empty() {
            let excess = render(&context_chars, &turns, question)?
                .chars()
                .count()
                .saturating_sub(config.max_prompt_chars);
            let keep = context_chars.len().saturating_sub(excess.max(1));
            context_chars.truncate(keep);
        } else {
            // Nothing left to trim; the question alone exceeds the
            // budget and is passed through whole.
            return Ok(ComposedPrompt {
                system: persona.system_prompt.clone(),
                user: render(&context_chars, &turns, question)?,
            });
        }
    }
}

/// Render the user-side template.
fn render(context_chars: &[char], turns: &[&Turn], question: &str) -> AppResult<String> {
    let context: String = context_chars.iter().collect();
    let history = turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string("user", USER_TEMPLATE)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(
            "user",
            &json!({
                "context": context,
                "history": history,
                "question": question,
            }),
        )
        .map_err(|e| AppError::Prompt(format!("Failed to render prompt: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("question {}", i))
                } else {
                    Turn::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_segments_are_labeled_and_ordered() {
        let persona = Persona::default();
        let history = turns(2);
        let prompt = compose(
            &persona,
            "Xenia binds host and guest.",
            &history,
            "What is xenia?",
            &ComposerConfig::default(),
        )
        .unwrap();

        assert_eq!(prompt.system, persona.system_prompt);

        let context_pos = prompt.user.find("REFERENCE CONTEXT:").unwrap();
        let history_pos = prompt.user.find("RECENT CONVERSATION:").unwrap();
        let question_pos = prompt.user.find("STUDENT QUESTION:").unwrap();
        assert!(context_pos < history_pos);
        assert!(history_pos < question_pos);
        assert!(prompt.user.ends_with("What is xenia?"));
    }

    #[test]
    fn test_empty_context_omits_context_segment() {
        let prompt = compose(
            &Persona::default(),
            "",
            &turns(2),
            "Who is Enkidu?",
            &ComposerConfig::default(),
        )
        .unwrap();

        assert!(!prompt.user.contains("REFERENCE CONTEXT:"));
        assert!(prompt.user.contains("RECENT CONVERSATION:"));
    }

    #[test]
    fn test_empty_history_omits_history_segment() {
        let prompt = compose(
            &Persona::default(),
            "Some context.",
            &[],
            "Who is Enkidu?",
            &ComposerConfig::default(),
        )
        .unwrap();

        assert!(prompt.user.contains("REFERENCE CONTEXT:"));
        assert!(!prompt.user.contains("RECENT CONVERSATION:"));
    }

    #[test]
    fn test_history_renders_role_content_lines_oldest_first() {
        let history = turns(4);
        let prompt = compose(
            &Persona::default(),
            "",
            &history,
            "next?",
            &ComposerConfig::default(),
        )
        .unwrap();

        let q0 = prompt.user.find("user: question 0").unwrap();
        let a1 = prompt.user.find("assistant: answer 1").unwrap();
        let q2 = prompt.user.find("user: question 2").unwrap();
        assert!(q0 < a1);
        assert!(a1 < q2);
    }

    #[test]
    fn test_history_window_is_bounded() {
        let history = turns(8);
        let config = ComposerConfig {
            history_turns: 5,
            ..ComposerConfig::default()
        };
        let prompt = compose(&Persona::default(), "", &history, "next?", &config).unwrap();

        // Exactly the last 5 turns appear.
        assert!(!prompt.user.contains("question 0"));
        assert!(!prompt.user.contains("answer 1"));
        assert!(!prompt.user.contains("question 2"));
        assert!(prompt.user.contains("answer 3"));
        assert!(prompt.user.contains("answer 7"));
    }

    #[test]
    fn test_budget_drops_history_before_context() {
        let history = turns(4);
        let context = "c".repeat(200);
        let config = ComposerConfig {
            history_turns: 5,
            max_prompt_chars: 260,
        };

        let prompt = compose(&Persona::default(), &context, &history, "q?", &config).unwrap();

        assert!(prompt.user.chars().count() <= 260);
        // History went first; some context survived.
        assert!(!prompt.user.contains("RECENT CONVERSATION:"));
        assert!(prompt.user.contains("REFERENCE CONTEXT:"));
        assert!(prompt.user.ends_with("q?"));
    }

    #[test]
    fn test_budget_truncates_context_after_history() {
        let context = "x".repeat(1000);
        let config = ComposerConfig {
            history_turns: 5,
            max_prompt_chars: 200,
        };

        let prompt = compose(&Persona::default(), &context, &[], "q?", &config).unwrap();

        assert!(prompt.user.chars().count() <= 200);
        assert!(prompt.user.ends_with("q?"));
    }

    #[test]
    fn test_persona_and_question_are_never_cut() {
        let persona = Persona::default();
        let question = "why does Odysseus weep at the bard's song?";
        let config = ComposerConfig {
            history_turns: 5,
            max_prompt_chars: 10, // absurdly small
        };

        let prompt = compose(&persona, "context", &turns(6), question, &config).unwrap();

        assert_eq!(prompt.system, persona.system_prompt);
        assert!(prompt.user.contains(question));
    }
}
