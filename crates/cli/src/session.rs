//! Per-turn session pipeline.
//!
//! One user turn runs one synchronous pipeline pass: append the turn,
//! retrieve context, compose the prompt, generate with retry, append the
//! response. Generation failures are turn-scoped: the user turn stays in
//! history, no assistant turn is appended, and the session remains usable
//! for the next turn.

use std::sync::Arc;
use tutor_core::{AppConfig, AppResult};
use tutor_knowledge::{create_embedder, IndexCache, Retriever};
use tutor_llm::{create_client, Generator, LlmRequest, RetryPolicy};
use tutor_prompt::{compose, load_persona, ComposerConfig, Persona, Transcript, Turn};
use uuid::Uuid;

/// A chat session: transcript plus the wired pipeline components.
pub struct ChatSession {
    id: Uuid,
    persona: Persona,
    transcript: Transcript,
    retriever: Retriever,
    generator: Generator,
    composer_config: ComposerConfig,
    model: String,
}

impl ChatSession {
    /// Wire a session from configuration.
    ///
    /// The index cache is passed in so concurrent sessions in one process
    /// share a single build.
    pub fn from_config(config: &AppConfig, cache: Arc<IndexCache>) -> AppResult<ChatSession> {
        let api_key = config.resolve_api_key();

        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            api_key.as_deref(),
        )?;

        let embedder = create_embedder(
            &config.embedding_provider,
            &config.embedding_model,
            config.endpoint.as_deref(),
            api_key.as_deref(),
        )?;

        let retriever = Retriever::new(
            cache,
            embedder,
            config.corpus_path.clone(),
            config.chunk_size,
            config.chunk_overlap,
            config.top_k,
        );

        let generator = Generator::new(client, RetryPolicy::from(&config.retry));

        let persona = load_persona(config.persona_file.as_deref())?;

        Ok(Self::new(
            persona,
            retriever,
            generator,
            ComposerConfig {
                history_turns: config.history_turns,
                max_prompt_chars: config.max_prompt_chars,
            },
            config.model.clone(),
        ))
    }

    /// Assemble a session from prebuilt components (used by tests).
    pub fn new(
        persona: Persona,
        retriever: Retriever,
        generator: Generator,
        composer_config: ComposerConfig,
        model: String,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "Starting chat session");

        Self {
            id,
            persona,
            transcript: Transcript::new(),
            retriever,
            generator,
            composer_config,
            model,
        }
    }

    /// Run the pipeline for one user turn.
    pub async fn handle_turn(&mut self, user_text: &str) -> AppResult<String> {
        self.transcript.append(Turn::user(user_text));

        // Empty in degrade mode; the tutor then answers from the persona
        // alone.
        let context = self.retriever.retrieve(user_text).await;

        let prompt = {
            let history = self
                .transcript
                .history_window(self.composer_config.history_turns);
            compose(
                &self.persona,
                &context,
                history,
                user_text,
                &self.composer_config,
            )?
        };

        let request = LlmRequest::new(prompt.user, &self.model).with_system(prompt.system);

        let response = self.generator.generate(&request).await?;

        self.transcript.append(Turn::assistant(&response.content));

        tracing::debug!(
            session = %self.id,
            turns = self.transcript.len(),
            "Turn completed"
        );

        Ok(response.content)
    }

    /// The session persona.
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// The session transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}
