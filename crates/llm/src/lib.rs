//! LLM integration crate for the tutor CLI.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models, plus the resilient generator that wraps every
//! completion call in a bounded retry loop with exponential backoff.
//!
//! # Example
//! ```no_run
//! use tutor_llm::{Generator, LlmRequest, RetryPolicy, providers::GeminiClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GeminiClient::new("api-key"));
//! let generator = Generator::new(client, RetryPolicy::default());
//! let request = LlmRequest::new("What is xenia?", "gemini-2.5-flash");
//! let response = generator.generate(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod generator;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use generator::{Generator, RetryPolicy, Sleeper, TokioSleeper};
pub use providers::GeminiClient;
