//! Interactive chat command.
//!
//! The terminal is the rendering surface: it displays the ordered turns
//! and supplies new student text. Per-turn errors are rendered in place
//! of an answer and never appended to the transcript, so a failed turn
//! cannot poison future context.

use crate::session::ChatSession;
use clap::Args;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tutor_core::{AppConfig, AppError, AppResult};
use tutor_knowledge::IndexCache;

/// Start an interactive tutoring session
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let cache = Arc::new(IndexCache::new());
        let mut session = ChatSession::from_config(config, cache)?;

        let stdout = std::io::stdout();
        let stdin = std::io::stdin();

        {
            let mut out = stdout.lock();
            writeln!(out, "{}", session.persona().title)?;
            writeln!(out, "{}", session.persona().greeting)?;
            writeln!(out, "({}; type 'exit' to quit)", session.persona().input_hint)?;
            writeln!(out)?;
        }

        let mut lines = stdin.lock().lines();

        loop {
            {
                let mut out = stdout.lock();
                write!(out, "you> ")?;
                out.flush()?;
            }

            let line = match lines.next() {
                Some(line) => line?,
                None => break, // EOF
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                break;
            }

            match session.handle_turn(input).await {
                Ok(answer) => {
                    let mut out = stdout.lock();
                    writeln!(out, "\ntutor> {}\n", answer)?;
                }
                Err(AppError::Overloaded(message)) => {
                    let mut out = stdout.lock();
                    writeln!(out, "\n{}\n", message)?;
                }
                Err(err) => {
                    tracing::error!(error = %err, "Turn failed");
                    let mut out = stdout.lock();
                    writeln!(out, "\nAn unexpected error occurred: {}\n", err)?;
                }
            }
        }

        tracing::info!(
            "Session ended after {} turns",
            session.transcript().len()
        );

        Ok(())
    }
}
