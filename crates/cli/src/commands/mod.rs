//! Command handlers for the tutor CLI.

mod ask;
mod chat;
mod corpus;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use corpus::CorpusCommand;
