// LLM integration: the chat-completions client and prompt templates.

pub mod client;
pub mod prompt;
