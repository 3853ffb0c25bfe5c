//! # MacroChef Generate
//!
//! Clients for the remote text-generation service.

pub mod client;
pub mod config;
pub mod fake;
pub mod openai;

pub use client::{compose_messages, ChatMessage, GenerationClient, Role};
pub use config::ModelConfig;
pub use fake::FakeGenerator;
pub use openai::OpenAiClient;
