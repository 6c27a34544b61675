//! English-learning backend service
//!
//! REST/WebSocket face of the platform: JWT-authenticated endpoints that
//! hand each request to an agent graph (vocabulary, grammar,
//! pronunciation, speaking, assessment, scheduling, progress), backed by
//! SQLite persistence and Azure OpenAI/Speech clients.

pub mod agents;
pub mod api;
pub mod content;
pub mod error;
pub mod services;
