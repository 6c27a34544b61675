//! LLM-driven learning agents
//!
//! Each pillar of the curriculum is handled by one agent; the
//! orchestrator routes a request to the right agent and threads a shared
//! [`ConversationState`] through the graph. Agents never talk to each
//! other directly, only through the state.

pub mod assessment;
pub mod error_integration;
pub mod grammar;
pub mod orchestrator;
pub mod progress;
pub mod pronunciation;
pub mod scheduler;
pub mod speaking;
pub mod state;
pub mod vocabulary;

pub use orchestrator::Orchestrator;
pub use state::ConversationState;

use std::sync::Arc;

use async_trait::async_trait;
use lingua_common::config::Settings;
use lingua_common::Result;
use sqlx::SqlitePool;

use crate::services::{OpenAiClient, SpeechClient};

/// Shared dependencies injected into every agent
#[derive(Clone)]
pub struct AgentContext {
    pub db: SqlitePool,
    pub llm: Arc<OpenAiClient>,
    pub speech: Arc<SpeechClient>,
    pub settings: Arc<Settings>,
}

/// One node in the agent graph
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable agent name, used in logs and the state's message trail
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Handle the request, mutating the shared state
    async fn process(&self, ctx: &AgentContext, state: &mut ConversationState) -> Result<()>;
}
