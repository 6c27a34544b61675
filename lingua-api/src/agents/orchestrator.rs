//! Agent graph orchestrator
//!
//! Routes each request to its pillar agent by request type, then walks
//! the post-agent edges: detected errors flow to error integration,
//! completed activities to progress bookkeeping, and every path ends in
//! a finalized response stamped with the request id.

use chrono::Utc;
use lingua_common::models::user::User;
use lingua_common::Result;
use serde_json::{json, Value};

use super::assessment::AssessmentAgent;
use super::error_integration::ErrorIntegrationAgent;
use super::grammar::GrammarAgent;
use super::progress::ProgressAgent;
use super::pronunciation::PronunciationAgent;
use super::scheduler::SchedulerAgent;
use super::speaking::SpeakingAgent;
use super::vocabulary::VocabularyAgent;
use super::{Agent, AgentContext, ConversationState};

/// Entry node for a request type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Assessment,
    Scheduler,
    Progress,
    Vocabulary,
    Grammar,
    Pronunciation,
    Speaking,
}

/// The request-type routing table
pub fn route_for(request_type: &str) -> Option<Route> {
    match request_type {
        "assessment_initial" | "assessment_continuous" => Some(Route::Assessment),
        "get_schedule" | "get_next_activity" => Some(Route::Scheduler),
        "get_progress" => Some(Route::Progress),
        "vocabulary_exercise" => Some(Route::Vocabulary),
        "grammar_lesson" | "grammar_exercise" => Some(Route::Grammar),
        "pronunciation_exercise" | "shadowing" => Some(Route::Pronunciation),
        "speaking_session" => Some(Route::Speaking),
        _ => None,
    }
}

pub struct Orchestrator {
    ctx: AgentContext,
    assessment: AssessmentAgent,
    scheduler: SchedulerAgent,
    progress: ProgressAgent,
    vocabulary: VocabularyAgent,
    grammar: GrammarAgent,
    pronunciation: PronunciationAgent,
    speaking: SpeakingAgent,
    error_integration: ErrorIntegrationAgent,
}

impl Orchestrator {
    pub fn new(ctx: AgentContext) -> Self {
        Self {
            ctx,
            assessment: AssessmentAgent,
            scheduler: SchedulerAgent,
            progress: ProgressAgent,
            vocabulary: VocabularyAgent,
            grammar: GrammarAgent,
            pronunciation: PronunciationAgent,
            speaking: SpeakingAgent,
            error_integration: ErrorIntegrationAgent,
        }
    }

    /// Run one request through the graph. Agent failures never
    /// propagate; they are folded into the finalized response.
    pub async fn handle(&self, request_type: &str, user: User, input: Value) -> ConversationState {
        let mut state = ConversationState::new(request_type, user, input);
        tracing::debug!(request_id = %state.request_id, request_type, "Orchestrating request");

        let Some(route) = route_for(request_type) else {
            state.has_error = true;
            state.error_kind = Some("invalid_input".to_string());
            state.error_message = Some(format!("Unknown request type: {}", request_type));
            state.response = json!({
                "type": "error",
                "message": format!("Unknown request type: {}", request_type),
            });
            finalize(&mut state);
            return state;
        };

        let entry: &dyn Agent = match route {
            Route::Assessment => &self.assessment,
            Route::Scheduler => &self.scheduler,
            Route::Progress => &self.progress,
            Route::Vocabulary => &self.vocabulary,
            Route::Grammar => &self.grammar,
            Route::Pronunciation => &self.pronunciation,
            Route::Speaking => &self.speaking,
        };

        if self.run(entry, &mut state).await {
            self.walk_edges(route, &mut state).await;
        }
        finalize(&mut state);
        state
    }

    /// Post-agent edges per entry route
    async fn walk_edges(&self, route: Route, state: &mut ConversationState) {
        match route {
            Route::Assessment => {
                if state.assessment.final_scores.is_some() {
                    self.run(&self.progress, state).await;
                }
            }
            Route::Vocabulary | Route::Grammar | Route::Pronunciation => {
                if state.errors.has_pending() && !self.run(&self.error_integration, state).await {
                    return;
                }
                if state.activity_output.is_some() {
                    self.run(&self.progress, state).await;
                }
            }
            Route::Speaking => {
                if !state.speaking.session_ended {
                    return;
                }
                if state.errors.has_pending() && !self.run(&self.error_integration, state).await {
                    return;
                }
                self.run(&self.progress, state).await;
            }
            Route::Scheduler | Route::Progress => {}
        }
    }

    /// Run one agent with error isolation, returning whether it succeeded
    async fn run(&self, agent: &dyn Agent, state: &mut ConversationState) -> bool {
        match agent.process(&self.ctx, state).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    request_id = %state.request_id,
                    agent = agent.name(),
                    error = %err,
                    "Agent failed"
                );
                state.has_error = true;
                state.error_kind = Some(error_kind(&err).to_string());
                state.error_message = Some(err.to_string());
                state.response = json!({
                    "type": "error",
                    "agent": agent.name(),
                    "message": err.to_string(),
                });
                false
            }
        }
    }
}

/// Error classification handed to the HTTP layer
fn error_kind(err: &lingua_common::Error) -> &'static str {
    use lingua_common::Error;
    match err {
        Error::NotFound(_) => "not_found",
        Error::InvalidInput(_) => "invalid_input",
        Error::Unauthorized(_) => "unauthorized",
        Error::Forbidden(_) => "forbidden",
        Error::ExternalService(_) => "external_service",
        _ => "internal",
    }
}

/// Mark the state complete and stamp the response
fn finalize(state: &mut ConversationState) {
    state.is_complete = true;
    if !state.response.is_object() {
        state.response = json!({});
    }
    if let Value::Object(map) = &mut state.response {
        map.insert("request_id".to_string(), json!(state.request_id));
        map.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table_covers_every_request_type() {
        assert_eq!(route_for("assessment_initial"), Some(Route::Assessment));
        assert_eq!(route_for("assessment_continuous"), Some(Route::Assessment));
        assert_eq!(route_for("get_schedule"), Some(Route::Scheduler));
        assert_eq!(route_for("get_next_activity"), Some(Route::Scheduler));
        assert_eq!(route_for("get_progress"), Some(Route::Progress));
        assert_eq!(route_for("vocabulary_exercise"), Some(Route::Vocabulary));
        assert_eq!(route_for("grammar_lesson"), Some(Route::Grammar));
        assert_eq!(route_for("grammar_exercise"), Some(Route::Grammar));
        assert_eq!(route_for("pronunciation_exercise"), Some(Route::Pronunciation));
        assert_eq!(route_for("shadowing"), Some(Route::Pronunciation));
        assert_eq!(route_for("speaking_session"), Some(Route::Speaking));
    }

    #[test]
    fn unknown_request_types_do_not_route() {
        assert_eq!(route_for("make_coffee"), None);
        assert_eq!(route_for(""), None);
    }

    #[test]
    fn finalize_stamps_the_response() {
        let user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let mut state = ConversationState::new("get_progress", user, json!({}));
        state.response = json!({"type": "progress_dashboard"});
        finalize(&mut state);
        assert!(state.is_complete);
        assert_eq!(state.response["request_id"], json!(state.request_id));
        assert!(state.response.get("timestamp").is_some());
    }

    #[test]
    fn finalize_tolerates_a_missing_response() {
        let user = User::new(
            "ana@example.com".to_string(),
            "Ana".to_string(),
            "hash".to_string(),
        );
        let mut state = ConversationState::new("get_progress", user, json!({}));
        finalize(&mut state);
        assert!(state.response.is_object());
        assert!(state.response.get("request_id").is_some());
    }
}
