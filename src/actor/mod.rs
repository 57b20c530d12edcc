//! Decision-making players.
//!
//! The orchestrator only knows the `Actor` capability: given a request it
//! returns reply text, the way a language-model provider would. Built-in
//! actors are looked up by provider identifier.

pub mod passive;
pub mod random;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::protocol::{ActionTemplate, ChatMessage};

pub use passive::PassiveActor;
pub use random::RandomActor;

/// Provider identifiers accepted by `actor_for`.
pub const PROVIDERS: [&str; 2] = ["random", "passive"];

/// Failure inside an actor or its provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActorError {
    #[error("provider failure: {0}")]
    Provider(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}

/// Everything an actor sees when asked for a move.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub player: String,
    pub snapshot: Value,
    pub valid_actions: Vec<ActionTemplate>,
    pub rules: &'static str,
    /// Context for this request, e.g. why the previous reply was refused.
    pub hint: Option<String>,
    /// Whether chat actions are accepted for this decision.
    pub allow_chat: bool,
}

/// One turn of a private conversation.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub speaker: String,
    pub partner: String,
    pub history: Vec<ChatMessage>,
    pub snapshot: Value,
}

/// A player capability. Replies are raw text and are parsed by the caller.
pub trait Actor: Send + Sync {
    /// Returns a `{"thought": ..., "action": {...}}` reply.
    fn decide(&self, request: &DecisionRequest) -> Result<String, ActorError>;

    /// Returns the next message in a private conversation.
    fn converse(&self, request: &ChatRequest) -> Result<String, ActorError>;
}

/// Formats a reply the way actors are asked to.
pub fn format_reply(thought: &str, action: &impl serde::Serialize) -> String {
    serde_json::json!({ "thought": thought, "action": action }).to_string()
}

/// Builds the built-in actor registered under `provider`.
pub fn actor_for(provider: &str, seed: u64) -> Result<Arc<dyn Actor>, ActorError> {
    match provider {
        "random" => Ok(Arc::new(RandomActor::new(seed))),
        "passive" => Ok(Arc::new(PassiveActor)),
        other => Err(ActorError::UnknownProvider(other.to_string())),
    }
}
