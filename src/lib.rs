//! Conquest engine library.
//!
//! Exposes the board model, rules, legal-action generation, the actor
//! protocol and the turn orchestrator for use by the binaries and the
//! integration tests.

pub mod actor;
pub mod board;
pub mod config;
pub mod engine;
pub mod movegen;
pub mod orchestrator;
pub mod protocol;
pub mod rules;
pub mod tournament;
