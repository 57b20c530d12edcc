//! Actor wire protocol.
//!
//! Typed actions and action templates, structural matching of actor replies
//! against the offered templates, reply decoding, state snapshots and the
//! static rules text shipped with every request.

pub mod action;
pub mod matching;
pub mod reply;
pub mod rules_text;
pub mod snapshot;

pub use action::{Action, ActionTemplate};
pub use matching::{match_action, DecisionError};
pub use reply::{parse_reply, Reply};
pub use rules_text::RULES_TEXT;
pub use snapshot::{ChatMessage, StateSnapshot};
