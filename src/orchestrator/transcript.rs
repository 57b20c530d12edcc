//! Chat records: the bounded global channel and private conversations.

use serde::Serialize;

use crate::protocol::ChatMessage;

/// Suffix that offers an alliance in private chat.
pub const PROPOSAL_MARKER: &str = "PROPOSAL: ALLIANCE";
/// Suffix that accepts the partner's offer.
pub const ACCEPT_MARKER: &str = "ACCEPT_PROPOSAL";
/// Suffix that declines the partner's offer.
pub const REJECT_MARKER: &str = "REJECT_PROPOSAL";
/// Stored in place of a message the actor failed to produce.
pub const NO_RESPONSE: &str = "(no response)";

/// How a private conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEnd {
    /// Ran out of exchanges.
    Exhausted,
    AllianceFormed,
    ProposalRejected,
}

/// A two-party exchange started by a `PRIVATE_CHAT` action.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub turn: u32,
    pub participants: [String; 2],
    pub messages: Vec<ChatMessage>,
    pub end: Option<ConversationEnd>,
}

/// Reaction of the latest message to an offer made in the message before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    None,
    Accepted,
    Rejected,
}

fn ends_with_marker(message: &str, marker: &str) -> bool {
    message.trim_end().ends_with(marker)
}

impl Conversation {
    pub fn new(turn: u32, initiator: &str, partner: &str, opening: String) -> Self {
        Conversation {
            turn,
            participants: [initiator.to_string(), partner.to_string()],
            messages: vec![ChatMessage {
                turn,
                sender: initiator.to_string(),
                message: opening,
            }],
            end: None,
        }
    }

    pub fn push(&mut self, sender: &str, message: String) {
        self.messages.push(ChatMessage {
            turn: self.turn,
            sender: sender.to_string(),
            message,
        });
    }

    /// Checks whether the last message answers an alliance offer made in
    /// the one before it.
    pub fn negotiation(&self) -> Negotiation {
        let [.., offer, reply] = self.messages.as_slice() else {
            return Negotiation::None;
        };
        if !ends_with_marker(&offer.message, PROPOSAL_MARKER) {
            return Negotiation::None;
        }
        if ends_with_marker(&reply.message, ACCEPT_MARKER) {
            Negotiation::Accepted
        } else if ends_with_marker(&reply.message, REJECT_MARKER) {
            Negotiation::Rejected
        } else {
            Negotiation::None
        }
    }
}

/// Everything said during a game.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    global: Vec<ChatMessage>,
    #[serde(skip)]
    global_limit: usize,
    conversations: Vec<Conversation>,
    #[serde(skip)]
    conversation_limit: usize,
}

impl Transcript {
    pub fn new(global_limit: usize, conversation_limit: usize) -> Self {
        Transcript {
            global_limit,
            conversation_limit,
            ..Default::default()
        }
    }

    /// Appends to the global channel, dropping the oldest lines past the limit.
    pub fn post_global(&mut self, turn: u32, sender: &str, message: String) {
        self.global.push(ChatMessage {
            turn,
            sender: sender.to_string(),
            message,
        });
        let excess = self.global.len().saturating_sub(self.global_limit);
        self.global.drain(..excess);
    }

    pub fn global(&self) -> &[ChatMessage] {
        &self.global
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Stores a new conversation and returns its index. The oldest
    /// conversations are dropped first, so earlier indices are only valid
    /// until the next call.
    pub fn open(&mut self, conversation: Conversation) -> usize {
        let excess = (self.conversations.len() + 1).saturating_sub(self.conversation_limit.max(1));
        self.conversations.drain(..excess);
        self.conversations.push(conversation);
        self.conversations.len() - 1
    }

    pub fn conversation_mut(&mut self, index: usize) -> Option<&mut Conversation> {
        self.conversations.get_mut(index)
    }
}
