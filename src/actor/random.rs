//! A seeded actor that picks uniformly among legal moves.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{format_reply, Actor, ActorError, ChatRequest, DecisionRequest};
use crate::protocol::Action;

/// Chance of ending the phase when an end action is on offer.
const END_BIAS: f64 = 0.25;
/// Chance of a global chat line when chat is allowed.
const CHAT_RATE: f64 = 0.02;
/// Chance of accepting an alliance offered in private chat.
const ACCEPT_RATE: f64 = 0.5;

const TAUNTS: [&str; 4] = [
    "The dice will decide.",
    "Nobody is safe.",
    "Borders are merely suggestions.",
    "I am watching the east.",
];

/// Random legal play. The generator sits behind a mutex because the actor is
/// shared with the decision worker.
#[derive(Debug)]
pub struct RandomActor {
    rng: Mutex<SmallRng>,
}

impl RandomActor {
    pub fn new(seed: u64) -> Self {
        RandomActor {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut SmallRng) -> T) -> Result<T, ActorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ActorError::Provider("random source poisoned".into()))?;
        Ok(f(&mut rng))
    }
}

impl Actor for RandomActor {
    fn decide(&self, request: &DecisionRequest) -> Result<String, ActorError> {
        let templates = &request.valid_actions;
        if templates.is_empty() {
            return Err(ActorError::Provider("no valid actions offered".into()));
        }
        self.with_rng(|rng| {
            if request.allow_chat && rng.gen_bool(CHAT_RATE) {
                let message = TAUNTS.choose(rng).copied().unwrap_or_default();
                return format_reply(
                    "Talk is cheap.",
                    &Action::GlobalChat {
                        message: message.to_string(),
                    },
                );
            }
            let end = templates.iter().find(|t| t.is_end());
            let template = match end {
                Some(end) if rng.gen_bool(END_BIAS) => end,
                _ => &templates[rng.gen_range(0..templates.len())],
            };
            let action = template.instantiate(|lo, hi| {
                if hi <= lo {
                    lo
                } else {
                    rng.gen_range(lo..=hi)
                }
            });
            format_reply("Rolling with it.", &action)
        })
    }

    fn converse(&self, request: &ChatRequest) -> Result<String, ActorError> {
        let proposed = request
            .history
            .last()
            .is_some_and(|m| m.message.trim_end().ends_with("PROPOSAL: ALLIANCE"));
        self.with_rng(|rng| {
            if proposed {
                if rng.gen_bool(ACCEPT_RATE) {
                    "Agreed. ACCEPT_PROPOSAL".to_string()
                } else {
                    "Not this time. REJECT_PROPOSAL".to_string()
                }
            } else if request.history.is_empty() && rng.gen_bool(ACCEPT_RATE) {
                format!("{}, shall we stop fighting? PROPOSAL: ALLIANCE", request.partner)
            } else {
                TAUNTS.choose(rng).copied().unwrap_or_default().to_string()
            }
        })
    }
}
