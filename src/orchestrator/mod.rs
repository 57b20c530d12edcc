//! Turn orchestration.
//!
//! Drives a game from setup to the end: finds the acting player, asks its
//! actor for a decision through the `DecisionWorker`, validates the reply
//! against the offered templates and applies it through the engine. On top of
//! the phase machine it runs the decisions that belong to other players
//! (alliance answers, Neutral defense dice) and private conversations.
//!
//! `tick` never blocks; `run` drives `tick` to completion and awaits the
//! worker whenever a reply is outstanding.

pub mod transcript;
pub mod worker;

use std::sync::Arc;

use rand::rngs::SmallRng;
use serde::Serialize;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::actor::{actor_for, Actor, ActorError, ChatRequest, DecisionRequest};
use crate::board::{BoardError, Phase, PlayerId};
use crate::config::{ConfigError, GameConfig};
use crate::engine::{Applied, Engine, RandomSource};
use crate::movegen::alliance_response_templates;
use crate::protocol::{
    match_action, parse_reply, Action, ActionTemplate, DecisionError, StateSnapshot, RULES_TEXT,
};
use crate::rules::{GameOutcome, RuleViolation};

pub use transcript::{Conversation, ConversationEnd, Transcript};
pub use worker::{DecisionWorker, Job};

use transcript::{Negotiation, NO_RESPONSE};

const CHAT_HINT: &str = "Your message was delivered. Now choose your action.";

/// Failures that stop the game.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("state corruption: {0}")]
    StateCorruption(String),

    #[error("a decision request is already in flight")]
    RequestInFlight,

    #[error("game setup failed: {0}")]
    Setup(#[from] RuleViolation),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Actor(#[from] ActorError),

    #[error("failed to serialize state snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("{expected} players need actors but {given} were given")]
    ActorCount { expected: usize, given: usize },
}

fn corruption(message: impl Into<String>) -> OrchestratorError {
    let message = message.into();
    error!(%message, "state corruption");
    OrchestratorError::StateCorruption(message)
}

/// Bounds applied while driving a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// The game ends with `TurnLimit` once this many rounds have been played.
    pub max_turns: u32,
    /// Attempts per decision before the fallback action is used.
    pub max_decision_attempts: u32,
    /// Actions one player may take in one phase before its end is forced.
    pub max_phase_actions: u32,
    /// Requests for an elimination trade before it is waived.
    pub max_forced_trades: u32,
    /// Round trips in a private conversation.
    pub chat_max_exchanges: u32,
    pub global_chat_limit: usize,
    /// Private conversations kept in the transcript; older ones are dropped.
    pub conversation_limit: usize,
    pub event_feed_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_turns: 200,
            max_decision_attempts: 3,
            max_phase_actions: 30,
            max_forced_trades: 5,
            chat_max_exchanges: 3,
            global_chat_limit: 100,
            conversation_limit: 50,
            event_feed_limit: 50,
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Winner { player: String },
    Draw,
    TurnLimit,
}

impl Outcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Outcome::Winner { player } => Some(player),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner { player } => write!(f, "{player} wins"),
            Outcome::Draw => f.write_str("draw"),
            Outcome::TurnLimit => f.write_str("turn limit reached"),
        }
    }
}

/// Counters over all decisions of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub requests: u64,
    pub retries: u64,
    pub fallbacks: u64,
    pub provider_failures: u64,
}

/// Summary of a finished game.
#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    pub outcome: Outcome,
    pub turns: u32,
    pub stats: DecisionStats,
}

/// What a call to `tick` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// A reply is still outstanding.
    Waiting,
    /// A request was sent to an actor.
    Dispatched,
    /// The game advanced without a new request.
    Progressed,
    Finished(Outcome),
}

/// Why a decision is being asked for.
#[derive(Debug, Clone)]
pub enum Purpose {
    /// The acting player's move in the current phase.
    Turn,
    /// Dice for a Neutral territory attacked with `attack`.
    NeutralDefense { attacker: PlayerId, attack: Action },
    /// Answer to an alliance proposal.
    AllianceResponse { proposer: PlayerId },
}

/// A decision awaiting its reply.
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub player: PlayerId,
    pub purpose: Purpose,
    pub templates: Vec<ActionTemplate>,
    pub attempt: u32,
    pub allow_chat: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingChat {
    conversation: usize,
    speaker: PlayerId,
    partner: PlayerId,
}

enum Pending {
    Decision(PendingDecision),
    Chat(PendingChat),
}

/// Work to start once an action has been handled.
enum FollowUp {
    None,
    Decision(PendingDecision, Option<String>),
    Chat(PendingChat),
}

/// The action used when an actor keeps failing: the phase end if offered,
/// a refusal for alliance proposals, else the first template's default.
pub fn fallback_action(templates: &[ActionTemplate]) -> Option<Action> {
    templates
        .iter()
        .find(|t| t.is_end())
        .or_else(|| {
            templates
                .iter()
                .find(|t| matches!(t, ActionTemplate::RejectAlliance { .. }))
        })
        .or_else(|| templates.first())
        .map(ActionTemplate::default_action)
}

/// True when the menu is a mandatory card trade.
fn is_forced_trade(templates: &[ActionTemplate]) -> bool {
    templates
        .iter()
        .any(|t| matches!(t, ActionTemplate::TradeCards { must_trade: true, .. }))
}

const fn in_turn(phase: Phase) -> bool {
    matches!(phase, Phase::Reinforce | Phase::Attack | Phase::Fortify)
}

/// Runs one game.
pub struct Orchestrator<R: RandomSource = SmallRng> {
    engine: Engine<R>,
    actors: Vec<Option<Arc<dyn Actor>>>,
    limits: Limits,
    worker: DecisionWorker,
    pending: Option<Pending>,
    transcript: Transcript,
    phase_key: Option<(u32, PlayerId, Phase)>,
    phase_actions: u32,
    forced_trades: u32,
    next_hint: Option<String>,
    stats: DecisionStats,
    finished: Option<Outcome>,
}

impl Orchestrator<SmallRng> {
    /// Builds a game from a validated configuration.
    pub fn from_config(config: &GameConfig, handle: Handle) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let board = config.load_board()?;
        let engine = Engine::new_game(board, config.variant, &config.seats(), config.rules, config.seed)?;
        let actors = config
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| actor_for(&p.provider, config.actor_seed(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(engine, actors, config.limits(), handle)
    }
}

impl<R: RandomSource> Orchestrator<R> {
    /// `actors` are assigned to the non-Neutral players in seat order.
    pub fn new(
        engine: Engine<R>,
        actors: Vec<Arc<dyn Actor>>,
        limits: Limits,
        handle: Handle,
    ) -> Result<Self, OrchestratorError> {
        let players = &engine.state().players;
        let expected = players.iter().filter(|p| !p.is_neutral).count();
        if expected != actors.len() {
            return Err(OrchestratorError::ActorCount {
                expected,
                given: actors.len(),
            });
        }
        let mut given = actors.into_iter();
        let actors = players
            .iter()
            .map(|p| if p.is_neutral { None } else { given.next() })
            .collect();
        Ok(Orchestrator {
            engine,
            actors,
            limits,
            worker: DecisionWorker::new(handle),
            pending: None,
            transcript: Transcript::new(limits.global_chat_limit, limits.conversation_limit),
            phase_key: None,
            phase_actions: 0,
            forced_trades: 0,
            next_hint: None,
            stats: DecisionStats::default(),
            finished: None,
        })
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn stats(&self) -> DecisionStats {
        self.stats
    }

    /// The decision currently awaiting a reply, if any.
    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        match &self.pending {
            Some(Pending::Decision(d)) => Some(d),
            _ => None,
        }
    }

    /// Plays the game to the end.
    pub async fn run(&mut self) -> Result<GameReport, OrchestratorError> {
        loop {
            match self.tick()? {
                Tick::Finished(outcome) => {
                    return Ok(GameReport {
                        outcome,
                        turns: self.engine.state().turn,
                        stats: self.stats,
                    })
                }
                Tick::Waiting => self.worker.wait().await,
                Tick::Dispatched | Tick::Progressed => {}
            }
        }
    }

    /// Advances the game by one step without blocking.
    pub fn tick(&mut self) -> Result<Tick, OrchestratorError> {
        if let Some(outcome) = &self.finished {
            return Ok(Tick::Finished(outcome.clone()));
        }
        if let Some(pending) = self.pending.take() {
            let Some(reply) = self.worker.poll() else {
                self.pending = Some(pending);
                return Ok(Tick::Waiting);
            };
            match pending {
                Pending::Decision(decision) => self.resolve_decision(decision, reply)?,
                Pending::Chat(chat) => self.resolve_chat(chat, reply)?,
            }
            return Ok(if self.pending.is_some() {
                Tick::Dispatched
            } else {
                Tick::Progressed
            });
        }
        if self.engine.advance_automatic() {
            return Ok(Tick::Progressed);
        }
        if let Some(outcome) = self.check_finished() {
            info!(%outcome, turn = self.engine.state().turn, "game finished");
            self.finished = Some(outcome.clone());
            return Ok(Tick::Finished(outcome));
        }
        let player = self
            .engine
            .acting_player()
            .ok_or_else(|| corruption(format!("no acting player in {}", self.engine.phase())))?;
        self.begin_turn_decision(player)
    }

    fn check_finished(&self) -> Option<Outcome> {
        let state = self.engine.state();
        if let Some(outcome) = self.engine.outcome() {
            return Some(match outcome {
                GameOutcome::Winner(p) => Outcome::Winner {
                    player: state.pname(p).to_string(),
                },
                GameOutcome::Draw => Outcome::Draw,
            });
        }
        (in_turn(state.phase) && state.turn > self.limits.max_turns).then_some(Outcome::TurnLimit)
    }

    fn track_phase(&mut self, player: PlayerId) {
        let state = self.engine.state();
        let key = (state.turn, player, state.phase);
        if self.phase_key == Some(key) {
            return;
        }
        if self.phase_key.map(|(_, _, phase)| phase) != Some(state.phase) {
            info!(turn = state.turn, player = %state.pname(player), phase = %state.phase, "phase");
        }
        self.phase_key = Some(key);
        self.phase_actions = 0;
    }

    /// Counts requests for an elimination trade. Only forced trade menus
    /// count, and a re-request after a chat message does not. Once the budget
    /// is spent the trade is waived and the regular menu is returned.
    fn check_forced_trade(&mut self, player: PlayerId, templates: Vec<ActionTemplate>) -> Vec<ActionTemplate> {
        if self.engine.state().elimination_trade != Some(player) {
            self.forced_trades = 0;
            return templates;
        }
        let after_chat = self.next_hint.as_deref() == Some(CHAT_HINT);
        if after_chat || !is_forced_trade(&templates) {
            return templates;
        }
        if self.forced_trades < self.limits.max_forced_trades {
            self.forced_trades += 1;
            return templates;
        }
        warn!(
            player = %self.engine.state().pname(player),
            requests = self.forced_trades,
            "elimination trade waived"
        );
        self.engine.waive_elimination_trade();
        self.forced_trades = 0;
        self.engine.valid_actions(player)
    }

    fn begin_turn_decision(&mut self, player: PlayerId) -> Result<Tick, OrchestratorError> {
        self.track_phase(player);
        let phase = self.engine.phase();
        let templates = self.engine.valid_actions(player);
        let templates = self.check_forced_trade(player, templates);
        if templates.is_empty() {
            return Err(corruption(format!(
                "{} has no legal action in {phase}",
                self.engine.state().pname(player)
            )));
        }
        let capped = self.phase_actions >= self.limits.max_phase_actions;
        if capped && in_turn(phase) {
            let action = fallback_action(&templates)
                .ok_or_else(|| corruption("no fallback action"))?;
            warn!(player = %self.engine.state().pname(player), action = action.kind(), "phase action cap reached");
            self.stats.fallbacks += 1;
            self.engine
                .apply(player, &action)
                .map_err(|e| corruption(format!("forced {} refused: {e}", action.kind())))?;
            self.phase_actions += 1;
            return Ok(Tick::Progressed);
        }
        let decision = PendingDecision {
            player,
            purpose: Purpose::Turn,
            templates,
            attempt: 0,
            allow_chat: !capped,
        };
        let hint = self.next_hint.take();
        self.request(decision, hint)?;
        Ok(Tick::Dispatched)
    }

    fn actor(&self, player: PlayerId) -> Result<Arc<dyn Actor>, OrchestratorError> {
        self.actors
            .get(player.0)
            .and_then(|actor| actor.clone())
            .ok_or_else(|| corruption(format!("player {} has no actor", player.0)))
    }

    fn snapshot(&self, viewer: PlayerId) -> Result<serde_json::Value, OrchestratorError> {
        let snapshot = StateSnapshot::build(
            self.engine.state(),
            Some(viewer),
            self.limits.event_feed_limit,
            self.transcript.global(),
        );
        Ok(snapshot.to_value()?)
    }

    fn request(&mut self, decision: PendingDecision, hint: Option<String>) -> Result<(), OrchestratorError> {
        let actor = self.actor(decision.player)?;
        let request = DecisionRequest {
            player: self.engine.state().pname(decision.player).to_string(),
            snapshot: self.snapshot(decision.player)?,
            valid_actions: decision.templates.clone(),
            rules: RULES_TEXT,
            hint,
            allow_chat: decision.allow_chat,
        };
        self.worker.dispatch(Job::Decide(actor, request))?;
        self.stats.requests += 1;
        self.pending = Some(Pending::Decision(decision));
        Ok(())
    }

    fn request_chat(&mut self, chat: PendingChat) -> Result<(), OrchestratorError> {
        let actor = self.actor(chat.speaker)?;
        let history = self
            .transcript
            .conversations()
            .get(chat.conversation)
            .map(|c| c.messages.clone())
            .ok_or_else(|| corruption("conversation vanished"))?;
        let state = self.engine.state();
        let request = ChatRequest {
            speaker: state.pname(chat.speaker).to_string(),
            partner: state.pname(chat.partner).to_string(),
            history,
            snapshot: self.snapshot(chat.speaker)?,
        };
        self.worker.dispatch(Job::Converse(actor, request))?;
        self.pending = Some(Pending::Chat(chat));
        Ok(())
    }

    fn follow(&mut self, next: FollowUp) -> Result<(), OrchestratorError> {
        match next {
            FollowUp::None => Ok(()),
            FollowUp::Decision(decision, hint) => self.request(decision, hint),
            FollowUp::Chat(chat) => self.request_chat(chat),
        }
    }

    fn resolve_decision(
        &mut self,
        decision: PendingDecision,
        reply: Result<String, ActorError>,
    ) -> Result<(), OrchestratorError> {
        let result = reply
            .map_err(|e| {
                self.stats.provider_failures += 1;
                DecisionError::Provider(e.to_string())
            })
            .and_then(|text| parse_reply(&text))
            .and_then(|reply| {
                debug!(thought = %reply.thought, "actor reasoning");
                match_action(&reply.action, &decision.templates, decision.allow_chat)
            })
            .and_then(|action| self.execute(&decision, action));
        let next = match result {
            Ok(next) => next,
            Err(DecisionError::Rejected(RuleViolation::StateCorruption(message))) => {
                return Err(corruption(message))
            }
            Err(err) => self.handle_failure(decision, err)?,
        };
        self.follow(next)
    }

    fn handle_failure(
        &mut self,
        decision: PendingDecision,
        err: DecisionError,
    ) -> Result<FollowUp, OrchestratorError> {
        let name = self.engine.state().pname(decision.player).to_string();
        let attempt = decision.attempt + 1;
        if attempt < self.limits.max_decision_attempts {
            warn!(player = %name, attempt, error = %err, "decision refused, asking again");
            self.stats.retries += 1;
            let hint = format!("Your previous reply was refused: {err}. Reply with exactly one of the valid actions.");
            return Ok(FollowUp::Decision(PendingDecision { attempt, ..decision }, Some(hint)));
        }
        let action = fallback_action(&decision.templates)
            .ok_or_else(|| corruption(format!("no fallback action for {name}")))?;
        warn!(player = %name, error = %err, action = action.kind(), "attempts exhausted, using fallback");
        self.stats.fallbacks += 1;
        let kind = action.kind();
        self.execute(&decision, action)
            .map_err(|e| corruption(format!("fallback {kind} for {name} refused: {e}")))
    }

    fn execute(&mut self, decision: &PendingDecision, action: Action) -> Result<FollowUp, DecisionError> {
        match &decision.purpose {
            Purpose::Turn => self.execute_turn_action(decision.player, action),
            Purpose::NeutralDefense { attacker, attack } => {
                let Action::ChooseDefenseDice { num_dice } = action else {
                    return Err(DecisionError::InvalidAction(format!(
                        "expected CHOOSE_DEFENSE_DICE, got {}",
                        action.kind()
                    )));
                };
                self.engine.apply_with_defense(*attacker, attack, Some(num_dice))?;
                self.phase_actions += 1;
                Ok(FollowUp::None)
            }
            Purpose::AllianceResponse { .. } => {
                self.engine.apply(decision.player, &action)?;
                Ok(FollowUp::None)
            }
        }
    }

    fn execute_turn_action(&mut self, player: PlayerId, action: Action) -> Result<FollowUp, DecisionError> {
        let state = self.engine.state();
        let name = state.pname(player).to_string();
        let turn = state.turn;
        match action {
            Action::GlobalChat { message } => {
                info!(player = %name, %message, "global chat");
                self.transcript.post_global(turn, &name, message);
                self.phase_actions += 1;
                self.next_hint = Some(CHAT_HINT.to_string());
                Ok(FollowUp::None)
            }
            Action::PrivateChat {
                target_player_name,
                initial_message,
            } => {
                if self.limits.chat_max_exchanges == 0 {
                    return Err(DecisionError::InvalidAction("private chat is disabled".into()));
                }
                let partner = state
                    .player_by_name(&target_player_name)
                    .filter(|&p| p != player && state.player(p).is_active())
                    .ok_or_else(|| {
                        DecisionError::InvalidAction(format!(
                            "cannot chat privately with '{target_player_name}'"
                        ))
                    })?;
                info!(player = %name, partner = %target_player_name, "private chat opened");
                let conversation = self.transcript.open(Conversation::new(
                    turn,
                    &name,
                    &target_player_name,
                    initial_message,
                ));
                self.phase_actions += 1;
                Ok(FollowUp::Chat(PendingChat {
                    conversation,
                    speaker: partner,
                    partner: player,
                }))
            }
            Action::Attack { .. } | Action::BetrayAlly { .. } => {
                if let Some(arbitration) = self.engine.defense_arbitration(player, &action)? {
                    let decision = PendingDecision {
                        player: arbitration.arbiter,
                        purpose: Purpose::NeutralDefense {
                            attacker: player,
                            attack: action,
                        },
                        templates: vec![ActionTemplate::ChooseDefenseDice {
                            max_dice: arbitration.max_dice,
                        }],
                        attempt: 0,
                        allow_chat: false,
                    };
                    let hint = format!("{name} is attacking Neutral. Choose how many dice Neutral defends with.");
                    return Ok(FollowUp::Decision(decision, Some(hint)));
                }
                self.engine.apply(player, &action)?;
                self.phase_actions += 1;
                Ok(FollowUp::None)
            }
            action => {
                let applied = self.engine.apply(player, &action)?;
                self.phase_actions += 1;
                let Applied::ProposalSent { target } = applied else {
                    return Ok(FollowUp::None);
                };
                let decision = PendingDecision {
                    player: target,
                    purpose: Purpose::AllianceResponse { proposer: player },
                    templates: alliance_response_templates(&name),
                    attempt: 0,
                    allow_chat: false,
                };
                let hint = format!("{name} proposes an alliance with you.");
                Ok(FollowUp::Decision(decision, Some(hint)))
            }
        }
    }

    fn resolve_chat(&mut self, chat: PendingChat, reply: Result<String, ActorError>) -> Result<(), OrchestratorError> {
        let speaker = self.engine.state().pname(chat.speaker).to_string();
        let message = reply.unwrap_or_else(|e| {
            warn!(player = %speaker, error = %e, "no chat reply");
            self.stats.provider_failures += 1;
            NO_RESPONSE.to_string()
        });
        let limit = 2 * self.limits.chat_max_exchanges as usize;
        let conversation = self
            .transcript
            .conversation_mut(chat.conversation)
            .ok_or_else(|| corruption("conversation vanished"))?;
        conversation.push(&speaker, message);
        let negotiation = conversation.negotiation();
        let length = conversation.messages.len();

        let end = match negotiation {
            Negotiation::Accepted => match self.engine.form_alliance(chat.speaker, chat.partner) {
                Ok(()) => Some(ConversationEnd::AllianceFormed),
                Err(e) => {
                    warn!(error = %e, "negotiated alliance could not be formed");
                    Some(ConversationEnd::ProposalRejected)
                }
            },
            Negotiation::Rejected => Some(ConversationEnd::ProposalRejected),
            Negotiation::None if length >= limit => Some(ConversationEnd::Exhausted),
            Negotiation::None => None,
        };
        let Some(end) = end else {
            return self.request_chat(PendingChat {
                conversation: chat.conversation,
                speaker: chat.partner,
                partner: chat.speaker,
            });
        };
        if let Some(conversation) = self.transcript.conversation_mut(chat.conversation) {
            conversation.end = Some(end);
        }
        info!(?end, messages = length, "private chat closed");
        self.next_hint = Some(CHAT_HINT.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_prefers_end_then_reject() {
        let menu = vec![
            ActionTemplate::Deploy {
                territory: "A".into(),
                max_armies: 4,
            },
            ActionTemplate::EndReinforcePhase,
        ];
        assert_eq!(fallback_action(&menu), Some(Action::EndReinforcePhase));

        let menu = alliance_response_templates("Ann");
        assert_eq!(
            fallback_action(&menu),
            Some(Action::RejectAlliance {
                proposing_player_name: "Ann".into()
            })
        );

        let menu = vec![ActionTemplate::PostAttackFortify {
            from_territory: "A".into(),
            to_territory: "B".into(),
            min_armies: 2,
            max_armies: 6,
        }];
        assert_eq!(
            fallback_action(&menu),
            Some(Action::PostAttackFortify {
                from_territory: "A".into(),
                to_territory: "B".into(),
                num_armies: 2,
            })
        );
        assert_eq!(fallback_action(&[]), None);
    }

    #[test]
    fn outcome_display() {
        let o = Outcome::Winner {
            player: "Ann".into(),
        };
        assert_eq!(o.to_string(), "Ann wins");
        assert_eq!(o.winner(), Some("Ann"));
        assert_eq!(Outcome::TurnLimit.winner(), None);
    }
}
