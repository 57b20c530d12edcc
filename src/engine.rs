//! Engine state management.
//!
//! Owns the `GameState`, the rule options and the random source, and is the
//! single entry point through which typed actions reach the rules.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::board::{Board, GameState, Phase, PlayerId, Seat, Variant};
use crate::movegen::valid_actions;
use crate::protocol::{Action, ActionTemplate};
use crate::rules::combat::{check_attack, max_defense_dice};
use crate::rules::phase::{end_turn, game_outcome};
use crate::rules::{self, setup, BattleReport, GameOutcome, RuleViolation, RulesConfig};

/// Randomness used for dice and shuffles.
pub trait RandomSource: Rng + Send {}

impl<T: Rng + Send> RandomSource for T {}

/// What an applied action produced beyond the state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Done,
    Battle(BattleReport),
    /// An alliance proposal now awaits `target`'s answer.
    ProposalSent { target: PlayerId },
}

/// A Neutral territory under attack whose dice another player chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseArbitration {
    pub arbiter: PlayerId,
    pub max_dice: u32,
}

/// Holds a game and applies actions to it.
pub struct Engine<R: RandomSource = SmallRng> {
    state: GameState,
    rules: RulesConfig,
    rng: R,
}

impl Engine<SmallRng> {
    /// Seats `seats` on `board`. A `None` seed draws from entropy.
    pub fn new_game(
        board: Board,
        variant: Variant,
        seats: &[Seat],
        rules: RulesConfig,
        seed: Option<u64>,
    ) -> Result<Self, RuleViolation> {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(board, variant, seats, rules, rng)
    }
}

impl<R: RandomSource> Engine<R> {
    pub fn with_rng(
        board: Board,
        variant: Variant,
        seats: &[Seat],
        rules: RulesConfig,
        mut rng: R,
    ) -> Result<Self, RuleViolation> {
        let state = setup::new_game(board, variant, seats, &mut rng)?;
        Ok(Engine { state, rules, rng })
    }

    /// Wraps an existing state, e.g. a hand-built test position.
    pub fn from_state(state: GameState, rules: RulesConfig, rng: R) -> Self {
        Engine { state, rules, rng }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> RulesConfig {
        self.rules
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// The player expected to act now, if any.
    pub fn acting_player(&self) -> Option<PlayerId> {
        rules::acting_player(&self.state)
    }

    pub fn valid_actions(&self, player: PlayerId) -> Vec<ActionTemplate> {
        valid_actions(&self.state, self.rules, player)
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.state.phase != Phase::GameOver {
            return None;
        }
        game_outcome(&self.state).or(Some(GameOutcome::Draw))
    }

    /// Resolves automatic setup phases. Returns true if anything changed.
    pub fn advance_automatic(&mut self) -> bool {
        let mut progressed = false;
        while setup::run_automatic(&mut self.state, &mut self.rng) {
            progressed = true;
        }
        progressed
    }

    /// If `action` attacks a Neutral territory in the two-player variant,
    /// returns who picks the defending dice. Fails like the attack would.
    pub fn defense_arbitration(
        &self,
        player: PlayerId,
        action: &Action,
    ) -> Result<Option<DefenseArbitration>, RuleViolation> {
        let (Action::Attack { from, to, num_armies } | Action::BetrayAlly { from, to, num_armies }) =
            action
        else {
            return Ok(None);
        };
        if self.state.variant != Variant::TwoPlayer {
            return Ok(None);
        }
        let (_, t) = check_attack(&self.state, player, from, to, *num_armies)?;
        let target = self.state.territory(t);
        let Some(owner) = target.owner.filter(|&o| self.state.player(o).is_neutral) else {
            return Ok(None);
        };
        let arbiter = self
            .state
            .players
            .iter()
            .find(|p| p.id != player && p.id != owner && !p.is_neutral && !p.eliminated)
            .map(|p| p.id);
        Ok(arbiter.map(|arbiter| DefenseArbitration {
            arbiter,
            max_dice: max_defense_dice(target.armies),
        }))
    }

    /// Applies `action` for `player`. On `Err` the state is unchanged.
    pub fn apply(&mut self, player: PlayerId, action: &Action) -> Result<Applied, RuleViolation> {
        self.apply_with_defense(player, action, None)
    }

    /// Like `apply`, with the defender's dice count fixed for an attack.
    pub fn apply_with_defense(
        &mut self,
        player: PlayerId,
        action: &Action,
        defender_dice: Option<u32>,
    ) -> Result<Applied, RuleViolation> {
        debug!(player = %self.state.pname(player), action = ?action, "applying");
        let state = &mut self.state;
        let rng = &mut self.rng;
        match action {
            Action::SetupClaim { territory } => {
                setup::claim_territory(state, player, territory, rng)?;
            }
            Action::SetupPlaceArmy { territory } => {
                setup::place_setup_army(state, player, territory, rng)?;
            }
            Action::Setup2pPlaceArmiesTurn {
                own_army_placements,
                neutral_army_placement,
            } => {
                setup::place_two_player_turn(
                    state,
                    player,
                    own_army_placements,
                    neutral_army_placement.as_ref(),
                    rng,
                )?;
            }
            Action::TradeCards { card_indices } => {
                rules::trade_cards(state, player, *card_indices, rng)?;
            }
            Action::Deploy {
                territory,
                num_armies,
            } => rules::deploy(state, player, territory, *num_armies)?,
            Action::EndReinforcePhase => rules::end_reinforce_phase(state, player)?,
            Action::Attack {
                from,
                to,
                num_armies,
            }
            | Action::BetrayAlly {
                from,
                to,
                num_armies,
            } => {
                let report = rules::attack(state, player, from, to, *num_armies, defender_dice, rng)?;
                return Ok(Applied::Battle(report));
            }
            Action::PostAttackFortify {
                from_territory,
                to_territory,
                num_armies,
            } => rules::post_attack_fortify(state, player, from_territory, to_territory, *num_armies)?,
            Action::EndAttackPhase => rules::end_attack_phase(state, player)?,
            Action::Fortify {
                from,
                to,
                num_armies,
            } => rules::fortify(state, self.rules.fortify_rule, player, from, to, *num_armies)?,
            Action::EndTurn => end_turn(state, player)?,
            Action::ProposeAlliance { target_player_name } => {
                let target = rules::propose_alliance(state, player, target_player_name)?;
                return Ok(Applied::ProposalSent { target });
            }
            Action::AcceptAlliance {
                proposing_player_name,
            } => rules::accept_alliance(state, player, proposing_player_name)?,
            Action::RejectAlliance {
                proposing_player_name,
            } => rules::reject_alliance(state, player, proposing_player_name)?,
            Action::BreakAlliance { target_player_name } => {
                rules::break_alliance(state, player, target_player_name)?
            }
            Action::ChooseDefenseDice { .. } | Action::GlobalChat { .. } | Action::PrivateChat { .. } => {
                return Err(RuleViolation::NotARuleAction(action.kind()));
            }
        }
        Ok(Applied::Done)
    }

    /// Drops a pending elimination trade that could not be completed.
    pub fn waive_elimination_trade(&mut self) {
        self.state.elimination_trade = None;
    }

    /// Forms an alliance agreed in private negotiation.
    pub fn form_alliance(&mut self, a: PlayerId, b: PlayerId) -> Result<(), RuleViolation> {
        rules::diplomacy::form_alliance(&mut self.state, a, b)
    }
}
