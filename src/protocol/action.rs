//! Typed actions and the templates offered to actors.
//!
//! Both travel as JSON objects tagged by `"type"`. A template lists the
//! fixed fields of one legal move plus the bounds of its open fields; the
//! actor answers with an `Action` carrying the same fixed fields and its
//! choice for the open ones.

use serde::{Deserialize, Serialize};

/// A concrete move chosen by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetupClaim {
        territory: String,
    },
    SetupPlaceArmy {
        territory: String,
    },
    #[serde(rename = "SETUP_2P_PLACE_ARMIES_TURN")]
    Setup2pPlaceArmiesTurn {
        own_army_placements: Vec<(String, u32)>,
        #[serde(default)]
        neutral_army_placement: Option<(String, u32)>,
    },
    TradeCards {
        card_indices: [usize; 3],
    },
    Deploy {
        territory: String,
        num_armies: u32,
    },
    EndReinforcePhase,
    Attack {
        from: String,
        to: String,
        num_armies: u32,
    },
    /// An attack on an ally. Resolves like `Attack` and ends the alliance.
    BetrayAlly {
        from: String,
        to: String,
        num_armies: u32,
    },
    PostAttackFortify {
        from_territory: String,
        to_territory: String,
        num_armies: u32,
    },
    EndAttackPhase,
    Fortify {
        from: String,
        to: String,
        num_armies: u32,
    },
    EndTurn,
    ProposeAlliance {
        target_player_name: String,
    },
    AcceptAlliance {
        proposing_player_name: String,
    },
    RejectAlliance {
        proposing_player_name: String,
    },
    BreakAlliance {
        target_player_name: String,
    },
    /// Dice picked for a Neutral territory under attack.
    ChooseDefenseDice {
        num_dice: u32,
    },
    GlobalChat {
        message: String,
    },
    PrivateChat {
        target_player_name: String,
        initial_message: String,
    },
}

impl Action {
    /// Returns the wire `type` tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Action::SetupClaim { .. } => "SETUP_CLAIM",
            Action::SetupPlaceArmy { .. } => "SETUP_PLACE_ARMY",
            Action::Setup2pPlaceArmiesTurn { .. } => "SETUP_2P_PLACE_ARMIES_TURN",
            Action::TradeCards { .. } => "TRADE_CARDS",
            Action::Deploy { .. } => "DEPLOY",
            Action::EndReinforcePhase => "END_REINFORCE_PHASE",
            Action::Attack { .. } => "ATTACK",
            Action::BetrayAlly { .. } => "BETRAY_ALLY",
            Action::PostAttackFortify { .. } => "POST_ATTACK_FORTIFY",
            Action::EndAttackPhase => "END_ATTACK_PHASE",
            Action::Fortify { .. } => "FORTIFY",
            Action::EndTurn => "END_TURN",
            Action::ProposeAlliance { .. } => "PROPOSE_ALLIANCE",
            Action::AcceptAlliance { .. } => "ACCEPT_ALLIANCE",
            Action::RejectAlliance { .. } => "REJECT_ALLIANCE",
            Action::BreakAlliance { .. } => "BREAK_ALLIANCE",
            Action::ChooseDefenseDice { .. } => "CHOOSE_DEFENSE_DICE",
            Action::GlobalChat { .. } => "GLOBAL_CHAT",
            Action::PrivateChat { .. } => "PRIVATE_CHAT",
        }
    }

    /// Chat actions are accepted outside the template list.
    pub const fn is_chat(&self) -> bool {
        matches!(self, Action::GlobalChat { .. } | Action::PrivateChat { .. })
    }
}

/// One legal move as offered to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionTemplate {
    SetupClaim {
        territory: String,
    },
    SetupPlaceArmy {
        territory: String,
    },
    #[serde(rename = "SETUP_2P_PLACE_ARMIES_TURN")]
    Setup2pPlaceArmiesTurn {
        player_armies_to_place_this_turn: u32,
        player_owned_territories: Vec<String>,
        neutral_can_place: bool,
        neutral_owned_territories: Vec<String>,
    },
    TradeCards {
        card_indices: [usize; 3],
        must_trade: bool,
    },
    Deploy {
        territory: String,
        max_armies: u32,
    },
    EndReinforcePhase,
    Attack {
        from: String,
        to: String,
        max_armies_for_attack: u32,
    },
    BetrayAlly {
        from: String,
        to: String,
        max_armies_for_attack: u32,
    },
    PostAttackFortify {
        from_territory: String,
        to_territory: String,
        min_armies: u32,
        max_armies: u32,
    },
    EndAttackPhase,
    Fortify {
        from: String,
        to: String,
        max_armies_to_move: u32,
    },
    EndTurn,
    ProposeAlliance {
        target_player_name: String,
    },
    AcceptAlliance {
        proposing_player_name: String,
    },
    RejectAlliance {
        proposing_player_name: String,
    },
    BreakAlliance {
        target_player_name: String,
    },
    ChooseDefenseDice {
        max_dice: u32,
    },
}

impl ActionTemplate {
    /// Returns the wire `type` tag, shared with the matching `Action`.
    pub const fn kind(&self) -> &'static str {
        match self {
            ActionTemplate::SetupClaim { .. } => "SETUP_CLAIM",
            ActionTemplate::SetupPlaceArmy { .. } => "SETUP_PLACE_ARMY",
            ActionTemplate::Setup2pPlaceArmiesTurn { .. } => "SETUP_2P_PLACE_ARMIES_TURN",
            ActionTemplate::TradeCards { .. } => "TRADE_CARDS",
            ActionTemplate::Deploy { .. } => "DEPLOY",
            ActionTemplate::EndReinforcePhase => "END_REINFORCE_PHASE",
            ActionTemplate::Attack { .. } => "ATTACK",
            ActionTemplate::BetrayAlly { .. } => "BETRAY_ALLY",
            ActionTemplate::PostAttackFortify { .. } => "POST_ATTACK_FORTIFY",
            ActionTemplate::EndAttackPhase => "END_ATTACK_PHASE",
            ActionTemplate::Fortify { .. } => "FORTIFY",
            ActionTemplate::EndTurn => "END_TURN",
            ActionTemplate::ProposeAlliance { .. } => "PROPOSE_ALLIANCE",
            ActionTemplate::AcceptAlliance { .. } => "ACCEPT_ALLIANCE",
            ActionTemplate::RejectAlliance { .. } => "REJECT_ALLIANCE",
            ActionTemplate::BreakAlliance { .. } => "BREAK_ALLIANCE",
            ActionTemplate::ChooseDefenseDice { .. } => "CHOOSE_DEFENSE_DICE",
        }
    }

    /// Fields the actor fills in; everything else is fixed by the template.
    pub const fn open_fields(&self) -> &'static [&'static str] {
        match self {
            ActionTemplate::Deploy { .. }
            | ActionTemplate::Attack { .. }
            | ActionTemplate::BetrayAlly { .. }
            | ActionTemplate::PostAttackFortify { .. }
            | ActionTemplate::Fortify { .. } => &["num_armies"],
            ActionTemplate::ChooseDefenseDice { .. } => &["num_dice"],
            ActionTemplate::Setup2pPlaceArmiesTurn { .. } => {
                &["own_army_placements", "neutral_army_placement"]
            }
            _ => &[],
        }
    }

    /// True for the actions that close a phase or a turn.
    pub const fn is_end(&self) -> bool {
        matches!(
            self,
            ActionTemplate::EndReinforcePhase
                | ActionTemplate::EndAttackPhase
                | ActionTemplate::EndTurn
        )
    }

    /// Fills the open fields with `pick(min, max)` for each numeric range.
    ///
    /// Composite two-player placements spread the quota over the first owned
    /// territories and put the Neutral army on the first Neutral territory.
    pub fn instantiate(&self, mut pick: impl FnMut(u32, u32) -> u32) -> Action {
        match self {
            ActionTemplate::SetupClaim { territory } => Action::SetupClaim {
                territory: territory.clone(),
            },
            ActionTemplate::SetupPlaceArmy { territory } => Action::SetupPlaceArmy {
                territory: territory.clone(),
            },
            ActionTemplate::Setup2pPlaceArmiesTurn {
                player_armies_to_place_this_turn,
                player_owned_territories,
                neutral_can_place,
                neutral_owned_territories,
            } => {
                let own_army_placements = match player_owned_territories.first() {
                    Some(t) if *player_armies_to_place_this_turn > 0 => {
                        vec![(t.clone(), *player_armies_to_place_this_turn)]
                    }
                    _ => Vec::new(),
                };
                let neutral_army_placement = neutral_owned_territories
                    .first()
                    .filter(|_| *neutral_can_place)
                    .map(|t| (t.clone(), 1));
                Action::Setup2pPlaceArmiesTurn {
                    own_army_placements,
                    neutral_army_placement,
                }
            }
            ActionTemplate::TradeCards { card_indices, .. } => Action::TradeCards {
                card_indices: *card_indices,
            },
            ActionTemplate::Deploy {
                territory,
                max_armies,
            } => Action::Deploy {
                territory: territory.clone(),
                num_armies: pick(1, *max_armies),
            },
            ActionTemplate::EndReinforcePhase => Action::EndReinforcePhase,
            ActionTemplate::Attack {
                from,
                to,
                max_armies_for_attack,
            } => Action::Attack {
                from: from.clone(),
                to: to.clone(),
                num_armies: pick(1, *max_armies_for_attack),
            },
            ActionTemplate::BetrayAlly {
                from,
                to,
                max_armies_for_attack,
            } => Action::BetrayAlly {
                from: from.clone(),
                to: to.clone(),
                num_armies: pick(1, *max_armies_for_attack),
            },
            ActionTemplate::PostAttackFortify {
                from_territory,
                to_territory,
                min_armies,
                max_armies,
            } => Action::PostAttackFortify {
                from_territory: from_territory.clone(),
                to_territory: to_territory.clone(),
                num_armies: pick(*min_armies, *max_armies),
            },
            ActionTemplate::EndAttackPhase => Action::EndAttackPhase,
            ActionTemplate::Fortify {
                from,
                to,
                max_armies_to_move,
            } => Action::Fortify {
                from: from.clone(),
                to: to.clone(),
                num_armies: pick(1, *max_armies_to_move),
            },
            ActionTemplate::EndTurn => Action::EndTurn,
            ActionTemplate::ProposeAlliance { target_player_name } => Action::ProposeAlliance {
                target_player_name: target_player_name.clone(),
            },
            ActionTemplate::AcceptAlliance {
                proposing_player_name,
            } => Action::AcceptAlliance {
                proposing_player_name: proposing_player_name.clone(),
            },
            ActionTemplate::RejectAlliance {
                proposing_player_name,
            } => Action::RejectAlliance {
                proposing_player_name: proposing_player_name.clone(),
            },
            ActionTemplate::BreakAlliance { target_player_name } => Action::BreakAlliance {
                target_player_name: target_player_name.clone(),
            },
            ActionTemplate::ChooseDefenseDice { max_dice } => Action::ChooseDefenseDice {
                num_dice: pick(1, *max_dice),
            },
        }
    }

    /// The deterministic instantiation used when an actor keeps failing.
    ///
    /// Deploys everything, moves the minimum after a capture and defends
    /// with as many dice as allowed.
    pub fn default_action(&self) -> Action {
        match self {
            ActionTemplate::ChooseDefenseDice { .. } | ActionTemplate::Deploy { .. } => {
                self.instantiate(|_, max| max)
            }
            _ => self.instantiate(|min, _| min),
        }
    }
}
