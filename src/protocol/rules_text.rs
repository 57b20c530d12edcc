//! Static rules summary sent with every decision request.

/// Rules and response format, as given to actors.
pub const RULES_TEXT: &str = r#"You are playing a game of territorial conquest.
Win by eliminating every other player (two-player game: your human opponent; Neutral does not count).

RESPONSE FORMAT
Reply with one JSON object with exactly two keys:
  {"thought": "<your reasoning>", "action": {<one action>}}
The action must copy one entry of the valid action list. Keep every name field
unchanged and fill in only the open number fields:
  DEPLOY, ATTACK, BETRAY_ALLY, FORTIFY, POST_ATTACK_FORTIFY -> "num_armies"
  CHOOSE_DEFENSE_DICE -> "num_dice"
  SETUP_2P_PLACE_ARMIES_TURN -> "own_army_placements": [["Territory", n], ...]
                                "neutral_army_placement": ["NeutralTerritory", 1] or null
Do not add any other keys.
During your own turn you may also send
  {"type": "GLOBAL_CHAT", "message": "..."}
  {"type": "PRIVATE_CHAT", "target_player_name": "...", "initial_message": "..."}
Chat does not use up your move; you will be asked again afterwards.

SETUP
Standard game: claim one unclaimed territory per turn (SETUP_CLAIM), then place
one army per turn (SETUP_PLACE_ARMY) until your pool is empty.
Pools: 3 players 35, 4 players 30, 5 players 25, 6 players 20, 2 players 40.
Two-player game: territories are dealt evenly to both players and Neutral.
Each turn place 2 of your armies and 1 Neutral army.

TURN
1. REINFORCE: receive max(3, territories / 3) armies plus the bonus of every
   continent you fully hold. With 5 or more cards you must trade a set first.
   A set is three of a kind, one of each, or any set completed by wildcards.
   Set bonuses: 4, 6, 8, 10, 12, 15, then +5 each. A traded card showing a
   territory you occupy puts 2 extra armies there. Armies not deployed when
   you end the phase are spread over your territories automatically.
2. ATTACK: from a territory with at least 2 armies into an adjacent enemy.
   Attacker rolls min(3, num_armies) dice, defender min(2, armies) dice.
   Highest dice are compared pairwise; ties go to the defender.
   After a capture you must move between the dice rolled and the armies that
   survived into the new territory (POST_ATTACK_FORTIFY) before anything else.
   Your first capture of a turn earns one card. Eliminating a player gives you
   their cards; with 6 or more you must trade down to 4 and deploy at once.
3. FORTIFY: once per turn move armies between two of your territories
   connected through your own territories, leaving at least 1 behind. END_TURN
   passes play.

DIPLOMACY
PROPOSE_ALLIANCE asks a player for an alliance; they accept or reject at once.
BREAK_ALLIANCE ends one. Attacking an ally (BETRAY_ALLY) is betrayal and means war.
In private chat, end a message with "PROPOSAL: ALLIANCE" to offer an alliance;
the other side answers with "ACCEPT_PROPOSAL" or "REJECT_PROPOSAL".
"#;
