//! Structural validation of actor-proposed actions against the offered templates.
//!
//! An action matches a template when it has the same `type`, repeats every
//! fixed (non-numeric) template field unchanged, fills the template's open
//! fields, and carries no other keys. Echoed numeric template fields such as
//! `max_armies` are tolerated as long as they are unchanged. Ranges are left
//! to the rules engine.

use serde_json::{Map, Value};
use thiserror::Error;

use super::action::{Action, ActionTemplate};

/// Why an actor's decision could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("provider failure: {0}")]
    Provider(String),

    #[error("rejected by the rules: {0}")]
    Rejected(#[from] crate::rules::RuleViolation),
}

const CHAT_FIELDS: [&str; 3] = ["message", "target_player_name", "initial_message"];

/// Matches a raw action object against `templates`.
///
/// `GLOBAL_CHAT` and `PRIVATE_CHAT` are accepted outside the list when
/// `allow_chat` is set.
pub fn match_action(
    raw: &Value,
    templates: &[ActionTemplate],
    allow_chat: bool,
) -> Result<Action, DecisionError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| DecisionError::Malformed("action must be a JSON object".into()))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DecisionError::Malformed("action has no string 'type'".into()))?;

    if kind == "GLOBAL_CHAT" || kind == "PRIVATE_CHAT" {
        if !allow_chat {
            return Err(DecisionError::InvalidAction(format!(
                "{kind} is not available for this decision"
            )));
        }
        if let Some(key) = obj
            .keys()
            .find(|k| k.as_str() != "type" && !CHAT_FIELDS.contains(&k.as_str()))
        {
            return Err(DecisionError::InvalidAction(format!(
                "unexpected field '{key}' in {kind}"
            )));
        }
        return serde_json::from_value(raw.clone())
            .map_err(|e| DecisionError::InvalidAction(format!("{kind}: {e}")));
    }

    let mut offered = false;
    for template in templates.iter().filter(|t| t.kind() == kind) {
        offered = true;
        let Value::Object(fixed) = serde_json::to_value(template)
            .map_err(|e| DecisionError::Malformed(e.to_string()))?
        else {
            continue;
        };
        if fixed_fields_match(obj, &fixed, template) {
            return finish_match(raw, obj, &fixed, template);
        }
    }
    if offered {
        Err(DecisionError::InvalidAction(format!(
            "no {kind} template has these fields: {raw}"
        )))
    } else {
        Err(DecisionError::InvalidAction(format!(
            "{kind} is not among the valid actions"
        )))
    }
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::Bool(_))
}

/// Composite templates describe choices rather than fixed values.
fn is_composite(template: &ActionTemplate) -> bool {
    matches!(template, ActionTemplate::Setup2pPlaceArmiesTurn { .. })
}

fn fixed_fields_match(obj: &Map<String, Value>, fixed: &Map<String, Value>, template: &ActionTemplate) -> bool {
    if is_composite(template) {
        return true;
    }
    fixed
        .iter()
        .filter(|(k, v)| k.as_str() != "type" && !is_scalar(v))
        .all(|(k, v)| obj.get(k) == Some(v))
}

fn finish_match(
    raw: &Value,
    obj: &Map<String, Value>,
    fixed: &Map<String, Value>,
    template: &ActionTemplate,
) -> Result<Action, DecisionError> {
    let kind = template.kind();
    let open = template.open_fields();
    for (key, value) in obj {
        if key == "type" || open.contains(&key.as_str()) {
            continue;
        }
        match fixed.get(key) {
            Some(expected) if expected == value => {}
            Some(_) => {
                return Err(DecisionError::InvalidAction(format!(
                    "field '{key}' of {kind} must not be changed"
                )))
            }
            None => {
                return Err(DecisionError::InvalidAction(format!(
                    "unexpected field '{key}' in {kind}"
                )))
            }
        }
    }
    let action: Action = serde_json::from_value(raw.clone())
        .map_err(|e| DecisionError::InvalidAction(format!("{kind}: {e}")))?;
    check_composite(template, &action)?;
    Ok(action)
}

fn check_composite(template: &ActionTemplate, action: &Action) -> Result<(), DecisionError> {
    let (
        ActionTemplate::Setup2pPlaceArmiesTurn {
            player_armies_to_place_this_turn: quota,
            player_owned_territories: own,
            neutral_can_place,
            neutral_owned_territories: neutral,
        },
        Action::Setup2pPlaceArmiesTurn {
            own_army_placements,
            neutral_army_placement,
        },
    ) = (template, action)
    else {
        return Ok(());
    };
    let invalid = |msg: String| Err(DecisionError::InvalidAction(msg));

    let mut total = 0;
    for (territory, count) in own_army_placements {
        if !own.contains(territory) {
            return invalid(format!("{territory} is not one of your territories"));
        }
        if *count == 0 {
            return invalid(format!("placement on {territory} must be positive"));
        }
        total += count;
    }
    if total != *quota {
        return invalid(format!("own placements must total {quota}, got {total}"));
    }
    match (neutral_can_place, neutral_army_placement) {
        (true, Some((territory, 1))) if neutral.contains(territory) => Ok(()),
        (true, Some((territory, 1))) => invalid(format!("{territory} is not a Neutral territory")),
        (true, Some(_)) => invalid("exactly one Neutral army must be placed".into()),
        (true, None) => invalid("a Neutral placement is required".into()),
        (false, Some(_)) => invalid("no Neutral armies are left to place".into()),
        (false, None) => Ok(()),
    }
}
