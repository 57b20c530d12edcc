//! An actor that always takes the safe way out.

use super::{format_reply, Actor, ActorError, ChatRequest, DecisionRequest};

/// Ends every phase as soon as it may, otherwise takes the first template's
/// default. Useful as a baseline opponent and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassiveActor;

impl Actor for PassiveActor {
    fn decide(&self, request: &DecisionRequest) -> Result<String, ActorError> {
        let template = request
            .valid_actions
            .iter()
            .find(|t| t.is_end())
            .or_else(|| request.valid_actions.first())
            .ok_or_else(|| ActorError::Provider("no valid actions offered".into()))?;
        Ok(format_reply("Holding position.", &template.default_action()))
    }

    fn converse(&self, _request: &ChatRequest) -> Result<String, ActorError> {
        Ok("I have nothing to discuss. REJECT_PROPOSAL".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_reply, ActionTemplate, RULES_TEXT};
    use serde_json::json;

    fn request(valid_actions: Vec<ActionTemplate>) -> DecisionRequest {
        DecisionRequest {
            player: "Ann".into(),
            snapshot: json!({}),
            valid_actions,
            rules: RULES_TEXT,
            hint: None,
            allow_chat: true,
        }
    }

    #[test]
    fn prefers_end_action() {
        let req = request(vec![
            ActionTemplate::Deploy {
                territory: "A".into(),
                max_armies: 3,
            },
            ActionTemplate::EndReinforcePhase,
        ]);
        let reply = parse_reply(&PassiveActor.decide(&req).unwrap()).unwrap();
        assert_eq!(reply.action, json!({"type": "END_REINFORCE_PHASE"}));
    }

    #[test]
    fn falls_back_to_first_template() {
        let req = request(vec![ActionTemplate::SetupClaim {
            territory: "Peru".into(),
        }]);
        let reply = parse_reply(&PassiveActor.decide(&req).unwrap()).unwrap();
        assert_eq!(reply.action, json!({"type": "SETUP_CLAIM", "territory": "Peru"}));
    }

    #[test]
    fn empty_menu_is_a_provider_error() {
        assert!(PassiveActor.decide(&request(vec![])).is_err());
    }
}
