//! Parsing of actor replies.
//!
//! Actors answer with `{"thought": ..., "action": {...}}`, possibly wrapped
//! in prose or a fenced code block. The outermost JSON object is extracted
//! and the action is returned raw for template matching.

use serde_json::Value;

use super::matching::DecisionError;

/// A decoded reply. `action` is still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub thought: String,
    pub action: Value,
}

/// Returns the span from the first `{` to the last `}`.
fn extract_json(text: &str) -> Result<&str, DecisionError> {
    let start = text
        .find('{')
        .ok_or_else(|| DecisionError::Malformed("no JSON object in reply".into()))?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| DecisionError::Malformed("no closing brace in reply".into()))?;
    Ok(&text[start..=end])
}

/// Decodes a decision reply.
pub fn parse_reply(text: &str) -> Result<Reply, DecisionError> {
    let json = extract_json(text)?;
    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| DecisionError::Malformed(format!("reply is not valid JSON: {e}")))?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| DecisionError::Malformed("reply must be a JSON object".into()))?;
    let thought = obj
        .get("thought")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let action = match obj.remove("action") {
        Some(Value::String(s)) => serde_json::from_str(&s)
            .map_err(|e| DecisionError::Malformed(format!("action string is not JSON: {e}")))?,
        Some(v) => v,
        None => return Err(DecisionError::Malformed("reply has no 'action'".into())),
    };
    Ok(Reply { thought, action })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_reply() {
        let reply = parse_reply(r#"{"thought": "hold", "action": {"type": "END_TURN"}}"#).unwrap();
        assert_eq!(reply.thought, "hold");
        assert_eq!(reply.action, json!({"type": "END_TURN"}));
    }

    #[test]
    fn fenced_reply_with_prose() {
        let text = "Sure.\n```json\n{\"thought\": \"push\", \"action\": {\"type\": \"END_ATTACK_PHASE\"}}\n```\n";
        let reply = parse_reply(text).unwrap();
        assert_eq!(reply.action["type"], "END_ATTACK_PHASE");
    }

    #[test]
    fn string_encoded_action() {
        let text = r#"{"thought": "", "action": "{\"type\": \"END_TURN\"}"}"#;
        assert_eq!(parse_reply(text).unwrap().action, json!({"type": "END_TURN"}));
    }

    #[test]
    fn missing_thought_defaults_empty() {
        let reply = parse_reply(r#"{"action": {"type": "END_TURN"}}"#).unwrap();
        assert!(reply.thought.is_empty());
    }

    #[test]
    fn malformed_replies() {
        assert!(matches!(parse_reply("no idea"), Err(DecisionError::Malformed(_))));
        assert!(matches!(parse_reply("{not json}"), Err(DecisionError::Malformed(_))));
        assert!(matches!(
            parse_reply(r#"{"thought": "hmm"}"#),
            Err(DecisionError::Malformed(_))
        ));
        assert!(matches!(parse_reply("} {"), Err(DecisionError::Malformed(_))));
    }
}
