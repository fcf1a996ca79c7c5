//! Block Kit building blocks.

use serde_json::{Value, json};

/// A divider block.
pub fn divider() -> Value {
    json!({ "type": "divider" })
}

/// A markdown section block.
pub fn section(text: impl AsRef<str>) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text.as_ref() },
    })
}

/// A plain-text button carrying an action id.
pub fn button(action_id: &str, label: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "text": { "type": "plain_text", "text": label, "emoji": true },
        "value": action_id,
    })
}

/// An actions block wrapping a row of elements.
pub fn actions(elements: Vec<Value>) -> Value {
    json!({ "type": "actions", "elements": elements })
}

/// Wrap blocks into a Home tab view.
pub fn home_view(blocks: Vec<Value>) -> Value {
    json!({ "type": "home", "blocks": blocks })
}
