//! Home tab and direct-message views.
//!
//! Pure functions from resolved state to Block Kit JSON. Name resolution
//! happens in the dispatch layer; nothing here talks to Slack.

use serde_json::Value;

use crate::queue::RequesterStatus;

use super::blocks::{actions, button, divider, home_view, section};

/// Interactive component action ids.
pub mod action {
    pub const REQUEST_HELP: &str = "request_help";
    pub const LEAVE_QUEUE: &str = "leave_queue";
    pub const TA_TOGGLE: &str = "ta_toggle";
    pub const TA_COMPLETE: &str = "ta_complete";
    pub const ADMIN_RESET: &str = "admin_reset";
}

/// Everything the student home view needs, already resolved.
#[derive(Debug)]
pub struct StudentHome<'a> {
    pub display_name: &'a str,
    pub status: RequesterStatus,
    /// 1-based queue position, present while `status` is queued.
    pub position: Option<usize>,
    pub active_helpers: usize,
}

/// Render the home view a student sees.
pub fn student_home(view: &StudentHome<'_>) -> Value {
    let mut blocks = vec![
        section(format!("Logged in as {}", view.display_name)),
        section("I'm here to connect you to a TA during lab section."),
        divider(),
        section(format!("{} TA(s) Active:", view.active_helpers)),
        divider(),
    ];

    let mut row = Vec::new();
    match view.status {
        RequesterStatus::Idle => {
            row.push(button(action::REQUEST_HELP, "Connect to a Tutor / TA"));
        }
        RequesterStatus::Queued => {
            if let Some(position) = view.position {
                blocks.push(section(format!("You are #{position} in the queue.")));
            }
            row.push(button(action::LEAVE_QUEUE, "Leave the Queue"));
        }
        RequesterStatus::Busy => {
            blocks.push(section(
                "A TA is on the way — check your direct messages.",
            ));
        }
    }
    row.push(button(action::TA_TOGGLE, "TA Login"));
    blocks.push(actions(row));

    home_view(blocks)
}

/// One line of the TA roster.
#[derive(Debug)]
pub struct RosterLine {
    pub name: String,
    /// Display name of the student being helped, while busy.
    pub helping: Option<String>,
}

/// Everything the TA home view needs, already resolved.
#[derive(Debug)]
pub struct HelperHome<'a> {
    pub display_name: &'a str,
    pub is_active: bool,
    pub is_busy: bool,
    pub active_count: usize,
    /// Helpers that are active or mid-engagement, in roster order.
    pub roster: Vec<RosterLine>,
    pub queue_length: usize,
}

/// Render the home view a TA sees.
pub fn helper_home(view: &HelperHome<'_>) -> Value {
    let mut blocks = vec![
        section(format!("Logged in as {}", view.display_name)),
        section(if view.is_active {
            "You are logged in as a TA. Remember to log off when you're done."
        } else {
            "You are logged off and no longer accepting new requests."
        }),
        divider(),
        section(format!("{} TA(s) Active:", view.active_count)),
    ];
    for line in &view.roster {
        blocks.push(section(match &line.helping {
            Some(student) => format!("(Busy) {} currently helping {}", line.name, student),
            None => line.name.clone(),
        }));
    }
    blocks.push(divider());
    blocks.push(section(format!("{} student(s) waiting.", view.queue_length)));

    let mut row = Vec::new();
    if view.is_busy {
        row.push(button(action::TA_COMPLETE, "Finished!"));
    }
    row.push(button(
        action::TA_TOGGLE,
        if view.is_active { "TA Log Off" } else { "TA Login" },
    ));
    row.push(button(action::ADMIN_RESET, "Reset Queue"));
    blocks.push(actions(row));

    home_view(blocks)
}

/// Direct message sent to a helper when a student is assigned to them.
pub fn request_dm(student_name: &str) -> Vec<Value> {
    vec![
        section(format!("You have a new request from *{student_name}*.")),
        section(format!(
            "Reach out to {student_name} directly, then mark the request finished when you're done."
        )),
        actions(vec![button(action::TA_COMPLETE, "Finished!")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_texts(view: &Value) -> Vec<String> {
        view["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["text"]["text"].as_str().map(str::to_string))
            .collect()
    }

    fn action_ids(view: &Value) -> Vec<String> {
        view["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|b| b["type"] == "actions")
            .flat_map(|b| b["elements"].as_array().unwrap().iter())
            .filter_map(|e| e["action_id"].as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn idle_student_sees_request_button() {
        let view = student_home(&StudentHome {
            display_name: "Ada",
            status: RequesterStatus::Idle,
            position: None,
            active_helpers: 2,
        });
        assert_eq!(
            action_ids(&view),
            vec![action::REQUEST_HELP, action::TA_TOGGLE]
        );
        assert!(block_texts(&view).contains(&"2 TA(s) Active:".to_string()));
    }

    #[test]
    fn queued_student_sees_position_and_cancel() {
        let view = student_home(&StudentHome {
            display_name: "Ada",
            status: RequesterStatus::Queued,
            position: Some(3),
            active_helpers: 1,
        });
        assert!(block_texts(&view).contains(&"You are #3 in the queue.".to_string()));
        assert!(action_ids(&view).contains(&action::LEAVE_QUEUE.to_string()));
        assert!(!action_ids(&view).contains(&action::REQUEST_HELP.to_string()));
    }

    #[test]
    fn busy_ta_sees_finished_button() {
        let view = helper_home(&HelperHome {
            display_name: "Grace",
            is_active: true,
            is_busy: true,
            active_count: 1,
            roster: vec![RosterLine {
                name: "Grace".into(),
                helping: Some("Ada".into()),
            }],
            queue_length: 0,
        });
        assert!(action_ids(&view).contains(&action::TA_COMPLETE.to_string()));
        assert!(
            block_texts(&view).contains(&"(Busy) Grace currently helping Ada".to_string())
        );
    }

    #[test]
    fn inactive_ta_sees_login_label() {
        let view = helper_home(&HelperHome {
            display_name: "Grace",
            is_active: false,
            is_busy: false,
            active_count: 0,
            roster: vec![],
            queue_length: 0,
        });
        let texts: Vec<String> = view["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|b| b["type"] == "actions")
            .flat_map(|b| b["elements"].as_array().unwrap().iter())
            .filter_map(|e| e["text"]["text"].as_str().map(str::to_string))
            .collect();
        assert!(texts.contains(&"TA Login".to_string()));
        assert!(!texts.contains(&"Finished!".to_string()));
    }

    #[test]
    fn request_dm_names_the_student() {
        let blocks = request_dm("Ada");
        assert!(
            blocks[0]["text"]["text"]
                .as_str()
                .unwrap()
                .contains("Ada")
        );
    }
}
