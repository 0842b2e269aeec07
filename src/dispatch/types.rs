//! Dispatch output types

use crate::sms::Reply;

/// A message for someone other than the sender, delivered by the fan-out
/// queue after the direct reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to_phone: String,
    pub reply: Reply,
}

/// What one command produced: at most one direct reply to the sender, plus
/// notifications to other participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Option<Reply>,
    pub notifications: Vec<Notification>,
}

impl Outcome {
    pub fn reply(reply: Reply) -> Self {
        Self {
            reply: Some(reply),
            notifications: Vec::new(),
        }
    }

    /// No reply at all (suppressed unrecognized input)
    pub fn silent() -> Self {
        Self {
            reply: None,
            notifications: Vec::new(),
        }
    }

    pub fn with_notification(mut self, to_phone: &str, reply: Reply) -> Self {
        self.notifications.push(Notification {
            to_phone: to_phone.to_string(),
            reply,
        });
        self
    }
}
