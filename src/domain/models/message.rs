#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> Message {
        return Message::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> Message {
        return Message::new(Role::Assistant, content);
    }

    pub fn system(content: &str) -> Message {
        return Message::new(Role::System, content);
    }

    /// Error entries are shown to the user with the same prefix they are
    /// stored with.
    pub fn error(reason: &str) -> Message {
        return Message::new(Role::Error, &format!("Error: {reason}"));
    }

    pub fn is_error(&self) -> bool {
        return self.role == Role::Error;
    }
}
