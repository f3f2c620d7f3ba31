#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use super::Message;
use super::Role;

/// Append-only log of the messages committed during one popup session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: Option<&str>) -> Conversation {
        let mut conversation = Conversation::default();
        if let Some(prompt) = system_prompt {
            if !prompt.trim().is_empty() {
                conversation.push(Message::system(prompt));
            }
        }

        return conversation;
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn last(&self) -> Option<&Message> {
        return self.messages.last();
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    pub fn system_prompt(&self) -> Option<&str> {
        return self
            .messages
            .iter()
            .find(|msg| return msg.role == Role::System)
            .map(|msg| return msg.content.as_str());
    }
}
