use super::Conversation;
use super::Message;
use super::Role;

#[test]
fn it_starts_empty_without_system_prompt() {
    let conversation = Conversation::new(None);
    assert!(conversation.is_empty());
    assert_eq!(conversation.system_prompt(), None);
}

#[test]
fn it_ignores_blank_system_prompt() {
    let conversation = Conversation::new(Some("  "));
    assert!(conversation.is_empty());
}

#[test]
fn it_leads_with_system_prompt() {
    let conversation = Conversation::new(Some("Answer in one sentence."));
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.messages()[0].role, Role::System);
    assert_eq!(conversation.system_prompt(), Some("Answer in one sentence."));
}

#[test]
fn it_appends_in_order() {
    let mut conversation = Conversation::new(None);
    conversation.push(Message::user("one"));
    conversation.push(Message::assistant("two"));
    conversation.push(Message::error("three"));

    let roles = conversation
        .messages()
        .iter()
        .map(|msg| return msg.role)
        .collect::<Vec<Role>>();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Error]);
    assert_eq!(conversation.last().unwrap().content, "Error: three");
}
