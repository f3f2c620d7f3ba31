use super::BackendPrompt;
use super::BackendSettings;
use super::SplitLinePolicy;
use super::FALLBACK_MODEL;
use crate::domain::models::Message;

#[test]
fn it_prefers_requested_model() {
    let settings = BackendSettings {
        model: "mistral".to_string(),
        ..BackendSettings::default()
    };
    assert_eq!(settings.resolve_model("llama2:13b"), "llama2:13b");
}

#[test]
fn it_falls_back_to_default_model() {
    let settings = BackendSettings {
        model: "mistral".to_string(),
        ..BackendSettings::default()
    };
    assert_eq!(settings.resolve_model(" "), "mistral");
}

#[test]
fn it_falls_back_to_llama2() {
    let settings = BackendSettings::default();
    assert_eq!(settings.resolve_model(""), FALLBACK_MODEL);
}

#[test]
fn it_uses_last_message_as_prompt_text() {
    let prompt = BackendPrompt::new(
        "",
        vec![
            Message::system("Be brief."),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ],
        None,
    );

    assert_eq!(prompt.text(), "second");
    assert_eq!(prompt.system(), "Be brief.");
}

#[test]
fn it_has_empty_text_and_system_without_messages() {
    let prompt = BackendPrompt::default();
    assert_eq!(prompt.text(), "");
    assert_eq!(prompt.system(), "");
}

#[test]
fn it_parses_line_policies() {
    assert_eq!("drop".parse::<SplitLinePolicy>(), Ok(SplitLinePolicy::Drop));
    assert_eq!("carry".parse::<SplitLinePolicy>(), Ok(SplitLinePolicy::Carry));
    assert!("reassemble".parse::<SplitLinePolicy>().is_err());
    assert_eq!(SplitLinePolicy::default().to_string(), "drop");
}
