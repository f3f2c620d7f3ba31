use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(
        doc.get("ollama-url").and_then(|e| return e.as_str()),
        Some("http://localhost:11434")
    );
    assert_eq!(doc.get("stream").and_then(|e| return e.as_bool()), Some(true));
    assert_eq!(
        doc.get("backend-health-check-timeout")
            .and_then(|e| return e.as_integer()),
        Some(1000)
    );
    assert!(doc.get("config-file").is_none());
    assert!(res.contains("# model = \"\""));
    assert!(res.contains("[possible values: drop, carry]"));

    return Ok(());
}

#[test]
fn it_rejects_unknown_line_policy() {
    let res = Config::load_toml(&cli::build(), "stream-line-policy = \"middle\"\n");
    let err = res.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @r###"
    config.toml has an invalid value for key 'stream-line-policy': middle
    Possible values are: drop, carry
    "###);
}

#[test]
fn it_rejects_invalid_toml() {
    assert!(Config::load_toml(&cli::build(), "model = ").is_err());
}

// The only test that writes to the shared configuration.
#[tokio::test]
async fn it_loads_config_file_then_args() -> Result<()> {
    let config_path = std::env::temp_dir().join(format!("pagechat-config-{}.toml", std::process::id()));
    tokio::fs::write(
        &config_path,
        r#"
model = "llama2"
models = ["llama2", "mistral:7b"]
stream = false
stream-line-policy = "carry"
backend-health-check-timeout = 250
"#,
    )
    .await?;

    let config_file = config_path.to_string_lossy().to_string();
    let matches = cli::build().try_get_matches_from(vec![
        "pagechat",
        "-c",
        &config_file,
        "--model",
        "mistral:7b",
    ])?;
    Config::load(cli::build(), vec![&matches]).await?;
    tokio::fs::remove_file(&config_path).await?;

    assert_eq!(Config::get(ConfigKey::Model), "mistral:7b");
    assert_eq!(
        Config::get_list(ConfigKey::Models),
        vec!["llama2".to_string(), "mistral:7b".to_string()]
    );
    assert!(!Config::get_bool(ConfigKey::Stream));
    assert_eq!(Config::get(ConfigKey::StreamLinePolicy), "carry");
    assert_eq!(Config::get(ConfigKey::BackendHealthCheckTimeout), "250");
    assert_eq!(
        Config::get(ConfigKey::OllamaURL),
        "http://localhost:11434"
    );

    return Ok(());
}
