#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::ChatError;
use super::Message;
use super::Role;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

pub const FALLBACK_MODEL: &str = "llama2";

/// How the chunk decoder treats a line broken across two chunks.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumVariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SplitLinePolicy {
    /// Each chunk is decoded on its own and the halves of a split line are
    /// dropped as malformed.
    #[default]
    Drop,
    /// The trailing fragment of a chunk is carried into the next one.
    Carry,
}

/// Backend configuration, read fresh at the start of every turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    pub url: String,
    pub model: String,
    pub stream: bool,
    pub line_policy: SplitLinePolicy,
    pub health_check_timeout_ms: u64,
}

impl BackendSettings {
    pub fn from_config() -> BackendSettings {
        let line_policy = Config::get(ConfigKey::StreamLinePolicy)
            .parse::<SplitLinePolicy>()
            .unwrap_or_default();
        let health_check_timeout_ms = Config::get(ConfigKey::BackendHealthCheckTimeout)
            .parse::<u64>()
            .unwrap_or(1000);

        return BackendSettings {
            url: Config::get(ConfigKey::OllamaURL),
            model: Config::get(ConfigKey::Model),
            stream: Config::get_bool(ConfigKey::Stream),
            line_policy,
            health_check_timeout_ms,
        };
    }

    /// Model for a turn: the popup's pick, then the configured default.
    pub fn resolve_model(&self, requested: &str) -> String {
        if !requested.trim().is_empty() {
            return requested.trim().to_string();
        }
        if !self.model.trim().is_empty() {
            return self.model.trim().to_string();
        }

        return FALLBACK_MODEL.to_string();
    }
}

impl Default for BackendSettings {
    fn default() -> BackendSettings {
        return BackendSettings {
            url: "http://localhost:11434".to_string(),
            model: "".to_string(),
            stream: true,
            line_policy: SplitLinePolicy::default(),
            health_check_timeout_ms: 1000,
        };
    }
}

/// Everything a backend needs for one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendPrompt {
    /// Model picked in the popup. Empty means the configured default.
    pub model: String,
    /// The conversation so far, ending with the message being sent.
    pub messages: Vec<Message>,
    /// Opaque context returned by the previous completed turn.
    pub context: Option<Vec<i64>>,
}

impl BackendPrompt {
    pub fn new(model: &str, messages: Vec<Message>, context: Option<Vec<i64>>) -> BackendPrompt {
        return BackendPrompt {
            model: model.to_string(),
            messages,
            context,
        };
    }

    /// The message being answered.
    pub fn text(&self) -> &str {
        return self
            .messages
            .last()
            .map(|msg| return msg.content.as_str())
            .unwrap_or_default();
    }

    pub fn system(&self) -> &str {
        return self
            .messages
            .iter()
            .find(|msg| return msg.role == Role::System)
            .map(|msg| return msg.content.as_str())
            .unwrap_or_default();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    pub context: Option<Vec<i64>>,
}

/// Raw body chunks of a streamed completion.
pub type ChunkStream = BoxStream<'static, Result<Bytes, ChatError>>;

#[async_trait]
pub trait Backend {
    /// Used by `pagechat models` to verify the server is reachable before
    /// listing anything.
    async fn health_check(&self) -> Result<(), ChatError>;

    /// All models the server has available, sorted by name.
    async fn list_models(&self) -> Result<Vec<String>, ChatError>;

    /// Requests a completion and waits for the whole body.
    async fn generate(&self, prompt: &BackendPrompt) -> Result<BackendResponse, ChatError>;

    /// Requests a completion and hands back the body as it arrives, without
    /// buffering it.
    async fn generate_stream(&self, prompt: &BackendPrompt) -> Result<ChunkStream, ChatError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
