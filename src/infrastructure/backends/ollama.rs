#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::BackendSettings;
use crate::domain::models::ChatError;
use crate::domain::models::ChunkStream;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Vec<i64>>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub context: Option<Vec<i64>>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    pub models: Vec<Model>,
}

/// Model names with their `:tag` suffix removed, deduplicated.
pub fn base_model_names(models: &[String]) -> Vec<String> {
    let mut names = models
        .iter()
        .map(|model| return model.split(':').next().unwrap_or_default().to_string())
        .filter(|name| return !name.is_empty())
        .collect::<Vec<String>>();

    names.sort();
    names.dedup();

    return names;
}

pub struct Ollama {
    client: reqwest::Client,
    settings: BackendSettings,
}

impl Ollama {
    pub fn new(settings: BackendSettings) -> Result<Ollama, ChatError> {
        if settings.url.trim().is_empty() {
            return Err(ChatError::ConfigurationMissing(
                "no Ollama URL is set, configure `ollama-url` first".to_string(),
            ));
        }

        return Ok(Ollama {
            client: reqwest::Client::new(),
            settings,
        });
    }

    fn url(&self, path: &str) -> String {
        let base = self.settings.url.trim().trim_end_matches('/');
        return format!("{base}{path}");
    }

    fn completion_request(&self, prompt: &BackendPrompt, stream: bool) -> CompletionRequest {
        return CompletionRequest {
            model: self.settings.resolve_model(&prompt.model),
            prompt: prompt.text().to_string(),
            system: prompt.system().to_string(),
            context: prompt.context.clone(),
            stream,
        };
    }

    async fn post_generate(&self, req: &CompletionRequest) -> Result<reqwest::Response, ChatError> {
        tracing::debug!(model = req.model, stream = req.stream, "Completion request");

        let res = self
            .client
            .post(self.url("/api/generate"))
            .json(req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status,
                body,
                model = req.model,
                "Failed to make completion request to Ollama"
            );
            return Err(ChatError::ServerError { status, body });
        }

        return Ok(res);
    }
}

#[async_trait]
impl Backend for Ollama {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<(), ChatError> {
        let res = self
            .client
            .get(self.url(""))
            .timeout(Duration::from_millis(self.settings.health_check_timeout_ms))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Ollama is not running");
                return Err(ChatError::TransportFailure(format!(
                    "Ollama is not running at {}",
                    self.settings.url
                )));
            }
        };

        if !res.status().is_success() {
            let status = res.status().as_u16();
            tracing::error!(status, "Ollama health check failed");
            return Err(ChatError::ServerError {
                status,
                body: res.text().await.unwrap_or_default(),
            });
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let res = self.client.get(self.url("/api/tags")).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            return Err(ChatError::ServerError {
                status,
                body: res.text().await.unwrap_or_default(),
            });
        }

        let body = res.text().await?;
        let list = serde_json::from_str::<ModelListResponse>(&body)
            .map_err(|err| return ChatError::InvalidResponse(err.to_string()))?;

        let mut models: Vec<String> = list
            .models
            .iter()
            .map(|model| {
                return model.name.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: &BackendPrompt) -> Result<BackendResponse, ChatError> {
        let req = self.completion_request(prompt, false);
        let res = self.post_generate(&req).await?;

        let body = res.text().await?;
        let ores = serde_json::from_str::<CompletionResponse>(&body).map_err(|err| {
            tracing::error!(error = ?err, body, "Unparseable completion response");
            return ChatError::InvalidResponse(err.to_string());
        })?;
        tracing::debug!(body = ?ores, "Completion response");

        if let Some(err) = ores.error {
            tracing::error!(error = err, "Ollama reported a completion error");
            return Err(ChatError::InvalidResponse(err));
        }
        let text = match ores.response {
            Some(text) => text,
            None => {
                return Err(ChatError::InvalidResponse(
                    "completion has no response field".to_string(),
                ));
            }
        };

        return Ok(BackendResponse {
            text,
            context: ores.context,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn generate_stream(&self, prompt: &BackendPrompt) -> Result<ChunkStream, ChatError> {
        let req = self.completion_request(prompt, true);
        let res = self.post_generate(&req).await?;

        return Ok(res.bytes_stream().map_err(ChatError::from).boxed());
    }
}
