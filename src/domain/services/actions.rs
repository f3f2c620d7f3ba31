#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::decode_stream;
use super::Decoded;
use super::Relay;
use crate::domain::models::Ack;
use crate::domain::models::Action;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::BackendSettings;
use crate::domain::models::ChatError;
use crate::domain::models::Event;
use crate::domain::models::Surface;
use crate::infrastructure::backends::ollama::Ollama;

/// Runs one turn against a backend and relays its output to the popup.
/// Exactly one `TurnComplete` is relayed on success; on error nothing
/// terminal is relayed here and the error is returned to the caller.
pub async fn run_turn(
    backend: &(dyn Backend + Send + Sync),
    settings: &BackendSettings,
    prompt: BackendPrompt,
    relay: &Relay,
) -> Result<(), ChatError> {
    if !settings.stream {
        let res = backend.generate(&prompt).await?;
        relay.send(Surface::Popup, Event::TurnComplete(res))?;
        return Ok(());
    }

    let chunks = backend.generate_stream(&prompt).await?;
    let mut decoded = decode_stream(chunks, settings.line_policy);

    let mut result = BackendResponse::default();
    while let Some(item) = decoded.next().await {
        match item? {
            Decoded::Token(token) => {
                result.text += &token;
                relay.send(Surface::Popup, Event::StreamToken(token))?;
            }
            Decoded::Done { context } => {
                result.context = context;
            }
        }
    }

    tracing::debug!(chars = result.text.len(), "Completion streamed");
    relay.send(Surface::Popup, Event::TurnComplete(result))?;

    return Ok(());
}

/// Runs a turn and reports any abort to the popup as a single turn error.
async fn turn_worker(
    backend: Result<BackendBox, ChatError>,
    settings: BackendSettings,
    prompt: BackendPrompt,
    relay: Relay,
) {
    let res = match backend {
        Ok(backend) => run_turn(backend.as_ref(), &settings, prompt, &relay).await,
        Err(err) => Err(err),
    };

    let err = match res {
        Ok(()) => return,
        Err(err) => err,
    };

    if !err.aborts_turn() {
        tracing::warn!(error = %err, "Chat window closed mid-turn, abandoning it");
        return;
    }

    tracing::error!(error = %err, "Turn failed");
    if let Err(relay_err) = relay.send(Surface::Popup, Event::TurnError(err.to_string())) {
        tracing::warn!(error = %relay_err, "Unable to report turn failure");
    }
}

fn log_ack(action: &'static str, ack: oneshot::Receiver<Ack>) {
    tokio::spawn(async move {
        match ack.await {
            Ok(status) => tracing::debug!(action, status, "Surface acknowledged"),
            Err(_) => tracing::warn!(action, "Surface went away before acknowledging"),
        }
    });
}

/// Builds the backend for a turn from the configuration as it is now.
pub fn backend_from_settings(settings: &BackendSettings) -> Result<BackendBox, ChatError> {
    let backend = Ollama::new(settings.clone())?;
    return Ok(Box::new(backend));
}

/// The background coordinator. Owns the routes to the surfaces and runs
/// each turn in its own task.
pub struct ActionsService {
    relay: Relay,
    make_backend: fn(&BackendSettings) -> Result<BackendBox, ChatError>,
    read_settings: fn() -> BackendSettings,
}

impl Default for ActionsService {
    fn default() -> ActionsService {
        return ActionsService {
            relay: Relay::default(),
            make_backend: backend_from_settings,
            read_settings: BackendSettings::from_config,
        };
    }
}

impl ActionsService {
    pub fn new(
        relay: Relay,
        make_backend: fn(&BackendSettings) -> Result<BackendBox, ChatError>,
        read_settings: fn() -> BackendSettings,
    ) -> ActionsService {
        return ActionsService {
            relay,
            make_backend,
            read_settings,
        };
    }

    pub fn relay(&self) -> &Relay {
        return &self.relay;
    }

    /// Handles a single action. Returns the worker for submitted turns.
    pub fn handle(&self, action: Action) -> Option<JoinHandle<()>> {
        match action {
            Action::OpenChat { page, surface } => {
                self.relay.attach(Surface::Popup, surface);
                match self
                    .relay
                    .send_with_ack(Surface::Popup, Event::InitChat(page))
                {
                    Ok(ack) => log_ack("init-chat", ack),
                    Err(err) => tracing::warn!(error = %err, "Unable to initialize chat window"),
                }
            }
            Action::AddQuote(quote) => {
                match self
                    .relay
                    .send_with_ack(Surface::Popup, Event::QuoteAttached(quote))
                {
                    Ok(ack) => log_ack("add-quote", ack),
                    Err(err) => tracing::warn!(error = %err, "Chat window is not open"),
                }
            }
            Action::SubmitTurn(prompt) => {
                let settings = (self.read_settings)();
                let backend = (self.make_backend)(&settings);
                let relay = self.relay.clone();

                return Some(tokio::spawn(async move {
                    turn_worker(backend, settings, prompt, relay).await;
                }));
            }
            Action::CloseChat() => {
                self.relay.detach(Surface::Popup);
            }
        }

        return None;
    }

    pub async fn start(&self, rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<()> {
        while let Some(action) = rx.recv().await {
            let is_close = matches!(action, Action::CloseChat());
            self.handle(action);
            if is_close {
                break;
            }
        }

        return Ok(());
    }
}
