#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use super::RenderSink;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::ChatError;
use crate::domain::models::Conversation;
use crate::domain::models::Envelope;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::PageContext;
use crate::domain::models::Quote;
use crate::domain::models::Role;
use crate::domain::models::TurnOutcome;
use crate::domain::models::TurnState;
use crate::domain::models::UserTurn;

pub const ACK_INITIALIZED: &str = "Chat window initialized";
pub const ACK_QUOTE_ADDED: &str = "Quote added to chat";
pub const QUOTE_REMOVED: &str = "Quote removed";
pub const NO_QUOTE: &str = "No quote to remove";

/// Picks the model a new popup starts with: the default when it is known,
/// otherwise the first known model.
pub fn select_model(known_models: &[String], default_model: &str) -> String {
    if known_models.is_empty() || known_models.iter().any(|model| return model == default_model)
    {
        return default_model.to_string();
    }

    return known_models[0].to_string();
}

/// What a popup reads from configuration when it opens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub system_prompt: String,
    pub known_models: Vec<String>,
    pub default_model: String,
}

impl SessionSettings {
    pub fn from_config() -> SessionSettings {
        return SessionSettings {
            system_prompt: Config::get(ConfigKey::SystemPrompt),
            known_models: Config::get_list(ConfigKey::Models),
            default_model: Config::get(ConfigKey::Model),
        };
    }
}

/// State of one chat popup, from the moment it opens until it closes.
///
/// Streamed tokens go to the sink as they arrive but only reach the
/// conversation once the turn completes, as a single assistant message. A
/// failed turn commits one error message instead and leaves whatever partial
/// output was shown on screen.
pub struct ChatSession<R: RenderSink> {
    sink: R,
    conversation: Conversation,
    page: Option<PageContext>,
    quote: Option<Quote>,
    accumulator: String,
    turn: TurnState,
    last_outcome: Option<TurnOutcome>,
    backend_context: Option<Vec<i64>>,
    settings: SessionSettings,
    model: String,
}

impl<R: RenderSink> ChatSession<R> {
    pub fn new(sink: R, settings: SessionSettings) -> ChatSession<R> {
        return ChatSession {
            sink,
            conversation: Conversation::new(Some(&settings.system_prompt)),
            page: None,
            quote: None,
            accumulator: "".to_string(),
            turn: TurnState::Idle,
            last_outcome: None,
            backend_context: None,
            settings,
            model: "".to_string(),
        };
    }

    pub fn sink(&self) -> &R {
        return &self.sink;
    }

    pub fn conversation(&self) -> &Conversation {
        return &self.conversation;
    }

    pub fn page(&self) -> Option<&PageContext> {
        return self.page.as_ref();
    }

    pub fn quote(&self) -> Option<&Quote> {
        return self.quote.as_ref();
    }

    pub fn turn(&self) -> TurnState {
        return self.turn;
    }

    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        return self.last_outcome;
    }

    pub fn accumulator(&self) -> &str {
        return &self.accumulator;
    }

    pub fn model(&self) -> &str {
        return &self.model;
    }

    pub fn known_models(&self) -> &[String] {
        return &self.settings.known_models;
    }

    /// Captures the page context. Only the first call has any effect.
    pub fn initialize(&mut self, page: PageContext) {
        if self.page.is_some() {
            tracing::warn!(url = page.url, "Chat already initialized, ignoring page context");
            return;
        }

        self.model = select_model(&self.settings.known_models, &self.settings.default_model);
        self.sink.page_context(&page);
        tracing::debug!(title = page.title, url = page.url, model = self.model, "Chat initialized");
        self.page = Some(page);
    }

    pub fn select_model(&mut self, model: &str) {
        self.model = model.trim().to_string();
    }

    /// Replaces any pending quote.
    pub fn attach_quote(&mut self, text: &str) {
        self.quote = Quote::new(text);
        let shown = self.quote.as_ref().map(|quote| return quote.text());
        self.sink.quote(shown);
    }

    /// Drops the pending quote at the user's request and says so.
    pub fn dismiss_quote(&mut self) {
        if self.quote.is_some() {
            self.clear_quote();
            self.sink.notice(QUOTE_REMOVED);
        } else {
            self.sink.notice(NO_QUOTE);
        }
    }

    fn clear_quote(&mut self) {
        self.quote = None;
        self.sink.quote(None);
    }

    /// Commits a user message and returns the prompt for the coordinator.
    /// Blank input is ignored. A new turn is refused until the previous one
    /// has finished.
    pub fn submit(&mut self, text: &str) -> Result<Option<BackendPrompt>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        if self.turn != TurnState::Idle {
            return Err(ChatError::TurnInProgress);
        }

        let user_turn = UserTurn::compose(text, self.quote.as_ref());
        self.conversation.push(Message::user(&user_turn.committed));
        self.sink.message(Role::User, &user_turn.displayed);
        self.clear_quote();

        self.turn = TurnState::Sent;
        tracing::debug!(turn = %self.turn, messages = self.conversation.len(), "Turn sent");

        return Ok(Some(BackendPrompt::new(
            &self.model,
            self.conversation.messages().to_vec(),
            self.backend_context.clone(),
        )));
    }

    /// Shows a refused submission without committing it.
    pub fn reject(&mut self, err: &ChatError) {
        self.sink.message(Role::Error, &format!("Error: {err}"));
    }

    pub fn handle_token(&mut self, token: &str) {
        match self.turn {
            TurnState::Idle => {
                tracing::warn!(token, "Token received with no turn in flight, ignoring");
                return;
            }
            TurnState::Sent => {
                self.turn = TurnState::Streaming;
            }
            TurnState::Streaming => {}
        }

        self.accumulator += token;
        self.sink.token(token);
    }

    pub fn complete(&mut self, res: BackendResponse) {
        let text = match self.turn {
            TurnState::Idle => {
                tracing::warn!("Completion received with no turn in flight, ignoring");
                return;
            }
            TurnState::Sent => {
                // Whole response, nothing was streamed.
                self.sink.message(Role::Assistant, &res.text);
                res.text
            }
            TurnState::Streaming => {
                self.sink.finish_stream();
                std::mem::take(&mut self.accumulator)
            }
        };

        self.conversation.push(Message::assistant(&text));
        if res.context.is_some() {
            self.backend_context = res.context;
        }

        self.finish_turn(TurnOutcome::Completed);
    }

    /// Ends the turn with an error. Partial output stays on screen but is
    /// never committed.
    pub fn fail(&mut self, reason: &str) {
        match self.turn {
            TurnState::Idle => {
                tracing::warn!(reason, "Turn error received with no turn in flight, ignoring");
                return;
            }
            TurnState::Sent => {}
            TurnState::Streaming => {
                self.sink.finish_stream();
            }
        }
        self.accumulator.clear();

        let message = Message::error(reason);
        self.sink.message(Role::Error, &message.content);
        self.conversation.push(message);

        self.finish_turn(TurnOutcome::Failed);
    }

    fn finish_turn(&mut self, outcome: TurnOutcome) {
        self.turn = TurnState::Idle;
        self.last_outcome = Some(outcome);
        tracing::debug!(%outcome, messages = self.conversation.len(), "Turn finished");
    }

    /// Applies one relayed event, answering its acknowledgment if asked.
    pub fn handle_envelope(&mut self, mut envelope: Envelope) {
        match envelope.event.clone() {
            Event::InitChat(page) => {
                self.initialize(page);
                envelope.acknowledge(ACK_INITIALIZED);
            }
            Event::QuoteAttached(quote) => {
                self.attach_quote(&quote);
                envelope.acknowledge(ACK_QUOTE_ADDED);
            }
            Event::StreamToken(token) => self.handle_token(&token),
            Event::TurnComplete(res) => self.complete(res),
            Event::TurnError(reason) => self.fail(&reason),
        }
    }
}
