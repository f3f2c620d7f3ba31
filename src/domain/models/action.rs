use tokio::sync::mpsc;

use super::BackendPrompt;
use super::Envelope;
use super::PageContext;

/// Requests sent to the background coordinator by the host page and the
/// popup.
#[derive(Debug)]
pub enum Action {
    OpenChat {
        page: PageContext,
        surface: mpsc::UnboundedSender<Envelope>,
    },
    AddQuote(String),
    SubmitTurn(BackendPrompt),
    CloseChat(),
}
