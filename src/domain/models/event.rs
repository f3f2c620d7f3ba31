use tokio::sync::oneshot;

use super::BackendResponse;
use super::PageContext;

/// Surfaces the coordinator can route events to. The host page only ever
/// sends actions, so the popup is the one receiving side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Surface {
    Popup,
}

/// Events delivered from the coordinator to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    InitChat(PageContext),
    StreamToken(String),
    TurnComplete(BackendResponse),
    TurnError(String),
    QuoteAttached(String),
}

pub type Ack = String;

/// An event plus the optional acknowledgment the receiver may answer.
#[derive(Debug)]
pub struct Envelope {
    pub event: Event,
    pub ack: Option<oneshot::Sender<Ack>>,
}

impl Envelope {
    pub fn new(event: Event) -> Envelope {
        return Envelope { event, ack: None };
    }

    pub fn with_ack(event: Event) -> (Envelope, oneshot::Receiver<Ack>) {
        let (tx, rx) = oneshot::channel::<Ack>();
        return (
            Envelope {
                event,
                ack: Some(tx),
            },
            rx,
        );
    }

    /// Answers the sender if it asked for it. The sender may have gone away,
    /// which is not an error for the receiver.
    pub fn acknowledge(&mut self, status: &str) {
        if let Some(ack) = self.ack.take() {
            if ack.send(status.to_string()).is_err() {
                tracing::debug!(status, "acknowledgment dropped by sender");
            }
        }
    }
}
