#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::domain::models::Ack;
use crate::domain::models::ChatError;
use crate::domain::models::Envelope;
use crate::domain::models::Event;
use crate::domain::models::Surface;

/// Routes coordinator events to whichever surfaces are currently open.
///
/// A route is dropped the first time delivery to it fails, so the next send
/// re-resolves the surface instead of writing into a closed channel again.
/// Nothing is retried.
#[derive(Clone, Default)]
pub struct Relay {
    routes: Arc<DashMap<Surface, mpsc::UnboundedSender<Envelope>>>,
}

impl Relay {
    pub fn attach(&self, surface: Surface, tx: mpsc::UnboundedSender<Envelope>) {
        tracing::debug!(%surface, "Surface attached");
        self.routes.insert(surface, tx);
    }

    pub fn detach(&self, surface: Surface) {
        if self.routes.remove(&surface).is_some() {
            tracing::debug!(%surface, "Surface detached");
        }
    }

    pub fn is_attached(&self, surface: Surface) -> bool {
        return self.routes.contains_key(&surface);
    }

    pub fn send(&self, surface: Surface, event: Event) -> Result<(), ChatError> {
        return self.deliver(surface, Envelope::new(event));
    }

    /// Sends an event and hands back the receiver for the surface's answer.
    pub fn send_with_ack(
        &self,
        surface: Surface,
        event: Event,
    ) -> Result<oneshot::Receiver<Ack>, ChatError> {
        let (envelope, ack_rx) = Envelope::with_ack(event);
        self.deliver(surface, envelope)?;

        return Ok(ack_rx);
    }

    fn deliver(&self, surface: Surface, envelope: Envelope) -> Result<(), ChatError> {
        // Clone the sender out so the map guard is released before a
        // possible removal below.
        let tx = match self.routes.get(&surface) {
            Some(route) => route.value().clone(),
            None => {
                tracing::warn!(%surface, "Surface is not open");
                return Err(ChatError::RelayUndeliverable(surface));
            }
        };

        if tx.send(envelope).is_err() {
            tracing::warn!(%surface, "Surface closed, resetting route");
            self.routes
                .remove_if(&surface, |_, route| return route.same_channel(&tx));
            return Err(ChatError::RelayUndeliverable(surface));
        }

        return Ok(());
    }
}
