use tokio::sync::mpsc;
use tracing::{info, warn};

use super::GiveawayEvent;

/// Receives lifecycle events after the state change is committed.
///
/// Sinks are called synchronously on the thread that performed the
/// operation, outside any store lock. Anything slow (network delivery,
/// rendering) belongs on the other side of a [`ChannelSink`].
pub trait EventSink: Send + Sync {
    fn handle_event(&self, event: &GiveawayEvent);
}

impl<F> EventSink for F
where
    F: Fn(&GiveawayEvent) + Send + Sync,
{
    fn handle_event(&self, event: &GiveawayEvent) {
        self(event)
    }
}

/// Forwards events to an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GiveawayEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<GiveawayEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GiveawayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn handle_event(&self, event: &GiveawayEvent) {
        if self.tx.send(event.clone()).is_err() {
            warn!(
                giveaway_id = %event.giveaway_id(),
                event = event.kind(),
                "Event receiver closed, dropping event"
            );
        }
    }
}

/// Writes every event to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl EventSink for LoggingSink {
    fn handle_event(&self, event: &GiveawayEvent) {
        info!(giveaway_id = %event.giveaway_id(), kind = event.kind(), details = ?event, "Giveaway event");
    }
}
