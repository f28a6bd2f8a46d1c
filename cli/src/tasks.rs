use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use giveaway_core::{GiveawayEvent, LifecycleEngine};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::render::render_event;

/// Print every engine event until all senders are gone.
pub fn spawn_renderer(mut events: UnboundedReceiver<GiveawayEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = render_event(&event, Utc::now());
            // Delivery failures stay on this side of the channel
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "\n{text}").and_then(|_| stdout.flush()) {
                warn!(giveaway_id = %event.giveaway_id(), error = %e, "Failed to render event");
            }
        }
    })
}

/// Periodically drop resolved giveaways older than `retention`.
pub fn spawn_evictor(engine: LifecycleEngine, retention: Duration) -> JoinHandle<()> {
    let period = retention.clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            engine.evict_resolved(retention);
        }
    })
}
