pub mod event;
pub mod sink;

pub use event::{GiveawayEvent, ResolveTrigger};
pub use sink::{ChannelSink, EventSink, LoggingSink};
