pub mod auth;
pub mod config;
pub mod duration;
pub mod engine;
pub mod events;
pub mod giveaway;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod store;

// Re-exports for convenience
pub use auth::{Authorizer, HostOnly, Moderators};
pub use config::{ConfigError, EngineLimits, load_config, save_config};
pub use duration::{ParseError, parse_duration};
pub use engine::{CancelError, EndError, LifecycleEngine, RerollError, Resolution, StartError};
pub use events::{ChannelSink, EventSink, GiveawayEvent, LoggingSink, ResolveTrigger};
pub use giveaway::{EndOutcome, GiveawaySnapshot};
pub use giveaway_types::{AppConfig, EngineConfig, GiveawayId, GiveawayStatus, RerollPolicy, UserId};
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler};
pub use store::{GiveawayStore, ToggleError, ToggleResult};
