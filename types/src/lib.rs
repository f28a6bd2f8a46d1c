//! Shared plain-data types for the giveaway workspace.
//!
//! Everything in here is cheap to clone and serializable so that hosts can
//! forward identifiers, status values and configuration across process or
//! network boundaries without depending on the engine itself.

pub mod config;
pub mod formatting;
pub mod ids;

pub use config::{AppConfig, EngineConfig, LogConfig, RerollPolicy};
pub use ids::{GiveawayId, GiveawayStatus, IdParseError, UserId};
