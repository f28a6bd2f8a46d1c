use chrono::{DateTime, Utc};
use giveaway_types::{GiveawayId, UserId};
use serde::Serialize;

use crate::giveaway::{EndOutcome, GiveawaySnapshot};

/// What closed a giveaway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ResolveTrigger {
    Timer,
    Manual { actor: UserId },
}

/// Lifecycle notifications for the presentation layer.
/// Every variant carries copied data, never a handle into the live store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GiveawayEvent {
    Started {
        giveaway: GiveawaySnapshot,
    },
    ParticipantToggled {
        giveaway_id: GiveawayId,
        user_id: UserId,
        joined: bool,
        participant_count: usize,
    },
    Ended {
        giveaway_id: GiveawayId,
        prize: String,
        host_id: UserId,
        outcome: EndOutcome,
        trigger: ResolveTrigger,
        ended_at: DateTime<Utc>,
    },
    Cancelled {
        giveaway_id: GiveawayId,
        prize: String,
        host_id: UserId,
        actor: UserId,
    },
    Rerolled {
        giveaway_id: GiveawayId,
        prize: String,
        host_id: UserId,
        outcome: EndOutcome,
    },
}

impl GiveawayEvent {
    pub fn giveaway_id(&self) -> GiveawayId {
        match self {
            Self::Started { giveaway } => giveaway.id,
            Self::ParticipantToggled { giveaway_id, .. }
            | Self::Ended { giveaway_id, .. }
            | Self::Cancelled { giveaway_id, .. }
            | Self::Rerolled { giveaway_id, .. } => *giveaway_id,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::ParticipantToggled { .. } => "participant_toggled",
            Self::Ended { .. } => "ended",
            Self::Cancelled { .. } => "cancelled",
            Self::Rerolled { .. } => "rerolled",
        }
    }
}
