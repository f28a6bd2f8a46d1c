//! The giveaway entity and its immutable snapshots.

use chrono::{DateTime, Utc};
use giveaway_types::{GiveawayId, GiveawayStatus, UserId};
use serde::Serialize;

use crate::registry::ParticipantRegistry;

/// Live state of one giveaway. Only reachable through `GiveawayStore`.
///
/// Fields that must not change after creation have no setters; status and
/// winners only move through the `mark_*`/`record_*` methods, which refuse
/// transitions out of terminal states.
#[derive(Debug, Clone)]
pub struct Giveaway {
    id: GiveawayId,
    prize: String,
    host_id: UserId,
    winner_count: u32,
    created_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    participants: ParticipantRegistry,
    status: GiveawayStatus,
    last_winners: Vec<UserId>,
    /// When the giveaway left `Open`.
    resolved_at: Option<DateTime<Utc>>,
}

impl Giveaway {
    pub fn new(
        id: GiveawayId,
        host_id: UserId,
        prize: String,
        winner_count: u32,
        created_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            prize,
            host_id,
            winner_count,
            created_at,
            ends_at,
            participants: ParticipantRegistry::new(),
            status: GiveawayStatus::Open,
            last_winners: Vec::new(),
            resolved_at: None,
        }
    }

    pub fn id(&self) -> GiveawayId {
        self.id
    }

    pub fn prize(&self) -> &str {
        &self.prize
    }

    pub fn host_id(&self) -> UserId {
        self.host_id
    }

    pub fn winner_count(&self) -> u32 {
        self.winner_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn status(&self) -> GiveawayStatus {
        self.status
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn last_winners(&self) -> &[UserId] {
        &self.last_winners
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Flip a user's membership. Fails with the current status unless open.
    pub fn toggle_participant(&mut self, user: UserId) -> Result<bool, GiveawayStatus> {
        if !self.status.is_open() {
            return Err(self.status);
        }
        Ok(self.participants.toggle(user))
    }

    /// Record the first draw and close the giveaway.
    pub fn mark_ended(&mut self, winners: Vec<UserId>, at: DateTime<Utc>) -> Result<(), GiveawayStatus> {
        if !self.status.is_open() {
            return Err(self.status);
        }
        self.status = GiveawayStatus::Ended;
        self.last_winners = winners;
        self.resolved_at = Some(at);
        Ok(())
    }

    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) -> Result<(), GiveawayStatus> {
        if !self.status.is_open() {
            return Err(self.status);
        }
        self.status = GiveawayStatus::Cancelled;
        self.resolved_at = Some(at);
        Ok(())
    }

    /// Overwrite the winners of an ended giveaway.
    pub fn record_reroll(&mut self, winners: Vec<UserId>) -> Result<(), GiveawayStatus> {
        if self.status != GiveawayStatus::Ended {
            return Err(self.status);
        }
        self.last_winners = winners;
        Ok(())
    }

    pub fn snapshot(&self) -> GiveawaySnapshot {
        GiveawaySnapshot {
            id: self.id,
            prize: self.prize.clone(),
            host_id: self.host_id,
            winner_count: self.winner_count,
            created_at: self.created_at,
            ends_at: self.ends_at,
            status: self.status,
            participants: self.participants.snapshot(),
            last_winners: self.last_winners.clone(),
            resolved_at: self.resolved_at,
        }
    }
}

/// Detached copy of a giveaway, safe to hand to renderers and authorizers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiveawaySnapshot {
    pub id: GiveawayId,
    pub prize: String,
    pub host_id: UserId,
    pub winner_count: u32,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: GiveawayStatus,
    /// Sorted participant ids.
    pub participants: Vec<UserId>,
    pub last_winners: Vec<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl GiveawaySnapshot {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

/// Result of a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndOutcome {
    Winners {
        winners: Vec<UserId>,
        participant_count: usize,
    },
    /// Nobody had joined, so nobody could win.
    NoParticipants,
}

impl EndOutcome {
    pub fn from_draw(winners: Vec<UserId>, participant_count: usize) -> Self {
        if participant_count == 0 {
            Self::NoParticipants
        } else {
            Self::Winners {
                winners,
                participant_count,
            }
        }
    }

    pub fn winners(&self) -> &[UserId] {
        match self {
            Self::Winners { winners, .. } => winners,
            Self::NoParticipants => &[],
        }
    }

    pub fn participant_count(&self) -> usize {
        match self {
            Self::Winners {
                participant_count, ..
            } => *participant_count,
            Self::NoParticipants => 0,
        }
    }
}
