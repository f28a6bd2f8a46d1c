use giveaway_types::{GiveawayId, GiveawayStatus, UserId};
use thiserror::Error;

use crate::duration::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("invalid duration: {0}")]
    Duration(#[from] ParseError),
    #[error("duration of {requested_secs}s exceeds the maximum of {max_secs}s")]
    DurationTooLong { requested_secs: u64, max_secs: u64 },
    #[error("winner count must be at least 1")]
    InvalidWinnerCount,
    #[error("winner count {requested} exceeds the maximum of {max}")]
    TooManyWinners { requested: u32, max: u32 },
    #[error("prize must not be empty")]
    EmptyPrize,
    #[error("giveaway {0} already exists")]
    DuplicateId(GiveawayId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("user {actor} may not end giveaway {id}")]
    Unauthorized { id: GiveawayId, actor: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("user {actor} may not cancel giveaway {id}")]
    Unauthorized { id: GiveawayId, actor: UserId },
    #[error("giveaway {id} is already {status}")]
    AlreadyResolved { id: GiveawayId, status: GiveawayStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RerollError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("giveaway {id} is {status}, only ended giveaways can be rerolled")]
    NotEnded { id: GiveawayId, status: GiveawayStatus },
    #[error("giveaway {0} has no participants to reroll")]
    NoParticipants(GiveawayId),
    #[error("every participant of giveaway {0} has already won")]
    NoEligibleParticipants(GiveawayId),
    #[error("winner count must be at least 1")]
    InvalidWinnerCount,
    #[error("winner count {requested} exceeds the maximum of {max}")]
    TooManyWinners { requested: u32, max: u32 },
}
