use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a chat user (host, participant or moderator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Stable handle for a single giveaway. Hosts usually derive it from the id of
/// the announcement message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiveawayId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError(pub String);

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid id: {:?}", self.0)
    }
}

impl std::error::Error for IdParseError {}

/// Accepts a bare number or a mention (`<@123>`, `<@!123>`).
impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .map(|inner| inner.trim_start_matches('!'))
            .unwrap_or(trimmed);
        digits
            .parse()
            .map(UserId)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl FromStr for GiveawayId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(GiveawayId)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

/// Lifecycle status of a giveaway.
///
/// `Open` is the only non-terminal state. `Ended` giveaways may still be
/// rerolled; `Cancelled` ones accept nothing further.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveawayStatus {
    #[default]
    Open,
    Ended,
    Cancelled,
}

impl GiveawayStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

impl fmt::Display for GiveawayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        };
        f.pad(label)
    }
}
