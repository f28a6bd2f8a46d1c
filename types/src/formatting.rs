//! Display formatting helpers for giveaway announcements.
//!
//! The engine never renders text itself. Hosts that do render go through
//! these helpers so counts, countdowns and mentions look the same everywhere.

use crate::ids::UserId;

/// Format a number with thousands separators.
///
/// # Examples
/// ```
/// use giveaway_types::formatting::format_thousands;
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(500), "500");
/// assert_eq!(format_thousands(1_500), "1,500");
/// assert_eq!(format_thousands(1_500_000), "1,500,000");
/// ```
pub fn format_thousands(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

fn pluralize(n: u64, singular: &str, plural: &str) -> String {
    let noun = if n == 1 { singular } else { plural };
    format!("{} {}", format_thousands(n), noun)
}

/// Label for the participant counter next to the join control.
///
/// # Examples
/// ```
/// use giveaway_types::formatting::format_participant_count;
/// assert_eq!(format_participant_count(0), "0 Participants");
/// assert_eq!(format_participant_count(1), "1 Participant");
/// assert_eq!(format_participant_count(2_400), "2,400 Participants");
/// ```
pub fn format_participant_count(n: usize) -> String {
    pluralize(n as u64, "Participant", "Participants")
}

/// # Examples
/// ```
/// use giveaway_types::formatting::format_winner_count;
/// assert_eq!(format_winner_count(1), "1 Winner");
/// assert_eq!(format_winner_count(3), "3 Winners");
/// ```
pub fn format_winner_count(n: u32) -> String {
    pluralize(u64::from(n), "Winner", "Winners")
}

/// Chat mention for a user.
pub fn format_mention(user: UserId) -> String {
    format!("<@{}>", user.0)
}

/// Comma-separated mentions, in the given order.
///
/// # Examples
/// ```
/// use giveaway_types::UserId;
/// use giveaway_types::formatting::format_mentions;
/// assert_eq!(format_mentions(&[UserId(1), UserId(22)]), "<@1>, <@22>");
/// assert_eq!(format_mentions(&[]), "");
/// ```
pub fn format_mentions(users: &[UserId]) -> String {
    users
        .iter()
        .map(|u| format_mention(*u))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format remaining time as `1d 2h 30m 5s`, skipping zero components.
///
/// Values <= 0 return `zero_label`.
///
/// # Examples
/// ```
/// use giveaway_types::formatting::format_countdown;
/// assert_eq!(format_countdown(95_405, "ended"), "1d 2h 30m 5s");
/// assert_eq!(format_countdown(3_600, "ended"), "1h");
/// assert_eq!(format_countdown(45, "ended"), "45s");
/// assert_eq!(format_countdown(0, "ended"), "ended");
/// assert_eq!(format_countdown(-3, "ended"), "ended");
/// ```
pub fn format_countdown(secs: i64, zero_label: &str) -> String {
    if secs <= 0 {
        return zero_label.to_string();
    }
    let units = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];
    let mut remaining = secs;
    let mut parts = Vec::with_capacity(units.len());
    for (size, suffix) in units {
        let value = remaining / size;
        remaining %= size;
        if value > 0 {
            parts.push(format!("{value}{suffix}"));
        }
    }
    parts.join(" ")
}
