//! Compact duration expressions (`1d2h30m`, `90s`, `2 weeks`).
//!
//! An expression is a sequence of `<integer><unit>` tokens, summed. Units are
//! case-insensitive and tokens may be written back to back or separated by
//! whitespace. Months and years are fixed approximations (30 and 365 days).

use std::iter::Peekable;
use std::str::CharIndices;
use std::time::Duration;

use thiserror::Error;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no duration found (expected something like 1d2h30m)")]
    Empty,
    #[error("duration must be greater than zero")]
    NonPositive,
    #[error("unknown duration unit {0:?}")]
    UnknownUnit(String),
    #[error("number {0} is missing a unit")]
    MissingUnit(u64),
    #[error("unexpected input at position {position}")]
    UnexpectedInput { position: usize },
    #[error("duration is too large")]
    Overflow,
}

/// A single unit suffix and its length in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl DurationUnit {
    /// Match a lowercase unit suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix {
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Second,
            "m" | "min" | "mins" | "minute" | "minutes" => Self::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => Self::Hour,
            "d" | "day" | "days" => Self::Day,
            "w" | "wk" | "wks" | "week" | "weeks" => Self::Week,
            "mo" | "mon" | "month" | "months" => Self::Month,
            "y" | "yr" | "yrs" | "year" | "years" => Self::Year,
            _ => return None,
        };
        Some(unit)
    }

    pub fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => MINUTE,
            Self::Hour => HOUR,
            Self::Day => DAY,
            Self::Week => 7 * DAY,
            Self::Month => 30 * DAY,
            Self::Year => 365 * DAY,
        }
    }
}

/// Parse a duration expression into a positive interval.
pub fn parse_duration(text: &str) -> Result<Duration, ParseError> {
    let mut chars = text.char_indices().peekable();
    let mut total: u64 = 0;
    let mut tokens = 0usize;

    loop {
        skip_whitespace(&mut chars);
        let Some(&(position, c)) = chars.peek() else {
            break;
        };
        if !c.is_ascii_digit() {
            return Err(if tokens == 0 {
                ParseError::Empty
            } else {
                ParseError::UnexpectedInput { position }
            });
        }

        let value = read_number(&mut chars)?;
        skip_whitespace(&mut chars);
        let suffix = read_suffix(&mut chars);

        if suffix.is_empty() {
            return Err(match chars.peek() {
                Some(&(position, c)) if !c.is_ascii_digit() => {
                    ParseError::UnexpectedInput { position }
                }
                _ => ParseError::MissingUnit(value),
            });
        }

        let unit = DurationUnit::from_suffix(&suffix).ok_or(ParseError::UnknownUnit(suffix))?;
        total = value
            .checked_mul(unit.seconds())
            .and_then(|secs| total.checked_add(secs))
            .ok_or(ParseError::Overflow)?;
        tokens += 1;
    }

    if tokens == 0 {
        return Err(ParseError::Empty);
    }
    if total == 0 {
        return Err(ParseError::NonPositive);
    }
    Ok(Duration::from_secs(total))
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}

fn read_number(chars: &mut Peekable<CharIndices<'_>>) -> Result<u64, ParseError> {
    let mut value: u64 = 0;
    while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
        let digit = u64::from(c as u8 - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseError::Overflow)?;
    }
    Ok(value)
}

fn read_suffix(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut suffix = String::new();
    while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_alphabetic()) {
        suffix.push(c.to_ascii_lowercase());
    }
    suffix
}
