//! Text rendering of engine events and snapshots for the terminal.

use chrono::{DateTime, Utc};
use giveaway_core::{EndOutcome, GiveawayEvent, GiveawaySnapshot, GiveawayStatus, ResolveTrigger};
use giveaway_types::formatting::{
    format_countdown, format_mention, format_mentions, format_participant_count,
    format_winner_count,
};

pub fn render_event(event: &GiveawayEvent, now: DateTime<Utc>) -> String {
    match event {
        GiveawayEvent::Started { giveaway } => render_snapshot(giveaway, now),
        GiveawayEvent::ParticipantToggled {
            giveaway_id,
            user_id,
            joined,
            participant_count,
        } => format!(
            "[#{giveaway_id}] {} {} ({})",
            format_mention(*user_id),
            if *joined { "joined" } else { "left" },
            format_participant_count(*participant_count)
        ),
        GiveawayEvent::Ended {
            giveaway_id,
            prize,
            outcome,
            trigger,
            ..
        } => {
            let how = match trigger {
                ResolveTrigger::Timer => "ended".to_string(),
                ResolveTrigger::Manual { actor } => {
                    format!("ended early by {}", format_mention(*actor))
                }
            };
            format!("[#{giveaway_id}] {how}: {}", render_outcome(prize, outcome))
        }
        GiveawayEvent::Cancelled {
            giveaway_id,
            prize,
            actor,
            ..
        } => format!(
            "[#{giveaway_id}] {prize} was cancelled by {}",
            format_mention(*actor)
        ),
        GiveawayEvent::Rerolled {
            giveaway_id,
            prize,
            outcome,
            ..
        } => format!("[#{giveaway_id}] rerolled: {}", render_outcome(prize, outcome)),
    }
}

fn render_outcome(prize: &str, outcome: &EndOutcome) -> String {
    match outcome {
        EndOutcome::Winners { winners, .. } => {
            format!("{} won {prize}", format_mentions(winners))
        }
        EndOutcome::NoParticipants => format!("nobody entered, no winner for {prize}"),
    }
}

/// Multi-line announcement of a giveaway's current state.
pub fn render_snapshot(giveaway: &GiveawaySnapshot, now: DateTime<Utc>) -> String {
    let timing = match giveaway.status {
        GiveawayStatus::Open => {
            let left = (giveaway.ends_at - now).num_seconds();
            format!("Ends in {}", format_countdown(left, "a moment"))
        }
        GiveawayStatus::Ended => "Ended".to_string(),
        GiveawayStatus::Cancelled => "Cancelled".to_string(),
    };

    let mut lines = vec![
        format!("── Giveaway #{} ──", giveaway.id),
        format!("Prize:   {}", giveaway.prize),
        format!("Host:    {}", format_mention(giveaway.host_id)),
        format!(
            "         {} · {}",
            format_winner_count(giveaway.winner_count),
            format_participant_count(giveaway.participant_count())
        ),
        format!("Status:  {timing}"),
    ];
    if !giveaway.last_winners.is_empty() {
        lines.push(format!("Winners: {}", format_mentions(&giveaway.last_winners)));
    }
    lines.join("\n")
}
