//! REPL command handlers.
//!
//! Successful state changes are reported by the render task through engine
//! events, so handlers only return text the events do not carry.

use std::path::Path;

use chrono::Utc;
use giveaway_core::config::save_config;
use giveaway_core::{GiveawayId, LifecycleEngine, Resolution, UserId};
use giveaway_types::AppConfig;
use giveaway_types::formatting::{format_countdown, format_participant_count};

use crate::render::render_snapshot;

pub type CommandResult = Result<Option<String>, String>;

pub fn start(
    engine: &LifecycleEngine,
    id: Option<GiveawayId>,
    host: UserId,
    prize: &str,
    duration: &str,
    winners: u32,
) -> CommandResult {
    let id = match id {
        Some(id) => engine.start_with_id(id, host, prize, duration, winners),
        None => engine.start(host, prize, duration, winners),
    }
    .map_err(|e| e.to_string())?;
    Ok(Some(format!("Created giveaway #{id}")))
}

pub fn join(engine: &LifecycleEngine, id: GiveawayId, user: UserId) -> CommandResult {
    engine
        .toggle_participant(id, user)
        .map_err(|e| e.to_string())?;
    Ok(None)
}

pub fn end(engine: &LifecycleEngine, id: GiveawayId, actor: UserId) -> CommandResult {
    match engine.end_giveaway(id, actor).map_err(|e| e.to_string())? {
        Resolution::Resolved(_) => Ok(None),
        Resolution::AlreadyResolved(status) => {
            Ok(Some(format!("Giveaway #{id} is already {status}")))
        }
    }
}

pub fn cancel(engine: &LifecycleEngine, id: GiveawayId, actor: UserId) -> CommandResult {
    engine.cancel(id, actor).map_err(|e| e.to_string())?;
    Ok(None)
}

pub fn reroll(engine: &LifecycleEngine, id: GiveawayId, winners: Option<u32>) -> CommandResult {
    engine.reroll(id, winners).map_err(|e| e.to_string())?;
    Ok(None)
}

pub fn show(engine: &LifecycleEngine, id: GiveawayId, json: bool) -> CommandResult {
    let snapshot = engine
        .get(id)
        .ok_or_else(|| format!("giveaway {id} not found"))?;
    if json {
        return serde_json::to_string_pretty(&snapshot)
            .map(Some)
            .map_err(|e| e.to_string());
    }
    Ok(Some(render_snapshot(&snapshot, Utc::now())))
}

pub fn list(engine: &LifecycleEngine) -> CommandResult {
    let all = engine.list();
    if all.is_empty() {
        return Ok(Some("No giveaways".to_string()));
    }
    let now = Utc::now();
    let lines: Vec<String> = all
        .iter()
        .map(|g| {
            let left = (g.ends_at - now).num_seconds();
            let timing = if g.status.is_open() {
                format_countdown(left, "due")
            } else {
                g.status.to_string()
            };
            format!(
                "#{:<6} {:<24} {:<10} {}",
                g.id,
                g.prize,
                timing,
                format_participant_count(g.participant_count())
            )
        })
        .collect();
    Ok(Some(lines.join("\n")))
}

pub fn show_config(config: &AppConfig, path: Option<&Path>) -> CommandResult {
    let mut out = String::new();
    if let Some(path) = path {
        out.push_str(&format!("Config file: {}\n", path.display()));
    }
    let body = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    out.push_str(&body);
    Ok(Some(out))
}

/// Write the active config back to disk, creating the file if needed.
pub fn store_config(config: &AppConfig, path: Option<&Path>) -> CommandResult {
    save_config(config, path).map_err(|e| e.to_string())?;
    let message = match path {
        Some(path) => format!("Saved config to {}", path.display()),
        None => "Saved config".to_string(),
    };
    Ok(Some(message))
}

pub fn exit(engine: &LifecycleEngine) {
    let open = engine.list_open().len();
    if open > 0 {
        println!("Stopping with {open} giveaway(s) still open");
    }
    engine.shutdown();
}
