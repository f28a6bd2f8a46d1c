//! Scenario tests for the lifecycle engine
//!
//! Timer-driven paths run on tokio's paused clock; cancellation races use a
//! manual scheduler that fires callbacks on demand.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use giveaway_types::{EngineConfig, GiveawayId, GiveawayStatus, RerollPolicy, UserId};

use super::{CancelError, EndError, LifecycleEngine, RerollError, Resolution, StartError};
use crate::auth::Moderators;
use crate::duration::ParseError;
use crate::events::{ChannelSink, EventSink, GiveawayEvent, ResolveTrigger};
use crate::giveaway::EndOutcome;
use crate::scheduler::{Scheduler, TimerCallback, TimerHandle, TokioScheduler};
use crate::store::ToggleError;

const HOST: UserId = UserId(42);

// ─────────────────────────────────────────────────────────────────────────────
// Test doubles
// ─────────────────────────────────────────────────────────────────────────────

struct ManualTimer {
    delay: Duration,
    callback: Option<TimerCallback>,
    cancelled: Arc<AtomicBool>,
}

/// Records timers and fires them only when asked.
#[derive(Clone, Default)]
struct ManualScheduler {
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

struct ManualHandle(Arc<AtomicBool>);

impl TimerHandle for ManualHandle {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.lock().unwrap().push(ManualTimer {
            delay,
            callback: Some(callback),
            cancelled: Arc::clone(&cancelled),
        });
        Box::new(ManualHandle(cancelled))
    }
}

impl ManualScheduler {
    /// Run every pending, uncancelled callback.
    fn fire_all(&self) {
        self.fire(false);
    }

    /// Run pending callbacks even if cancelled, as a late-firing timer would.
    fn fire_all_ignoring_cancel(&self) {
        self.fire(true);
    }

    fn fire(&self, ignore_cancel: bool) {
        let callbacks: Vec<TimerCallback> = self
            .timers
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|t| ignore_cancel || !t.cancelled.load(Ordering::SeqCst))
            .filter_map(|t| t.callback.take())
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Run the `n`th scheduled callback, cancelled or not.
    fn fire_nth(&self, n: usize) {
        let callback = self.timers.lock().unwrap()[n].callback.take();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn scheduled(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    fn cancelled(&self) -> usize {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    fn delays(&self) -> Vec<Duration> {
        self.timers.lock().unwrap().iter().map(|t| t.delay).collect()
    }
}

type Recorded = Arc<Mutex<Vec<GiveawayEvent>>>;

fn recorder() -> (impl EventSink, Recorded) {
    let events: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);
    let sink = move |event: &GiveawayEvent| sink_events.lock().unwrap().push(event.clone());
    (sink, events)
}

fn manual_engine() -> (LifecycleEngine, ManualScheduler, Recorded) {
    let scheduler = ManualScheduler::default();
    let (sink, events) = recorder();
    let engine = LifecycleEngine::builder(scheduler.clone())
        .sink(sink)
        .rng_seed(7)
        .build();
    (engine, scheduler, events)
}

fn join_all(engine: &LifecycleEngine, id: GiveawayId, users: &[u64]) {
    for user in users {
        let result = engine.toggle_participant(id, UserId(*user)).unwrap();
        assert!(result.joined);
    }
}

fn kinds(events: &Recorded) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(GiveawayEvent::kind).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Timer-driven resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_end_to_end_timer_resolution() {
    let (sink, mut rx) = ChannelSink::channel();
    let engine = LifecycleEngine::builder(TokioScheduler::current())
        .sink(sink)
        .build();

    let id = engine.start(HOST, "Nitro", "2s", 1).unwrap();
    assert!(engine.toggle_participant(id, UserId(100)).unwrap().joined);
    assert!(engine.toggle_participant(id, UserId(200)).unwrap().joined);

    let (outcome, trigger) = loop {
        match rx.recv().await.expect("sink dropped") {
            GiveawayEvent::Ended { outcome, trigger, .. } => break (outcome, trigger),
            _ => continue,
        }
    };

    assert_eq!(trigger, ResolveTrigger::Timer);
    let winners = outcome.winners().to_vec();
    assert_eq!(winners.len(), 1);
    assert!([UserId(100), UserId(200)].contains(&winners[0]));
    assert_eq!(outcome.participant_count(), 2);
    assert_eq!(engine.pending_timers(), 0);

    // A second manual end is the idempotent signal, not a new draw
    assert_eq!(
        engine.end_giveaway(id, HOST),
        Ok(Resolution::AlreadyResolved(GiveawayStatus::Ended))
    );
    assert_eq!(engine.get(id).unwrap().last_winners, winners);
}

#[tokio::test(start_paused = true)]
async fn test_timer_with_no_participants_resolves_to_no_winner() {
    let (sink, mut rx) = ChannelSink::channel();
    let engine = LifecycleEngine::builder(TokioScheduler::current())
        .sink(sink)
        .build();

    let empty = engine.start(HOST, "Nothing", "1s", 3).unwrap();
    let later = engine.start(HOST, "Something", "5s", 1).unwrap();
    engine.toggle_participant(later, UserId(7)).unwrap();

    let mut ended = Vec::new();
    while ended.len() < 2 {
        if let Some(GiveawayEvent::Ended { giveaway_id, outcome, .. }) = rx.recv().await {
            ended.push((giveaway_id, outcome));
        }
    }

    // The empty giveaway does not disturb the timer subsystem
    assert_eq!(ended[0], (empty, EndOutcome::NoParticipants));
    assert_eq!(ended[1].0, later);
    assert_eq!(ended[1].1.winners(), &[UserId(7)]);
}

#[tokio::test(start_paused = true)]
async fn test_timer_not_fired_before_deadline() {
    let engine = LifecycleEngine::builder(TokioScheduler::current()).build();
    let id = engine.start(HOST, "Nitro", "1m", 1).unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Open);

    tokio::time::sleep(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Ended);
}

#[test]
fn test_start_schedules_one_timer_for_the_parsed_duration() {
    let (engine, scheduler, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1d2h30m", 1).unwrap();

    assert_eq!(scheduler.delays(), vec![Duration::from_secs(86_400 + 2 * 3_600 + 30 * 60)]);
    assert_eq!(engine.pending_timers(), 1);
    let snapshot = engine.get(id).unwrap();
    assert_eq!(snapshot.status, GiveawayStatus::Open);
    assert_eq!(
        (snapshot.ends_at - snapshot.created_at).num_seconds(),
        86_400 + 2 * 3_600 + 30 * 60
    );
    assert_eq!(kinds(&events), vec!["started"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Manual end
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_undersubscribed_giveaway_gives_everyone_a_win() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 5).unwrap();
    join_all(&engine, id, &[100, 200]);

    let Ok(Resolution::Resolved(outcome)) = engine.end_giveaway(id, HOST) else {
        panic!("expected a resolution");
    };
    let mut winners = outcome.winners().to_vec();
    winners.sort();
    assert_eq!(winners, vec![UserId(100), UserId(200)]);
}

#[test]
fn test_zero_participants_is_a_distinct_outcome() {
    let (engine, _, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();

    assert_eq!(
        engine.end_giveaway(id, HOST),
        Ok(Resolution::Resolved(EndOutcome::NoParticipants))
    );
    let recorded = events.lock().unwrap();
    assert!(matches!(
        recorded.last(),
        Some(GiveawayEvent::Ended { outcome: EndOutcome::NoParticipants, .. })
    ));
}

#[test]
fn test_manual_end_cancels_timer_and_late_fire_is_a_no_op() {
    let (engine, scheduler, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    join_all(&engine, id, &[1, 2, 3]);

    let Ok(Resolution::Resolved(outcome)) = engine.end_giveaway(id, HOST) else {
        panic!("expected a resolution");
    };
    assert_eq!(scheduler.cancelled(), 1);
    assert_eq!(engine.pending_timers(), 0);

    // Cancelled timers are skipped...
    scheduler.fire_all();
    // ...and even a timer that fires anyway cannot re-resolve
    scheduler.fire_all_ignoring_cancel();

    let snapshot = engine.get(id).unwrap();
    assert_eq!(snapshot.status, GiveawayStatus::Ended);
    assert_eq!(snapshot.last_winners, outcome.winners());
    let ended = kinds(&events).into_iter().filter(|k| *k == "ended").count();
    assert_eq!(ended, 1);
}

#[test]
fn test_end_records_manual_trigger() {
    let (engine, _, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    engine.toggle_participant(id, UserId(5)).unwrap();
    engine.end_giveaway(id, HOST).unwrap();

    assert_eq!(kinds(&events), vec!["started", "participant_toggled", "ended"]);
    let recorded = events.lock().unwrap();
    let Some(GiveawayEvent::Ended { trigger, prize, host_id, .. }) = recorded.last() else {
        panic!("expected an ended event");
    };
    assert_eq!(*trigger, ResolveTrigger::Manual { actor: HOST });
    assert_eq!(prize, "Nitro");
    assert_eq!(*host_id, HOST);
}

#[test]
fn test_end_requires_host_or_override() {
    let scheduler = ManualScheduler::default();
    let engine = LifecycleEngine::builder(scheduler)
        .authorizer(Moderators::new([UserId(7)]))
        .build();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();

    assert_eq!(
        engine.end_giveaway(id, UserId(999)),
        Err(EndError::Unauthorized { id, actor: UserId(999) })
    );
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Open);
    assert!(matches!(engine.end_giveaway(id, UserId(7)), Ok(Resolution::Resolved(_))));
    assert_eq!(
        engine.end_giveaway(GiveawayId(404), HOST),
        Err(EndError::NotFound(GiveawayId(404)))
    );
}

#[test]
fn test_toggle_after_resolution_is_rejected() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    engine.toggle_participant(id, UserId(1)).unwrap();
    engine.end_giveaway(id, HOST).unwrap();

    assert_eq!(
        engine.toggle_participant(id, UserId(2)),
        Err(ToggleError::NotOpen { id, status: GiveawayStatus::Ended })
    );
    assert_eq!(
        engine.toggle_participant(GiveawayId(404), UserId(2)),
        Err(ToggleError::NotFound(GiveawayId(404)))
    );
    assert_eq!(engine.get(id).unwrap().participants, vec![UserId(1)]);
}

#[test]
fn test_toggle_twice_restores_count() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    engine.toggle_participant(id, UserId(1)).unwrap();

    let joined = engine.toggle_participant(id, UserId(2)).unwrap();
    assert_eq!((joined.joined, joined.participant_count), (true, 2));
    let left = engine.toggle_participant(id, UserId(2)).unwrap();
    assert_eq!((left.joined, left.participant_count), (false, 1));
}

#[test]
fn test_toggles_racing_resolution_never_partially_apply() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 3).unwrap();

    let togglers: Vec<_> = (0..16u64)
        .map(|user| {
            let engine = engine.clone();
            thread::spawn(move || (user, engine.toggle_participant(id, UserId(user))))
        })
        .collect();
    let ender = {
        let engine = engine.clone();
        thread::spawn(move || engine.end_giveaway(id, HOST))
    };

    let results: Vec<_> = togglers.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(matches!(ender.join().unwrap(), Ok(Resolution::Resolved(_))));

    let snapshot = engine.get(id).unwrap();
    let participants: HashSet<_> = snapshot.participants.iter().copied().collect();
    for (user, result) in results {
        match result {
            Ok(toggle) => {
                assert!(toggle.joined);
                assert!(participants.contains(&UserId(user)));
            }
            Err(ToggleError::NotOpen { .. }) => assert!(!participants.contains(&UserId(user))),
            Err(other) => panic!("unexpected toggle error: {other}"),
        }
    }
    assert!(snapshot.last_winners.iter().all(|w| participants.contains(w)));
    assert_eq!(snapshot.last_winners.len(), participants.len().min(3));
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_start_requests_never_enter_the_store() {
    let (engine, scheduler, events) = manual_engine();

    assert_eq!(
        engine.start(HOST, "Nitro", "xyz", 1),
        Err(StartError::Duration(ParseError::Empty))
    );
    assert_eq!(
        engine.start(HOST, "Nitro", "0s", 1),
        Err(StartError::Duration(ParseError::NonPositive))
    );
    assert_eq!(engine.start(HOST, "Nitro", "1h", 0), Err(StartError::InvalidWinnerCount));
    assert_eq!(
        engine.start(HOST, "Nitro", "1h", 51),
        Err(StartError::TooManyWinners { requested: 51, max: 50 })
    );
    assert_eq!(engine.start(HOST, "   ", "1h", 1), Err(StartError::EmptyPrize));
    assert_eq!(
        engine.start(HOST, "Nitro", "2y", 1),
        Err(StartError::DurationTooLong {
            requested_secs: 2 * 365 * 86_400,
            max_secs: 365 * 86_400,
        })
    );

    assert!(engine.store().is_empty());
    assert_eq!(scheduler.scheduled(), 0);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_host_supplied_ids() {
    let (engine, _, _) = manual_engine();
    let taken = engine
        .start_with_id(GiveawayId(1), HOST, "Nitro", "1h", 1)
        .unwrap();
    assert_eq!(taken, GiveawayId(1));
    assert_eq!(
        engine.start_with_id(GiveawayId(1), HOST, "Other", "1h", 1),
        Err(StartError::DuplicateId(GiveawayId(1)))
    );

    // Allocated ids skip over host-supplied ones
    assert_eq!(engine.start(HOST, "Nitro", "1h", 1), Ok(GiveawayId(2)));
    assert_eq!(engine.get(GiveawayId(1)).unwrap().prize, "Nitro");
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cancel_by_stranger_is_rejected() {
    let (engine, scheduler, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();

    assert_eq!(
        engine.cancel(id, UserId(999)),
        Err(CancelError::Unauthorized { id, actor: UserId(999) })
    );
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Open);
    assert_eq!(scheduler.cancelled(), 0);
}

#[test]
fn test_cancel_by_host_stops_timer_and_skips_resolution() {
    let (engine, scheduler, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    engine.toggle_participant(id, UserId(1)).unwrap();

    engine.cancel(id, HOST).unwrap();
    assert_eq!(scheduler.cancelled(), 1);
    scheduler.fire_all_ignoring_cancel();

    let snapshot = engine.get(id).unwrap();
    assert_eq!(snapshot.status, GiveawayStatus::Cancelled);
    assert!(snapshot.last_winners.is_empty());
    assert_eq!(kinds(&events), vec!["started", "participant_toggled", "cancelled"]);

    assert_eq!(
        engine.cancel(id, HOST),
        Err(CancelError::AlreadyResolved { id, status: GiveawayStatus::Cancelled })
    );
    assert_eq!(
        engine.end_giveaway(id, HOST),
        Ok(Resolution::AlreadyResolved(GiveawayStatus::Cancelled))
    );
    assert!(matches!(engine.reroll(id, None), Err(RerollError::NotEnded { .. })));
}

#[test]
fn test_cancel_from_started_handler_stops_the_timer() {
    let scheduler = ManualScheduler::default();
    let slot: Arc<OnceLock<LifecycleEngine>> = Arc::new(OnceLock::new());
    let sink_slot = Arc::clone(&slot);
    let engine = LifecycleEngine::builder(scheduler.clone())
        .sink(move |event: &GiveawayEvent| {
            if let GiveawayEvent::Started { giveaway } = event {
                if let (Some(engine), "Old") = (sink_slot.get(), giveaway.prize.as_str()) {
                    engine.cancel(giveaway.id, giveaway.host_id).unwrap();
                }
            }
        })
        .rng_seed(11)
        .build();
    let _ = slot.set(engine.clone());

    let id = GiveawayId(77);
    engine.start_with_id(id, HOST, "Old", "1s", 1).unwrap();
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Cancelled);
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(scheduler.cancelled(), 1);

    // Same id again after the old entry is gone
    assert_eq!(engine.evict_resolved(Duration::ZERO), 1);
    engine.start_with_id(id, HOST, "New", "1h", 1).unwrap();
    join_all(&engine, id, &[5]);

    // The old timer firing anyway leaves the new giveaway alone
    scheduler.fire_nth(0);
    let snapshot = engine.get(id).unwrap();
    assert_eq!(snapshot.prize, "New");
    assert_eq!(snapshot.status, GiveawayStatus::Open);
    assert_eq!(engine.pending_timers(), 1);

    scheduler.fire_nth(1);
    let snapshot = engine.get(id).unwrap();
    assert_eq!(snapshot.status, GiveawayStatus::Ended);
    assert_eq!(snapshot.last_winners, vec![UserId(5)]);
}

#[test]
fn test_reused_id_cancels_the_displaced_timer() {
    let (engine, scheduler, _) = manual_engine();
    let id = GiveawayId(9);
    engine.start_with_id(id, HOST, "First", "1s", 1).unwrap();
    assert!(engine.store().remove(id).is_some());

    engine.start_with_id(id, HOST, "Second", "1h", 1).unwrap();
    assert_eq!(scheduler.cancelled(), 1);
    assert_eq!(engine.pending_timers(), 1);

    scheduler.fire_nth(0);
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Open);
}

#[test]
fn test_moderator_can_cancel() {
    let engine = LifecycleEngine::builder(ManualScheduler::default())
        .authorizer(|actor: UserId, _: &crate::giveaway::GiveawaySnapshot| actor == UserId(7))
        .build();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();

    engine.cancel(id, UserId(7)).unwrap();
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Cancelled);
}

#[test]
fn test_cancel_after_end_reports_already_resolved() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    engine.end_giveaway(id, HOST).unwrap();

    assert_eq!(
        engine.cancel(id, HOST),
        Err(CancelError::AlreadyResolved { id, status: GiveawayStatus::Ended })
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Reroll
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_reroll_requires_ended_giveaway_with_participants() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();

    assert_eq!(
        engine.reroll(id, None),
        Err(RerollError::NotEnded { id, status: GiveawayStatus::Open })
    );
    engine.end_giveaway(id, HOST).unwrap();
    assert_eq!(engine.reroll(id, None), Err(RerollError::NoParticipants(id)));
    assert_eq!(
        engine.reroll(GiveawayId(404), None),
        Err(RerollError::NotFound(GiveawayId(404)))
    );
}

#[test]
fn test_reroll_resamples_independently() {
    let (engine, _, events) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    join_all(&engine, id, &[100, 200, 300]);
    engine.end_giveaway(id, HOST).unwrap();

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let outcome = engine.reroll(id, None).unwrap();
        assert_eq!(outcome.winners().len(), 1);
        assert_eq!(outcome.participant_count(), 3);
        assert_eq!(engine.get(id).unwrap().last_winners, outcome.winners());
        seen.insert(outcome.winners()[0]);
    }
    assert!(seen.len() > 1, "reroll kept returning {seen:?}");
    assert_eq!(engine.get(id).unwrap().status, GiveawayStatus::Ended);
    assert_eq!(kinds(&events).into_iter().filter(|k| *k == "rerolled").count(), 200);
}

#[test]
fn test_reroll_winner_count_override() {
    let (engine, _, _) = manual_engine();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    join_all(&engine, id, &[1, 2, 3, 4]);
    engine.end_giveaway(id, HOST).unwrap();

    let outcome = engine.reroll(id, Some(3)).unwrap();
    let unique: HashSet<_> = outcome.winners().iter().collect();
    assert_eq!(unique.len(), 3);

    // More than the pool degrades to everyone
    assert_eq!(engine.reroll(id, Some(10)).unwrap().winners().len(), 4);
    assert_eq!(engine.reroll(id, Some(0)), Err(RerollError::InvalidWinnerCount));
    assert_eq!(
        engine.reroll(id, Some(51)),
        Err(RerollError::TooManyWinners { requested: 51, max: 50 })
    );
    // The stored winner count is unchanged
    assert_eq!(engine.get(id).unwrap().winner_count, 1);
}

#[test]
fn test_reroll_excluding_previous_winners() {
    let config = EngineConfig {
        reroll_policy: RerollPolicy::ExcludePreviousWinners,
        ..EngineConfig::default()
    };
    let engine = LifecycleEngine::builder(ManualScheduler::default())
        .config(config)
        .rng_seed(3)
        .build();

    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    join_all(&engine, id, &[1, 2]);
    let Ok(Resolution::Resolved(first)) = engine.end_giveaway(id, HOST) else {
        panic!("expected a resolution");
    };

    let second = engine.reroll(id, None).unwrap();
    assert_ne!(first.winners(), second.winners());

    let solo = engine.start(HOST, "Solo", "1h", 1).unwrap();
    join_all(&engine, solo, &[9]);
    engine.end_giveaway(solo, HOST).unwrap();
    assert_eq!(engine.reroll(solo, None), Err(RerollError::NoEligibleParticipants(solo)));
}

#[test]
fn test_concurrent_rerolls_each_see_the_previous_winners() {
    let config = EngineConfig {
        reroll_policy: RerollPolicy::ExcludePreviousWinners,
        ..EngineConfig::default()
    };
    let engine = LifecycleEngine::builder(ManualScheduler::default())
        .config(config)
        .rng_seed(5)
        .build();
    let id = engine.start(HOST, "Nitro", "1h", 1).unwrap();
    join_all(&engine, id, &[1, 2]);
    let Ok(Resolution::Resolved(first)) = engine.end_giveaway(id, HOST) else {
        panic!("expected a resolution");
    };
    let first = first.winners()[0];

    let rerollers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| engine.reroll(id, None).unwrap().winners()[0])
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let drawn: Vec<UserId> = rerollers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // With two participants every committed reroll flips the winner, which
    // only holds if no two rerolls drew from the same previous state
    let repeats = drawn.iter().filter(|w| **w == first).count();
    assert_eq!(drawn.len(), 200);
    assert_eq!(repeats, 100);
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries and maintenance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_list_open_orders_by_deadline() {
    let (engine, _, _) = manual_engine();
    let slow = engine.start(HOST, "Slow", "2h", 1).unwrap();
    let fast = engine.start(HOST, "Fast", "10m", 1).unwrap();
    let done = engine.start(HOST, "Done", "1m", 1).unwrap();
    engine.end_giveaway(done, HOST).unwrap();

    let open: Vec<_> = engine.list_open().into_iter().map(|g| g.id).collect();
    assert_eq!(open, vec![fast, slow]);
    assert_eq!(engine.list().len(), 3);

    let remaining = engine.remaining(slow).unwrap();
    assert!(remaining > Duration::from_secs(7_100) && remaining <= Duration::from_secs(7_200));
    assert!(engine.remaining(GiveawayId(404)).is_none());
}

#[test]
fn test_evict_resolved_keeps_open_giveaways() {
    let (engine, _, _) = manual_engine();
    let open = engine.start(HOST, "Open", "1h", 1).unwrap();
    let ended = engine.start(HOST, "Ended", "1h", 1).unwrap();
    let cancelled = engine.start(HOST, "Cancelled", "1h", 1).unwrap();
    engine.end_giveaway(ended, HOST).unwrap();
    engine.cancel(cancelled, HOST).unwrap();

    assert_eq!(engine.evict_resolved(Duration::from_secs(3_600)), 0);
    assert_eq!(engine.evict_expired(), 0);
    assert_eq!(engine.evict_resolved(Duration::ZERO), 2);

    assert!(engine.get(open).is_some());
    assert!(engine.get(ended).is_none());
    assert!(engine.get(cancelled).is_none());
}

#[test]
fn test_shutdown_cancels_pending_timers() {
    let (engine, scheduler, _) = manual_engine();
    let first = engine.start(HOST, "One", "1h", 1).unwrap();
    engine.start(HOST, "Two", "2h", 1).unwrap();

    engine.shutdown();
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(scheduler.cancelled(), 2);

    scheduler.fire_all();
    assert_eq!(engine.get(first).unwrap().status, GiveawayStatus::Open);
}

#[test]
fn test_giveaways_are_isolated() {
    let (engine, scheduler, _) = manual_engine();
    let a = engine.start(HOST, "A", "1h", 1).unwrap();
    let b = engine.start(UserId(43), "B", "1h", 1).unwrap();
    join_all(&engine, a, &[1]);
    join_all(&engine, b, &[2]);

    engine.end_giveaway(a, HOST).unwrap();
    assert_eq!(engine.get(b).unwrap().status, GiveawayStatus::Open);
    assert_eq!(engine.get(b).unwrap().participants, vec![UserId(2)]);
    assert_eq!(engine.pending_timers(), 1);

    // Only b's timer is still live
    scheduler.fire_all();
    assert_eq!(engine.get(b).unwrap().last_winners, vec![UserId(2)]);
    assert_eq!(engine.get(a).unwrap().last_winners, vec![UserId(1)]);
}
