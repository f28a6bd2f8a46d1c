use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use giveaway_types::{EngineConfig, GiveawayId, GiveawayStatus, RerollPolicy, UserId};
use hashbrown::HashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::error::{CancelError, EndError, RerollError, StartError};
use crate::auth::{Authorizer, HostOnly};
use crate::config::EngineLimits;
use crate::duration::parse_duration;
use crate::events::{EventSink, GiveawayEvent, ResolveTrigger};
use crate::giveaway::{EndOutcome, Giveaway, GiveawaySnapshot};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::selector::select_winners;
use crate::store::{GiveawayStore, StoreError, ToggleError, ToggleResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of an end request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(EndOutcome),
    /// The giveaway had already left `Open`; nothing changed.
    AlreadyResolved(GiveawayStatus),
}

pub struct EngineBuilder {
    scheduler: Arc<dyn Scheduler>,
    store: Option<Arc<GiveawayStore>>,
    authorizer: Arc<dyn Authorizer>,
    sinks: Vec<Arc<dyn EventSink>>,
    config: EngineConfig,
    seed: Option<u64>,
}

impl EngineBuilder {
    /// Share an existing store instead of creating a fresh one.
    pub fn store(mut self, store: Arc<GiveawayStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the winner RNG for reproducible draws.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> LifecycleEngine {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        LifecycleEngine {
            inner: Arc::new(EngineInner {
                store: self.store.unwrap_or_default(),
                scheduler: self.scheduler,
                authorizer: self.authorizer,
                sinks: self.sinks,
                config: self.config,
                timers: Mutex::new(HashMap::new()),
                rng: Mutex::new(rng),
                next_id: AtomicU64::new(1),
                next_timer: AtomicU64::new(1),
            }),
        }
    }
}

/// Orchestrates giveaways from start to resolution.
///
/// Cloning is cheap; clones share the same store, timers and sinks.
#[derive(Clone)]
pub struct LifecycleEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<GiveawayStore>,
    scheduler: Arc<dyn Scheduler>,
    authorizer: Arc<dyn Authorizer>,
    sinks: Vec<Arc<dyn EventSink>>,
    config: EngineConfig,
    /// Pending expiry timers of open giveaways
    timers: Mutex<HashMap<GiveawayId, PendingTimer>>,
    rng: Mutex<StdRng>,
    next_id: AtomicU64,
    next_timer: AtomicU64,
}

/// A scheduled expiry. The token ties a firing callback to the entry that
/// scheduled it, so a timer outliving its giveaway cannot resolve a newer
/// giveaway reusing the same id.
struct PendingTimer {
    token: u64,
    handle: Box<dyn TimerHandle>,
}

/// Validated start request.
struct Draft {
    prize: String,
    winner_count: u32,
    duration: Duration,
    length: chrono::Duration,
}

/// Winners committed by a resolution and the metadata its event needs.
struct Drawn {
    outcome: EndOutcome,
    prize: String,
    host_id: UserId,
}

/// Committed reroll and the metadata its event needs.
struct RerollDraw {
    outcome: EndOutcome,
    pool_size: usize,
    prize: String,
    host_id: UserId,
}

impl LifecycleEngine {
    pub fn builder(scheduler: impl Scheduler + 'static) -> EngineBuilder {
        EngineBuilder {
            scheduler: Arc::new(scheduler),
            store: None,
            authorizer: Arc::new(HostOnly),
            sinks: Vec::new(),
            config: EngineConfig::default(),
            seed: None,
        }
    }

    pub fn store(&self) -> &Arc<GiveawayStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    /// Create an open giveaway with a freshly allocated id and schedule its expiry.
    pub fn start(
        &self,
        host: UserId,
        prize: &str,
        duration_text: &str,
        winner_count: u32,
    ) -> Result<GiveawayId, StartError> {
        let draft = self.inner.validate(prize, duration_text, winner_count)?;
        loop {
            let id = GiveawayId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
            match self.inner.launch(id, host, &draft) {
                // Taken by a host-supplied id; try the next one
                Err(StartError::DuplicateId(_)) => continue,
                result => return result,
            }
        }
    }

    /// Like [`start`](Self::start) but with a host-chosen id, typically the
    /// announcement message id.
    pub fn start_with_id(
        &self,
        id: GiveawayId,
        host: UserId,
        prize: &str,
        duration_text: &str,
        winner_count: u32,
    ) -> Result<GiveawayId, StartError> {
        let draft = self.inner.validate(prize, duration_text, winner_count)?;
        self.inner.launch(id, host, &draft)
    }

    /// Join or leave an open giveaway.
    pub fn toggle_participant(
        &self,
        id: GiveawayId,
        user: UserId,
    ) -> Result<ToggleResult, ToggleError> {
        let result = self.inner.store.toggle_participant(id, user).inspect_err(|e| {
            debug!(giveaway_id = %id, user = %user, error = %e, "Toggle rejected");
        })?;

        debug!(
            giveaway_id = %id,
            user = %user,
            joined = result.joined,
            participants = result.participant_count,
            "Participant toggled"
        );
        self.inner.emit(&GiveawayEvent::ParticipantToggled {
            giveaway_id: id,
            user_id: user,
            joined: result.joined,
            participant_count: result.participant_count,
        });
        Ok(result)
    }

    /// End a giveaway early. Idempotent: ending a resolved giveaway reports
    /// [`Resolution::AlreadyResolved`] and changes nothing.
    pub fn end_giveaway(&self, id: GiveawayId, actor: UserId) -> Result<Resolution, EndError> {
        let snapshot = self.inner.store.get(id).ok_or(EndError::NotFound(id))?;
        if !self.inner.is_authorized(actor, &snapshot) {
            debug!(giveaway_id = %id, actor = %actor, "End rejected: not authorized");
            return Err(EndError::Unauthorized { id, actor });
        }
        self.inner.resolve(id, ResolveTrigger::Manual { actor })
    }

    /// Cancel an open giveaway without drawing winners.
    pub fn cancel(&self, id: GiveawayId, actor: UserId) -> Result<(), CancelError> {
        let snapshot = self.inner.store.get(id).ok_or(CancelError::NotFound(id))?;
        if !self.inner.is_authorized(actor, &snapshot) {
            debug!(giveaway_id = %id, actor = %actor, "Cancel rejected: not authorized");
            return Err(CancelError::Unauthorized { id, actor });
        }

        let now = self.inner.scheduler.now();
        self.inner
            .store
            .transition_status(id, GiveawayStatus::Cancelled, now)
            .map_err(|e| match e {
                StoreError::InvalidTransition { from, .. } => {
                    CancelError::AlreadyResolved { id, status: from }
                }
                _ => CancelError::NotFound(id),
            })?;

        self.inner.cancel_timer(id);
        info!(giveaway_id = %id, actor = %actor, "Giveaway cancelled");
        self.inner.emit(&GiveawayEvent::Cancelled {
            giveaway_id: id,
            prize: snapshot.prize,
            host_id: snapshot.host_id,
            actor,
        });
        Ok(())
    }

    /// Draw a fresh set of winners for an ended giveaway.
    ///
    /// `winner_count_override` replaces the stored winner count for this draw only.
    pub fn reroll(
        &self,
        id: GiveawayId,
        winner_count_override: Option<u32>,
    ) -> Result<EndOutcome, RerollError> {
        if let Some(requested) = winner_count_override {
            let max = self.inner.config.max_winners;
            if requested == 0 {
                return Err(RerollError::InvalidWinnerCount);
            }
            if requested > max {
                return Err(RerollError::TooManyWinners { requested, max });
            }
        }

        let policy = self.inner.config.reroll_policy;
        let draw = self
            .inner
            .store
            .update(id, |giveaway| {
                if giveaway.status() != GiveawayStatus::Ended {
                    return Err(RerollError::NotEnded {
                        id,
                        status: giveaway.status(),
                    });
                }
                let participants = giveaway.participants();
                if participants.is_empty() {
                    return Err(RerollError::NoParticipants(id));
                }
                let pool = match policy {
                    RerollPolicy::AllowRepeats => participants.snapshot(),
                    RerollPolicy::ExcludePreviousWinners => {
                        participants.snapshot_excluding(giveaway.last_winners())
                    }
                };
                if pool.is_empty() {
                    return Err(RerollError::NoEligibleParticipants(id));
                }

                // Draw and record under the entry lock so concurrent rerolls
                // each see the previous one's winners
                let count = winner_count_override.unwrap_or(giveaway.winner_count());
                let winners = select_winners(&pool, count, &mut *lock(&self.inner.rng));
                let participant_count = participants.len();
                giveaway
                    .record_reroll(winners.clone())
                    .map_err(|status| RerollError::NotEnded { id, status })?;
                Ok(RerollDraw {
                    outcome: EndOutcome::from_draw(winners, participant_count),
                    pool_size: pool.len(),
                    prize: giveaway.prize().to_string(),
                    host_id: giveaway.host_id(),
                })
            })
            .ok_or(RerollError::NotFound(id))?
            .inspect_err(|e| debug!(giveaway_id = %id, error = %e, "Reroll rejected"))?;

        let outcome = draw.outcome;
        info!(
            giveaway_id = %id,
            winners = outcome.winners().len(),
            pool = draw.pool_size,
            "Giveaway rerolled"
        );
        self.inner.emit(&GiveawayEvent::Rerolled {
            giveaway_id: id,
            prize: draw.prize,
            host_id: draw.host_id,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn get(&self, id: GiveawayId) -> Option<GiveawaySnapshot> {
        self.inner.store.get(id)
    }

    /// Every stored giveaway, soonest deadline first.
    pub fn list(&self) -> Vec<GiveawaySnapshot> {
        let mut all = self.inner.store.snapshots();
        all.sort_by_key(|g| (g.ends_at, g.id));
        all
    }

    /// Open giveaways, soonest deadline first.
    pub fn list_open(&self) -> Vec<GiveawaySnapshot> {
        let mut open = self.list();
        open.retain(|g| g.status.is_open());
        open
    }

    /// Time left until the deadline; zero once it has passed.
    pub fn remaining(&self, id: GiveawayId) -> Option<Duration> {
        let snapshot = self.inner.store.get(id)?;
        let left = snapshot.ends_at - self.inner.scheduler.now();
        Some(left.to_std().unwrap_or(Duration::ZERO))
    }

    pub fn pending_timers(&self) -> usize {
        lock(&self.inner.timers).len()
    }

    // ─── Maintenance ─────────────────────────────────────────────────────────

    /// Remove ended/cancelled giveaways resolved more than `retention` ago.
    pub fn evict_resolved(&self, retention: Duration) -> usize {
        let now = self.inner.scheduler.now();
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
        else {
            return 0;
        };

        let removed = self.inner.store.retain(|giveaway| {
            !giveaway.status().is_terminal()
                || giveaway.resolved_at().is_none_or(|at| at > cutoff)
        });
        if removed > 0 {
            info!(removed, "Evicted resolved giveaways");
        }
        removed
    }

    /// Evict using the configured retention, if any.
    pub fn evict_expired(&self) -> usize {
        self.inner
            .config
            .eviction_retention()
            .map_or(0, |retention| self.evict_resolved(retention))
    }

    /// Cancel every pending timer. Open giveaways stay open in the store.
    pub fn shutdown(&self) {
        let timers: Vec<_> = lock(&self.inner.timers).drain().collect();
        for (_, timer) in &timers {
            timer.handle.cancel();
        }
        info!(cancelled = timers.len(), "Engine timers stopped");
    }
}

impl EngineInner {
    fn validate(
        &self,
        prize: &str,
        duration_text: &str,
        winner_count: u32,
    ) -> Result<Draft, StartError> {
        let duration = parse_duration(duration_text)?;
        let max = self.config.max_duration();
        let too_long = StartError::DurationTooLong {
            requested_secs: duration.as_secs(),
            max_secs: max.as_secs(),
        };
        if duration > max {
            return Err(too_long);
        }
        let length = chrono::Duration::from_std(duration).map_err(|_| too_long)?;

        if winner_count == 0 {
            return Err(StartError::InvalidWinnerCount);
        }
        if winner_count > self.config.max_winners {
            return Err(StartError::TooManyWinners {
                requested: winner_count,
                max: self.config.max_winners,
            });
        }

        let prize = prize.trim();
        if prize.is_empty() {
            return Err(StartError::EmptyPrize);
        }

        Ok(Draft {
            prize: prize.to_string(),
            winner_count,
            duration,
            length,
        })
    }

    fn launch(
        self: &Arc<Self>,
        id: GiveawayId,
        host: UserId,
        draft: &Draft,
    ) -> Result<GiveawayId, StartError> {
        let created_at = self.scheduler.now();
        let ends_at = created_at
            .checked_add_signed(draft.length)
            .ok_or(StartError::DurationTooLong {
                requested_secs: draft.duration.as_secs(),
                max_secs: self.config.max_duration_secs,
            })?;

        let giveaway = Giveaway::new(
            id,
            host,
            draft.prize.clone(),
            draft.winner_count,
            created_at,
            ends_at,
        );
        let snapshot = giveaway.snapshot();
        {
            // Creation and timer registration happen under the timer map lock,
            // so a cancel or end that can see the giveaway also finds its timer
            let mut timers = lock(&self.timers);
            // create only fails on an id collision
            self.store
                .create(giveaway)
                .map_err(|_| StartError::DuplicateId(id))?;
            self.schedule_expiry(&mut timers, id, draft.duration);
        }

        info!(
            giveaway_id = %id,
            host = %host,
            prize = %draft.prize,
            winners = draft.winner_count,
            ends_at = %ends_at,
            "Giveaway started"
        );
        self.emit(&GiveawayEvent::Started { giveaway: snapshot });
        Ok(id)
    }

    /// Must be called with the timer map locked; a fast timer waits on that
    /// lock until its handle is stored.
    fn schedule_expiry(
        self: &Arc<Self>,
        timers: &mut HashMap<GiveawayId, PendingTimer>,
        id: GiveawayId,
        delay: Duration,
    ) {
        let engine = Arc::downgrade(self);
        let token = self.next_timer.fetch_add(1, Ordering::Relaxed);
        let handle = self.scheduler.after(
            delay,
            Box::new(move || {
                if let Some(engine) = engine.upgrade() {
                    engine.on_timer(id, token);
                }
            }),
        );
        if let Some(displaced) = timers.insert(id, PendingTimer { token, handle }) {
            displaced.handle.cancel();
        }
    }

    fn on_timer(&self, id: GiveawayId, token: u64) {
        let now = self.scheduler.now();
        let drawn = {
            // Claim the entry and draw under the timer map lock, so no giveaway
            // reusing this id can be created in between
            let mut timers = lock(&self.timers);
            if !timers.get(&id).is_some_and(|timer| timer.token == token) {
                debug!(giveaway_id = %id, "Stale timer fired, ignoring");
                return;
            }
            timers.remove(&id);
            self.draw(id, now)
        };

        match self.finish(id, ResolveTrigger::Timer, now, drawn) {
            Ok(Resolution::Resolved(_)) => {}
            Ok(Resolution::AlreadyResolved(status)) => {
                debug!(giveaway_id = %id, %status, "Timer fired for resolved giveaway");
            }
            Err(e) => debug!(giveaway_id = %id, error = %e, "Timer fired for missing giveaway"),
        }
    }

    /// Manually draw winners and close the giveaway, once.
    fn resolve(&self, id: GiveawayId, trigger: ResolveTrigger) -> Result<Resolution, EndError> {
        let now = self.scheduler.now();
        let drawn = self.draw(id, now);
        if matches!(drawn, Some(Ok(_))) {
            self.cancel_timer(id);
        }
        self.finish(id, trigger, now, drawn)
    }

    /// Atomically move an open giveaway to `Ended` with freshly drawn winners.
    ///
    /// `None` if the id is unknown, `Some(Err(status))` if it already left `Open`.
    fn draw(&self, id: GiveawayId, now: DateTime<Utc>) -> Option<Result<Drawn, GiveawayStatus>> {
        self.store.update(id, |giveaway| {
            if !giveaway.status().is_open() {
                return Err(giveaway.status());
            }
            let pool = giveaway.participants().snapshot();
            let winners = select_winners(&pool, giveaway.winner_count(), &mut *lock(&self.rng));
            giveaway.mark_ended(winners.clone(), now)?;
            Ok(Drawn {
                outcome: EndOutcome::from_draw(winners, pool.len()),
                prize: giveaway.prize().to_string(),
                host_id: giveaway.host_id(),
            })
        })
    }

    fn finish(
        &self,
        id: GiveawayId,
        trigger: ResolveTrigger,
        now: DateTime<Utc>,
        drawn: Option<Result<Drawn, GiveawayStatus>>,
    ) -> Result<Resolution, EndError> {
        let drawn = match drawn.ok_or(EndError::NotFound(id))? {
            Ok(drawn) => drawn,
            Err(status) => {
                debug!(giveaway_id = %id, %status, ?trigger, "Giveaway already resolved");
                return Ok(Resolution::AlreadyResolved(status));
            }
        };

        let outcome = drawn.outcome;
        info!(
            giveaway_id = %id,
            winners = outcome.winners().len(),
            participants = outcome.participant_count(),
            ?trigger,
            "Giveaway ended"
        );
        self.emit(&GiveawayEvent::Ended {
            giveaway_id: id,
            prize: drawn.prize,
            host_id: drawn.host_id,
            outcome: outcome.clone(),
            trigger,
            ended_at: now,
        });
        Ok(Resolution::Resolved(outcome))
    }

    fn cancel_timer(&self, id: GiveawayId) {
        let timer = lock(&self.timers).remove(&id);
        if let Some(timer) = timer {
            timer.handle.cancel();
        }
    }

    fn is_authorized(&self, actor: UserId, giveaway: &GiveawaySnapshot) -> bool {
        actor == giveaway.host_id || self.authorizer.can_manage(actor, giveaway)
    }

    fn emit(&self, event: &GiveawayEvent) {
        for sink in &self.sinks {
            sink.handle_event(event);
        }
    }
}
