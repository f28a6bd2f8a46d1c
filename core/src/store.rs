//! Concurrent giveaway storage.
//!
//! The map itself sits behind an `RwLock` that is only held long enough to
//! look up or insert an entry. Each entry has its own `Mutex`, so every
//! mutation of one giveaway is linearized while different giveaways never
//! contend with each other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use giveaway_types::{GiveawayId, GiveawayStatus, UserId};
use hashbrown::{HashMap, HashSet};
use thiserror::Error;

use crate::giveaway::{Giveaway, GiveawaySnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("giveaway {0} already exists")]
    DuplicateId(GiveawayId),
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("giveaway {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: GiveawayId,
        from: GiveawayStatus,
        to: GiveawayStatus,
    },
    #[error("giveaway {id} is {status}, winners can only be set once ended")]
    NotEnded { id: GiveawayId, status: GiveawayStatus },
    #[error("winner list for giveaway {0} is not a duplicate-free subset of its participants")]
    InvalidWinners(GiveawayId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("giveaway {id} is {status} and no longer accepts entries")]
    NotOpen { id: GiveawayId, status: GiveawayStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleResult {
    pub joined: bool,
    pub participant_count: usize,
}

type Entry = Arc<Mutex<Giveaway>>;

fn lock(entry: &Entry) -> MutexGuard<'_, Giveaway> {
    // Every critical section leaves the entry consistent before anything can
    // panic, so a poisoned entry is still valid.
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single source of truth for giveaway state, keyed by id.
#[derive(Debug, Default)]
pub struct GiveawayStore {
    entries: RwLock<HashMap<GiveawayId, Entry>>,
}

impl GiveawayStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<GiveawayId, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<GiveawayId, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, id: GiveawayId) -> Option<Entry> {
        self.read().get(&id).cloned()
    }

    pub fn create(&self, giveaway: Giveaway) -> Result<(), StoreError> {
        let id = giveaway.id();
        let mut entries = self.write();
        if entries.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        entries.insert(id, Arc::new(Mutex::new(giveaway)));
        Ok(())
    }

    pub fn contains(&self, id: GiveawayId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn get(&self, id: GiveawayId) -> Option<GiveawaySnapshot> {
        self.entry(id).map(|entry| lock(&entry).snapshot())
    }

    /// Run `f` with exclusive access to one giveaway. `None` if the id is unknown.
    pub fn update<T>(&self, id: GiveawayId, f: impl FnOnce(&mut Giveaway) -> T) -> Option<T> {
        let entry = self.entry(id)?;
        let mut giveaway = lock(&entry);
        Some(f(&mut giveaway))
    }

    pub fn toggle_participant(
        &self,
        id: GiveawayId,
        user: UserId,
    ) -> Result<ToggleResult, ToggleError> {
        self.update(id, |giveaway| {
            giveaway
                .toggle_participant(user)
                .map(|joined| ToggleResult {
                    joined,
                    participant_count: giveaway.participants().len(),
                })
                .map_err(|status| ToggleError::NotOpen { id, status })
        })
        .unwrap_or(Err(ToggleError::NotFound(id)))
    }

    /// Move an open giveaway to a terminal status.
    ///
    /// Reaching `Ended` this way records no winners; use [`update`](Self::update)
    /// to draw and close in one step.
    pub fn transition_status(
        &self,
        id: GiveawayId,
        to: GiveawayStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.update(id, |giveaway| {
            let result = match to {
                GiveawayStatus::Ended => giveaway.mark_ended(Vec::new(), at),
                GiveawayStatus::Cancelled => giveaway.mark_cancelled(at),
                GiveawayStatus::Open => Err(giveaway.status()),
            };
            result.map_err(|from| StoreError::InvalidTransition { id, from, to })
        })
        .unwrap_or(Err(StoreError::NotFound(id)))
    }

    /// Overwrite the winners of an ended giveaway.
    pub fn set_last_winners(&self, id: GiveawayId, winners: Vec<UserId>) -> Result<(), StoreError> {
        self.update(id, |giveaway| {
            let mut seen = HashSet::with_capacity(winners.len());
            let valid = winners
                .iter()
                .all(|w| giveaway.participants().contains(*w) && seen.insert(*w));
            if !valid {
                return Err(StoreError::InvalidWinners(id));
            }
            giveaway
                .record_reroll(winners)
                .map_err(|status| StoreError::NotEnded { id, status })
        })
        .unwrap_or(Err(StoreError::NotFound(id)))
    }

    pub fn remove(&self, id: GiveawayId) -> Option<GiveawaySnapshot> {
        let entry = self.write().remove(&id)?;
        Some(lock(&entry).snapshot())
    }

    /// Snapshots of every stored giveaway, in no particular order.
    pub fn snapshots(&self) -> Vec<GiveawaySnapshot> {
        let entries: Vec<Entry> = self.read().values().cloned().collect();
        entries.iter().map(|entry| lock(entry).snapshot()).collect()
    }

    /// Drop every giveaway for which `keep` returns false. Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(&Giveaway) -> bool) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| keep(&lock(entry)));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
