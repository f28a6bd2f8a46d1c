//! Override check for managing giveaways one did not host.
//!
//! The engine always lets the host end or cancel their own giveaway. Anyone
//! else needs the injected [`Authorizer`] to say yes; roles and permissions
//! stay with the host application.

use giveaway_types::{AppConfig, UserId};
use hashbrown::HashSet;

use crate::giveaway::GiveawaySnapshot;

pub trait Authorizer: Send + Sync {
    fn can_manage(&self, actor: UserId, giveaway: &GiveawaySnapshot) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(UserId, &GiveawaySnapshot) -> bool + Send + Sync,
{
    fn can_manage(&self, actor: UserId, giveaway: &GiveawaySnapshot) -> bool {
        self(actor, giveaway)
    }
}

/// Nobody but the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOnly;

impl Authorizer for HostOnly {
    fn can_manage(&self, _actor: UserId, _giveaway: &GiveawaySnapshot) -> bool {
        false
    }
}

/// Fixed set of users with override privilege on every giveaway.
#[derive(Debug, Clone, Default)]
pub struct Moderators {
    users: HashSet<UserId>,
}

impl Moderators {
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.moderators.iter().copied().map(UserId))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authorizer for Moderators {
    fn can_manage(&self, actor: UserId, _giveaway: &GiveawaySnapshot) -> bool {
        self.users.contains(&actor)
    }
}
