use giveaway_types::UserId;
use hashbrown::HashSet;

/// Set of users opted in to one giveaway.
///
/// Membership only ever changes through [`toggle`](Self::toggle); whether the
/// giveaway still accepts toggles is decided by the owning `Giveaway`.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    members: HashSet<UserId>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership. Returns `true` if the user is now joined.
    pub fn toggle(&mut self, user: UserId) -> bool {
        if self.members.remove(&user) {
            false
        } else {
            self.members.insert(user);
            true
        }
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sorted copy of the members. Sorting keeps seeded draws reproducible.
    pub fn snapshot(&self) -> Vec<UserId> {
        let mut members: Vec<UserId> = self.members.iter().copied().collect();
        members.sort_unstable();
        members
    }

    /// Sorted copy of the members not listed in `excluded`.
    pub fn snapshot_excluding(&self, excluded: &[UserId]) -> Vec<UserId> {
        let mut members: Vec<UserId> = self
            .members
            .iter()
            .copied()
            .filter(|user| !excluded.contains(user))
            .collect();
        members.sort_unstable();
        members
    }
}
