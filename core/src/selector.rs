//! Winner selection.

use giveaway_types::UserId;
use rand::Rng;
use rand::seq::SliceRandom;

/// Draw `min(count, pool.len())` distinct winners uniformly without replacement.
///
/// The result is in draw order. An empty pool yields an empty draw, which
/// callers report as "no winner" rather than an error. `pool` must not contain
/// duplicates; participant snapshots never do.
pub fn select_winners<R: Rng + ?Sized>(pool: &[UserId], count: u32, rng: &mut R) -> Vec<UserId> {
    let k = (count as usize).min(pool.len());
    pool.choose_multiple(rng, k).copied().collect()
}
