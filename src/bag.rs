//! Bag randomizer: a weighted pool of resource kinds, shuffled, drawn until empty, then rebuilt.

use crate::resource::ResourceKind;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Base copies of each kind per refill.
const BASE_WEIGHTS: [(ResourceKind, u32); 5] = [
    (ResourceKind::Seed, 2),
    (ResourceKind::Soil, 2),
    (ResourceKind::Water, 2),
    (ResourceKind::Sun, 1),
    (ResourceKind::Rock, 0),
];

/// Sun gets one extra copy when the grid holds more than this many resource blocks...
const SUN_BOOST_RESOURCES: usize = 12;
/// ...and fewer than this many of them are sun.
const SUN_BOOST_MAX_SUNS: usize = 2;

/// Rock weight steps as (applies after wave, delta). The dip after wave 6 is a breather wave.
const ROCK_WAVE_STEPS: [(u32, i32); 4] = [(2, 1), (4, 1), (6, -2), (7, 1)];

/// Grid and progress facts the pool weights depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolContext {
    pub wave: u32,
    /// Non-flower blocks currently settled in the grid.
    pub resource_blocks: usize,
    pub sun_blocks: usize,
}

impl Default for PoolContext {
    fn default() -> Self {
        Self {
            wave: 1,
            resource_blocks: 0,
            sun_blocks: 0,
        }
    }
}

/// Rock copies in a refill for the given wave.
pub fn rock_weight(wave: u32) -> u32 {
    let weight: i32 = ROCK_WAVE_STEPS
        .iter()
        .filter(|(after, _)| wave > *after)
        .map(|(_, delta)| delta)
        .sum();
    weight.max(0) as u32
}

/// Copies of each bag kind for one refill.
pub fn pool_weights(ctx: PoolContext) -> [(ResourceKind, u32); 5] {
    let mut weights = BASE_WEIGHTS;
    for (kind, weight) in &mut weights {
        match kind {
            ResourceKind::Sun
                if ctx.resource_blocks > SUN_BOOST_RESOURCES
                    && ctx.sun_blocks < SUN_BOOST_MAX_SUNS =>
            {
                *weight += 1;
            }
            ResourceKind::Rock => *weight += rock_weight(ctx.wave),
            _ => {}
        }
    }
    weights
}

/// Upcoming resource kinds.
#[derive(Debug, Clone, Default)]
pub struct Bag {
    queue: VecDeque<ResourceKind>,
    refills: u64,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and shuffle a fresh pool if nothing is left. Returns true if it refilled.
    pub fn refill_if_empty<R: Rng + ?Sized>(&mut self, ctx: PoolContext, rng: &mut R) -> bool {
        if !self.queue.is_empty() {
            return false;
        }
        let mut pool: Vec<ResourceKind> = pool_weights(ctx)
            .iter()
            .flat_map(|&(kind, weight)| std::iter::repeat_n(kind, weight as usize))
            .collect();
        pool.shuffle(rng);
        log::debug!("bag refilled for wave {}: {:?}", ctx.wave, pool);
        self.queue.extend(pool);
        self.refills += 1;
        true
    }

    /// Take the next kind, refilling first if needed.
    pub fn next<R: Rng + ?Sized>(&mut self, ctx: PoolContext, rng: &mut R) -> ResourceKind {
        self.refill_if_empty(ctx, rng);
        // Base weights are never all zero, so a refill always yields at least one kind.
        self.queue.pop_front().unwrap_or(ResourceKind::Seed)
    }

    /// The kind `next` would return, without consuming it.
    pub fn peek<R: Rng + ?Sized>(&mut self, ctx: PoolContext, rng: &mut R) -> ResourceKind {
        self.refill_if_empty(ctx, rng);
        self.queue.front().copied().unwrap_or(ResourceKind::Seed)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// How many pools have been built so far.
    pub fn refills(&self) -> u64 {
        self.refills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn count(weights: &[(ResourceKind, u32); 5], kind: ResourceKind) -> u32 {
        weights.iter().find(|(k, _)| *k == kind).map_or(0, |(_, w)| *w)
    }

    #[test]
    fn test_rock_weight_curve() {
        assert_eq!(rock_weight(1), 0);
        assert_eq!(rock_weight(2), 0);
        assert_eq!(rock_weight(3), 1);
        assert_eq!(rock_weight(4), 1);
        assert_eq!(rock_weight(5), 2);
        assert_eq!(rock_weight(6), 2);
        assert_eq!(rock_weight(7), 0);
        assert_eq!(rock_weight(8), 1);
        assert_eq!(rock_weight(40), 1);
    }

    #[test]
    fn test_sun_boost_needs_full_grid_and_few_suns() {
        let crowded = PoolContext {
            wave: 1,
            resource_blocks: 20,
            sun_blocks: 0,
        };
        assert_eq!(count(&pool_weights(crowded), ResourceKind::Sun), 2);
        let sunny = PoolContext {
            sun_blocks: 3,
            ..crowded
        };
        assert_eq!(count(&pool_weights(sunny), ResourceKind::Sun), 1);
        assert_eq!(count(&pool_weights(PoolContext::default()), ResourceKind::Sun), 1);
    }

    #[test]
    fn test_seven_draws_exhaust_first_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bag = Bag::new();
        let ctx = PoolContext::default();
        let mut drawn: Vec<_> = (0..7).map(|_| bag.next(ctx, &mut rng)).collect();
        drawn.sort();
        use crate::resource::ResourceKind::*;
        assert_eq!(drawn, vec![Seed, Seed, Soil, Soil, Water, Water, Sun]);
        assert!(bag.is_empty());
        assert_eq!(bag.refills(), 1);
        bag.next(ctx, &mut rng);
        assert_eq!(bag.refills(), 2);
        assert_eq!(bag.len(), 6);
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut bag = Bag::new();
        let ctx = PoolContext::default();
        for _ in 0..20 {
            let first = bag.peek(ctx, &mut rng);
            let second = bag.peek(ctx, &mut rng);
            assert_eq!(first, second);
            assert_eq!(bag.next(ctx, &mut rng), first);
        }
    }
}
