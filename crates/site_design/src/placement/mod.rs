//! Greedy maximin site placement over eligibility regions.
//!
//! This module defines the [`Eligibility`] seam used to restrict where a
//! placement step may land, the [`MaximinPlacer`] state machine, and the
//! RNG helpers shared with allocation.
use rand::RngCore;

use crate::raster::Grid;

pub mod maximin;

pub use maximin::{DistanceUpdate, MaximinPlacer, Placed, PlacementConfig, PlacerState};

/// Pixels a placement step may choose from.
pub trait Eligibility {
    /// Grid size as `(width, height)`.
    fn size(&self) -> (usize, usize);

    /// Whether the pixel at row-major `index` may receive a site.
    fn is_eligible(&self, index: usize) -> bool;

    /// Short description used in error messages.
    fn describe(&self) -> String {
        "eligible region".to_owned()
    }
}

impl Eligibility for Grid<bool> {
    fn size(&self) -> (usize, usize) {
        Grid::size(self)
    }

    #[inline]
    fn is_eligible(&self, index: usize) -> bool {
        self.as_slice()[index]
    }
}

/// Draw a uniform index in `0..n`. `n` must be positive.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn RngCore, n: usize) -> usize {
    debug_assert!(n > 0);
    // Widening multiply maps the 64-bit draw onto 0..n without modulo.
    ((u128::from(rng.next_u64()) * n as u128) >> 64) as usize
}

/// Uniform in-place Fisher-Yates shuffle.
pub(crate) fn shuffle<T>(items: &mut [T], rng: &mut dyn RngCore) {
    for i in (1..items.len()).rev() {
        let j = rand_index(rng, i + 1);
        items.swap(i, j);
    }
}

/// `k` distinct indices from `0..n`, drawn without replacement.
pub(crate) fn choose_distinct(n: usize, k: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut pool: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let j = i + rand_index(rng, n - i);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}
