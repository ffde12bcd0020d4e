//! Greedy farthest-point (maximin) placement on a pixel grid.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::RngCore;

use crate::design::Site;
use crate::error::{Error, Result};
use crate::placement::{rand_index, Eligibility};
use crate::raster::{DistanceTransform, Grid};

/// How the distance field is brought up to date after each placement.
///
/// Both strategies produce identical fields, so they yield identical designs
/// for the same RNG stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceUpdate {
    /// Rebuild the whole field with the distance transform.
    #[default]
    Recompute,
    /// Fold the new site into the existing field, `d² = min(d², |p - s|²)`.
    Incremental,
}

/// Configuration for [`MaximinPlacer`].
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct PlacementConfig {
    /// Distance field update strategy.
    pub distance_update: DistanceUpdate,
    /// Checked between placements; a raised flag aborts the run.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl PlacementConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the distance field update strategy.
    pub fn with_distance_update(mut self, distance_update: DistanceUpdate) -> Self {
        self.distance_update = distance_update;
        self
    }

    /// Sets a flag that cancels the run when raised.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Lifecycle of a [`MaximinPlacer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacerState {
    /// Distance field not built yet.
    Seeding,
    /// Field current; more sites to place.
    Placing,
    /// All requested sites placed.
    Done,
}

/// Outcome of one placement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placed {
    pub site: Site,
    /// Squared pixel distance from `site` to the nearest occupied pixel before
    /// placement; `f64::INFINITY` when nothing was occupied yet.
    pub squared_distance: f64,
    /// Number of eligible pixels that shared that distance.
    pub ties: usize,
}

impl Placed {
    pub fn distance(&self) -> f64 {
        self.squared_distance.sqrt()
    }
}

/// Greedy maximin placer.
///
/// Each step picks, among eligible unoccupied pixels, one maximizing the
/// distance to every occupied pixel (preplaced sites and sites placed so far),
/// breaking exact ties uniformly at random. The eligibility region can change
/// between steps while the occupied set keeps accumulating.
pub struct MaximinPlacer {
    count: usize,
    occupied: Grid<bool>,
    field: Grid<f64>,
    transform: DistanceTransform,
    preplaced: Vec<Site>,
    placed: Vec<Site>,
    ties: Vec<usize>,
    state: PlacerState,
    config: PlacementConfig,
}

impl MaximinPlacer {
    /// Create a placer for `count` sites on a `width` by `height` grid.
    ///
    /// `preplaced` sites occupy the distance field from the start and are never
    /// selected.
    pub fn new(
        width: usize,
        height: usize,
        count: usize,
        preplaced: &[Site],
        config: PlacementConfig,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be non-empty, got {width}x{height}"
            )));
        }
        let mut occupied = Grid::filled(width, height, false);
        for site in preplaced {
            match occupied.get_mut(site.row, site.col) {
                Some(cell) => *cell = true,
                None => {
                    return Err(Error::InvalidConfig(format!(
                        "preplaced site ({}, {}) lies outside the {width}x{height} grid",
                        site.row, site.col
                    )))
                }
            }
        }

        Ok(Self {
            count,
            occupied,
            field: Grid::filled(width, height, 0.0),
            transform: DistanceTransform::new(),
            preplaced: preplaced.to_vec(),
            placed: Vec::with_capacity(count),
            ties: Vec::new(),
            state: if count == 0 {
                PlacerState::Done
            } else {
                PlacerState::Seeding
            },
            config,
        })
    }

    pub fn state(&self) -> PlacerState {
        self.state
    }

    /// Number of sites this placer was asked for.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn remaining(&self) -> usize {
        self.count - self.placed.len()
    }

    pub fn preplaced(&self) -> &[Site] {
        &self.preplaced
    }

    /// Sites placed so far, in placement order.
    pub fn placed(&self) -> &[Site] {
        &self.placed
    }

    /// Occupied pixels: preplaced sites and sites placed so far.
    pub fn occupied(&self) -> &Grid<bool> {
        &self.occupied
    }

    /// Squared distance field of the occupied set. Meaningful once seeding is over.
    pub fn squared_distances(&self) -> &Grid<f64> {
        &self.field
    }

    /// Place one site inside `region`.
    pub fn place_next(
        &mut self,
        region: &dyn Eligibility,
        rng: &mut dyn RngCore,
    ) -> Result<Placed> {
        if self.state == PlacerState::Done {
            return Err(Error::Other(format!(
                "placer already placed all {} sites",
                self.count
            )));
        }
        if self.config.is_cancelled() {
            return Err(Error::Cancelled {
                placed: self.placed.len(),
            });
        }
        if region.size() != self.occupied.size() {
            let (w, h) = region.size();
            return Err(Error::InvalidConfig(format!(
                "eligibility is {w}x{h}, expected {}x{}",
                self.occupied.width(),
                self.occupied.height()
            )));
        }
        if self.state == PlacerState::Seeding {
            self.transform.squared_into(&self.occupied, &mut self.field);
            self.state = PlacerState::Placing;
        }

        let step = self.placed.len();
        let mut best = f64::NEG_INFINITY;
        self.ties.clear();
        let occupied = self.occupied.as_slice();
        for (i, &d) in self.field.as_slice().iter().enumerate() {
            if occupied[i] || !region.is_eligible(i) {
                continue;
            }
            if d > best {
                best = d;
                self.ties.clear();
                self.ties.push(i);
            } else if d == best {
                self.ties.push(i);
            }
        }

        if self.ties.is_empty() {
            return Err(Error::infeasible(
                step,
                format!("{} has no unoccupied pixel left", region.describe()),
            ));
        }

        let pick = self.ties[rand_index(rng, self.ties.len())];
        let (row, col) = self.occupied.coords(pick);
        let site = Site::new(row, col);
        let nothing_occupied = self.preplaced.is_empty() && self.placed.is_empty();
        let placed = Placed {
            site,
            squared_distance: if nothing_occupied { f64::INFINITY } else { best },
            ties: self.ties.len(),
        };

        self.commit(site);
        Ok(placed)
    }

    /// Place every remaining site inside the same `region`.
    pub fn run(mut self, region: &dyn Eligibility, rng: &mut dyn RngCore) -> Result<Vec<Site>> {
        while self.state != PlacerState::Done {
            self.place_next(region, rng)?;
        }
        Ok(self.placed)
    }

    pub fn into_sites(self) -> Vec<Site> {
        self.placed
    }

    fn commit(&mut self, site: Site) {
        let index = self.occupied.index(site.row, site.col);
        self.occupied.as_mut_slice()[index] = true;
        self.placed.push(site);

        match self.config.distance_update {
            DistanceUpdate::Recompute => {
                self.transform.squared_into(&self.occupied, &mut self.field);
            }
            DistanceUpdate::Incremental => {
                let w = self.field.width();
                for (i, d) in self.field.as_mut_slice().iter_mut().enumerate() {
                    let dr = (i / w) as f64 - site.row as f64;
                    let dc = (i % w) as f64 - site.col as f64;
                    let dd = dr * dr + dc * dc;
                    if dd < *d {
                        *d = dd;
                    }
                }
            }
        }

        if self.placed.len() == self.count {
            self.state = PlacerState::Done;
        }
    }
}
