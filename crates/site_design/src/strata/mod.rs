//! Metric stratification: binning continuous rasters, combining bins into strata,
//! and allocating sample sites across strata.
use std::fmt;

use crate::error::{Error, Result};
use crate::placement::Eligibility;
use crate::raster::Grid;

pub mod allocation;
pub mod binning;
pub mod combine;

pub use allocation::{allocate, suggest_sample_bounds, Allocation, AllocationConfig};
pub use binning::{discretize, distinct_value_count, BinEdges, BinnedMetric};
pub use combine::combine;

/// Dense identifier of a stratum within one [`StratumTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct StratumId(pub u32);

impl fmt::Display for StratumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One combination of per-metric bins.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stratum {
    pub id: StratumId,
    /// Bin index of each metric, in metric order.
    pub bins: Vec<u16>,
    /// Number of valid pixels in the stratum.
    pub population: usize,
    /// Base number of sites per stratum, `floor(s_opt)`. Zero until allocated.
    pub target: usize,
    /// Number of sites allocated to the stratum. Zero until allocated.
    pub frequency: usize,
}

/// Strata of a landscape together with the pixel membership grid.
#[derive(Clone, Debug)]
pub struct StratumTable {
    strata: Vec<Stratum>,
    membership: Grid<Option<StratumId>>,
}

impl StratumTable {
    /// Build a table from strata and the grid assigning pixels to them.
    ///
    /// Ids in `membership` that are missing from `strata` are rejected.
    pub fn new(strata: Vec<Stratum>, membership: Grid<Option<StratumId>>) -> Result<Self> {
        let table = Self { strata, membership };
        if let Some(id) = table
            .membership
            .iter()
            .flatten()
            .find(|id| table.get(**id).is_none())
        {
            return Err(Error::DataInconsistency(format!(
                "membership grid references unknown stratum {id}"
            )));
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.strata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strata.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stratum> {
        self.strata.iter()
    }

    pub fn strata(&self) -> &[Stratum] {
        &self.strata
    }

    pub fn ids(&self) -> impl Iterator<Item = StratumId> + '_ {
        self.strata.iter().map(|s| s.id)
    }

    pub fn get(&self, id: StratumId) -> Option<&Stratum> {
        // Ids are assigned in ascending order and never reordered.
        self.strata
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.strata[i])
    }

    pub(crate) fn get_mut(&mut self, id: StratumId) -> Option<&mut Stratum> {
        self.strata
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(move |i| &mut self.strata[i])
    }

    /// Fail with [`Error::DataInconsistency`] unless `id` is in the table.
    pub fn require(&self, id: StratumId) -> Result<&Stratum> {
        self.get(id).ok_or_else(|| {
            Error::DataInconsistency(format!("stratum {id} is not present in the stratum table"))
        })
    }

    /// Pixel membership grid; `None` marks pixels outside every stratum.
    ///
    /// Pixels of strata removed by allocation are `None` as well.
    pub fn membership(&self) -> &Grid<Option<StratumId>> {
        &self.membership
    }

    pub fn stratum_at(&self, row: usize, col: usize) -> Option<StratumId> {
        self.membership.get(row, col).copied().flatten()
    }

    /// Membership mask of one stratum.
    pub fn mask(&self, id: StratumId) -> Result<Grid<bool>> {
        self.require(id)?;
        Ok(self.membership.map(|m| *m == Some(id)))
    }

    /// Eligibility region restricted to stratum `id`.
    pub fn region<'a>(
        &'a self,
        eligibility: &'a Grid<bool>,
        id: StratumId,
    ) -> Result<StratumRegion<'a>> {
        self.require(id)?;
        self.membership
            .ensure_same_shape(eligibility, "eligibility mask")?;
        Ok(StratumRegion {
            eligibility,
            membership: &self.membership,
            stratum: id,
        })
    }

    /// Sum of allocated frequencies.
    pub fn total_frequency(&self) -> usize {
        self.strata.iter().map(|s| s.frequency).sum()
    }

    /// Keep only the strata accepted by `keep`; their pixels leave the membership grid.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&Stratum) -> bool) {
        self.strata.retain(keep);
        let strata = &self.strata;
        for cell in self.membership.as_mut_slice() {
            if let Some(id) = *cell {
                if strata.binary_search_by_key(&id, |s| s.id).is_err() {
                    *cell = None;
                }
            }
        }
    }
}

/// Pixels that are eligible and belong to one stratum.
#[derive(Clone, Copy, Debug)]
pub struct StratumRegion<'a> {
    eligibility: &'a Grid<bool>,
    membership: &'a Grid<Option<StratumId>>,
    stratum: StratumId,
}

impl StratumRegion<'_> {
    pub fn stratum(&self) -> StratumId {
        self.stratum
    }
}

impl Eligibility for StratumRegion<'_> {
    fn size(&self) -> (usize, usize) {
        self.eligibility.size()
    }

    #[inline]
    fn is_eligible(&self, index: usize) -> bool {
        self.eligibility.as_slice()[index] && self.membership.as_slice()[index] == Some(self.stratum)
    }

    fn describe(&self) -> String {
        format!("stratum {}", self.stratum)
    }
}
