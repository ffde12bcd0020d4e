//! Sample designs: site coordinates, the stratified and uniform front-ends, and design updates.
use glam::{DVec2, IVec2};

use crate::raster::Grid;
use crate::strata::StratumId;

pub mod events;
pub mod record;
pub mod stratified;
pub mod uniform;
pub mod update;

pub use record::{SampledSiteRecord, SiteStatus};

/// A pixel coordinate chosen as a sample site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Site {
    pub row: usize,
    pub col: usize,
}

impl Site {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Squared pixel distance to `other`.
    pub fn squared_distance(self, other: Site) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        dr * dr + dc * dc
    }

    /// Integer position as `(x = col, y = row)`.
    pub fn to_ivec2(self) -> IVec2 {
        IVec2::new(self.col as i32, self.row as i32)
    }

    /// Center of the pixel in physical units, `(x = col, y = row)` scaled by `resolution`.
    pub fn center(self, resolution: f64) -> DVec2 {
        DVec2::new(self.col as f64 + 0.5, self.row as f64 + 0.5) * resolution
    }
}

impl From<(usize, usize)> for Site {
    fn from((row, col): (usize, usize)) -> Self {
        Site::new(row, col)
    }
}

impl From<Site> for mint::Point2<usize> {
    fn from(site: Site) -> Self {
        mint::Point2 {
            x: site.col,
            y: site.row,
        }
    }
}

impl From<mint::Point2<usize>> for Site {
    fn from(p: mint::Point2<usize>) -> Self {
        Site::new(p.y, p.x)
    }
}

/// Which front-end produced a design.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesignKind {
    Stratified,
    Uniform,
    StratifiedUpdate,
    UniformUpdate,
}

/// An ordered sample design.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct Design {
    /// Sites in placement order. Updated designs list their fixed sites first.
    pub sites: Vec<Site>,
    /// Stratum of each site, parallel to `sites`, for uniform designs.
    pub strata: Option<Vec<StratumId>>,
    /// Number of leading sites carried over unchanged from a prior design.
    pub fixed: usize,
    /// Eligibility grid used for placing the new sites.
    pub eligibility: Grid<bool>,
}

impl Design {
    pub fn new(sites: Vec<Site>, eligibility: Grid<bool>) -> Self {
        Self {
            sites,
            strata: None,
            fixed: 0,
            eligibility,
        }
    }

    pub fn with_strata(mut self, strata: Vec<StratumId>) -> Self {
        debug_assert_eq!(strata.len(), self.sites.len());
        self.strata = Some(strata);
        self
    }

    pub fn with_fixed(mut self, fixed: usize) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn contains(&self, site: Site) -> bool {
        self.sites.contains(&site)
    }

    /// Stratum of the site at `index`, if this is a uniform design.
    pub fn stratum_at(&self, index: usize) -> Option<StratumId> {
        self.strata.as_ref().and_then(|s| s.get(index).copied())
    }

    /// Records suitable for persisting and tagging in the field: fixed sites as
    /// [`SiteStatus::Sampled`], the rest as [`SiteStatus::NotSampled`].
    pub fn records(&self) -> Vec<SampledSiteRecord> {
        self.sites
            .iter()
            .enumerate()
            .map(|(i, &site)| SampledSiteRecord {
                site,
                status: if i < self.fixed {
                    SiteStatus::Sampled
                } else {
                    SiteStatus::NotSampled
                },
                stratum: self.stratum_at(i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_geometry_helpers() {
        let a = Site::new(1, 2);
        let b = Site::new(4, 6);
        assert_eq!(a.squared_distance(b), 25.0);
        assert_eq!(a.to_ivec2(), IVec2::new(2, 1));
        assert_eq!(a.center(10.0), DVec2::new(25.0, 15.0));
    }

    #[test]
    fn site_mint_roundtrip() {
        let site = Site::new(3, 7);
        let p: mint::Point2<usize> = site.into();
        assert_eq!((p.x, p.y), (7, 3));
        assert_eq!(Site::from(p), site);
    }

    #[test]
    fn records_tag_fixed_prefix() {
        let design = Design::new(
            vec![Site::new(0, 0), Site::new(1, 1), Site::new(2, 2)],
            Grid::filled(3, 3, true),
        )
        .with_fixed(1)
        .with_strata(vec![StratumId(4), StratumId(5), StratumId(4)]);

        let records = design.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, SiteStatus::Sampled);
        assert_eq!(records[1].status, SiteStatus::NotSampled);
        assert_eq!(records[2].stratum, Some(StratumId(4)));
    }
}
