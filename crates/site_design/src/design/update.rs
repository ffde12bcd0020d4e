//! Updating a tagged design after field work.
//!
//! Sites already sampled stay fixed. Sites found inaccessible become buffer
//! centers: pixels closer than `radius` to any of them are excluded, and the
//! freed sites are re-placed by maximin around everything still occupied.
use std::collections::HashSet;

use rand::RngCore;
use tracing::{debug, info};

use crate::design::events::{DesignEvent, EventSink};
use crate::design::{Design, DesignKind, SampledSiteRecord, Site, SiteStatus};
use crate::error::{Error, Result};
use crate::placement::{shuffle, MaximinPlacer, PlacementConfig};
use crate::raster::{scaled_distance_field, Grid};
use crate::strata::{StratumId, StratumTable};

/// Inputs of a design update.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UpdateRequest {
    /// Tagged records of the prior design, one per site.
    pub records: Vec<SampledSiteRecord>,
    /// Revised validity mask.
    pub validity: Grid<bool>,
    /// Number of sites of the prior design.
    pub nsp: usize,
    /// Exclusion radius around inaccessible sites, in physical units.
    pub radius: Option<f64>,
    /// Pixel size in physical units.
    pub resolution: f64,
    pub placement: PlacementConfig,
}

impl UpdateRequest {
    pub fn new(records: Vec<SampledSiteRecord>, validity: Grid<bool>, nsp: usize) -> Self {
        Self {
            records,
            validity,
            nsp,
            radius: None,
            resolution: 1.0,
            placement: PlacementConfig::default(),
        }
    }

    /// Sets the exclusion radius around inaccessible sites.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Sets the pixel size used to scale distances for the buffer.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Validates the request, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.nsp == 0 {
            return Err(Error::InvalidConfig("nsp must be > 0".into()));
        }
        validate_buffer_params(self.radius.unwrap_or(0.0), self.resolution)?;

        if self.records.len() != self.nsp {
            return Err(Error::DataInconsistency(format!(
                "prior design has {} records, expected nsp = {}",
                self.records.len(),
                self.nsp
            )));
        }
        let mut seen = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            let site = record.site;
            if !self.validity.contains(site.row, site.col) {
                return Err(Error::DataInconsistency(format!(
                    "record ({}, {}) lies outside the {}x{} grid",
                    site.row,
                    site.col,
                    self.validity.width(),
                    self.validity.height()
                )));
            }
            if !seen.insert(site) {
                return Err(Error::DataInconsistency(format!(
                    "site ({}, {}) appears more than once",
                    site.row, site.col
                )));
            }
        }
        Ok(())
    }

    pub fn fixed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == SiteStatus::Sampled)
            .count()
    }
}

/// Mask of pixels at least `radius` away from every center, distances scaled by `resolution`.
///
/// With no centers every pixel is kept.
pub fn exclusion_buffer(
    width: usize,
    height: usize,
    centers: &[Site],
    radius: f64,
    resolution: f64,
) -> Result<Grid<bool>> {
    validate_buffer_params(radius, resolution)?;
    if centers.is_empty() {
        return Ok(Grid::filled(width, height, true));
    }

    let mut occupied = Grid::filled(width, height, false);
    for center in centers {
        match occupied.get_mut(center.row, center.col) {
            Some(cell) => *cell = true,
            None => {
                return Err(Error::InvalidConfig(format!(
                    "buffer center ({}, {}) lies outside the {width}x{height} grid",
                    center.row, center.col
                )))
            }
        }
    }

    Ok(scaled_distance_field(&occupied, resolution).map(|d| *d >= radius))
}

fn validate_buffer_params(radius: f64, resolution: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "radius must be finite and >= 0, got {radius}"
        )));
    }
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "resolution must be finite and > 0, got {resolution}"
        )));
    }
    Ok(())
}

/// Re-place the sites of a stratified design that were not sampled.
pub fn update_stratified_design(
    request: &UpdateRequest,
    rng: &mut impl RngCore,
) -> Result<Design> {
    update_stratified_design_with_events(request, rng, &mut ())
}

/// Like [`update_stratified_design`], reporting progress to `sink`.
pub fn update_stratified_design_with_events(
    request: &UpdateRequest,
    rng: &mut impl RngCore,
    sink: &mut dyn EventSink,
) -> Result<Design> {
    request.validate()?;
    let prepared = prepare(request, DesignKind::StratifiedUpdate, sink)?;
    let mut placer = prepared.placer(request)?;

    for index in 0..prepared.pending {
        let placed = placer.place_next(&prepared.eligibility, rng)?;
        report(sink, index, placed.site, None, placed.distance(), placed.ties);
    }

    Ok(prepared.finish(placer.into_sites(), None, sink))
}

/// Re-place the sites of a uniform design that were not sampled.
///
/// Every freed site is re-placed inside the stratum it was allocated to. The
/// order in which strata are refilled is shuffled with `rng`.
pub fn update_uniform_design(
    request: &UpdateRequest,
    strata: &StratumTable,
    rng: &mut impl RngCore,
) -> Result<Design> {
    update_uniform_design_with_events(request, strata, rng, &mut ())
}

/// Like [`update_uniform_design`], reporting progress to `sink`.
pub fn update_uniform_design_with_events(
    request: &UpdateRequest,
    strata: &StratumTable,
    rng: &mut impl RngCore,
    sink: &mut dyn EventSink,
) -> Result<Design> {
    request.validate()?;
    strata
        .membership()
        .ensure_same_shape(&request.validity, "validity mask")?;

    let mut fixed_strata = Vec::new();
    let mut sequence = Vec::new();
    for record in &request.records {
        let id = record.stratum.ok_or_else(|| {
            Error::DataInconsistency(format!(
                "record ({}, {}) carries no stratum id",
                record.site.row, record.site.col
            ))
        })?;
        strata.require(id)?;
        if record.status == SiteStatus::Sampled {
            fixed_strata.push(id);
        } else {
            sequence.push(id);
        }
    }
    shuffle(&mut sequence, rng);

    let prepared = prepare(request, DesignKind::UniformUpdate, sink)?;
    let mut placer = prepared.placer(request)?;

    for (index, &id) in sequence.iter().enumerate() {
        let region = strata.region(&prepared.eligibility, id)?;
        let placed = placer.place_next(&region, rng)?;
        report(sink, index, placed.site, Some(id), placed.distance(), placed.ties);
    }

    fixed_strata.extend(sequence);
    Ok(prepared.finish(placer.into_sites(), Some(fixed_strata), sink))
}

/// Partitioned records and the effective eligibility of an update.
struct Prepared {
    fixed: Vec<Site>,
    centers: Vec<Site>,
    pending: usize,
    eligibility: Grid<bool>,
}

/// Callers validate `request` first.
fn prepare(
    request: &UpdateRequest,
    kind: DesignKind,
    sink: &mut dyn EventSink,
) -> Result<Prepared> {
    let mut fixed = Vec::new();
    let mut centers = Vec::new();
    for record in &request.records {
        match record.status {
            SiteStatus::Sampled => fixed.push(record.site),
            SiteStatus::Inaccessible => centers.push(record.site),
            SiteStatus::NotSampled => {}
        }
    }
    if fixed.len() > request.nsp {
        return Err(Error::DataInconsistency(format!(
            "{} sampled sites exceed nsp = {}",
            fixed.len(),
            request.nsp
        )));
    }
    let pending = request.nsp - fixed.len();

    info!(
        "Updating design: {} fixed, {} inaccessible, {} sites to place.",
        fixed.len(),
        centers.len(),
        pending
    );
    sink.send(DesignEvent::RunStarted {
        kind,
        requested: pending,
        preplaced: fixed.len() + centers.len(),
    });

    let validity = &request.validity;
    let eligibility = match request.radius {
        Some(radius) if !centers.is_empty() => {
            let buffer = exclusion_buffer(
                validity.width(),
                validity.height(),
                &centers,
                radius,
                request.resolution,
            )?;
            let eligibility = validity.and(&buffer)?;
            let excluded = validity.count_true() - eligibility.count_true();
            info!(
                "Exclusion buffer of radius {} around {} sites removed {} pixels.",
                radius,
                centers.len(),
                excluded
            );
            sink.send(DesignEvent::BufferApplied {
                centers: centers.len(),
                excluded_pixels: excluded,
            });
            eligibility
        }
        _ => validity.clone(),
    };

    Ok(Prepared {
        fixed,
        centers,
        pending,
        eligibility,
    })
}

impl Prepared {
    fn placer(&self, request: &UpdateRequest) -> Result<MaximinPlacer> {
        let mut preplaced = self.fixed.clone();
        preplaced.extend_from_slice(&self.centers);
        let (width, height) = self.eligibility.size();
        MaximinPlacer::new(
            width,
            height,
            self.pending,
            &preplaced,
            request.placement.clone(),
        )
    }

    fn finish(
        self,
        placed: Vec<Site>,
        strata: Option<Vec<StratumId>>,
        sink: &mut dyn EventSink,
    ) -> Design {
        info!("Design update complete: {} new sites.", placed.len());
        sink.send(DesignEvent::RunFinished {
            placed: placed.len(),
        });

        let fixed = self.fixed.len();
        let mut sites = self.fixed;
        sites.extend(placed);
        let design = Design::new(sites, self.eligibility).with_fixed(fixed);
        match strata {
            Some(strata) => design.with_strata(strata),
            None => design,
        }
    }
}

fn report(
    sink: &mut dyn EventSink,
    index: usize,
    site: Site,
    stratum: Option<StratumId>,
    distance: f64,
    ties: usize,
) {
    debug!(
        "Replacement site {} at ({}, {}), distance {:.3}, {} ties.",
        index, site.row, site.col, distance, ties
    );
    sink.send(DesignEvent::SitePlaced {
        index,
        site,
        stratum,
        distance,
        ties,
    });
}
