//! Uniform design: sites spread across space and across the joint range of
//! one or more landscape metrics.
//!
//! Each metric raster is binned into equal-width intervals, the bins are
//! combined into strata, sites are allocated proportionally over the strata,
//! and every site is then placed by maximin inside its own stratum. All strata
//! share one distance field, so sites also repel across stratum boundaries.
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::design::events::{DesignEvent, EventSink};
use crate::design::{Design, DesignKind};
use crate::error::{Error, Result};
use crate::placement::{MaximinPlacer, PlacementConfig};
use crate::raster::Grid;
use crate::strata::{
    allocate, combine, discretize, distinct_value_count, AllocationConfig, BinEdges, StratumId,
    StratumTable,
};

/// A named metric raster and the number of bins to split it into.
#[derive(Clone, Debug)]
pub struct MetricLayer {
    pub name: String,
    pub raster: Grid<f64>,
    pub n_bins: usize,
}

impl MetricLayer {
    pub fn new(name: impl Into<String>, raster: Grid<f64>, n_bins: usize) -> Self {
        Self {
            name: name.into(),
            raster,
            n_bins,
        }
    }

    /// A categorical raster (integer classes) binned with one bin per class
    /// present on the valid pixels.
    pub fn categorical(
        name: impl Into<String>,
        raster: Grid<f64>,
        validity: &Grid<bool>,
    ) -> Result<Self> {
        let n_bins = distinct_value_count(&raster, validity)?;
        Ok(Self::new(name, raster, n_bins))
    }
}

/// Inputs of a uniform design run besides the validity mask.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct UniformPlan {
    /// Metric layers, in stratum-ordering priority (first varies slowest).
    pub layers: Vec<MetricLayer>,
    /// Total number of sites.
    pub nsp: usize,
    pub allocation: AllocationConfig,
    pub placement: PlacementConfig,
}

impl UniformPlan {
    /// Create an empty plan for `nsp` sites.
    pub fn new(nsp: usize) -> Self {
        Self {
            layers: Vec::new(),
            nsp,
            allocation: AllocationConfig::default(),
            placement: PlacementConfig::default(),
        }
    }

    /// Add a metric layer.
    pub fn with_layer(mut self, layer: MetricLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add multiple metric layers.
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = MetricLayer>) -> Self {
        self.layers.extend(layers);
        self
    }

    pub fn with_allocation(mut self, allocation: AllocationConfig) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Validates the plan, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.nsp == 0 {
            return Err(Error::InvalidConfig("nsp must be > 0".into()));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "uniform plan needs at least one metric layer".into(),
            ));
        }
        for layer in &self.layers {
            if layer.n_bins < 1 {
                return Err(Error::InvalidConfig(format!(
                    "metric '{}': n_bins must be >= 1",
                    layer.name
                )));
            }
        }
        Ok(())
    }
}

/// Binning summary of one metric layer.
#[derive(Clone, Debug)]
pub struct MetricSummary {
    pub name: String,
    pub edges: BinEdges,
    /// Valid pixel count per bin.
    pub histogram: Vec<usize>,
}

/// Result of [`generate_uniform_design`].
#[derive(Clone, Debug)]
pub struct UniformDesign {
    /// Sites in placement order, each tagged with its stratum.
    pub design: Design,
    /// Surviving strata with their allocation written.
    pub strata: StratumTable,
    /// One summary per metric layer, in plan order.
    pub metrics: Vec<MetricSummary>,
    /// Target sites per surviving stratum.
    pub s_opt: f64,
    /// Strata dropped for having too few pixels.
    pub dropped: Vec<StratumId>,
}

/// Generate a uniform design over the valid pixels of `validity`.
pub fn generate_uniform_design(
    validity: &Grid<bool>,
    plan: &UniformPlan,
    rng: &mut impl RngCore,
) -> Result<UniformDesign> {
    generate_uniform_design_with_events(validity, plan, rng, &mut ())
}

/// Like [`generate_uniform_design`], reporting progress to `sink`.
pub fn generate_uniform_design_with_events(
    validity: &Grid<bool>,
    plan: &UniformPlan,
    rng: &mut impl RngCore,
    sink: &mut dyn EventSink,
) -> Result<UniformDesign> {
    plan.validate()?;

    info!(
        "Generating uniform design: {} sites over {} metric layers on {}x{} grid.",
        plan.nsp,
        plan.layers.len(),
        validity.width(),
        validity.height()
    );
    sink.send(DesignEvent::RunStarted {
        kind: DesignKind::Uniform,
        requested: plan.nsp,
        preplaced: 0,
    });

    let mut binned = Vec::with_capacity(plan.layers.len());
    for layer in &plan.layers {
        let metric = discretize(&layer.raster, validity, layer.n_bins).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("metric '{}': {msg}", layer.name))
            }
            other => other,
        })?;
        debug!(
            "Metric '{}' binned into {} bins, histogram {:?}.",
            layer.name, layer.n_bins, metric.histogram
        );
        binned.push(metric);
    }

    let table = combine(&binned, validity)?;
    let allocation = allocate(table, plan.nsp, &plan.allocation, rng)?;

    if !allocation.dropped.is_empty() {
        sink.send(DesignEvent::StrataPruned {
            dropped: allocation.dropped.clone(),
            s_opt: allocation.s_opt,
        });
    }
    let idle = allocation
        .table
        .iter()
        .filter(|s| s.frequency == 0)
        .count();
    if idle > 0 {
        warn!(
            "{} of {} strata receive no site; increase nsp to cover every stratum.",
            idle,
            allocation.table.len()
        );
        sink.send(DesignEvent::Warning {
            context: "allocation".into(),
            message: format!("{idle} strata receive no site"),
        });
    }

    let mut placer = MaximinPlacer::new(
        validity.width(),
        validity.height(),
        plan.nsp,
        &[],
        plan.placement.clone(),
    )?;
    for (index, &id) in allocation.sequence.iter().enumerate() {
        let region = allocation.table.region(validity, id)?;
        let placed = placer.place_next(&region, rng)?;
        debug!(
            "Site {} in stratum {} at ({}, {}), distance {:.3}, {} ties.",
            index,
            id,
            placed.site.row,
            placed.site.col,
            placed.distance(),
            placed.ties
        );
        sink.send(DesignEvent::SitePlaced {
            index,
            site: placed.site,
            stratum: Some(id),
            distance: placed.distance(),
            ties: placed.ties,
        });
    }

    let sites = placer.into_sites();
    info!(
        "Uniform design complete: {} sites over {} strata (s_opt = {:.3}).",
        sites.len(),
        allocation.table.len(),
        allocation.s_opt
    );
    sink.send(DesignEvent::RunFinished {
        placed: sites.len(),
    });

    let metrics = plan
        .layers
        .iter()
        .zip(binned)
        .map(|(layer, metric)| MetricSummary {
            name: layer.name.clone(),
            edges: metric.edges,
            histogram: metric.histogram,
        })
        .collect();

    Ok(UniformDesign {
        design: Design::new(sites, validity.clone()).with_strata(allocation.sequence),
        strata: allocation.table,
        metrics,
        s_opt: allocation.s_opt,
        dropped: allocation.dropped,
    })
}
