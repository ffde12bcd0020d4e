#![forbid(unsafe_code)]
//! site_design: spatially balanced sample site designs on landscape rasters.
//!
//! Modules:
//! - raster: row-major grids and exact Euclidean distance transforms
//! - strata: metric binning, stratum combination, proportional allocation
//! - placement: greedy maximin placement over eligibility regions
//! - design: stratified and uniform front-ends, design updates, events
//!
//! For examples and docs, see README and the `site_design_examples` crate.
pub mod design;
pub mod error;
pub mod placement;
pub mod raster;
pub mod strata;

/// Convenient re-exports for common types. Import with `use site_design::prelude::*;`.
pub mod prelude {
    pub use crate::design::events::{DesignEvent, EventSink, FnSink, VecSink};
    pub use crate::design::stratified::{
        generate_stratified_design, generate_stratified_design_with_events,
    };
    pub use crate::design::uniform::{
        generate_uniform_design, generate_uniform_design_with_events, MetricLayer, MetricSummary,
        UniformDesign, UniformPlan,
    };
    pub use crate::design::update::{
        exclusion_buffer, update_stratified_design, update_stratified_design_with_events,
        update_uniform_design, update_uniform_design_with_events, UpdateRequest,
    };
    pub use crate::design::{Design, DesignKind, SampledSiteRecord, Site, SiteStatus};
    pub use crate::error::{Error, Result};
    pub use crate::placement::{
        DistanceUpdate, Eligibility, MaximinPlacer, Placed, PlacementConfig, PlacerState,
    };
    pub use crate::raster::{distance_field, squared_distance_field, DistanceTransform, Grid};
    pub use crate::strata::{
        allocate, combine, discretize, distinct_value_count, suggest_sample_bounds, Allocation,
        AllocationConfig, BinEdges, BinnedMetric, Stratum, StratumId, StratumRegion, StratumTable,
    };
}
