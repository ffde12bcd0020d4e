//! Event types and sinks for observing design runs.
//!
//! Every front-end in [`crate::design`] has a `*_with_events` variant that
//! reports [`DesignEvent`]s to an [`EventSink`] alongside its `tracing` logs.
use crate::design::{DesignKind, Site};
use crate::strata::StratumId;

/// Describes events emitted by design runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum DesignEvent {
    /// Emitted before the first placement.
    RunStarted {
        /// Front-end that started the run.
        kind: DesignKind,
        /// Number of sites to place.
        requested: usize,
        /// Number of sites already occupying the landscape.
        preplaced: usize,
    },

    /// Emitted when strata were dropped for having too few pixels.
    StrataPruned {
        /// Dropped stratum ids.
        dropped: Vec<StratumId>,
        /// Target sites per stratum after pruning.
        s_opt: f64,
    },

    /// Emitted when an exclusion buffer was carved around inaccessible sites.
    BufferApplied {
        /// Number of buffer centers.
        centers: usize,
        /// Pixels of the revised validity mask lost to the buffer.
        excluded_pixels: usize,
    },

    /// Emitted after every committed placement.
    SitePlaced {
        /// Position of the site in the run (not counting preplaced sites).
        index: usize,
        /// Chosen pixel.
        site: Site,
        /// Stratum the site was placed for, if any.
        stratum: Option<StratumId>,
        /// Distance in pixels to the nearest occupied pixel before placement,
        /// infinite for the first site of a run without preplaced sites.
        distance: f64,
        /// Number of pixels tied at that distance.
        ties: usize,
    },

    /// Non-fatal warning generated during a run.
    Warning {
        /// Context string (e.g. stratum id).
        context: String,
        /// Human-readable message.
        message: String,
    },

    /// Emitted after the last placement.
    RunFinished {
        /// Number of sites placed by the run.
        placed: usize,
    },
}

/// Receives [`DesignEvent`]s as a run progresses.
pub trait EventSink {
    fn send(&mut self, event: DesignEvent);
}

/// Discards every event.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: DesignEvent) {}
}

/// Forwards each event to a closure.
pub struct FnSink<F>
where
    F: FnMut(DesignEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(DesignEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(DesignEvent),
{
    #[inline]
    fn send(&mut self, event: DesignEvent) {
        (self.f)(event);
    }
}

/// Records every event of a run.
#[derive(Debug, Default)]
pub struct VecSink {
    events: Vec<DesignEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[DesignEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<DesignEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sites reported by [`DesignEvent::SitePlaced`], in order.
    pub fn placed_sites(&self) -> Vec<Site> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DesignEvent::SitePlaced { site, .. } => Some(*site),
                _ => None,
            })
            .collect()
    }

    /// Number of placements whose maximal distance was shared by several pixels.
    pub fn tied_placements(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DesignEvent::SitePlaced { ties, .. } if *ties > 1))
            .count()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: DesignEvent) {
        self.events.push(event);
    }
}
