//! Equal-width discretization of continuous metric rasters.
use crate::error::{Error, Result};
use crate::raster::Grid;

/// Ascending histogram edges partitioning a metric's valid value range.
///
/// Interval `k` is `[edges[k], edges[k + 1])`, except the last interval, which
/// is closed on both ends so the maximum value always falls in the last bin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct BinEdges(Vec<f64>);

impl BinEdges {
    /// `n_bins` equal-width intervals spanning `[min, max]`.
    ///
    /// A degenerate range `min == max` is widened to `[min - 0.5, max + 0.5]`.
    pub fn equal_width(min: f64, max: f64, n_bins: usize) -> Result<Self> {
        if n_bins < 1 {
            return Err(Error::InvalidConfig("n_bins must be >= 1".into()));
        }
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(Error::InvalidConfig(format!(
                "invalid metric range [{min}, {max}]"
            )));
        }
        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let step = (hi - lo) / n_bins as f64;
        let mut edges: Vec<f64> = (0..=n_bins).map(|k| lo + k as f64 * step).collect();
        edges[n_bins] = hi;
        Ok(Self(edges))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn n_bins(&self) -> usize {
        self.0.len() - 1
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Bounds `(lower, upper)` of bin `k`.
    pub fn bounds(&self, k: usize) -> Option<(f64, f64)> {
        if k < self.n_bins() {
            Some((self.0[k], self.0[k + 1]))
        } else {
            None
        }
    }

    /// Index of the interval containing `value`, or `None` outside the range.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < self.min() || value > self.max() {
            return None;
        }
        let above = self.0.partition_point(|e| *e <= value);
        Some((above - 1).min(self.n_bins() - 1))
    }
}

/// A metric raster discretized into bins.
#[derive(Clone, Debug)]
pub struct BinnedMetric {
    /// Bin index per pixel; `None` for invalid pixels.
    pub bins: Grid<Option<u16>>,
    pub edges: BinEdges,
    /// Valid pixel count per bin.
    pub histogram: Vec<usize>,
}

impl BinnedMetric {
    pub fn n_bins(&self) -> usize {
        self.edges.n_bins()
    }
}

/// Discretize `metric` into `n_bins` equal-width bins over its valid pixels.
pub fn discretize(metric: &Grid<f64>, validity: &Grid<bool>, n_bins: usize) -> Result<BinnedMetric> {
    if n_bins < 1 {
        return Err(Error::InvalidConfig("n_bins must be >= 1".into()));
    }
    if n_bins > u16::MAX as usize {
        return Err(Error::InvalidConfig(format!(
            "n_bins must be <= {}, got {n_bins}",
            u16::MAX
        )));
    }
    validity.ensure_same_shape(metric, "metric raster")?;

    let (min, max) = valid_range(metric, validity)?;
    let edges = BinEdges::equal_width(min, max, n_bins)?;

    let mut histogram = vec![0usize; n_bins];
    let mut data = Vec::with_capacity(metric.len());
    for (value, valid) in metric.iter().zip(validity.iter()) {
        if !*valid {
            data.push(None);
            continue;
        }
        let bin = edges.bin_of(*value);
        if let Some(k) = bin {
            histogram[k] += 1;
        }
        data.push(bin.map(|k| k as u16));
    }

    Ok(BinnedMetric {
        bins: Grid::from_vec(metric.width(), metric.height(), data)?,
        edges,
        histogram,
    })
}

/// Number of distinct values among valid pixels.
///
/// Passing this as `n_bins` bins a categorical raster with integer classes
/// into one bin per class.
pub fn distinct_value_count(metric: &Grid<f64>, validity: &Grid<bool>) -> Result<usize> {
    validity.ensure_same_shape(metric, "metric raster")?;
    valid_range(metric, validity)?;
    let mut values: Vec<f64> = metric
        .iter()
        .zip(validity.iter())
        .filter(|(_, valid)| **valid)
        .map(|(v, _)| *v)
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    Ok(values.len())
}

fn valid_range(metric: &Grid<f64>, validity: &Grid<bool>) -> Result<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for (value, valid) in metric.iter().zip(validity.iter()) {
        if !*valid {
            continue;
        }
        if !value.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "metric has non-finite value {value} on a valid pixel"
            )));
        }
        range = Some(match range {
            None => (*value, *value),
            Some((lo, hi)) => (lo.min(*value), hi.max(*value)),
        });
    }
    range.ok_or_else(|| Error::InvalidConfig("validity mask has no valid pixels".into()))
}
