//! Cross-product of binned metrics into sampling strata.
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::Grid;
use crate::strata::{BinnedMetric, Stratum, StratumId, StratumTable};

/// Combine binned metrics into a stratum table.
///
/// Candidate strata are all combinations of per-metric bin indices, ordered
/// with the first metric varying slowest. A valid pixel belongs to the
/// candidate matching each of its bin indices. Candidates without pixels are
/// dropped; survivors get dense ids in candidate order.
pub fn combine(binned: &[BinnedMetric], validity: &Grid<bool>) -> Result<StratumTable> {
    if binned.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one binned metric is required".into(),
        ));
    }
    for metric in binned {
        validity.ensure_same_shape(&metric.bins, "binned metric")?;
    }

    // Mixed-radix strides, last metric fastest.
    let mut strides = vec![1u64; binned.len()];
    let mut candidates: u64 = 1;
    for (i, metric) in binned.iter().enumerate().rev() {
        strides[i] = candidates;
        candidates = candidates
            .checked_mul(metric.n_bins() as u64)
            .ok_or_else(|| Error::InvalidConfig("too many bin combinations".into()))?;
    }

    let code_at = |index: usize| -> Option<u64> {
        let mut code = 0;
        for (metric, stride) in binned.iter().zip(&strides) {
            code += u64::from(metric.bins.as_slice()[index]?) * stride;
        }
        Some(code)
    };

    let mut populations: BTreeMap<u64, usize> = BTreeMap::new();
    for (index, valid) in validity.iter().enumerate() {
        if !*valid {
            continue;
        }
        if let Some(code) = code_at(index) {
            *populations.entry(code).or_default() += 1;
        }
    }

    if populations.is_empty() {
        return Err(Error::AllocationInconsistency(
            "no stratum contains a valid pixel".into(),
        ));
    }

    let mut ids: BTreeMap<u64, StratumId> = BTreeMap::new();
    let mut strata = Vec::with_capacity(populations.len());
    for (n, (&code, &population)) in populations.iter().enumerate() {
        let id = StratumId(n as u32);
        ids.insert(code, id);
        strata.push(Stratum {
            id,
            bins: decode(code, binned, &strides),
            population,
            target: 0,
            frequency: 0,
        });
    }

    debug!(
        "Combined {} metrics into {} of {} candidate strata.",
        binned.len(),
        strata.len(),
        candidates
    );

    let membership = Grid::from_fn(validity.width(), validity.height(), |row, col| {
        let index = validity.index(row, col);
        if !validity.as_slice()[index] {
            return None;
        }
        code_at(index).and_then(|code| ids.get(&code).copied())
    });

    StratumTable::new(strata, membership)
}

fn decode(code: u64, binned: &[BinnedMetric], strides: &[u64]) -> Vec<u16> {
    binned
        .iter()
        .zip(strides)
        .map(|(metric, stride)| ((code / stride) % metric.n_bins() as u64) as u16)
        .collect()
}
