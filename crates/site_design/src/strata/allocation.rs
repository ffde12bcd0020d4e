//! Proportional allocation of sample sites across strata.
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::placement::{choose_distinct, shuffle};
use crate::strata::{StratumId, StratumTable};

/// Pixel-count factor used when pruning strata too small for their share of sites.
pub const DEFAULT_MIN_POPULATION_FACTOR: usize = 10;

/// Configuration for [`allocate`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct AllocationConfig {
    /// A stratum survives pruning if it has at least
    /// `min_population_factor * ceil(s_opt)` pixels.
    pub min_population_factor: usize,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            min_population_factor: DEFAULT_MIN_POPULATION_FACTOR,
        }
    }
}

impl AllocationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pruning factor. Zero disables pruning.
    pub fn with_min_population_factor(mut self, factor: usize) -> Self {
        self.min_population_factor = factor;
        self
    }
}

/// Result of [`allocate`].
#[derive(Clone, Debug)]
pub struct Allocation {
    /// Stratum to fill at each placement step, in fill order.
    pub sequence: Vec<StratumId>,
    /// Surviving strata with `target` and `frequency` written.
    pub table: StratumTable,
    /// Target sites per surviving stratum.
    pub s_opt: f64,
    /// Strata removed for having too few pixels.
    pub dropped: Vec<StratumId>,
}

/// Allocate `nsp` sites across the strata of `table`.
///
/// Strata holding fewer than `min_population_factor * ceil(nsp / k)` pixels are
/// dropped once, and `s_opt` is recomputed over the survivors without iterating
/// further. Every survivor receives `floor(s_opt)` sites; the remainder goes to
/// distinct survivors drawn without replacement. The sequence is shuffled,
/// since fill order shapes the shared distance field.
pub fn allocate(
    mut table: StratumTable,
    nsp: usize,
    config: &AllocationConfig,
    rng: &mut dyn RngCore,
) -> Result<Allocation> {
    if nsp == 0 {
        return Err(Error::InvalidConfig("nsp must be > 0".into()));
    }
    if table.is_empty() {
        return Err(Error::AllocationInconsistency(
            "stratum table is empty".into(),
        ));
    }

    let s_opt = nsp as f64 / table.len() as f64;
    let threshold = config.min_population_factor * s_opt.ceil() as usize;
    let dropped: Vec<StratumId> = table
        .iter()
        .filter(|s| s.population < threshold)
        .map(|s| s.id)
        .collect();
    table.retain(|s| s.population >= threshold);

    if table.is_empty() {
        return Err(Error::AllocationInconsistency(format!(
            "no stratum holds the required {threshold} pixels for {nsp} sites"
        )));
    }
    if !dropped.is_empty() {
        warn!(
            "Dropped {} strata with fewer than {} pixels.",
            dropped.len(),
            threshold
        );
    }

    let s_opt = nsp as f64 / table.len() as f64;
    let base = s_opt.floor() as usize;
    let ids: Vec<StratumId> = table.ids().collect();

    let mut sequence: Vec<StratumId> = Vec::with_capacity(nsp);
    for &id in &ids {
        sequence.extend(std::iter::repeat_n(id, base));
    }

    let diff = nsp as i64 - sequence.len() as i64;
    if diff < 0 {
        return Err(Error::AllocationInconsistency(format!(
            "base allocation of {} exceeds {nsp} sites",
            sequence.len()
        )));
    }
    let diff = diff as usize;
    if diff > ids.len() {
        return Err(Error::AllocationInconsistency(format!(
            "remainder {diff} exceeds the {} surviving strata",
            ids.len()
        )));
    }
    for i in choose_distinct(ids.len(), diff, rng) {
        sequence.push(ids[i]);
    }

    shuffle(&mut sequence, rng);

    for id in &ids {
        if let Some(stratum) = table.get_mut(*id) {
            stratum.target = base;
            stratum.frequency = 0;
        }
    }
    for id in &sequence {
        if let Some(stratum) = table.get_mut(*id) {
            stratum.frequency += 1;
        }
    }

    debug!(
        "Allocated {} sites over {} strata (s_opt = {:.3}).",
        nsp,
        ids.len(),
        s_opt
    );

    Ok(Allocation {
        sequence,
        table,
        s_opt,
        dropped,
    })
}

/// Nearest sample totals `(lower, upper)` that allocate evenly over `n_strata` strata.
pub fn suggest_sample_bounds(nsp: usize, n_strata: usize) -> (usize, usize) {
    if n_strata == 0 {
        return (0, 0);
    }
    let lower = (nsp / n_strata) * n_strata;
    let upper = nsp.div_ceil(n_strata) * n_strata;
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::raster::Grid;
    use crate::strata::Stratum;

    fn table_with(populations: &[usize]) -> StratumTable {
        let strata = populations
            .iter()
            .enumerate()
            .map(|(i, &population)| Stratum {
                id: StratumId(i as u32),
                bins: vec![i as u16],
                population,
                target: 0,
                frequency: 0,
            })
            .collect();
        StratumTable::new(strata, Grid::filled(1, 1, None)).unwrap()
    }

    #[test]
    fn frequencies_sum_to_nsp() {
        let mut rng = StdRng::seed_from_u64(5);
        let alloc = allocate(
            table_with(&[500, 500, 500, 500]),
            10,
            &AllocationConfig::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(alloc.sequence.len(), 10);
        assert_eq!(alloc.table.total_frequency(), 10);
        assert_eq!(alloc.s_opt, 2.5);
        for s in alloc.table.iter() {
            assert_eq!(s.target, 2);
            assert!(s.frequency == 2 || s.frequency == 3);
        }
    }

    #[test]
    fn small_stratum_is_pruned_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let alloc = allocate(
            table_with(&[60, 5]),
            10,
            &AllocationConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(alloc.dropped, vec![StratumId(1)]);
        assert_eq!(alloc.table.len(), 1);
        assert!(alloc.sequence.iter().all(|id| *id == StratumId(0)));
        assert_eq!(alloc.s_opt, 10.0);
    }

    #[test]
    fn pruning_is_not_iterated_to_a_fixed_point() {
        // s_opt = 10 / 3 -> threshold 40 drops only the 5-pixel stratum. The
        // recomputed s_opt = 5 would demand 50 pixels, yet 45 survives.
        let mut rng = StdRng::seed_from_u64(2);
        let alloc = allocate(
            table_with(&[45, 100, 5]),
            10,
            &AllocationConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(alloc.dropped, vec![StratumId(2)]);
        assert_eq!(alloc.table.get(StratumId(0)).unwrap().frequency, 5);
    }

    #[test]
    fn pruned_pixels_leave_the_membership_grid() {
        // 12 pixels in stratum 0, 3 in stratum 1; 2 sites need 10 pixels each.
        let membership = Grid::from_fn(5, 3, |row, col| {
            Some(StratumId(u32::from(row == 2 && col < 3)))
        });
        let strata = vec![
            Stratum {
                id: StratumId(0),
                bins: vec![0],
                population: 12,
                target: 0,
                frequency: 0,
            },
            Stratum {
                id: StratumId(1),
                bins: vec![1],
                population: 3,
                target: 0,
                frequency: 0,
            },
        ];
        let table = StratumTable::new(strata, membership).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let alloc = allocate(table, 2, &AllocationConfig::default(), &mut rng).unwrap();

        assert_eq!(alloc.dropped, vec![StratumId(1)]);
        assert_eq!(alloc.table.stratum_at(2, 0), None);
        assert_eq!(alloc.table.stratum_at(0, 0), Some(StratumId(0)));
        assert!(alloc.table.mask(StratumId(1)).is_err());
        assert_eq!(alloc.table.mask(StratumId(0)).unwrap().count_true(), 12);
    }

    #[test]
    fn all_strata_pruned_is_an_allocation_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = allocate(
            table_with(&[40, 5]),
            10,
            &AllocationConfig::default(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, Error::AllocationInconsistency(_)));
    }

    #[test]
    fn fewer_sites_than_strata_leaves_some_empty() {
        let mut rng = StdRng::seed_from_u64(4);
        let alloc = allocate(
            table_with(&[100; 5]),
            3,
            &AllocationConfig::default(),
            &mut rng,
        )
        .unwrap();
        let freqs: Vec<_> = alloc.table.iter().map(|s| s.frequency).collect();
        assert_eq!(freqs.iter().sum::<usize>(), 3);
        assert!(freqs.iter().all(|f| *f <= 1));
        let mut seen = alloc.sequence.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn zero_sites_is_a_configuration_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = allocate(table_with(&[10]), 0, &AllocationConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn same_seed_same_sequence() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            allocate(
                table_with(&[1000; 6]),
                17,
                &AllocationConfig::default(),
                &mut rng,
            )
            .unwrap()
            .sequence
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn sample_bounds_bracket_nsp() {
        assert_eq!(suggest_sample_bounds(30, 7), (28, 35));
        assert_eq!(suggest_sample_bounds(28, 7), (28, 28));
        assert_eq!(suggest_sample_bounds(5, 0), (0, 0));
    }
}
