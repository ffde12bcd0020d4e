use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use site_design::design::stratified::generate_stratified_design;
use site_design::design::update::{exclusion_buffer, update_stratified_design, UpdateRequest};
use site_design::design::{SampledSiteRecord, Site, SiteStatus};
use site_design::error::Error;
use site_design::placement::{DistanceUpdate, MaximinPlacer, PlacementConfig};
use site_design::raster::Grid;
use site_design::strata::{allocate, combine, discretize, AllocationConfig};

fn mask_strategy() -> impl Strategy<Value = Grid<bool>> {
    (2usize..10, 2usize..10).prop_flat_map(|(w, h)| {
        prop::collection::vec(prop::bool::weighted(0.8), w * h)
            .prop_map(move |data| Grid::from_vec(w, h, data).unwrap())
    })
}

fn metric_strategy() -> impl Strategy<Value = (Grid<bool>, Grid<f64>)> {
    mask_strategy().prop_flat_map(|mask| {
        let (w, h) = mask.size();
        prop::collection::vec(-50.0f64..50.0, w * h)
            .prop_map(move |data| (mask.clone(), Grid::from_vec(w, h, data).unwrap()))
    })
}

/// Largest squared distance from an eligible free pixel to the occupied set.
fn brute_force_maximin(validity: &Grid<bool>, occupied: &[Site]) -> f64 {
    validity
        .cells()
        .filter(|(row, col, valid)| **valid && !occupied.contains(&Site::new(*row, *col)))
        .map(|(row, col, _)| {
            occupied
                .iter()
                .map(|s| s.squared_distance(Site::new(row, col)))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_site_after_the_first_is_a_maximin_choice(mask in mask_strategy(), seed in any::<u64>()) {
        let valid = mask.count_true();
        prop_assume!(valid >= 2);
        let nsp = valid.min(6);
        let (w, h) = mask.size();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut placer = MaximinPlacer::new(w, h, nsp, &[], PlacementConfig::default()).unwrap();

        for step in 0..nsp {
            let expected = if step == 0 {
                None
            } else {
                Some(brute_force_maximin(&mask, placer.placed()))
            };
            let placed = placer.place_next(&mask, &mut rng).unwrap();
            if let Some(expected) = expected {
                prop_assert_eq!(placed.squared_distance, expected);
            }
        }
    }

    #[test]
    fn stratified_sites_are_distinct_valid_and_counted(mask in mask_strategy(), seed in any::<u64>(), extra in 0usize..3) {
        let valid = mask.count_true();
        prop_assume!(valid >= 1);
        let mut rng = StdRng::seed_from_u64(seed);

        let design = generate_stratified_design(&mask, valid, &PlacementConfig::default(), &mut rng).unwrap();
        prop_assert_eq!(design.len(), valid);
        let unique: HashSet<_> = design.sites.iter().copied().collect();
        prop_assert_eq!(unique.len(), valid);
        for site in &design.sites {
            prop_assert_eq!(mask.get(site.row, site.col), Some(&true));
        }

        let too_many = generate_stratified_design(&mask, valid + 1 + extra, &PlacementConfig::default(), &mut rng);
        let is_infeasible = matches!(too_many, Err(Error::Infeasible { .. }));
        prop_assert!(is_infeasible);
    }

    #[test]
    fn bins_bracket_their_values((mask, metric) in metric_strategy(), n_bins in 1usize..8) {
        prop_assume!(mask.count_true() >= 1);
        let binned = discretize(&metric, &mask, n_bins).unwrap();
        let edges = binned.edges.as_slice();

        for ((value, valid), bin) in metric.iter().zip(mask.iter()).zip(binned.bins.iter()) {
            if !*valid {
                prop_assert_eq!(*bin, None);
                continue;
            }
            let k = bin.expect("valid pixel has a bin") as usize;
            prop_assert!(k < n_bins);
            prop_assert!(edges[k] <= *value && *value <= edges[k + 1]);
        }
        prop_assert_eq!(binned.histogram.iter().sum::<usize>(), mask.count_true());

        let indices = binned.bins.map(|b| b.map_or(0.0, f64::from));
        let single = discretize(&indices, &mask, 1).unwrap();
        prop_assert_eq!(single.histogram, vec![mask.count_true()]);
    }

    #[test]
    fn allocation_conserves_nsp((mask, metric) in metric_strategy(), n_bins in 1usize..5, nsp in 1usize..30, seed in any::<u64>()) {
        prop_assume!(mask.count_true() >= 1);
        let binned = discretize(&metric, &mask, n_bins).unwrap();
        let table = combine(&[binned], &mask).unwrap();
        let config = AllocationConfig::default().with_min_population_factor(1);
        let mut rng = StdRng::seed_from_u64(seed);

        if let Ok(alloc) = allocate(table, nsp, &config, &mut rng) {
            prop_assert_eq!(alloc.table.total_frequency(), nsp);
            prop_assert_eq!(alloc.sequence.len(), nsp);
            let base = alloc.s_opt.floor() as usize;
            for stratum in alloc.table.iter() {
                prop_assert!(stratum.frequency == base || stratum.frequency == base + 1);
            }
        }
    }

    #[test]
    fn update_never_moves_sampled_sites(seed in any::<u64>(), statuses in prop::collection::vec(0u8..3, 6)) {
        let validity = Grid::filled(9, 9, true);
        let mut rng = StdRng::seed_from_u64(seed);
        let prior = generate_stratified_design(&validity, 6, &PlacementConfig::default(), &mut rng).unwrap();

        let records: Vec<_> = prior
            .sites
            .iter()
            .zip(&statuses)
            .map(|(site, code)| SampledSiteRecord::new(*site, SiteStatus::try_from(*code).unwrap()))
            .collect();
        let fixed: Vec<Site> = records
            .iter()
            .filter(|r| r.status == SiteStatus::Sampled)
            .map(|r| r.site)
            .collect();

        let request = UpdateRequest::new(records, validity, 6).with_radius(1.5);
        let updated = update_stratified_design(&request, &mut rng).unwrap();
        prop_assert_eq!(updated.len(), 6);
        prop_assert_eq!(&updated.sites[..fixed.len()], &fixed[..]);
        let unique: HashSet<_> = updated.sites.iter().copied().collect();
        prop_assert_eq!(unique.len(), 6);
    }

    #[test]
    fn excluded_region_grows_with_radius(
        centers in prop::collection::vec((0usize..15, 0usize..12), 1..4),
        r1 in 0.0f64..20.0,
        dr in 0.0f64..20.0,
        resolution in 0.5f64..5.0,
    ) {
        let centers: Vec<Site> = centers.into_iter().map(|(row, col)| Site::new(row, col)).collect();
        let near = exclusion_buffer(12, 15, &centers, r1, resolution).unwrap();
        let far = exclusion_buffer(12, 15, &centers, r1 + dr, resolution).unwrap();
        for (kept_far, kept_near) in far.iter().zip(near.iter()) {
            prop_assert!(!*kept_far || *kept_near);
        }
    }

    #[test]
    fn update_strategies_agree(mask in mask_strategy(), seed in any::<u64>()) {
        let valid = mask.count_true();
        prop_assume!(valid >= 1);
        let nsp = valid.min(8);
        let run = |update| {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = PlacementConfig::default().with_distance_update(update);
            generate_stratified_design(&mask, nsp, &config, &mut rng).unwrap().sites
        };
        prop_assert_eq!(run(DistanceUpdate::Recompute), run(DistanceUpdate::Incremental));
    }

    #[test]
    fn same_seed_replays_the_design(mask in mask_strategy(), seed in any::<u64>()) {
        let valid = mask.count_true();
        prop_assume!(valid >= 1);
        let nsp = valid.min(5);
        let run = || {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_stratified_design(&mask, nsp, &PlacementConfig::default(), &mut rng).unwrap().sites
        };
        prop_assert_eq!(run(), run());
    }
}
