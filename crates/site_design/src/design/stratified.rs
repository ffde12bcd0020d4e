//! Stratified design: maximin placement over a validity mask only.
use rand::RngCore;
use tracing::{debug, info};

use crate::design::events::{DesignEvent, EventSink};
use crate::design::{Design, DesignKind};
use crate::error::{Error, Result};
use crate::placement::{MaximinPlacer, PlacementConfig};
use crate::raster::Grid;

/// Place `nsp` sites on the valid pixels of `validity`, spread as far apart as possible.
pub fn generate_stratified_design(
    validity: &Grid<bool>,
    nsp: usize,
    config: &PlacementConfig,
    rng: &mut impl RngCore,
) -> Result<Design> {
    generate_stratified_design_with_events(validity, nsp, config, rng, &mut ())
}

/// Like [`generate_stratified_design`], reporting progress to `sink`.
pub fn generate_stratified_design_with_events(
    validity: &Grid<bool>,
    nsp: usize,
    config: &PlacementConfig,
    rng: &mut impl RngCore,
    sink: &mut dyn EventSink,
) -> Result<Design> {
    if nsp == 0 {
        return Err(Error::InvalidConfig("nsp must be > 0".into()));
    }

    info!(
        "Generating stratified design: {} sites on {}x{} grid ({} valid pixels).",
        nsp,
        validity.width(),
        validity.height(),
        validity.count_true()
    );
    sink.send(DesignEvent::RunStarted {
        kind: DesignKind::Stratified,
        requested: nsp,
        preplaced: 0,
    });

    let mut placer = MaximinPlacer::new(
        validity.width(),
        validity.height(),
        nsp,
        &[],
        config.clone(),
    )?;
    for index in 0..nsp {
        let placed = placer.place_next(validity, rng)?;
        debug!(
            "Site {} at ({}, {}), distance {:.3}, {} ties.",
            index,
            placed.site.row,
            placed.site.col,
            placed.distance(),
            placed.ties
        );
        sink.send(DesignEvent::SitePlaced {
            index,
            site: placed.site,
            stratum: None,
            distance: placed.distance(),
            ties: placed.ties,
        });
    }

    let sites = placer.into_sites();
    info!("Stratified design complete: {} sites.", sites.len());
    sink.send(DesignEvent::RunFinished {
        placed: sites.len(),
    });

    Ok(Design::new(sites, validity.clone()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::design::events::VecSink;
    use crate::design::Site;
    use crate::placement::DistanceUpdate;

    #[test]
    fn four_by_four_pair_spans_the_grid() {
        let validity = Grid::filled(4, 4, true);
        let corners = [
            Site::new(0, 0),
            Site::new(0, 3),
            Site::new(3, 0),
            Site::new(3, 3),
        ];
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let design =
                generate_stratified_design(&validity, 2, &PlacementConfig::default(), &mut rng)
                    .unwrap();
            assert_eq!(design.len(), 2);
            assert!(corners.contains(&design.sites[1]));
        }
    }

    #[test]
    fn second_site_avoids_invalid_column() {
        // 1x5 strip with the middle pixel invalid.
        let validity = Grid::from_vec(5, 1, vec![true, true, false, true, true]).unwrap();
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let design =
                generate_stratified_design(&validity, 2, &PlacementConfig::default(), &mut rng)
                    .unwrap();
            assert!(!design.contains(Site::new(0, 2)));
            let expected = if design.sites[0].col <= 1 { 4 } else { 0 };
            assert_eq!(design.sites[1].col, expected);
        }
    }

    #[test]
    fn sites_are_distinct_and_valid() {
        let validity = Grid::from_fn(20, 15, |row, col| !(5..10).contains(&row) || col < 4);
        let mut rng = StdRng::seed_from_u64(21);
        let design =
            generate_stratified_design(&validity, 40, &PlacementConfig::default(), &mut rng)
                .unwrap();
        let unique: HashSet<_> = design.sites.iter().copied().collect();
        assert_eq!(unique.len(), 40);
        for site in &design.sites {
            assert_eq!(validity.get(site.row, site.col), Some(&true));
        }
    }

    #[test]
    fn more_sites_than_valid_pixels_is_infeasible() {
        let validity = Grid::from_fn(3, 3, |row, _| row == 0);
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_stratified_design(&validity, 4, &PlacementConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::Infeasible { step: 3, .. }));
    }

    #[test]
    fn zero_sites_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_stratified_design(
            &Grid::filled(2, 2, true),
            0,
            &PlacementConfig::default(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn events_mirror_the_design() {
        let validity = Grid::filled(8, 8, true);
        let mut rng = StdRng::seed_from_u64(3);
        let mut sink = VecSink::new();
        let config = PlacementConfig::default().with_distance_update(DistanceUpdate::Incremental);
        let design =
            generate_stratified_design_with_events(&validity, 5, &config, &mut rng, &mut sink)
                .unwrap();

        assert_eq!(sink.placed_sites(), design.sites);
        let distances: Vec<f64> = sink
            .as_slice()
            .iter()
            .filter_map(|e| match e {
                DesignEvent::SitePlaced { distance, .. } => Some(*distance),
                _ => None,
            })
            .collect();
        assert_eq!(distances[0], f64::INFINITY);
        assert!(distances[1..].iter().all(|d| d.is_finite()));
        assert!(matches!(
            sink.as_slice().first(),
            Some(DesignEvent::RunStarted {
                kind: DesignKind::Stratified,
                requested: 5,
                preplaced: 0
            })
        ));
        assert!(matches!(
            sink.as_slice().last(),
            Some(DesignEvent::RunFinished { placed: 5 })
        ));
    }

    #[test]
    fn same_seed_same_design() {
        let validity = Grid::from_fn(12, 9, |row, col| (row + 2 * col) % 5 != 0);
        let run = || {
            let mut rng = StdRng::seed_from_u64(77);
            generate_stratified_design(&validity, 12, &PlacementConfig::default(), &mut rng)
                .unwrap()
                .sites
        };
        assert_eq!(run(), run());
    }
}
