use rand::rngs::StdRng;
use rand::SeedableRng;
use site_design::prelude::*;
use site_design_examples::{
    elevation_ramp, init_tracing, lake_mask, moisture_waves, render_design_to_png,
    write_design_csv, RenderConfig,
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let (width, height) = (120, 90);
    let validity = lake_mask(width, height);

    // Three elevation bands crossed with two moisture classes.
    let plan = UniformPlan::new(24)
        .with_layer(MetricLayer::new("elevation", elevation_ramp(width, height), 3))
        .with_layer(MetricLayer::new("moisture", moisture_waves(width, height), 2))
        .with_placement(PlacementConfig::default().with_distance_update(DistanceUpdate::Incremental));

    let (lower, upper) = suggest_sample_bounds(plan.nsp, 6);
    tracing::info!("Even allocations over 6 strata: {} or {} sites.", lower, upper);

    let mut rng = StdRng::seed_from_u64(7);
    let mut sink = VecSink::new();
    let result = generate_uniform_design_with_events(&validity, &plan, &mut rng, &mut sink)?;
    tracing::info!(
        "{} of {} placements broke a distance tie.",
        sink.tied_placements(),
        sink.placed_sites().len()
    );

    for metric in &result.metrics {
        tracing::info!(
            "{}: edges {:?}, histogram {:?}",
            metric.name,
            metric.edges.as_slice(),
            metric.histogram
        );
    }
    for stratum in result.strata.iter() {
        tracing::info!(
            "stratum {}: bins {:?}, {} pixels, target {}, {} sites",
            stratum.id,
            stratum.bins,
            stratum.population,
            stratum.target,
            stratum.frequency
        );
    }
    if !result.dropped.is_empty() {
        tracing::warn!("Dropped strata: {:?}", result.dropped);
    }

    render_design_to_png(
        &result.design,
        Some(&result.strata),
        &RenderConfig::default(),
        "uniform-two-metrics.png",
    )?;
    write_design_csv(&result.design, "uniform-two-metrics.csv")?;

    Ok(())
}
