use rand::rngs::StdRng;
use rand::SeedableRng;
use site_design::prelude::*;
use site_design_examples::{
    init_tracing, lake_mask, read_records_csv, render_design_to_png, write_design_csv,
    write_records_csv, RenderConfig,
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let validity = lake_mask(120, 90);
    let nsp = 20;
    let resolution = 25.0; // metres per pixel
    let radius = 300.0; // metres

    let mut rng = StdRng::seed_from_u64(2025);
    let prior = generate_stratified_design(&validity, nsp, &PlacementConfig::default(), &mut rng)?;
    render_design_to_png(&prior, None, &RenderConfig::default(), "update-prior.png")?;

    // Field season: the first eight sites were sampled, three could not be reached.
    let mut records = prior.records();
    for record in records.iter_mut().take(8) {
        record.status = SiteStatus::Sampled;
    }
    for record in records.iter_mut().skip(8).take(3) {
        record.status = SiteStatus::Inaccessible;
    }
    write_records_csv(&records, "update-tagged.csv")?;

    let records = read_records_csv("update-tagged.csv")?;
    let request = UpdateRequest::new(records, validity, nsp)
        .with_radius(radius)
        .with_resolution(resolution);

    let mut sink = FnSink::new(|event| {
        if let DesignEvent::BufferApplied {
            centers,
            excluded_pixels,
        } = event
        {
            tracing::info!("Buffer around {} sites excluded {} pixels.", centers, excluded_pixels);
        }
    });
    let updated = update_stratified_design_with_events(&request, &mut rng, &mut sink)?;

    render_design_to_png(
        &updated,
        None,
        &RenderConfig::default(),
        "update-exclusion-buffer.png",
    )?;
    write_design_csv(&updated, "update-exclusion-buffer.csv")?;

    Ok(())
}
