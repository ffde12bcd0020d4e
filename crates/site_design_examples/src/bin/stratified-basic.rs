use rand::rngs::StdRng;
use rand::SeedableRng;
use site_design::prelude::*;
use site_design_examples::{init_tracing, lake_mask, render_design_to_png, write_design_csv, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // 120 x 90 landscape with a lake in the west.
    let validity = lake_mask(120, 90);
    let nsp = 30;

    let mut rng = StdRng::seed_from_u64(42);
    let design = generate_stratified_design(&validity, nsp, &PlacementConfig::default(), &mut rng)?;

    for (i, site) in design.sites.iter().enumerate() {
        tracing::info!("site {:>2}: row {:>3}, col {:>3}", i, site.row, site.col);
    }

    render_design_to_png(&design, None, &RenderConfig::default(), "stratified-basic.png")?;
    write_design_csv(&design, "stratified-basic.csv")?;

    Ok(())
}
