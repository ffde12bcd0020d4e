//! PNG rendering of designs and tracing setup for the examples.
use std::path::Path;

use anyhow::Context;
use glam::DVec2;
use image::{Rgb, RgbImage};
use site_design::design::Design;
use site_design::strata::StratumTable;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a `fmt` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,site_design=debug"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

const STRATUM_PALETTE: [[u8; 3]; 10] = [
    [102, 153, 102],
    [153, 187, 119],
    [204, 204, 136],
    [221, 170, 102],
    [187, 119, 85],
    [136, 153, 187],
    [102, 119, 170],
    [170, 136, 187],
    [119, 170, 170],
    [170, 170, 170],
];

/// Colors and scale used by [`render_design_to_png`].
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Output pixels per landscape pixel.
    pub scale: u32,
    pub eligible: [u8; 3],
    pub ineligible: [u8; 3],
    pub site: [u8; 3],
    pub fixed_site: [u8; 3],
    /// Marker radius in output pixels.
    pub site_radius: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 6,
            eligible: [214, 222, 196],
            ineligible: [70, 110, 160],
            site: [200, 30, 30],
            fixed_site: [20, 20, 20],
            site_radius: 4.0,
        }
    }
}

impl RenderConfig {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            ..Default::default()
        }
    }

    pub fn with_site_radius(mut self, radius: f64) -> Self {
        self.site_radius = radius;
        self
    }

    pub fn with_colors(mut self, eligible: [u8; 3], ineligible: [u8; 3]) -> Self {
        self.eligible = eligible;
        self.ineligible = ineligible;
        self
    }
}

/// Render the design's eligibility grid and sites. With `strata`, eligible
/// pixels are colored by stratum.
pub fn render_design_to_png(
    design: &Design,
    strata: Option<&StratumTable>,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let grid = &design.eligibility;
    let scale = config.scale.max(1);
    let width = u32::try_from(grid.width())? * scale;
    let height = u32::try_from(grid.height())? * scale;
    let mut img = RgbImage::new(width, height);

    for (row, col, eligible) in grid.cells() {
        let color = if !*eligible {
            config.ineligible
        } else {
            match strata.and_then(|t| t.stratum_at(row, col)) {
                Some(id) => STRATUM_PALETTE[id.0 as usize % STRATUM_PALETTE.len()],
                None => config.eligible,
            }
        };
        let x0 = col as u32 * scale;
        let y0 = row as u32 * scale;
        for y in y0..y0 + scale {
            for x in x0..x0 + scale {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }

    for (i, site) in design.sites.iter().enumerate() {
        let color = if i < design.fixed {
            config.fixed_site
        } else {
            config.site
        };
        draw_disk(&mut img, site.center(f64::from(scale)), config.site_radius, color);
    }

    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn draw_disk(img: &mut RgbImage, center: DVec2, radius: f64, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    let min = (center - DVec2::splat(radius)).floor().max(DVec2::ZERO);
    let max = (center + DVec2::splat(radius))
        .ceil()
        .min(DVec2::new(f64::from(w) - 1.0, f64::from(h) - 1.0));
    for y in min.y as u32..=max.y as u32 {
        for x in min.x as u32..=max.x as u32 {
            let p = DVec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if p.distance_squared(center) <= radius * radius {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}
