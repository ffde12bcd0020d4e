#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use site_design::raster::Grid;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn pixels_throughput(width: usize, height: usize) -> Throughput {
    Throughput::Elements((width * height).max(1) as u64)
}

/// Square landscape with an invalid disk ("lake") in one quadrant.
pub fn lake_mask(size: usize) -> Grid<bool> {
    let cx = size as f64 * 0.3;
    let cy = size as f64 * 0.6;
    let r2 = (size as f64 * 0.15).powi(2);
    Grid::from_fn(size, size, |row, col| {
        let dx = col as f64 - cx;
        let dy = row as f64 - cy;
        dx * dx + dy * dy > r2
    })
}

/// Smooth synthetic metric in `[0, 1]`.
pub fn wave_metric(size: usize, frequency: f64) -> Grid<f64> {
    let scale = frequency / size as f64;
    Grid::from_fn(size, size, |row, col| {
        0.5 + 0.25 * ((row as f64 * scale).sin() + (col as f64 * scale * 1.3).cos())
    })
}
