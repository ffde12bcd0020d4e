//! Synthetic landscapes used by the examples.
use site_design::raster::Grid;

/// All-valid landscape with an elliptical lake of invalid pixels.
pub fn lake_mask(width: usize, height: usize) -> Grid<bool> {
    let cx = width as f64 * 0.35;
    let cy = height as f64 * 0.55;
    let rx = width as f64 * 0.18;
    let ry = height as f64 * 0.22;
    Grid::from_fn(width, height, |row, col| {
        let dx = (col as f64 - cx) / rx;
        let dy = (row as f64 - cy) / ry;
        dx * dx + dy * dy > 1.0
    })
}

/// Elevation rising from the south-west corner to the north-east corner.
pub fn elevation_ramp(width: usize, height: usize) -> Grid<f64> {
    Grid::from_fn(width, height, |row, col| {
        let x = col as f64 / width as f64;
        let y = 1.0 - row as f64 / height as f64;
        200.0 + 800.0 * (0.6 * x + 0.4 * y)
    })
}

/// Moisture index in `[0, 1]` with a few soft ridges.
pub fn moisture_waves(width: usize, height: usize) -> Grid<f64> {
    Grid::from_fn(width, height, |row, col| {
        let x = col as f64 / width as f64 * std::f64::consts::TAU;
        let y = row as f64 / height as f64 * std::f64::consts::TAU;
        0.5 + 0.25 * ((1.5 * x).sin() + (2.0 * y + 0.7 * x).cos())
    })
}
