//! Euclidean Distance Transform (EDT) of occupied-pixel masks.
//!
//! Every pixel receives the Euclidean distance to the nearest occupied pixel.
//! Squared distances are sums of squared integer offsets, so they are exact in
//! `f64` and ties between equally distant pixels compare exactly.
//!
//! This implementation is based on the Felzenszwalb-Huttenlocher algorithm,
//! which computes exact Euclidean distances using a separable approach with
//! two 1D passes.
use crate::raster::Grid;

/// Value assigned to every pixel of a grid without occupied pixels.
///
/// `width² + height²` is strictly larger than any squared distance between two
/// pixels of the grid, so an empty field ranks every pixel equally.
pub fn empty_field_value(width: usize, height: usize) -> f64 {
    (width * width + height * height) as f64
}

/// Reusable scratch buffers for repeated transforms.
#[derive(Debug, Default, Clone)]
pub struct DistanceTransform {
    v: Vec<usize>,
    z: Vec<f64>,
    line_in: Vec<f64>,
    line_out: Vec<f64>,
}

impl DistanceTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Squared distance to the nearest occupied pixel, written into `out`.
    ///
    /// `out` is reshaped to the shape of `occupied` when needed.
    pub fn squared_into(&mut self, occupied: &Grid<bool>, out: &mut Grid<f64>) {
        let (w, h) = occupied.size();
        if !out.same_shape(occupied) {
            *out = Grid::filled(w, h, 0.0);
        }
        if w == 0 || h == 0 {
            return;
        }

        let far = empty_field_value(w, h);
        let n = w.max(h);
        self.v.resize(n, 0);
        self.z.resize(n + 1, 0.0);
        self.line_in.resize(n, 0.0);
        self.line_out.resize(n, 0.0);

        // First pass: rows
        let cells = out.as_mut_slice();
        for y in 0..h {
            let row = &occupied.as_slice()[y * w..(y + 1) * w];
            for (x, &o) in row.iter().enumerate() {
                self.line_in[x] = if o { 0.0 } else { far };
            }
            edt_1d(
                &self.line_in[..w],
                &mut self.line_out[..w],
                &mut self.v[..w],
                &mut self.z[..w + 1],
            );
            cells[y * w..(y + 1) * w].copy_from_slice(&self.line_out[..w]);
        }

        // Second pass: columns
        for x in 0..w {
            for y in 0..h {
                self.line_in[y] = cells[y * w + x];
            }
            edt_1d(
                &self.line_in[..h],
                &mut self.line_out[..h],
                &mut self.v[..h],
                &mut self.z[..h + 1],
            );
            for y in 0..h {
                cells[y * w + x] = self.line_out[y].min(far);
            }
        }
    }

    /// Squared distance to the nearest occupied pixel.
    pub fn squared(&mut self, occupied: &Grid<bool>) -> Grid<f64> {
        let mut out = Grid::filled(occupied.width(), occupied.height(), 0.0);
        self.squared_into(occupied, &mut out);
        out
    }
}

/// Squared Euclidean distance from every pixel to the nearest occupied pixel.
pub fn squared_distance_field(occupied: &Grid<bool>) -> Grid<f64> {
    DistanceTransform::new().squared(occupied)
}

/// Euclidean distance from every pixel to the nearest occupied pixel, in pixels.
pub fn distance_field(occupied: &Grid<bool>) -> Grid<f64> {
    scaled_distance_field(occupied, 1.0)
}

/// Euclidean distance in physical units, given the size of one pixel.
pub fn scaled_distance_field(occupied: &Grid<bool>, resolution: f64) -> Grid<f64> {
    let mut field = squared_distance_field(occupied);
    for d in field.as_mut_slice() {
        *d = d.sqrt() * resolution;
    }
    field
}

/// Computes the 1D squared distance transform using the lower envelope algorithm.
fn edt_1d(f: &[f64], output: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    debug_assert_eq!(
        f.len(),
        output.len(),
        "Input and output must have same length"
    );
    debug_assert!(v.len() >= n && z.len() > n);

    let mut k = 0;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    // Compute lower envelope
    for q in 1..n {
        let mut s = intersection_safe(q, v[k], f);
        while s <= z[k] {
            // z[0] is -inf, so k never underflows here
            k -= 1;
            s = intersection_safe(q, v[k], f);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    // Fill output with minimum values
    k = 0;
    for (q, dq) in output.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dx = q as f64 - v[k] as f64;
        *dq = dx * dx + f[v[k]];
    }
}

/// Computes the intersection point of two parabolas in the lower envelope.
fn intersection_safe(i: usize, j: usize, f: &[f64]) -> f64 {
    debug_assert!(i < f.len() && j < f.len(), "Indices must be within bounds");

    if i == j {
        return f64::INFINITY;
    }

    let fi = f[i];
    let fj = f[j];

    if !fi.is_finite() || !fj.is_finite() {
        return f64::INFINITY;
    }

    let numerator = (fi + (i * i) as f64) - (fj + (j * j) as f64);
    let denominator = 2.0 * (i as f64 - j as f64);

    numerator / denominator
}
