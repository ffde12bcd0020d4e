//! Raster primitives: row-major grids and exact distance fields over them.
pub mod edt;
pub mod grid;

pub use edt::{
    distance_field, empty_field_value, scaled_distance_field, squared_distance_field,
    DistanceTransform,
};
pub use grid::Grid;
