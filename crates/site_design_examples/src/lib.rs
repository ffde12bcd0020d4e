#![forbid(unsafe_code)]

mod records;
mod rendering;
mod synthetic;

pub use records::{read_records_csv, write_design_csv, write_records_csv, RecordRow};
pub use rendering::{init_tracing, render_design_to_png, RenderConfig};
pub use synthetic::{elevation_ramp, lake_mask, moisture_waves};
