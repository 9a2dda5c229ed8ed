pub mod common;
pub mod config;
pub mod math;
pub mod window;

pub use config::tracker_config::TrackerConfig;
pub use math::band_tracker::{BandMetric, BandTracker};
pub use window::bounded_window::BoundedWindow;
