pub mod band_tracker;
