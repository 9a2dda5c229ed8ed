pub mod tracker_config;
