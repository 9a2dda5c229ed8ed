pub mod bounded_window;
