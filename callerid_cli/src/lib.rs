//! Command line harness around the caller identity cache
pub mod config;
pub mod output;
pub mod providers;
