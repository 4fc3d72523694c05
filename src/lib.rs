// Library entry point
pub mod chart;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod segments;
pub mod source;
