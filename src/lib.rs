pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod feature;
pub mod metrics;
pub mod pipeline;
pub mod plottable;
pub mod run;
pub mod signal;
