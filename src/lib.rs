//! Compare mAP50 and mAP50-95 curves of several object-detection training runs.
//!
//! ```text
//!  config.yaml ──► config::load ──► pipeline::load_series ──► chart::ComparisonChart
//!                                                                   │
//!                                             export::write_chart ◄─┴─► desktop viewer
//! ```

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod export;
pub mod pipeline;
