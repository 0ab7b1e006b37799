//! MovieMetrics - TMDB Movie Analytics Pipeline
//!
//! Fetches movie metadata from the TMDB REST API, cleans it into a flat
//! tabular dataset, and derives financial and engagement KPIs. The whole
//! pipeline is sequential: one HTTP request at a time, immutable snapshots
//! handed between stages, flat files as the only persistence.

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod services;
pub mod tmdb;
