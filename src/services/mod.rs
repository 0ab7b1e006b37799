//! Services Layer
//!
//! Each pipeline stage is a service with explicit inputs and outputs;
//! stages hand each other immutable snapshots, never shared state.
//!
//! # Architecture
//!
//! ```text
//! Catalog API --> FetchService --> raw records --> CleanService --> rows
//!                                                                    |
//!                     reports <-- AggregateService / KpiService <----┘
//! ```
//!
//! # Services
//!
//! - `FetchService` - Paginated fetching and the raw audit trail
//! - `CleanService` - Normalization, deduplication, drop accounting
//! - `KpiService` - Per-movie metrics and rankings
//! - `AggregateService` - Group-level statistics
//! - `FilterService` - Dataset search and filtering

pub mod aggregate_service;
pub mod clean_service;
pub mod fetch_service;
pub mod filter_service;
pub mod kpi_service;

// Re-export commonly used types and services
pub use aggregate_service::{
    AggregateService, CohortSummary, DirectorStats, FranchiseComparison, FranchiseStats, GroupBy,
    GroupStats, MetricSummary,
};
pub use clean_service::{CleanReport, CleanService, DropCounts, MovieRow};
pub use fetch_service::{FetchOutcome, FetchService};
pub use filter_service::{FilterService, SearchQuery, SortKey};
pub use kpi_service::{KpiService, MovieKpi, RankFilter, RankMetric, RankOrder, RankedMovie};
