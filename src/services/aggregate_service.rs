//! Aggregate Service
//!
//! Group-level statistics over the cleaned dataset: per-genre/year/company
//! summaries, franchise vs standalone comparison, and per-franchise and
//! per-director tables.

use crate::services::clean_service::MovieRow;
use crate::services::kpi_service::roi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// count/mean/total of one metric within one group.
///
/// Only rows where the metric is present qualify; a metric with zero
/// qualifying rows is omitted entirely rather than reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub total: f64,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total: f64 = values.iter().sum();
        Some(Self {
            count: values.len(),
            mean: total / values.len() as f64,
            total,
        })
    }
}

/// Aggregated metrics for one group key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub movie_count: usize,
    pub budget_musd: Option<MetricSummary>,
    pub revenue_musd: Option<MetricSummary>,
    pub roi: Option<MetricSummary>,
    pub popularity: Option<MetricSummary>,
    pub vote_average: Option<MetricSummary>,
}

/// Grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Genre,
    ReleaseYear,
    ProductionCompany,
}

/// Summary of one cohort in the franchise comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub movie_count: usize,
    pub mean_revenue_musd: Option<f64>,
    pub median_roi: Option<f64>,
    pub mean_budget_musd: Option<f64>,
    pub mean_popularity: Option<f64>,
    pub mean_rating: Option<f64>,
}

/// Franchise vs standalone comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseComparison {
    pub franchise: CohortSummary,
    pub standalone: CohortSummary,
}

/// Statistics for one franchise (collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseStats {
    pub franchise: String,
    pub movie_count: usize,
    pub total_budget_musd: f64,
    pub mean_budget_musd: Option<f64>,
    pub total_revenue_musd: f64,
    pub mean_revenue_musd: Option<f64>,
    pub mean_rating: Option<f64>,
}

/// Statistics for one director
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorStats {
    pub director: String,
    pub movie_count: usize,
    pub total_revenue_musd: f64,
    pub mean_revenue_musd: Option<f64>,
    pub mean_rating: Option<f64>,
}

/// Aggregation service for group-level summaries
pub struct AggregateService;

impl AggregateService {
    /// Aggregate the dataset along one dimension.
    ///
    /// A movie with several genres or companies contributes to each of its
    /// groups. Groups with no rows never appear; the BTreeMap keeps output
    /// order deterministic.
    pub fn group_stats(rows: &[MovieRow], group_by: GroupBy) -> BTreeMap<String, GroupStats> {
        let mut buckets: BTreeMap<String, Vec<&MovieRow>> = BTreeMap::new();
        for row in rows {
            for key in Self::keys_for(row, group_by) {
                buckets.entry(key).or_default().push(row);
            }
        }

        buckets
            .into_iter()
            .map(|(key, members)| (key, Self::stats_for(&members)))
            .collect()
    }

    fn keys_for(row: &MovieRow, group_by: GroupBy) -> Vec<String> {
        match group_by {
            GroupBy::Genre => row.genres.iter().cloned().collect(),
            GroupBy::ReleaseYear => row
                .release_year
                .map(|year| year.to_string())
                .into_iter()
                .collect(),
            GroupBy::ProductionCompany => row.production_companies.clone(),
        }
    }

    fn stats_for(members: &[&MovieRow]) -> GroupStats {
        let collect = |select: fn(&MovieRow) -> Option<f64>| -> Vec<f64> {
            members.iter().filter_map(|row| select(row)).collect()
        };

        GroupStats {
            movie_count: members.len(),
            budget_musd: MetricSummary::from_values(&collect(|r| r.budget_musd)),
            revenue_musd: MetricSummary::from_values(&collect(|r| r.revenue_musd)),
            roi: MetricSummary::from_values(&collect(|r| roi(r.budget, r.revenue))),
            popularity: MetricSummary::from_values(&collect(|r| r.popularity)),
            vote_average: MetricSummary::from_values(&collect(|r| r.vote_average)),
        }
    }

    /// Compare movies that belong to a collection against standalone ones.
    pub fn compare_franchise_vs_standalone(rows: &[MovieRow]) -> FranchiseComparison {
        let (franchise, standalone): (Vec<&MovieRow>, Vec<&MovieRow>) =
            rows.iter().partition(|row| row.collection_name.is_some());

        FranchiseComparison {
            franchise: Self::cohort_summary(&franchise),
            standalone: Self::cohort_summary(&standalone),
        }
    }

    fn cohort_summary(members: &[&MovieRow]) -> CohortSummary {
        let mut roi_values: Vec<f64> = members
            .iter()
            .filter_map(|row| roi(row.budget, row.revenue))
            .collect();

        CohortSummary {
            movie_count: members.len(),
            mean_revenue_musd: mean(members.iter().filter_map(|r| r.revenue_musd)),
            median_roi: median(&mut roi_values),
            mean_budget_musd: mean(members.iter().filter_map(|r| r.budget_musd)),
            mean_popularity: mean(members.iter().filter_map(|r| r.popularity)),
            mean_rating: mean(members.iter().filter_map(|r| r.vote_average)),
        }
    }

    /// Per-franchise table, sorted by total revenue descending (name breaks
    /// ties). Standalone movies do not appear.
    pub fn franchise_stats(rows: &[MovieRow]) -> Vec<FranchiseStats> {
        let mut buckets: BTreeMap<&str, Vec<&MovieRow>> = BTreeMap::new();
        for row in rows {
            if let Some(name) = row.collection_name.as_deref() {
                buckets.entry(name).or_default().push(row);
            }
        }

        let mut stats: Vec<FranchiseStats> = buckets
            .into_iter()
            .map(|(name, members)| FranchiseStats {
                franchise: name.to_string(),
                movie_count: members.len(),
                total_budget_musd: members.iter().filter_map(|r| r.budget_musd).sum(),
                mean_budget_musd: mean(members.iter().filter_map(|r| r.budget_musd)),
                total_revenue_musd: members.iter().filter_map(|r| r.revenue_musd).sum(),
                mean_revenue_musd: mean(members.iter().filter_map(|r| r.revenue_musd)),
                mean_rating: mean(members.iter().filter_map(|r| r.vote_average)),
            })
            .collect();

        stats.sort_by(|a, b| {
            b.total_revenue_musd
                .partial_cmp(&a.total_revenue_musd)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.franchise.cmp(&b.franchise))
        });
        stats
    }

    /// Per-director table, sorted by total revenue descending (name breaks
    /// ties). Movies without a director do not appear.
    pub fn director_stats(rows: &[MovieRow]) -> Vec<DirectorStats> {
        let mut buckets: BTreeMap<&str, Vec<&MovieRow>> = BTreeMap::new();
        for row in rows {
            if let Some(name) = row.director.as_deref() {
                buckets.entry(name).or_default().push(row);
            }
        }

        let mut stats: Vec<DirectorStats> = buckets
            .into_iter()
            .map(|(name, members)| DirectorStats {
                director: name.to_string(),
                movie_count: members.len(),
                total_revenue_musd: members.iter().filter_map(|r| r.revenue_musd).sum(),
                mean_revenue_musd: mean(members.iter().filter_map(|r| r.revenue_musd)),
                mean_rating: mean(members.iter().filter_map(|r| r.vote_average)),
            })
            .collect();

        stats.sort_by(|a, b| {
            b.total_revenue_musd
                .partial_cmp(&a.total_revenue_musd)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.director.cmp(&b.director))
        });
        stats
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
