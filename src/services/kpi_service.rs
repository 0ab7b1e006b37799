//! KPI Service
//!
//! Derives per-movie financial and engagement metrics from the cleaned
//! dataset and produces deterministic rankings. KPI records are recomputed
//! on demand and never persisted as a source of truth.

use crate::services::clean_service::MovieRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Derived metrics for one movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieKpi {
    pub id: u64,
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub budget_musd: Option<f64>,
    pub revenue_musd: Option<f64>,
    /// Revenue minus budget, defined when both are present.
    pub profit_musd: Option<f64>,
    /// (revenue - budget) / budget, defined only for a positive budget.
    pub roi: Option<f64>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
}

/// Metric a ranking can be keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Revenue,
    Budget,
    Profit,
    Roi,
    VoteAverage,
    VoteCount,
    Popularity,
}

impl RankMetric {
    fn value_of(&self, kpi: &MovieKpi) -> Option<f64> {
        match self {
            RankMetric::Revenue => kpi.revenue_musd,
            RankMetric::Budget => kpi.budget_musd,
            RankMetric::Profit => kpi.profit_musd,
            RankMetric::Roi => kpi.roi,
            RankMetric::VoteAverage => kpi.vote_average,
            RankMetric::VoteCount => kpi.vote_count.map(|v| v as f64),
            RankMetric::Popularity => kpi.popularity,
        }
    }
}

/// Sort direction for rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Descending,
    Ascending,
}

/// Qualification thresholds applied before ranking
#[derive(Debug, Clone, Copy, Default)]
pub struct RankFilter {
    pub min_budget_musd: Option<f64>,
    pub min_vote_count: Option<u64>,
}

impl RankFilter {
    fn admits(&self, kpi: &MovieKpi) -> bool {
        if let Some(min_budget) = self.min_budget_musd {
            if kpi.budget_musd.map_or(true, |b| b < min_budget) {
                return false;
            }
        }
        if let Some(min_votes) = self.min_vote_count {
            if kpi.vote_count.map_or(true, |v| v < min_votes) {
                return false;
            }
        }
        true
    }
}

/// One entry in a ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMovie {
    pub rank: usize,
    pub id: u64,
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub value: f64,
}

/// KPI calculation service
pub struct KpiService;

impl KpiService {
    /// Compute per-movie KPIs, preserving the row order of the input.
    pub fn compute(rows: &[MovieRow]) -> Vec<MovieKpi> {
        rows.iter().map(Self::compute_one).collect()
    }

    fn compute_one(row: &MovieRow) -> MovieKpi {
        MovieKpi {
            id: row.id,
            title: row.title.clone(),
            release_year: row.release_year,
            budget_musd: row.budget_musd,
            revenue_musd: row.revenue_musd,
            profit_musd: match (row.budget_musd, row.revenue_musd) {
                (Some(budget), Some(revenue)) => Some(revenue - budget),
                _ => None,
            },
            // ROI comes from the plain-USD amounts; the ratio is the same
            // either way but the raw integers divide exactly.
            roi: roi(row.budget, row.revenue),
            popularity: row.popularity,
            vote_average: row.vote_average,
            vote_count: row.vote_count,
        }
    }

    /// Rank movies by a metric.
    ///
    /// Movies with a missing metric are omitted, never ranked as zero.
    /// Ties break by ascending id, so repeated runs on identical input
    /// produce identical tables.
    pub fn rank_movies(
        kpis: &[MovieKpi],
        metric: RankMetric,
        order: RankOrder,
        top_n: usize,
        filter: RankFilter,
    ) -> Vec<RankedMovie> {
        let mut qualified: Vec<(&MovieKpi, f64)> = kpis
            .iter()
            .filter(|kpi| filter.admits(kpi))
            .filter_map(|kpi| metric.value_of(kpi).map(|value| (kpi, value)))
            .collect();

        qualified.sort_by(|(a, a_value), (b, b_value)| {
            let by_value = a_value.partial_cmp(b_value).unwrap_or(Ordering::Equal);
            let by_value = match order {
                RankOrder::Descending => by_value.reverse(),
                RankOrder::Ascending => by_value,
            };
            by_value.then(a.id.cmp(&b.id))
        });
        qualified.truncate(top_n);

        qualified
            .into_iter()
            .enumerate()
            .map(|(i, (kpi, value))| RankedMovie {
                rank: i + 1,
                id: kpi.id,
                title: kpi.title.clone(),
                release_year: kpi.release_year,
                value,
            })
            .collect()
    }

    pub fn top_by_revenue(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Revenue,
            RankOrder::Descending,
            top_n,
            RankFilter::default(),
        )
    }

    pub fn bottom_by_revenue(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Revenue,
            RankOrder::Ascending,
            top_n,
            RankFilter::default(),
        )
    }

    pub fn top_by_budget(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Budget,
            RankOrder::Descending,
            top_n,
            RankFilter::default(),
        )
    }

    pub fn top_by_profit(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Profit,
            RankOrder::Descending,
            top_n,
            RankFilter::default(),
        )
    }

    pub fn bottom_by_profit(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Profit,
            RankOrder::Ascending,
            top_n,
            RankFilter::default(),
        )
    }

    /// Highest ROI among movies with at least `min_budget_musd` of budget,
    /// filtering out low-budget outliers.
    pub fn top_by_roi(kpis: &[MovieKpi], top_n: usize, min_budget_musd: f64) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Roi,
            RankOrder::Descending,
            top_n,
            RankFilter {
                min_budget_musd: Some(min_budget_musd),
                ..Default::default()
            },
        )
    }

    pub fn bottom_by_roi(kpis: &[MovieKpi], top_n: usize, min_budget_musd: f64) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Roi,
            RankOrder::Ascending,
            top_n,
            RankFilter {
                min_budget_musd: Some(min_budget_musd),
                ..Default::default()
            },
        )
    }

    pub fn most_voted(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::VoteCount,
            RankOrder::Descending,
            top_n,
            RankFilter::default(),
        )
    }

    /// Highest rated among movies with at least `min_votes` votes.
    pub fn top_rated(kpis: &[MovieKpi], top_n: usize, min_votes: u64) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::VoteAverage,
            RankOrder::Descending,
            top_n,
            RankFilter {
                min_vote_count: Some(min_votes),
                ..Default::default()
            },
        )
    }

    pub fn bottom_rated(kpis: &[MovieKpi], top_n: usize, min_votes: u64) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::VoteAverage,
            RankOrder::Ascending,
            top_n,
            RankFilter {
                min_vote_count: Some(min_votes),
                ..Default::default()
            },
        )
    }

    pub fn most_popular(kpis: &[MovieKpi], top_n: usize) -> Vec<RankedMovie> {
        Self::rank_movies(
            kpis,
            RankMetric::Popularity,
            RankOrder::Descending,
            top_n,
            RankFilter::default(),
        )
    }
}

/// Return on investment, defined only for a positive budget. Both amounts
/// must share a unit.
///
/// Missing budget and an explicit zero budget both yield `None`; neither is
/// ever reported as zero or an error.
pub fn roi(budget: Option<f64>, revenue: Option<f64>) -> Option<f64> {
    match (budget, revenue) {
        (Some(budget), Some(revenue)) if budget > 0.0 => Some((revenue - budget) / budget),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn row(id: u64, budget: Option<f64>, revenue: Option<f64>) -> MovieRow {
        MovieRow {
            id,
            title: Some(format!("Movie {}", id)),
            tagline: None,
            release_date: None,
            release_year: None,
            genres: BTreeSet::new(),
            collection_name: None,
            original_language: None,
            budget,
            revenue,
            budget_musd: budget.map(|v| v / 1_000_000.0),
            revenue_musd: revenue.map(|v| v / 1_000_000.0),
            production_companies: Vec::new(),
            production_countries: Vec::new(),
            spoken_languages: Vec::new(),
            vote_count: None,
            vote_average: None,
            popularity: None,
            runtime: None,
            overview: None,
            poster_path: None,
            cast: Vec::new(),
            cast_size: 0,
            director: None,
            crew_size: 0,
        }
    }

    #[test]
    fn roi_defined_only_for_positive_budget() {
        let kpis = KpiService::compute(&[
            row(1, Some(1000.0), Some(3000.0)),
            row(2, None, Some(500.0)),
            row(3, Some(0.0), Some(0.0)),
        ]);

        assert_eq!(kpis[0].roi, Some(2.0));
        assert_eq!(kpis[1].roi, None);
        assert_eq!(kpis[2].roi, None);
    }

    #[test]
    fn profit_requires_both_amounts() {
        let kpis = KpiService::compute(&[
            row(1, Some(100_000_000.0), Some(350_000_000.0)),
            row(2, Some(100_000_000.0), None),
        ]);

        assert_eq!(kpis[0].profit_musd, Some(250.0));
        assert_eq!(kpis[1].profit_musd, None);
    }

    #[test]
    fn ranking_ties_break_by_ascending_id() {
        let mut a = row(9, None, Some(50.0));
        a.popularity = Some(80.0);
        let mut b = row(3, None, Some(50.0));
        b.popularity = Some(80.0);
        let mut c = row(7, None, None);
        c.popularity = Some(95.0);

        let kpis = KpiService::compute(&[a, b, c]);
        let ranking = KpiService::most_popular(&kpis, 10);

        let ids: Vec<u64> = ranking.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[2].rank, 3);
    }

    #[test]
    fn missing_metric_rows_are_omitted_not_zeroed() {
        let kpis = KpiService::compute(&[
            row(1, Some(10.0), Some(40.0)),
            row(2, None, Some(40.0)), // no budget, no ROI
        ]);

        let ranking = KpiService::rank_movies(
            &kpis,
            RankMetric::Roi,
            RankOrder::Ascending,
            10,
            RankFilter::default(),
        );

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].id, 1);
    }

    #[test]
    fn roi_ranking_honors_budget_floor() {
        let kpis = KpiService::compute(&[
            // huge ROI, tiny budget
            row(1, Some(500_000.0), Some(100_000_000.0)),
            row(2, Some(20_000_000.0), Some(80_000_000.0)),
        ]);

        let ranking = KpiService::top_by_roi(&kpis, 10, 10.0);

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].id, 2);
        assert_eq!(ranking[0].value, 3.0);
    }

    #[test]
    fn rated_rankings_honor_vote_floor() {
        let mut a = row(1, None, None);
        a.vote_average = Some(9.5);
        a.vote_count = Some(3);
        let mut b = row(2, None, None);
        b.vote_average = Some(7.0);
        b.vote_count = Some(500);

        let kpis = KpiService::compute(&[a, b]);
        let ranking = KpiService::top_rated(&kpis, 10, 10);

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].id, 2);
    }

    #[test]
    fn top_n_truncates() {
        let kpis = KpiService::compute(&[
            row(1, None, Some(10.0)),
            row(2, None, Some(30.0)),
            row(3, None, Some(20.0)),
        ]);

        let ranking = KpiService::top_by_revenue(&kpis, 2);

        let ids: Vec<u64> = ranking.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
