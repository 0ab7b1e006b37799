//! End-to-end pipeline orchestration
//!
//! Each stage consumes the previous stage's output as an immutable
//! snapshot: fetch -> audit -> clean -> KPIs -> aggregates -> reports.
//! A failed fetch halts the run with its cause; a dirty dataset still
//! produces cleaned output plus a drop-count report.

use crate::config::Settings;
use crate::error::Result;
use crate::export;
use crate::services::aggregate_service::{AggregateService, GroupBy};
use crate::services::clean_service::{CleanReport, CleanService, DropCounts, MovieRow};
use crate::services::fetch_service::FetchService;
use crate::services::kpi_service::KpiService;
use crate::tmdb::types::RawMovie;
use crate::tmdb::TmdbClient;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// What a pipeline run produced
#[derive(Debug)]
pub struct PipelineSummary {
    pub fetched: usize,
    pub pages_fetched: u32,
    pub audit_file: PathBuf,
    pub cleaned: usize,
    pub duplicates_replaced: usize,
    pub drops: DropCounts,
    pub outputs: Vec<PathBuf>,
}

/// Run the full fetch -> clean -> report pipeline.
pub async fn run_pipeline(settings: &Settings, api_key: String) -> Result<PipelineSummary> {
    let (movies, pages_fetched, audit_file) = fetch_stage(settings, api_key).await?;

    let report = CleanService::clean(&movies);
    let mut outputs = write_cleaned(settings, &report)?;
    outputs.extend(write_reports(settings, &report.rows)?);

    info!(
        fetched = movies.len(),
        cleaned = report.rows.len(),
        dropped = report.drops.total(),
        "Pipeline run complete"
    );

    Ok(PipelineSummary {
        fetched: movies.len(),
        pages_fetched,
        audit_file,
        cleaned: report.rows.len(),
        duplicates_replaced: report.duplicates_replaced,
        drops: report.drops,
        outputs,
    })
}

/// Fetch raw movies and write the audit trail, without cleaning.
pub async fn run_fetch(settings: &Settings, api_key: String) -> Result<PathBuf> {
    let (_, _, audit_file) = fetch_stage(settings, api_key).await?;
    Ok(audit_file)
}

/// Clean a previously fetched audit file and export the dataset.
pub fn run_clean(settings: &Settings, input: &Path) -> Result<CleanReport> {
    let movies = FetchService::read_audit(input)?;
    info!(input = %input.display(), count = movies.len(), "Cleaning raw audit file");

    let report = CleanService::clean(&movies);
    write_cleaned(settings, &report)?;
    Ok(report)
}

/// Recompute KPI reports from a cleaned JSON dataset.
pub fn run_report(settings: &Settings, input: &Path) -> Result<Vec<PathBuf>> {
    let rows: Vec<MovieRow> = export::read_json(input)?;
    info!(input = %input.display(), rows = rows.len(), "Recomputing KPI reports");

    write_reports(settings, &rows)
}

async fn fetch_stage(
    settings: &Settings,
    api_key: String,
) -> Result<(Vec<RawMovie>, u32, PathBuf)> {
    let client = TmdbClient::new(&settings.api, &settings.fetch.sort_by, api_key)?;
    let page_delay = Duration::from_millis(settings.api.rate_limit_delay_ms);

    info!(
        target_count = settings.fetch.target_count,
        sort_by = %settings.fetch.sort_by,
        "Starting fetch"
    );

    let outcome =
        FetchService::fetch_movies(&client, settings.fetch.target_count, page_delay).await?;

    let movies = if settings.fetch.fetch_credits {
        FetchService::enrich_movies(&client, outcome.movies, page_delay).await?
    } else {
        outcome.movies
    };

    let audit_file = FetchService::write_audit(&movies, &settings.paths.raw_dir)?;
    Ok((movies, outcome.pages_fetched, audit_file))
}

fn write_cleaned(settings: &Settings, report: &CleanReport) -> Result<Vec<PathBuf>> {
    let dir = &settings.paths.processed_dir;
    let csv_path = dir.join("movies_cleaned.csv");
    let json_path = dir.join("movies_cleaned.json");
    let drops_path = dir.join("clean_report.json");

    export::write_cleaned_csv(&report.rows, &csv_path)?;
    export::write_json(&report.rows, &json_path)?;
    export::write_json(
        &serde_json::json!({
            "total_input": report.total_input,
            "cleaned": report.rows.len(),
            "duplicates_replaced": report.duplicates_replaced,
            "drops": report.drops,
        }),
        &drops_path,
    )?;

    Ok(vec![csv_path, json_path, drops_path])
}

fn write_reports(settings: &Settings, rows: &[MovieRow]) -> Result<Vec<PathBuf>> {
    let dir = &settings.paths.reports_dir;
    let analysis = &settings.analysis;
    let kpis = KpiService::compute(rows);
    let mut outputs = Vec::new();

    let kpi_path = dir.join("movie_kpis.csv");
    export::write_kpi_csv(&kpis, &kpi_path)?;
    outputs.push(kpi_path);

    let rankings = [
        (
            "top_revenue.csv",
            KpiService::top_by_revenue(&kpis, analysis.top_n),
        ),
        (
            "bottom_revenue.csv",
            KpiService::bottom_by_revenue(&kpis, analysis.top_n),
        ),
        (
            "top_budget.csv",
            KpiService::top_by_budget(&kpis, analysis.top_n),
        ),
        (
            "top_profit.csv",
            KpiService::top_by_profit(&kpis, analysis.top_n),
        ),
        (
            "bottom_profit.csv",
            KpiService::bottom_by_profit(&kpis, analysis.top_n),
        ),
        (
            "top_roi.csv",
            KpiService::top_by_roi(&kpis, analysis.top_n, analysis.min_budget_musd),
        ),
        (
            "bottom_roi.csv",
            KpiService::bottom_by_roi(&kpis, analysis.top_n, analysis.min_budget_musd),
        ),
        (
            "most_voted.csv",
            KpiService::most_voted(&kpis, analysis.top_n),
        ),
        (
            "top_rated.csv",
            KpiService::top_rated(&kpis, analysis.top_n, analysis.min_vote_count),
        ),
        (
            "bottom_rated.csv",
            KpiService::bottom_rated(&kpis, analysis.top_n, analysis.min_vote_count),
        ),
        (
            "most_popular.csv",
            KpiService::most_popular(&kpis, analysis.top_n),
        ),
    ];
    for (name, ranking) in &rankings {
        let path = dir.join(name);
        export::write_ranking_csv(ranking, &path)?;
        outputs.push(path);
    }

    let groupings = [
        ("stats_by_genre.csv", GroupBy::Genre, "genre"),
        ("stats_by_year.csv", GroupBy::ReleaseYear, "release_year"),
        (
            "stats_by_company.csv",
            GroupBy::ProductionCompany,
            "production_company",
        ),
    ];
    for (name, group_by, key_header) in groupings {
        let stats = AggregateService::group_stats(rows, group_by);
        let path = dir.join(name);
        export::write_group_stats_csv(&stats, key_header, &path)?;
        outputs.push(path);
    }

    let comparison = AggregateService::compare_franchise_vs_standalone(rows);
    let comparison_path = dir.join("franchise_vs_standalone.json");
    export::write_franchise_comparison(&comparison, &comparison_path)?;
    outputs.push(comparison_path);

    let directors = AggregateService::director_stats(rows);
    let directors_path = dir.join("director_stats.json");
    export::write_json(&directors, &directors_path)?;
    outputs.push(directors_path);

    let franchises = AggregateService::franchise_stats(rows);
    let franchises_path = dir.join("franchise_stats.json");
    export::write_json(&franchises, &franchises_path)?;
    outputs.push(franchises_path);

    Ok(outputs)
}
