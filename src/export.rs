//! Flat-file exporters
//!
//! CSV and JSON writers for the cleaned dataset and the KPI reports.
//! Missing numeric values serialize as empty CSV cells, never as zero, and
//! identical input always produces byte-identical files.

use crate::error::Result;
use crate::services::aggregate_service::{FranchiseComparison, GroupStats, MetricSummary};
use crate::services::clean_service::MovieRow;
use crate::services::kpi_service::{MovieKpi, RankedMovie};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Separator for multi-valued cells (genres, cast, companies).
const LIST_SEPARATOR: &str = "|";

const CLEANED_HEADER: &[&str] = &[
    "id",
    "title",
    "tagline",
    "release_date",
    "genres",
    "collection_name",
    "original_language",
    "budget_musd",
    "revenue_musd",
    "production_companies",
    "production_countries",
    "vote_count",
    "vote_average",
    "popularity",
    "runtime",
    "overview",
    "spoken_languages",
    "poster_path",
    "cast",
    "cast_size",
    "director",
    "crew_size",
    "release_year",
];

/// Write the cleaned dataset as CSV.
pub fn write_cleaned_csv(rows: &[MovieRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CLEANED_HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            opt_str(row.title.as_deref()),
            opt_str(row.tagline.as_deref()),
            row.release_date.map(|d| d.to_string()).unwrap_or_default(),
            row.genres.iter().cloned().collect::<Vec<_>>().join(LIST_SEPARATOR),
            opt_str(row.collection_name.as_deref()),
            opt_str(row.original_language.as_deref()),
            opt_f64(row.budget_musd),
            opt_f64(row.revenue_musd),
            row.production_companies.join(LIST_SEPARATOR),
            row.production_countries.join(LIST_SEPARATOR),
            opt_u64(row.vote_count),
            opt_f64(row.vote_average),
            opt_f64(row.popularity),
            row.runtime.map(|r| r.to_string()).unwrap_or_default(),
            opt_str(row.overview.as_deref()),
            row.spoken_languages.join(LIST_SEPARATOR),
            opt_str(row.poster_path.as_deref()),
            row.cast.join(LIST_SEPARATOR),
            row.cast_size.to_string(),
            opt_str(row.director.as_deref()),
            row.crew_size.to_string(),
            row.release_year.map(|y| y.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote cleaned CSV");
    Ok(())
}

/// Write per-movie KPIs as CSV.
pub fn write_kpi_csv(kpis: &[MovieKpi], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "id",
        "title",
        "release_year",
        "budget_musd",
        "revenue_musd",
        "profit_musd",
        "roi",
        "popularity",
        "vote_average",
        "vote_count",
    ])?;

    for kpi in kpis {
        writer.write_record([
            kpi.id.to_string(),
            opt_str(kpi.title.as_deref()),
            kpi.release_year.map(|y| y.to_string()).unwrap_or_default(),
            opt_f64(kpi.budget_musd),
            opt_f64(kpi.revenue_musd),
            opt_f64(kpi.profit_musd),
            opt_f64(kpi.roi),
            opt_f64(kpi.popularity),
            opt_f64(kpi.vote_average),
            opt_u64(kpi.vote_count),
        ])?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = kpis.len(), "Wrote KPI CSV");
    Ok(())
}

/// Write one ranking table as CSV.
pub fn write_ranking_csv(ranking: &[RankedMovie], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["rank", "id", "title", "release_year", "value"])?;

    for entry in ranking {
        writer.write_record([
            entry.rank.to_string(),
            entry.id.to_string(),
            opt_str(entry.title.as_deref()),
            entry.release_year.map(|y| y.to_string()).unwrap_or_default(),
            entry.value.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one group-stats table as CSV. `key_header` names the group column
/// (genre, release_year, production_company).
pub fn write_group_stats_csv(
    stats: &BTreeMap<String, GroupStats>,
    key_header: &str,
    path: &Path,
) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![key_header.to_string(), "movie_count".to_string()];
    for metric in ["budget_musd", "revenue_musd", "roi", "popularity", "vote_average"] {
        header.push(format!("{}_count", metric));
        header.push(format!("{}_mean", metric));
        header.push(format!("{}_total", metric));
    }
    writer.write_record(&header)?;

    for (key, group) in stats {
        let mut record = vec![key.clone(), group.movie_count.to_string()];
        for summary in [
            group.budget_musd,
            group.revenue_musd,
            group.roi,
            group.popularity,
            group.vote_average,
        ] {
            push_summary(&mut record, summary);
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(path = %path.display(), groups = stats.len(), "Wrote group stats CSV");
    Ok(())
}

/// Write any serializable report as pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Read a JSON artifact back, e.g. the cleaned dataset for `report`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Franchise comparison goes out as JSON; the two cohorts are not a
/// natural fit for one flat table.
pub fn write_franchise_comparison(comparison: &FranchiseComparison, path: &Path) -> Result<()> {
    write_json(comparison, path)
}

fn push_summary(record: &mut Vec<String>, summary: Option<MetricSummary>) {
    match summary {
        Some(s) => {
            record.push(s.count.to_string());
            record.push(s.mean.to_string());
            record.push(s.total.to_string());
        }
        None => {
            record.push(String::new());
            record.push(String::new());
            record.push(String::new());
        }
    }
}

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_u64(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clean_service::CleanService;
    use crate::services::kpi_service::KpiService;
    use crate::tmdb::types::RawMovie;
    use serde_json::json;

    fn sample_rows() -> Vec<MovieRow> {
        let raw = vec![
            RawMovie {
                id: Some(json!(1)),
                title: Some("Breakout Hit".to_string()),
                budget: Some(json!(1000)),
                revenue: Some(json!(3000)),
                genres: Some(json!([{"id": 18, "name": "Drama"}])),
                ..Default::default()
            },
            RawMovie {
                id: Some(json!(2)),
                title: Some("Unknown Budget".to_string()),
                revenue: Some(json!(500)),
                ..Default::default()
            },
            RawMovie {
                id: Some(json!(3)),
                title: Some("Zero Budget".to_string()),
                budget: Some(json!(0)),
                revenue: Some(json!(0)),
                ..Default::default()
            },
        ];
        CleanService::clean(&raw).rows
    }

    #[test]
    fn missing_numeric_cells_are_empty_not_zero() {
        let rows = sample_rows();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies_cleaned.csv");
        write_cleaned_csv(&rows, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);

        // id 2 has no budget: the budget_musd cell is empty
        let id2: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(id2[7], "");
        // id 3 has an explicit zero budget
        let id3: Vec<&str> = lines[3].split(',').collect();
        assert_eq!(id3[7], "0");
    }

    #[test]
    fn identical_input_produces_identical_bytes() {
        let rows = sample_rows();
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");

        write_cleaned_csv(&rows, &first).unwrap();
        write_cleaned_csv(&rows, &second).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn kpi_csv_leaves_undefined_roi_empty() {
        let rows = sample_rows();
        let kpis = KpiService::compute(&rows);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpis.csv");
        write_kpi_csv(&kpis, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        let roi_cell = |line: &str| line.split(',').nth(6).unwrap().to_string();
        assert_eq!(roi_cell(lines[1]), "2");
        assert_eq!(roi_cell(lines[2]), "");
        assert_eq!(roi_cell(lines[3]), "");
    }

    #[test]
    fn cleaned_json_round_trip() {
        let rows = sample_rows();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies_cleaned.json");

        write_json(&rows, &path).unwrap();
        let restored: Vec<MovieRow> = read_json(&path).unwrap();

        assert_eq!(restored, rows);
    }
}
