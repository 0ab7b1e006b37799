//! Clean Service
//!
//! Normalizes raw API records into the canonical tabular dataset: type
//! coercion, nested-field flattening, deduplication, and drop accounting.
//! Row-level problems are counted, never raised.

use crate::tmdb::types::{value_as_f64, value_as_u64, RawMovie};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Text values the API uses as stand-ins for "no data".
const TEXT_PLACEHOLDERS: &[&str] = &["No Data", "No Overview", "n/a", "nan"];

/// Cast members kept per movie.
const TOP_CAST: usize = 5;

/// One cleaned, normalized movie row.
///
/// Missing numeric fields stay `None`; an explicit zero from the API stays
/// `Some(0.0)`. The two are distinguishable all the way to the KPI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRow {
    pub id: u64,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub release_year: Option<i32>,
    pub genres: BTreeSet<String>,
    pub collection_name: Option<String>,
    pub original_language: Option<String>,
    /// Budget in plain USD as reported by the API.
    pub budget: Option<f64>,
    /// Revenue in plain USD as reported by the API.
    pub revenue: Option<f64>,
    pub budget_musd: Option<f64>,
    pub revenue_musd: Option<f64>,
    pub production_companies: Vec<String>,
    pub production_countries: Vec<String>,
    pub spoken_languages: Vec<String>,
    pub vote_count: Option<u64>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub runtime: Option<u32>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub cast: Vec<String>,
    pub cast_size: u32,
    pub director: Option<String>,
    pub crew_size: u32,
}

/// Row-level drop counters, reported alongside the cleaned rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Identifier absent or unparseable.
    pub missing_id: usize,
    /// Non-empty release date that does not parse as YYYY-MM-DD.
    pub invalid_date: usize,
    /// Status field present and not "Released".
    pub not_released: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_id + self.invalid_date + self.not_released
    }
}

/// Output of one cleaning pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReport {
    /// Cleaned rows in ascending-id order.
    pub rows: Vec<MovieRow>,
    pub total_input: usize,
    /// Raw records replaced by a later record with the same id.
    pub duplicates_replaced: usize,
    pub drops: DropCounts,
}

enum DropReason {
    InvalidDate,
    NotReleased,
}

/// Cleaning service for raw movie records
pub struct CleanService;

impl CleanService {
    /// Clean a raw sequence into the canonical row set.
    ///
    /// Deduplication is by id with the later record winning. Output order
    /// is ascending id, so cleaning the same input twice is byte-identical.
    pub fn clean(raw: &[RawMovie]) -> CleanReport {
        let mut by_id: BTreeMap<u64, MovieRow> = BTreeMap::new();
        let mut drops = DropCounts::default();
        let mut duplicates_replaced = 0usize;

        for movie in raw {
            let Some(id) = movie.id_u64() else {
                drops.missing_id += 1;
                continue;
            };

            match Self::clean_one(id, movie) {
                Ok(row) => {
                    if by_id.insert(id, row).is_some() {
                        duplicates_replaced += 1;
                    }
                }
                Err(DropReason::InvalidDate) => drops.invalid_date += 1,
                Err(DropReason::NotReleased) => drops.not_released += 1,
            }
        }

        let report = CleanReport {
            rows: by_id.into_values().collect(),
            total_input: raw.len(),
            duplicates_replaced,
            drops,
        };

        info!(
            input = report.total_input,
            cleaned = report.rows.len(),
            duplicates_replaced = report.duplicates_replaced,
            dropped = report.drops.total(),
            "Cleaned raw movie records"
        );

        report
    }

    fn clean_one(id: u64, raw: &RawMovie) -> Result<MovieRow, DropReason> {
        if let Some(status) = raw.status.as_deref() {
            if status != "Released" {
                return Err(DropReason::NotReleased);
            }
        }

        let release_date = parse_release_date(raw.release_date.as_deref())?;
        let (cast, cast_size, director, crew_size) = extract_credits(raw.credits.as_ref());
        let budget = coerce_amount(raw.budget.as_ref());
        let revenue = coerce_amount(raw.revenue.as_ref());

        Ok(MovieRow {
            id,
            title: clean_text(raw.title.as_deref()),
            tagline: clean_text(raw.tagline.as_deref()),
            release_date,
            release_year: release_date.map(|d| d.year()),
            genres: extract_genres(raw.genres.as_ref()),
            collection_name: extract_object_name(raw.belongs_to_collection.as_ref()),
            original_language: clean_text(raw.original_language.as_deref()),
            budget,
            revenue,
            budget_musd: budget.map(|v| v / 1_000_000.0),
            revenue_musd: revenue.map(|v| v / 1_000_000.0),
            production_companies: extract_names(raw.production_companies.as_ref()),
            production_countries: extract_names(raw.production_countries.as_ref()),
            spoken_languages: extract_names(raw.spoken_languages.as_ref()),
            vote_count: raw.vote_count.as_ref().and_then(value_as_u64),
            vote_average: raw.vote_average.as_ref().and_then(value_as_f64),
            popularity: raw.popularity.as_ref().and_then(value_as_f64),
            runtime: coerce_runtime(raw.runtime.as_ref()),
            overview: clean_text(raw.overview.as_deref()),
            poster_path: clean_text(raw.poster_path.as_deref()),
            cast,
            cast_size,
            director,
            crew_size,
        })
    }
}

/// Absent or empty dates stay missing; anything else must be YYYY-MM-DD.
fn parse_release_date(raw: Option<&str>) -> Result<Option<NaiveDate>, DropReason> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| DropReason::InvalidDate),
    }
}

/// Monetary amount in plain USD. Negative amounts are treated as unreported;
/// an explicit zero is preserved.
fn coerce_amount(value: Option<&Value>) -> Option<f64> {
    let amount = value.and_then(value_as_f64)?;
    if amount < 0.0 {
        return None;
    }
    Some(amount)
}

/// Runtime in minutes. Zero-minute runtimes are API filler, not data.
fn coerce_runtime(value: Option<&Value>) -> Option<u32> {
    let minutes = value.and_then(value_as_u64)?;
    if minutes == 0 {
        return None;
    }
    u32::try_from(minutes).ok()
}

fn clean_text(value: Option<&str>) -> Option<String> {
    let s = value?.trim();
    if s.is_empty() || TEXT_PLACEHOLDERS.iter().any(|p| s.eq_ignore_ascii_case(p)) {
        return None;
    }
    Some(s.to_string())
}

/// Genre names from either shape the API uses: a list of `{id, name}`
/// objects, or a mapping of id to name.
fn extract_genres(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Object(map)) => {
            if let Some(name) = map.get("name").and_then(Value::as_str) {
                return std::iter::once(name.to_string()).collect();
            }
            map.values()
                .filter_map(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        }
        _ => BTreeSet::new(),
    }
}

/// `name` fields from a list of objects, API order preserved.
fn extract_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// `name` of a single nested object, e.g. `belongs_to_collection`.
fn extract_object_name(value: Option<&Value>) -> Option<String> {
    let name = value?.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// Top cast names, cast size, director, and crew size from `credits`.
fn extract_credits(value: Option<&Value>) -> (Vec<String>, u32, Option<String>, u32) {
    let Some(credits) = value.and_then(Value::as_object) else {
        return (Vec::new(), 0, None, 0);
    };

    let cast_list = credits
        .get("cast")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let crew_list = credits
        .get("crew")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let cast: Vec<String> = cast_list
        .iter()
        .take(TOP_CAST)
        .filter_map(|member| member.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let director = crew_list
        .iter()
        .find(|member| member.get("job").and_then(Value::as_str) == Some("Director"))
        .and_then(|member| member.get("name").and_then(Value::as_str))
        .map(str::to_string);

    (
        cast,
        cast_list.len() as u32,
        director,
        crew_list.len() as u32,
    )
}
