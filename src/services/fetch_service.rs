//! Fetch Service
//!
//! Drives sequential paginated fetching against the catalog API and writes
//! the raw audit trail for each run.

use crate::error::{AppError, Result};
use crate::tmdb::types::RawMovie;
use crate::tmdb::MovieCatalog;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Result of one fetch run
#[derive(Debug)]
pub struct FetchOutcome {
    pub movies: Vec<RawMovie>,
    pub pages_fetched: u32,
}

/// Fetch service for paginated collection
pub struct FetchService;

impl FetchService {
    /// Collect up to `target_count` movies from the discover listing.
    ///
    /// Pages are requested one at a time starting from page 1; the walk
    /// stops once the target is reached or the API reports no further
    /// pages. The returned sequence never exceeds `target_count`.
    pub async fn fetch_movies(
        catalog: &dyn MovieCatalog,
        target_count: usize,
        page_delay: Duration,
    ) -> Result<FetchOutcome> {
        let mut movies: Vec<RawMovie> = Vec::with_capacity(target_count);
        let mut pages_fetched = 0u32;
        let mut page = 1u32;

        while movies.len() < target_count {
            let result = catalog.discover_page(page).await?;
            pages_fetched += 1;

            if result.results.is_empty() {
                info!(page, "Discover page is empty, stopping");
                break;
            }

            movies.extend(result.results);
            info!(
                page,
                total_pages = result.total_pages,
                collected = movies.len().min(target_count),
                "Fetched discover page"
            );

            if page >= result.total_pages {
                break;
            }
            page += 1;

            if !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
        }

        movies.truncate(target_count);
        Ok(FetchOutcome {
            movies,
            pages_fetched,
        })
    }

    /// Replace discover stubs with full per-movie records, credits included.
    ///
    /// A permanent rejection for a single movie id is logged and the stub
    /// kept; auth failures and exhausted transient retries abort the run.
    pub async fn enrich_movies(
        catalog: &dyn MovieCatalog,
        movies: Vec<RawMovie>,
        page_delay: Duration,
    ) -> Result<Vec<RawMovie>> {
        let mut enriched = Vec::with_capacity(movies.len());

        for movie in movies {
            let Some(id) = movie.id_u64() else {
                enriched.push(movie);
                continue;
            };

            match catalog.movie_details(id).await {
                Ok(full) => enriched.push(full),
                Err(e @ AppError::Request(_)) => {
                    warn!(movie_id = id, "Skipping detail fetch: {}", e);
                    enriched.push(movie);
                }
                Err(e) => return Err(e),
            }

            if !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
        }

        Ok(enriched)
    }

    /// Write the accumulated raw sequence to one JSON file for this run.
    ///
    /// The file is the audit trail of what the API returned; it is never
    /// mutated afterwards.
    pub fn write_audit(movies: &[RawMovie], raw_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(raw_dir)?;

        let path = raw_dir.join(format!(
            "raw_movies_{}.json",
            Utc::now().format("%Y%m%dT%H%M%SZ")
        ));
        let json = serde_json::to_string_pretty(movies)?;
        std::fs::write(&path, json)?;

        info!(path = %path.display(), count = movies.len(), "Wrote raw fetch audit");
        Ok(path)
    }

    /// Read a raw audit file back, e.g. to clean a previous fetch run.
    pub fn read_audit(path: &Path) -> Result<Vec<RawMovie>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
