//! Filter Service
//!
//! Dataset search and filtering: by genre, cast member, director, release
//! year, and a combined multi-criteria search.

use crate::services::clean_service::MovieRow;
use std::cmp::Ordering;

/// Metric a search result set can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    VoteAverage,
    Revenue,
    Popularity,
    Runtime,
    ReleaseYear,
}

impl SortKey {
    fn value_of(&self, row: &MovieRow) -> Option<f64> {
        match self {
            SortKey::VoteAverage => row.vote_average,
            SortKey::Revenue => row.revenue_musd,
            SortKey::Popularity => row.popularity,
            SortKey::Runtime => row.runtime.map(|r| r as f64),
            SortKey::ReleaseYear => row.release_year.map(|y| y as f64),
        }
    }
}

/// Multi-criteria search query. Empty criteria match everything.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Every listed genre must be present.
    pub genres: Vec<String>,
    /// Any listed cast member matches.
    pub cast: Vec<String>,
    /// Any listed director matches.
    pub directors: Vec<String>,
    pub min_rating: Option<f64>,
    pub min_votes: Option<u64>,
    pub sort_by: SortKey,
    pub ascending: bool,
    pub top_n: Option<usize>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            cast: Vec::new(),
            directors: Vec::new(),
            min_rating: None,
            min_votes: None,
            sort_by: SortKey::VoteAverage,
            ascending: false,
            top_n: None,
        }
    }
}

/// Search service over the cleaned dataset
pub struct FilterService;

impl FilterService {
    /// Movies carrying the given genres. With `match_all` every genre must
    /// be present, otherwise any one suffices. Matching is case-insensitive
    /// substring, as in "Sci" matching "Science Fiction".
    pub fn by_genres(rows: &[MovieRow], genres: &[&str], match_all: bool) -> Vec<MovieRow> {
        rows.iter()
            .filter(|row| {
                let has = |wanted: &str| {
                    row.genres
                        .iter()
                        .any(|genre| contains_ignore_case(genre, wanted))
                };
                if match_all {
                    genres.iter().all(|g| has(g))
                } else {
                    genres.iter().any(|g| has(g))
                }
            })
            .cloned()
            .collect()
    }

    /// Movies where the given name appears in the top-billed cast.
    pub fn by_cast_member(rows: &[MovieRow], name: &str) -> Vec<MovieRow> {
        rows.iter()
            .filter(|row| row.cast.iter().any(|member| contains_ignore_case(member, name)))
            .cloned()
            .collect()
    }

    /// Movies by director name (partial match).
    pub fn by_director(rows: &[MovieRow], name: &str) -> Vec<MovieRow> {
        rows.iter()
            .filter(|row| {
                row.director
                    .as_deref()
                    .is_some_and(|director| contains_ignore_case(director, name))
            })
            .cloned()
            .collect()
    }

    /// Movies released within the inclusive year range.
    pub fn by_year_range(
        rows: &[MovieRow],
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Vec<MovieRow> {
        rows.iter()
            .filter(|row| match row.release_year {
                Some(year) => {
                    start_year.map_or(true, |s| year >= s) && end_year.map_or(true, |e| year <= e)
                }
                None => false,
            })
            .cloned()
            .collect()
    }

    /// Combined search. Rows with the sort metric missing sink to the end;
    /// ties and missing-metric runs order by ascending id.
    pub fn search(rows: &[MovieRow], query: &SearchQuery) -> Vec<MovieRow> {
        let mut result: Vec<MovieRow> = rows
            .iter()
            .filter(|row| {
                query.genres.iter().all(|wanted| {
                    row.genres
                        .iter()
                        .any(|genre| contains_ignore_case(genre, wanted))
                })
            })
            .filter(|row| {
                query.cast.is_empty()
                    || query.cast.iter().any(|wanted| {
                        row.cast
                            .iter()
                            .any(|member| contains_ignore_case(member, wanted))
                    })
            })
            .filter(|row| {
                query.directors.is_empty()
                    || query.directors.iter().any(|wanted| {
                        row.director
                            .as_deref()
                            .is_some_and(|director| contains_ignore_case(director, wanted))
                    })
            })
            .filter(|row| {
                query
                    .min_rating
                    .map_or(true, |min| row.vote_average.is_some_and(|v| v >= min))
            })
            .filter(|row| {
                query
                    .min_votes
                    .map_or(true, |min| row.vote_count.is_some_and(|v| v >= min))
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            let ordering = match (query.sort_by.value_of(a), query.sort_by.value_of(b)) {
                (Some(va), Some(vb)) => {
                    let by_value = va.partial_cmp(&vb).unwrap_or(Ordering::Equal);
                    if query.ascending {
                        by_value
                    } else {
                        by_value.reverse()
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            ordering.then(a.id.cmp(&b.id))
        });

        if let Some(top_n) = query.top_n {
            result.truncate(top_n);
        }
        result
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn row(id: u64, genres: &[&str]) -> MovieRow {
        MovieRow {
            id,
            title: Some(format!("Movie {}", id)),
            tagline: None,
            release_date: None,
            release_year: Some(2000 + id as i32),
            genres: genres.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
            collection_name: None,
            original_language: None,
            budget: None,
            revenue: None,
            budget_musd: None,
            revenue_musd: None,
            production_companies: Vec::new(),
            production_countries: Vec::new(),
            spoken_languages: Vec::new(),
            vote_count: Some(100),
            vote_average: Some(6.0),
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
    fn genre_match_all_vs_any() {
        let rows = vec![
            row(1, &["Action", "Science Fiction"]),
            row(2, &["Action"]),
            row(3, &["Drama"]),
        ];

        let both = FilterService::by_genres(&rows, &["Action", "Science Fiction"], true);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, 1);

        let any = FilterService::by_genres(&rows, &["Action", "Drama"], false);
        assert_eq!(any.len(), 3);
    }

    #[test]
    fn genre_matching_is_case_insensitive() {
        let rows = vec![row(1, &["Science Fiction"])];
        let hits = FilterService::by_genres(&rows, &["science fiction"], true);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn cast_and_director_partial_match() {
        let mut a = row(1, &[]);
        a.cast = vec!["Bruce Willis".to_string(), "Alan Rickman".to_string()];
        a.director = Some("John McTiernan".to_string());
        let b = row(2, &[]);

        let rows = vec![a, b];
        assert_eq!(FilterService::by_cast_member(&rows, "willis").len(), 1);
        assert_eq!(FilterService::by_director(&rows, "mctiernan").len(), 1);
        assert_eq!(FilterService::by_director(&rows, "tarantino").len(), 0);
    }

    #[test]
    fn year_range_excludes_undated_rows() {
        let mut undated = row(3, &[]);
        undated.release_year = None;
        let rows = vec![row(1, &[]), row(2, &[]), undated];

        let hits = FilterService::by_year_range(&rows, Some(2001), Some(2002));
        let ids: Vec<u64> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn search_combines_filters_and_sorts() {
        let mut a = row(1, &["Action"]);
        a.vote_average = Some(7.0);
        a.cast = vec!["Uma Thurman".to_string()];
        let mut b = row(2, &["Action"]);
        b.vote_average = Some(9.0);
        b.cast = vec!["Uma Thurman".to_string()];
        let mut c = row(3, &["Action"]);
        c.vote_average = Some(8.0);

        let query = SearchQuery {
            genres: vec!["Action".to_string()],
            cast: vec!["Uma Thurman".to_string()],
            ..Default::default()
        };
        let hits = FilterService::search(&[a, b, c], &query);

        let ids: Vec<u64> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn search_sorts_missing_metric_last() {
        let mut a = row(1, &[]);
        a.vote_average = None;
        let mut b = row(2, &[]);
        b.vote_average = Some(5.0);

        let hits = FilterService::search(&[a, b], &SearchQuery::default());
        let ids: Vec<u64> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
