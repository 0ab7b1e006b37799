//! Catalog API response types
//!
//! The API delivers several fields with shapes that vary across versions
//! (numbers as strings, genres as a list or a mapping). Those fields are
//! carried here as raw JSON values; all coercion is owned by the cleaner.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One movie as returned by the API, before any cleaning.
///
/// Immutable once fetched; the audit trail serializes these verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMovie {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belongs_to_collection: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_companies: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_countries: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoken_languages: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<Value>,
}

impl RawMovie {
    /// Movie identifier, if present and parseable.
    pub fn id_u64(&self) -> Option<u64> {
        self.id.as_ref().and_then(value_as_u64)
    }
}

/// One page of discover results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub results: Vec<RawMovie>,
}

/// Error envelope the API attaches to failed responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Coerce a JSON value to u64. Accepts integers and integer strings.
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value to f64. Accepts numbers and numeric strings.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_coercion_accepts_numbers_and_strings() {
        let mut movie = RawMovie {
            id: Some(json!(42)),
            ..Default::default()
        };
        assert_eq!(movie.id_u64(), Some(42));

        movie.id = Some(json!("42"));
        assert_eq!(movie.id_u64(), Some(42));

        movie.id = Some(json!("forty-two"));
        assert_eq!(movie.id_u64(), None);

        movie.id = Some(json!(-1));
        assert_eq!(movie.id_u64(), None);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(value_as_f64(&json!(1.5)), Some(1.5));
        assert_eq!(value_as_f64(&json!("2.25")), Some(2.25));
        assert_eq!(value_as_f64(&json!(null)), None);
        assert_eq!(value_as_f64(&json!([1])), None);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let movie: RawMovie =
            serde_json::from_value(json!({"id": 7, "adult": false, "video": false})).unwrap();
        assert_eq!(movie.id_u64(), Some(7));
    }
}
