//! Movie catalog API adapter

pub mod client;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use types::{DiscoverPage, RawMovie};

pub use client::TmdbClient;

/// Read-only interface to a paginated movie catalog API.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetch one page of the discover listing. Pages are 1-based.
    async fn discover_page(&self, page: u32) -> Result<DiscoverPage>;

    /// Fetch the full record for a single movie, credits included.
    async fn movie_details(&self, movie_id: u64) -> Result<RawMovie>;
}
