// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cms;
pub mod feeds;
pub mod metrics;
pub mod search;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::feeds::{NewsAggregator, PodcastService};
pub use crate::search::{SearchResults, SearchService};
