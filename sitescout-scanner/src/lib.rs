pub mod crawler;
pub mod discover;
pub mod error;
pub mod result;
pub mod scope;
pub mod sitemap;

pub use crawler::{Crawler, ProgressCallback};
pub use discover::Discoverer;
pub use error::ScoutError;
pub use result::{Discovery, FetchFailure, Strategy, Traversal};
pub use scope::{Scope, ScopeGranularity};
pub use sitemap::SitemapHeuristic;
