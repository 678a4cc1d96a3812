pub mod config;
pub mod dom;
pub mod fetch;
pub mod item;
pub mod landing;
pub mod models;
pub mod pipeline;

pub use config::Config;
pub use fetch::{HttpFetcher, PageFetcher};
pub use models::{ItemKind, Record};
pub use pipeline::{DedupStrategy, ScrapeOptions, Scraper};
