use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dom::Document;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::item::{ItemParser, ParserOptions};
use crate::landing::{extract_top_item_urls, normalize_episode_path};
use crate::models::Record;

/// How records collected in one run are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupStrategy {
    /// Records are duplicates only when every field matches.
    #[default]
    FullRecord,
    /// One record per URL; the first one collected wins.
    Url,
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub base_url: String,
    pub sections: Vec<String>,
    pub concurrency: usize,
    pub dedup: DedupStrategy,
    pub parser: ParserOptions,
}

impl ScrapeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            sections: config.sections.clone(),
            concurrency: config.concurrency,
            dedup: config.dedup,
            parser: ParserOptions::default(),
        }
    }
}

pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<ItemParser>,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: ScrapeOptions) -> Self {
        Self {
            fetcher,
            parser: Arc::new(ItemParser::new(options.parser)),
            options,
        }
    }

    /// Scrapes the landing page and every item it links to.
    ///
    /// Never fails: a landing page that cannot be fetched gives an empty set,
    /// and items that cannot be fetched or have no title are left out.
    pub async fn run(&self) -> HashSet<Record> {
        let base = &self.options.base_url;
        let body = match self.fetcher.fetch_page(base).await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to fetch main page {}: {:#}", base, e);
                return HashSet::new();
            }
        };
        let fragments = {
            let page = Document::parse(&body);
            extract_top_item_urls(&page, &self.options.sections)
        };
        let item_urls: HashSet<String> = fragments
            .iter()
            .filter_map(|fragment| {
                let url = item_url(base, fragment);
                if url.is_none() {
                    debug!("Ignoring off-site link {}", fragment);
                }
                url
            })
            .collect();
        info!(
            "Found {} links, {} distinct items",
            fragments.len(),
            item_urls.len()
        );

        let records = self.scrape_items(item_urls).await;
        let records = dedup(records, self.options.dedup);
        info!("Scraped {} items.", records.len());
        for record in &records {
            info!("Scraped: {} ({}) - {}", record.title, record.year, record.kind);
        }
        records
    }

    async fn scrape_items(&self, urls: HashSet<String>) -> Vec<Record> {
        let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for url in urls {
            let fetcher = Arc::clone(&self.fetcher);
            let parser = Arc::clone(&self.parser);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                scrape_item(fetcher.as_ref(), &parser, &url).await
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => error!("Item task failed: {}", e),
            }
        }
        records
    }
}

async fn scrape_item(fetcher: &dyn PageFetcher, parser: &ItemParser, url: &str) -> Option<Record> {
    debug!("Fetching {}", url);
    let body = match fetcher.fetch_page(url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Skipping {}: {:#}", url, e);
            return None;
        }
    };
    let page = Document::parse(&body);
    parser.parse(&page, url)
}

/// Absolute item URL for a landing page link, with episode paths collapsed.
///
/// Absolute links are only followed when they point at the same host as
/// `base_url`; links to other sites give `None`.
pub fn item_url(base_url: &str, fragment: &str) -> Option<String> {
    let path = match split_origin(fragment) {
        Some((host, path)) => {
            let base_host = split_origin(base_url).map(|(h, _)| h)?;
            if !host.eq_ignore_ascii_case(base_host) {
                return None;
            }
            path
        }
        None => fragment,
    };
    Some(format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        normalize_episode_path(path)
    ))
}

/// Splits an `http(s)://host/path` URL into host and path (`/` when empty).
fn split_origin(url: &str) -> Option<(&str, &str)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    Some(match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    })
}

fn dedup(records: Vec<Record>, strategy: DedupStrategy) -> HashSet<Record> {
    match strategy {
        DedupStrategy::FullRecord => records.into_iter().collect(),
        DedupStrategy::Url => {
            let mut by_url: HashMap<String, Record> = HashMap::new();
            for record in records {
                by_url.entry(record.url.clone()).or_insert(record);
            }
            by_url.into_values().collect()
        }
    }
}

/// Builds an [`HttpFetcher`] from `config` and runs a full scrape.
pub async fn run(config: &Config) -> HashSet<Record> {
    let fetcher = match HttpFetcher::new(&config.headers(), config.timeout) {
        Ok(f) => f,
        Err(e) => {
            error!("Cannot build HTTP client: {:#}", e);
            return HashSet::new();
        }
    };
    Scraper::new(Arc::new(fetcher), ScrapeOptions::from_config(config))
        .run()
        .await
}
