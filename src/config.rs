use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::pipeline::DedupStrategy;

pub const DEFAULT_BASE_URL: &str = "https://www.csfd.cz";
pub const DEFAULT_USER_AGENT: &str = "csfd crawler";
pub const DEFAULT_SECTIONS: [&str; 2] = ["Nejnavštěvovanější seriály", "Nejnavštěvovanější filmy"];
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    pub sections: Vec<String>,
    pub timeout: Duration,
    pub concurrency: usize,
    pub dedup: DedupStrategy,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            dedup: DedupStrategy::FullRecord,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Config::default();

        if let Some(url) = get("CSFD_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ua) = get("CSFD_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(raw) = get("CSFD_SECTIONS") {
            config.sections = raw
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = get("CSFD_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("CSFD_TIMEOUT_SECS must be a number, got '{}'", raw))?;
            if secs == 0 {
                bail!("CSFD_TIMEOUT_SECS must be at least 1");
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("CSFD_CONCURRENCY") {
            let n: usize = raw
                .parse()
                .with_context(|| format!("CSFD_CONCURRENCY must be a number, got '{}'", raw))?;
            if n == 0 {
                bail!("CSFD_CONCURRENCY must be at least 1");
            }
            config.concurrency = n;
        }
        if let Some(raw) = get("CSFD_DEDUP") {
            config.dedup = match raw.to_ascii_lowercase().as_str() {
                "record" => DedupStrategy::FullRecord,
                "url" => DedupStrategy::Url,
                other => bail!("CSFD_DEDUP must be 'record' or 'url', got '{}'", other),
            };
        }
        if let Some(level) = get("CSFD_LOG_LEVEL") {
            config.log_level = level.to_ascii_lowercase();
        }
        Ok(config)
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![("User-Agent".to_string(), self.user_agent.clone())]
    }
}
