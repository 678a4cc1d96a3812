use anyhow::Result;
use csfd_scraper::{pipeline, Config, Record};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    info!(
        "Scraping {} (sections: {})",
        config.base_url,
        config.sections.join(", ")
    );

    let mut records: Vec<Record> = pipeline::run(&config).await.into_iter().collect();
    records.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.title.cmp(&b.title)));

    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}
