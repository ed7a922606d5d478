//! `lotlift scrape`: load a page, run the engine, and record the result.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use lotlift_core::{AppConfig, HistoryStore, ScrapeResult, Settings};
use lotlift_scraper::{fetch_page, Page, ScrapingEngine};

pub(crate) struct ScrapeOptions<'a> {
    pub url: &'a str,
    pub html: Option<&'a Path>,
    pub save: bool,
}

/// HTTP client shared by page fetches and photo downloads.
pub(crate) fn build_client(config: &AppConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(&config.user_agent)
        .build()
        .context("failed to build HTTP client")
}

async fn load_page(config: &AppConfig, options: &ScrapeOptions<'_>) -> anyhow::Result<Page> {
    if let Some(path) = options.html {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Page::parse(options.url, &html)?);
    }
    let client = build_client(config)?;
    fetch_page(&client, options.url)
        .await
        .with_context(|| format!("failed to fetch {}", options.url))
}

/// Human-readable summary printed after a scrape.
pub(crate) fn summarize(result: &ScrapeResult) -> String {
    let v = &result.vehicle;
    let title = lotlift_scraper::generate_facebook_title(v);
    let mut lines = vec![
        format!("id:       {}", result.id),
        format!(
            "vehicle:  {}",
            if title.is_empty() { "(unknown)" } else { title.as_str() }
        ),
    ];
    if let Some(price) = v.price {
        lines.push(format!(
            "price:    {}",
            lotlift_scraper::normalize::format_price(price)
        ));
    }
    if let Some(mileage) = v.mileage {
        lines.push(format!(
            "mileage:  {}",
            lotlift_scraper::normalize::format_mileage(mileage)
        ));
    }
    if let Some(vin) = v.vin.as_deref() {
        lines.push(format!("vin:      {vin}"));
    }
    if let Some(dealer) = result.dealer.name.as_deref() {
        lines.push(format!("dealer:   {dealer}"));
    }
    lines.push(format!("photos:   {}", result.photos.len()));
    for warning in &result.warnings {
        lines.push(format!("warning:  {warning}"));
    }
    lines.join("\n")
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    settings: &Settings,
    store: &HistoryStore,
    options: &ScrapeOptions<'_>,
) -> anyhow::Result<()> {
    let page = load_page(config, options).await?;
    let engine = ScrapingEngine::new(settings);
    let result = engine
        .scrape_page(&page)
        .with_context(|| format!("scrape failed for {}", options.url))?;

    println!("{}", summarize(&result));
    if options.save {
        let id = result.id.clone();
        store
            .push(result)
            .with_context(|| format!("failed to save to {}", store.path().display()))?;
        tracing::info!(%id, path = %store.path().display(), "saved to history");
    }
    Ok(())
}
