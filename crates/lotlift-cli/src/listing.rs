//! Marketplace listing output: text, photo files, and form preview.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use lotlift_core::{AppConfig, HistoryStore, ScrapeResult, Settings};
use lotlift_scraper::{
    download_photos, replay, ListingDraft, PhotoFile, PollConfig, SnapshotForm,
};

use crate::scrape::build_client;

fn load_result(store: &HistoryStore, id: &str) -> anyhow::Result<ScrapeResult> {
    store
        .get(id)?
        .ok_or_else(|| anyhow::anyhow!("no stored result with id '{id}'"))
}

/// Title and body text for a marketplace listing.
pub(crate) fn listing_text(result: &ScrapeResult) -> String {
    let title = lotlift_scraper::generate_facebook_title(&result.vehicle);
    let body = lotlift_scraper::generate_facebook_description(
        &result.vehicle,
        &result.dealer,
        result.vehicle.stock_number.as_deref(),
    );
    format!("{title}\n\n{body}")
}

pub(crate) fn run_listing(store: &HistoryStore, id: &str) -> anyhow::Result<()> {
    let result = load_result(store, id)?;
    println!("{}", listing_text(&result));
    Ok(())
}

async fn fetch_files(
    config: &AppConfig,
    settings: &Settings,
    result: &ScrapeResult,
) -> anyhow::Result<Vec<PhotoFile>> {
    let draft = ListingDraft::from_result(result, &settings.autofill_options);
    if draft.photos.is_empty() {
        return Ok(Vec::new());
    }
    let client = build_client(config)?;
    Ok(download_photos(
        &client,
        &draft.photos,
        settings.autofill_options.max_photos,
        config.fetch_concurrency,
    )
    .await)
}

pub(crate) fn write_files(files: &[PhotoFile], out: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    for file in files {
        let path = out.join(&file.file_name);
        std::fs::write(&path, &file.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

pub(crate) async fn run_photos(
    config: &AppConfig,
    settings: &Settings,
    store: &HistoryStore,
    id: &str,
    out: &Path,
) -> anyhow::Result<()> {
    let result = load_result(store, id)?;
    let files = fetch_files(config, settings, &result).await?;
    let options = &settings.autofill_options;
    if options.upload_photos && files.len() < result.photos.len().min(options.max_photos) {
        tracing::warn!(id, saved = files.len(), "some photos could not be downloaded");
    }
    write_files(&files, out)?;
    println!(
        "saved {} of {} photos to {}",
        files.len(),
        result.photos.len(),
        out.display()
    );
    Ok(())
}

pub(crate) async fn run_preview(
    config: &AppConfig,
    settings: &Settings,
    store: &HistoryStore,
    id: &str,
    form_path: &Path,
) -> anyhow::Result<()> {
    let result = load_result(store, id)?;
    let html = std::fs::read_to_string(form_path)
        .with_context(|| format!("failed to read {}", form_path.display()))?;
    let draft = ListingDraft::from_result(&result, &settings.autofill_options);
    let files = fetch_files(config, settings, &result).await?;

    let mut form = SnapshotForm::parse(&html);
    // A saved page never changes; one probe per field is enough.
    let poll = PollConfig {
        timeout: Duration::ZERO,
        ..PollConfig::default()
    };
    let report = replay(&mut form, &draft, &files, poll).await;

    for (field, value, tag) in &form.filled {
        let first_line = value.lines().next().unwrap_or_default();
        println!("fill   {:<15} <{tag}> {first_line}", field.name());
    }
    for field in &report.skipped {
        println!("skip   {}", field.name());
    }
    println!("photos {}", report.photos_attached);
    Ok(())
}
