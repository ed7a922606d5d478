//! History, export, and import handlers.

use std::path::Path;

use anyhow::Context;
use lotlift_core::{ExportDocument, HistoryStore, Settings};

use crate::scrape::summarize;

pub(crate) fn run_list(store: &HistoryStore) -> anyhow::Result<()> {
    let results = store.list()?;
    if results.is_empty() {
        println!("history is empty");
        return Ok(());
    }
    for result in &results {
        let title = lotlift_scraper::generate_facebook_title(&result.vehicle);
        println!(
            "{}  {}  {}",
            result.id,
            result.scraped_at.format("%Y-%m-%d %H:%M"),
            if title.is_empty() { &result.source_url } else { &title }
        );
    }
    Ok(())
}

pub(crate) fn run_show(store: &HistoryStore, id: &str) -> anyhow::Result<()> {
    let result = store
        .get(id)?
        .ok_or_else(|| anyhow::anyhow!("no stored result with id '{id}'"))?;
    println!("{}", summarize(&result));
    Ok(())
}

pub(crate) fn run_clear(store: &HistoryStore) -> anyhow::Result<()> {
    store.clear()?;
    println!("history cleared");
    Ok(())
}

pub(crate) fn run_export(store: &HistoryStore, settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let document = store.export(settings)?;
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "exported {} results to {}",
        document.scrape_results.len(),
        path.display()
    );
    Ok(())
}

/// Replace history from an export file. The file's settings are validated
/// and printed but not written back.
pub(crate) fn run_import(store: &HistoryStore, path: &Path) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: ExportDocument = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an export document", path.display()))?;
    let count = document.scrape_results.len();
    let settings = store.import(document)?;
    println!(
        "imported {} results; export settings: condition={}, uploadPhotos={}, maxPhotos={}",
        count.min(lotlift_core::HISTORY_LIMIT),
        settings.autofill_options.condition,
        settings.autofill_options.upload_photos,
        settings.autofill_options.max_photos
    );
    Ok(())
}
