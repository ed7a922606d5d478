//! Bounded, newest-first history of scrape results plus the export/import
//! document.
//!
//! Writes are read-modify-write against a single JSON file with no locking;
//! one process is assumed to own the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::listing::ScrapeResult;
use crate::settings::{validate_settings, Settings};

/// Maximum number of results kept; the oldest are evicted first.
pub const HISTORY_LIMIT: usize = 50;

/// Portable snapshot of history and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub scrape_results: Vec<ScrapeResult>,
    #[serde(default)]
    pub settings: Settings,
}

/// JSON-file backed history store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored results, newest first. A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the file cannot be read or parsed.
    pub fn list(&self) -> Result<Vec<ScrapeResult>, HistoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Look up a stored result by id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history cannot be loaded.
    pub fn get(&self, id: &str) -> Result<Option<ScrapeResult>, HistoryError> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Prepend `result` and evict anything past [`HISTORY_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history cannot be loaded or written.
    pub fn push(&self, result: ScrapeResult) -> Result<(), HistoryError> {
        let mut results = self.list()?;
        results.insert(0, result);
        let evicted = results.len().saturating_sub(HISTORY_LIMIT);
        results.truncate(HISTORY_LIMIT);
        if evicted > 0 {
            tracing::debug!(evicted, "history limit reached; dropped oldest results");
        }
        self.write(&results)
    }

    /// Remove every stored result.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the file cannot be written.
    pub fn clear(&self) -> Result<(), HistoryError> {
        self.write(&[])
    }

    /// Bundle current history with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history cannot be loaded.
    pub fn export(&self, settings: &Settings) -> Result<ExportDocument, HistoryError> {
        Ok(ExportDocument {
            scrape_results: self.list()?,
            settings: settings.clone(),
        })
    }

    /// Replace history with the document's results and hand back its
    /// settings. Results beyond [`HISTORY_LIMIT`] are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::InvalidExport`] for duplicate ids,
    /// [`HistoryError::Settings`] for invalid settings, or an I/O error.
    pub fn import(&self, document: ExportDocument) -> Result<Settings, HistoryError> {
        validate_settings(&document.settings)?;

        let mut seen = std::collections::HashSet::new();
        for result in &document.scrape_results {
            if !seen.insert(result.id.as_str()) {
                return Err(HistoryError::InvalidExport(format!(
                    "duplicate scrape result id '{}'",
                    result.id
                )));
            }
        }

        let mut results = document.scrape_results;
        results.truncate(HISTORY_LIMIT);
        self.write(&results)?;
        Ok(document.settings)
    }

    fn write(&self, results: &[ScrapeResult]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(results).map_err(|source| HistoryError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, body).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
