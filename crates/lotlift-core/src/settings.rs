use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::vehicle::Condition;
use crate::ConfigError;

/// Adapter names accepted in `enabledSites`, in dispatch order.
pub const SITE_NAMES: [&str; 5] = [
    "autotrader",
    "carsdotcom",
    "cargurus",
    "dealerdotcom",
    "generic",
];

/// Marketplace listings accept at most this many photos per upload batch.
pub const MAX_PHOTOS_LIMIT: usize = 50;

const DEFAULT_MAX_PHOTOS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillOptions {
    #[serde(default)]
    pub condition: Condition,
    #[serde(default = "default_upload_photos")]
    pub upload_photos: bool,
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
}

impl Default for AutofillOptions {
    fn default() -> Self {
        Self {
            condition: Condition::default(),
            upload_photos: default_upload_photos(),
            max_photos: default_max_photos(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub autofill_options: AutofillOptions,
    /// Adapter names allowed to handle a page. Empty means all of them.
    #[serde(default)]
    pub enabled_sites: Vec<String>,
}

impl Settings {
    /// Returns `true` if the adapter called `name` may be selected.
    #[must_use]
    pub fn site_enabled(&self, name: &str) -> bool {
        self.enabled_sites.is_empty() || self.enabled_sites.iter().any(|s| s == name)
    }
}

fn default_upload_photos() -> bool {
    true
}

fn default_max_photos() -> usize {
    DEFAULT_MAX_PHOTOS
}

/// Load and validate settings from a YAML file. A missing file yields defaults.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "settings file not found; using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let settings: Settings = serde_yaml::from_str(&content)?;
    validate_settings(&settings)?;

    Ok(settings)
}

/// Check value ranges and site names.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] describing the first problem found.
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let max = settings.autofill_options.max_photos;
    if max == 0 || max > MAX_PHOTOS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "maxPhotos {max} out of range; must be 1..={MAX_PHOTOS_LIMIT}"
        )));
    }

    let mut seen = HashSet::new();
    for site in &settings.enabled_sites {
        if !SITE_NAMES.contains(&site.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown site '{site}' in enabledSites; expected one of {}",
                SITE_NAMES.join(", ")
            )));
        }
        if !seen.insert(site.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site '{site}' in enabledSites"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_apply_to_empty_document() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.autofill_options.max_photos, 20);
        assert!(settings.autofill_options.upload_photos);
        assert_eq!(settings.autofill_options.condition, Condition::Used);
    }

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = "autofillOptions:\n  condition: CertifiedPreOwned\n  uploadPhotos: false\n  maxPhotos: 8\nenabledSites: [carsdotcom, generic]\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            settings.autofill_options.condition,
            Condition::CertifiedPreOwned
        );
        assert!(!settings.autofill_options.upload_photos);
        assert_eq!(settings.autofill_options.max_photos, 8);
        assert!(settings.site_enabled("generic"));
        assert!(!settings.site_enabled("autotrader"));
    }

    #[test]
    fn empty_enabled_sites_enables_everything() {
        let settings = Settings::default();
        assert!(SITE_NAMES.iter().all(|s| settings.site_enabled(s)));
    }

    #[test]
    fn validate_rejects_zero_max_photos() {
        let mut settings = Settings::default();
        settings.autofill_options.max_photos = 0;
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("maxPhotos 0 out of range"));
    }

    #[test]
    fn validate_rejects_unknown_site() {
        let settings = Settings {
            enabled_sites: vec!["craigslist".to_string()],
            ..Settings::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("unknown site 'craigslist'"));
    }

    #[test]
    fn validate_rejects_duplicate_site() {
        let settings = Settings {
            enabled_sites: vec!["cargurus".to_string(), "cargurus".to_string()],
            ..Settings::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("duplicate site"));
    }

    #[test]
    fn load_settings_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_settings_reads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "autofillOptions:\n  maxPhotos: 99").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
