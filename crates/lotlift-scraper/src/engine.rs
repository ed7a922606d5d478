//! Adapter selection, guarded invocation, and post-hoc validation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use lotlift_core::{ScrapeResult, Settings};
use regex::Regex;

use crate::adapters::Adapter;
use crate::error::ScraperError;
use crate::page::Page;

const MIN_YEAR: i32 = 1950;
const MIN_PRICE: u64 = 100;
const MAX_PRICE: u64 = 1_000_000;
const MAX_MILEAGE: u64 = 1_000_000;

static FULL_VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("valid VIN regex"));

/// Picks an adapter for a page and runs it.
#[derive(Debug, Clone)]
pub struct ScrapingEngine {
    enabled: Vec<Adapter>,
}

impl Default for ScrapingEngine {
    fn default() -> Self {
        Self::all()
    }
}

impl ScrapingEngine {
    /// Engine limited to the adapters that `settings` enables.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let enabled = Adapter::ALL
            .into_iter()
            .filter(|adapter| settings.site_enabled(adapter.name()))
            .collect();
        Self { enabled }
    }

    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: Adapter::ALL.to_vec(),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> &[Adapter] {
        &self.enabled
    }

    fn is_enabled(&self, adapter: Adapter) -> bool {
        self.enabled.contains(&adapter)
    }

    /// First site adapter whose host and vehicle-page pattern both match,
    /// else the generic adapter if it accepts the URL.
    #[must_use]
    pub fn select_adapter(&self, page: &Page) -> Option<Adapter> {
        let url = page.url();
        let hostname = page.hostname();
        let host = hostname.as_str();

        let site = Adapter::SITE_ADAPTERS.into_iter().find(|adapter| {
            self.is_enabled(*adapter) && adapter.matches_host(host) && adapter.is_vehicle_page(url)
        });
        if let Some(adapter) = site {
            tracing::debug!(%adapter, host, "selected site adapter");
            return Some(adapter);
        }

        let generic = Adapter::Generic;
        if self.is_enabled(generic) && generic.is_vehicle_page(url) {
            tracing::debug!(host, "falling back to generic adapter");
            return Some(generic);
        }

        tracing::debug!(host, "no adapter accepts this page");
        None
    }

    /// Scrape `page` with the selected adapter and append validation warnings.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoSuitableAdapter`] when no enabled adapter
    /// accepts the URL, or [`ScraperError::AdapterFailed`] if the adapter
    /// panics.
    pub fn scrape_page(&self, page: &Page) -> Result<ScrapeResult, ScraperError> {
        let adapter =
            self.select_adapter(page)
                .ok_or_else(|| ScraperError::NoSuitableAdapter {
                    url: page.url().to_string(),
                })?;

        let mut result = run_guarded(adapter.name(), || adapter.scrape(page))?;
        for warning in validate_result(&result) {
            if !result.warnings.contains(&warning) {
                result.warnings.push(warning);
            }
        }

        tracing::info!(
            %adapter,
            id = %result.id,
            photos = result.photos.len(),
            warnings = result.warnings.len(),
            "scrape complete"
        );
        Ok(result)
    }
}

/// Run `scrape`, turning a panic into [`ScraperError::AdapterFailed`].
fn run_guarded<F>(adapter: &str, scrape: F) -> Result<ScrapeResult, ScraperError>
where
    F: FnOnce() -> ScrapeResult,
{
    panic::catch_unwind(AssertUnwindSafe(scrape)).map_err(|payload| {
        let reason = panic_reason(payload.as_ref());
        tracing::error!(adapter, %reason, "adapter failed");
        ScraperError::AdapterFailed {
            adapter: adapter.to_string(),
            reason,
        }
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Range and completeness checks. Never changes the data.
#[must_use]
pub fn validate_result(result: &ScrapeResult) -> Vec<String> {
    let vehicle = &result.vehicle;
    let mut warnings = Vec::new();

    let missing = [
        ("year", vehicle.year.is_none()),
        ("make", vehicle.make.is_none()),
        ("model", vehicle.model.is_none()),
        ("price", vehicle.price.is_none()),
    ];
    for (field, absent) in missing {
        if absent {
            warnings.push(format!("Missing required field: {field}"));
        }
    }

    if let Some(vin) = vehicle.vin.as_deref() {
        if !FULL_VIN_RE.is_match(vin) {
            warnings.push(format!("Invalid VIN format: {vin}"));
        }
    }

    let max_year = Utc::now().year() + 1;
    if let Some(year) = vehicle.year {
        if !(MIN_YEAR..=max_year).contains(&year) {
            warnings.push(format!("Year {year} outside {MIN_YEAR}..{max_year}"));
        }
    }
    if let Some(price) = vehicle.price {
        if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
            warnings.push(format!("Price {price} outside {MIN_PRICE}..{MAX_PRICE}"));
        }
    }
    if let Some(mileage) = vehicle.mileage {
        if mileage > MAX_MILEAGE {
            warnings.push(format!("Mileage {mileage} outside 0..{MAX_MILEAGE}"));
        }
    }

    if result.photos.is_empty() {
        warnings.push("No photos found".to_string());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use lotlift_core::{Dealer, Photo, Vehicle};

    use super::*;

    fn page(raw: &str) -> Page {
        Page::parse(raw, "<html></html>").unwrap()
    }

    fn enabling(sites: &[&str]) -> Settings {
        Settings {
            enabled_sites: sites.iter().map(ToString::to_string).collect(),
            ..Settings::default()
        }
    }

    fn result_with(vehicle: Vehicle, photos: usize) -> ScrapeResult {
        ScrapeResult {
            id: "generic_1_abc".to_string(),
            vehicle,
            dealer: Dealer::default(),
            photos: (0..photos)
                .map(|i| Photo {
                    url: format!("https://img.example/{i}.jpg"),
                    width: None,
                    height: None,
                    is_main: false,
                })
                .collect(),
            source_url: "https://dealer.example/vehicle/1".to_string(),
            scraped_at: Utc::now(),
            warnings: Vec::new(),
        }
    }

    fn complete_vehicle() -> Vehicle {
        Vehicle {
            year: Some(2023),
            make: Some("Honda".to_string()),
            model: Some("Civic".to_string()),
            price: Some(25_999),
            mileage: Some(15_234),
            vin: Some("1HGCM82633A004352".to_string()),
            ..Vehicle::default()
        }
    }

    #[test]
    fn site_adapter_wins_over_generic() {
        let engine = ScrapingEngine::all();
        let chosen = engine.select_adapter(&page("https://www.cars.com/vehicledetail/abc-123/"));
        assert_eq!(chosen, Some(Adapter::CarsDotCom));
    }

    #[test]
    fn non_vehicle_site_page_falls_back_to_generic() {
        let engine = ScrapingEngine::all();
        // cars.com host, but not a detail page; generic accepts the "car" keyword.
        let chosen = engine.select_adapter(&page("https://www.cars.com/shopping/results/"));
        assert_eq!(chosen, Some(Adapter::Generic));
    }

    #[test]
    fn no_adapter_for_unrelated_page() {
        let engine = ScrapingEngine::all();
        assert_eq!(engine.select_adapter(&page("https://example.org/about")), None);
    }

    #[test]
    fn disabled_adapters_are_skipped() {
        let engine = ScrapingEngine::new(&enabling(&["generic"]));
        let chosen = engine.select_adapter(&page("https://www.cars.com/vehicledetail/abc-123/"));
        assert_eq!(chosen, Some(Adapter::Generic));

        let engine = ScrapingEngine::new(&enabling(&["carsdotcom"]));
        assert_eq!(
            engine.select_adapter(&page("https://dealer.example/used-car/42")),
            None
        );
    }

    #[test]
    fn empty_site_list_enables_everything() {
        assert_eq!(ScrapingEngine::new(&Settings::default()).enabled(), Adapter::ALL.as_slice());
    }

    #[test]
    fn scrape_page_reports_unsupported_page() {
        let page = Page::parse("https://example.org/about", "<html></html>").unwrap();
        let err = ScrapingEngine::all().scrape_page(&page).unwrap_err();
        assert!(matches!(err, ScraperError::NoSuitableAdapter { .. }));
    }

    #[test]
    fn panic_becomes_adapter_failed() {
        let err = run_guarded("generic", || panic!("selector table corrupt")).unwrap_err();
        match err {
            ScraperError::AdapterFailed { adapter, reason } => {
                assert_eq!(adapter, "generic");
                assert_eq!(reason, "selector table corrupt");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let err = run_guarded("cargurus", || panic!("bad row {}", 3)).unwrap_err();
        assert!(err.to_string().contains("cargurus adapter failed: bad row 3"));
    }

    #[test]
    fn complete_result_has_no_warnings() {
        assert!(validate_result(&result_with(complete_vehicle(), 1)).is_empty());
    }

    #[test]
    fn missing_fields_and_photos_are_flagged() {
        let warnings = validate_result(&result_with(Vehicle::default(), 0));
        assert_eq!(
            warnings,
            vec![
                "Missing required field: year",
                "Missing required field: make",
                "Missing required field: model",
                "Missing required field: price",
                "No photos found",
            ]
        );
    }

    #[test]
    fn out_of_range_values_are_flagged_not_dropped() {
        let vehicle = Vehicle {
            year: Some(1932),
            price: Some(50),
            mileage: Some(1_200_000),
            ..complete_vehicle()
        };
        let result = result_with(vehicle.clone(), 1);
        let warnings = validate_result(&result);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].starts_with("Year 1932"));
        assert!(warnings[1].starts_with("Price 50"));
        assert!(warnings[2].starts_with("Mileage 1200000"));
        assert_eq!(result.vehicle, vehicle);
    }

    #[test]
    fn next_model_year_is_accepted() {
        let vehicle = Vehicle {
            year: Some(Utc::now().year() + 1),
            ..complete_vehicle()
        };
        assert!(validate_result(&result_with(vehicle, 1)).is_empty());
    }

    #[test]
    fn malformed_vin_is_flagged() {
        let vehicle = Vehicle {
            vin: Some("1HGCM82633A00435".to_string()),
            ..complete_vehicle()
        };
        let warnings = validate_result(&result_with(vehicle, 1));
        assert_eq!(warnings, vec!["Invalid VIN format: 1HGCM82633A00435"]);
    }
}
