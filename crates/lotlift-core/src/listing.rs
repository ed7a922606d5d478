//! Dealer, photo, and the per-scrape aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vehicle::Vehicle;

/// Selling dealer, populated best-effort per adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dealer {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    /// `12345` or `12345-6789`.
    pub zip: Option<String>,
}

impl Dealer {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Dealer::default()
    }
}

/// A listing photo discovered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Absolute URL with tracking parameters and fragment removed.
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Heuristic "hero image" flag.
    pub is_main: bool,
}

impl Photo {
    /// Pixel area used for ordering; unknown dimensions count as zero.
    #[must_use]
    pub fn area(&self) -> u64 {
        match (self.width, self.height) {
            (Some(w), Some(h)) => u64::from(w) * u64::from(h),
            _ => 0,
        }
    }
}

/// The outcome of one scrape invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// `<adapter>_<unix millis>_<random>`.
    pub id: String,
    pub vehicle: Vehicle,
    pub dealer: Dealer,
    pub photos: Vec<Photo>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(width: Option<u32>, height: Option<u32>) -> Photo {
        Photo {
            url: "https://cdn.example.com/a.jpg".to_string(),
            width,
            height,
            is_main: false,
        }
    }

    #[test]
    fn area_treats_unknown_dimensions_as_zero() {
        assert_eq!(photo(Some(800), Some(600)).area(), 480_000);
        assert_eq!(photo(Some(800), None).area(), 0);
        assert_eq!(photo(None, None).area(), 0);
    }

    #[test]
    fn scrape_result_serializes_camel_case() {
        let result = ScrapeResult {
            id: "generic_1_x".to_string(),
            vehicle: Vehicle::default(),
            dealer: Dealer::default(),
            photos: vec![Photo {
                is_main: true,
                ..photo(None, None)
            }],
            source_url: "https://example.com/".to_string(),
            scraped_at: Utc::now(),
            warnings: vec!["Price not found".to_string()],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sourceUrl"], "https://example.com/");
        assert_eq!(json["photos"][0]["isMain"], true);
        assert!(json.get("scrapedAt").is_some());
    }
}
