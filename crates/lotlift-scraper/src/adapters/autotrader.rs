//! AutoTrader vehicle detail pages.

use std::sync::LazyLock;

use lotlift_core::ScrapeResult;
use regex::Regex;
use reqwest::Url;

use super::pipeline::{self, Draft, SiteProfile};
use crate::page::Page;

pub(super) const NAME: &str = "autotrader";

static VDP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/cars-for-sale/vehicle(?:details)?(?:/|\.)|[?&]listingid=\d+")
        .expect("valid autotrader regex")
});

const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1[data-cmp='heading']",
        "[data-cmp='listingTitle']",
        "h1.text-bold",
        "h1",
    ],
    price: &[
        "[data-cmp='firstPrice']",
        "[data-cmp='pricing']",
        ".first-price",
        "[class*='price']",
    ],
    mileage: &["[data-cmp='mileage']", ".mileage", "[class*='mileage']"],
    vin: &["[data-cmp='vin']", "[class*='vin']"],
    stock: &["[data-cmp='stockNumber']", "[class*='stock-number']"],
    description: &[
        "[data-cmp='sellerComments']",
        "[data-cmp='description']",
        ".seller-comments",
        "[class*='description']",
    ],
    specs: &[
        "[data-cmp='vehicleDetails']",
        "[data-cmp='specifications']",
        ".vehicle-details",
        "dl",
    ],
    dealer_name: &[
        "[data-cmp='ownerName']",
        "[data-cmp='dealerName']",
        ".dealer-name",
    ],
    dealer_phone: &["[data-cmp='phoneNumber']", "a[href^='tel:']"],
    dealer_address: &[
        "[data-cmp='ownerAddress']",
        "[data-cmp='dealerAddress']",
        "address",
    ],
    photos: &[
        "[data-cmp='gallery'] img",
        ".media-gallery img",
        "[class*='gallery'] img",
        "[class*='carousel'] img",
    ],
};

pub(super) fn is_vehicle_page(url: &Url) -> bool {
    let target = format!("{}?{}", url.path(), url.query().unwrap_or_default());
    VDP_RE.is_match(&target)
}

pub(super) fn scrape(page: &Page) -> ScrapeResult {
    let mut draft = Draft::new(page);
    pipeline::run(&PROFILE, page, &mut draft);
    pipeline::finish(NAME, page, draft)
}
