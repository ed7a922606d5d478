//! Cars.com vehicle detail pages.

use std::sync::LazyLock;

use lotlift_core::ScrapeResult;
use regex::Regex;
use reqwest::Url;

use super::pipeline::{self, Draft, SiteProfile};
use crate::page::Page;
use crate::structured::{jsonld_vehicles, schema_vehicle};

pub(super) const NAME: &str = "carsdotcom";

static VDP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/vehicledetail/[^/]+").expect("valid cars.com regex"));

const PROFILE: SiteProfile = SiteProfile {
    title: &["h1.listing-title", ".listing-title", "h1"],
    price: &[
        ".primary-price",
        "[data-qa='primary-price']",
        ".price-section",
        "[class*='price']",
    ],
    mileage: &[".listing-mileage", "[data-qa='mileage']", "[class*='mileage']"],
    vin: &["[data-qa='vin']", "[class*='vin']"],
    stock: &["[data-qa='stock-number']", "[class*='stock']"],
    description: &[
        ".sellers-notes",
        "[data-qa='sellers-notes']",
        ".seller-notes",
    ],
    specs: &[
        "dl.fancy-description-list",
        ".basics-section dl",
        ".features-section dl",
    ],
    dealer_name: &[".seller-name", "[data-qa='dealer-name']", ".dealer-name"],
    dealer_phone: &[
        ".dealer-phone",
        "[data-qa='dealer-phone']",
        "a[href^='tel:']",
    ],
    dealer_address: &[
        ".dealer-address",
        "[data-qa='dealer-address']",
        ".seller-address",
    ],
    photos: &[
        "gallery-slides img",
        ".vdp-gallery img",
        "img.swipe-main-image",
        "[class*='gallery'] img",
    ],
};

pub(super) fn is_vehicle_page(url: &Url) -> bool {
    VDP_RE.is_match(url.path())
}

pub(super) fn scrape(page: &Page) -> ScrapeResult {
    let mut draft = Draft::new(page);
    for vehicle in jsonld_vehicles(page.document()) {
        tracing::debug!(adapter = NAME, "using JSON-LD vehicle data");
        draft.absorb_schema(schema_vehicle(&vehicle));
    }
    pipeline::run(&PROFILE, page, &mut draft);
    pipeline::finish(NAME, page, draft)
}
