//! CarGurus listing pages.

use std::sync::LazyLock;

use lotlift_core::ScrapeResult;
use regex::Regex;
use reqwest::Url;

use super::pipeline::{self, Draft, SiteProfile};
use crate::page::Page;
use crate::structured::{jsonld_vehicles, schema_vehicle};

pub(super) const NAME: &str = "cargurus";

static VDP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/details/\d+|/vdp/|listing=\d+").expect("valid cargurus regex")
});

const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1[data-cg-ft='vdp-listing-title']",
        "[data-testid='listing-title']",
        "h1",
    ],
    price: &[
        "[data-cg-ft='vdp-price']",
        "[data-testid='price']",
        "[class*='price']",
    ],
    mileage: &["[data-cg-ft='vdp-mileage']", "[class*='mileage']"],
    vin: &["[data-cg-ft='vdp-vin']", "[class*='vin']"],
    stock: &["[data-cg-ft='vdp-stock-number']"],
    description: &[
        "[data-cg-ft='vdp-dealer-description']",
        "[data-cg-ft='vdp-description']",
        "[class*='description']",
    ],
    specs: &[
        "[data-cg-ft='vdp-listing-specs']",
        "section[class*='specs']",
        "dl",
    ],
    dealer_name: &[
        "[data-cg-ft='vdp-dealer-name']",
        "[class*='dealerName']",
        "[class*='dealer-name']",
    ],
    dealer_phone: &["[data-cg-ft='vdp-dealer-phone']", "a[href^='tel:']"],
    dealer_address: &["[data-cg-ft='vdp-dealer-address']", "address"],
    photos: &[
        "[data-cg-ft='vdp-gallery'] img",
        "[class*='gallery'] img",
        "[class*='Gallery'] img",
    ],
};

pub(super) fn is_vehicle_page(url: &Url) -> bool {
    let target = format!(
        "{}?{}#{}",
        url.path(),
        url.query().unwrap_or_default(),
        url.fragment().unwrap_or_default()
    );
    VDP_RE.is_match(&target)
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
