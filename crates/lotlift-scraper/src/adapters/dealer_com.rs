//! Dealer.com platform sites.
//!
//! Vehicle detail pages carry the listing as `data-*` attributes on the
//! vehicle card, which are read before the selector steps.

use std::sync::LazyLock;

use lotlift_core::{RawVehicleData, ScrapeResult};
use regex::Regex;
use reqwest::Url;
use scraper::ElementRef;

use super::pipeline::{self, Draft, SiteProfile};
use crate::extract::find_element;
use crate::page::Page;

pub(super) const NAME: &str = "dealerdotcom";

static VDP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)/(?:new|used|certified)/[^/]+/\d{4}-[^/]+\.htm|/vdp/|/inventory/|/vehicledetails|/\d{5,}(?:/|$)",
    )
    .expect("valid dealer.com regex")
});

const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1.vehicle-title",
        ".vehicle-title h1",
        "[data-location='vehicle-title'] h1",
        "h1",
    ],
    price: &[
        ".final-price .price-value",
        "[data-location='vehicle-pricing'] .price-value",
        ".price-value",
        "[class*='price']",
    ],
    mileage: &["li.odometer .value", ".odometer", "[class*='mileage']"],
    vin: &[".vin", "li.vin .value", "[class*='vin']"],
    stock: &["li.stockNumber .value", ".stock-number", ".stockNumber"],
    description: &[
        ".vehicle-description",
        "[data-location='vehicle-description']",
        ".dealer-comments",
    ],
    specs: &[
        ".vehicle-highlights",
        ".quick-specs",
        "ul.vehicle-details",
        "dl.vehicle-details",
        "dl",
    ],
    dealer_name: &[".dealer-name", ".org", "[itemprop='name']"],
    dealer_phone: &[".tel", "[class*='phone']", "a[href^='tel:']"],
    dealer_address: &[".adr", "address", "[class*='address']"],
    photos: &[
        ".media-gallery img",
        "#media1-app-root img",
        "[class*='gallery'] img",
        ".slider img",
    ],
};

pub(super) fn is_vehicle_page(url: &Url) -> bool {
    VDP_RE.is_match(url.path())
}

fn data_attr(card: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| card.value().attr(name))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read the listing's `data-*` attributes from the vehicle card.
fn vehicle_card_data(card: ElementRef<'_>) -> RawVehicleData {
    RawVehicleData {
        year: data_attr(card, &["data-year", "data-model-year"]).map(Into::into),
        make: data_attr(card, &["data-make"]),
        model: data_attr(card, &["data-model"]),
        trim: data_attr(card, &["data-trim"]),
        body_style: data_attr(card, &["data-bodystyle", "data-body-style"]),
        price: data_attr(card, &["data-internetprice", "data-price", "data-msrp"])
            .map(Into::into),
        mileage: data_attr(card, &["data-odometer", "data-mileage"]).map(Into::into),
        exterior_color: data_attr(card, &["data-exteriorcolor", "data-exterior-color"]),
        interior_color: data_attr(card, &["data-interiorcolor", "data-interior-color"]),
        transmission: data_attr(card, &["data-transmission"]),
        drivetrain: data_attr(card, &["data-drivetrain", "data-driveline"]),
        engine: data_attr(card, &["data-engine"]),
        fuel_type: data_attr(card, &["data-fueltype", "data-fuel-type"]),
        vin: data_attr(card, &["data-vin"]),
        stock_number: data_attr(card, &["data-stocknumber", "data-stock-number"]),
        description: None,
        condition: data_attr(card, &["data-type", "data-condition"]),
    }
}

pub(super) fn scrape(page: &Page) -> ScrapeResult {
    let mut draft = Draft::new(page);
    let root = page.document().root_element();
    if let Some(card) = find_element(root, &["[data-vin]", "[data-vehicle-id][data-make]"]) {
        tracing::debug!(adapter = NAME, "using vehicle card data attributes");
        draft.absorb(vehicle_card_data(card));
    }
    pipeline::run(&PROFILE, page, &mut draft);
    pipeline::finish(NAME, page, draft)
}
