//! Fallback adapter for arbitrary dealer sites.
//!
//! Structured sources are read in priority order before the selector
//! heuristics: microdata, then OpenGraph/Twitter meta, then JSON-LD. Each
//! source only fills what earlier ones left empty.

use lotlift_core::{RawVehicleData, ScrapeResult};
use reqwest::Url;

use super::pipeline::{self, Draft, SiteProfile};
use crate::page::Page;
use crate::structured::{jsonld_vehicles, microdata_vehicle, schema_vehicle, social_meta};

pub(super) const NAME: &str = "generic";

const URL_KEYWORDS: [&str; 9] = [
    "vehicle",
    "car",
    "auto",
    "inventory",
    "details",
    "listing",
    "vdp",
    "used-car",
    "new-car",
];

const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1",
        "[class*='vehicle-title']",
        "[class*='listing-title']",
        "[itemprop='name']",
        "title",
    ],
    price: &[
        "[itemprop='price']",
        "[class*='price']",
        "[id*='price']",
        "[data-price]",
    ],
    mileage: &["[class*='mileage']", "[class*='odometer']", "[id*='mileage']"],
    vin: &["[class*='vin']", "[id*='vin']"],
    stock: &["[class*='stock-number']", "[class*='stockNumber']", "[id*='stock']"],
    description: &[
        "[itemprop='description']",
        "[class*='description']",
        "[id*='description']",
        "[class*='comments']",
    ],
    specs: &[
        "[class*='spec']",
        "[class*='details'] dl",
        "[class*='details'] ul",
        "dl",
        "table",
    ],
    dealer_name: &[
        "[class*='dealer-name']",
        "[class*='dealerName']",
        "[class*='dealer'] h2",
        "[class*='dealer'] h3",
    ],
    dealer_phone: &["a[href^='tel:']", "[class*='phone']"],
    dealer_address: &["address", "[class*='address']"],
    photos: &[
        "[class*='gallery'] img",
        "[class*='carousel'] img",
        "[class*='slider'] img",
        "[class*='photo'] img",
        "[class*='image'] img",
        "main img",
        "article img",
    ],
};

pub(super) fn is_vehicle_page(url: &Url) -> bool {
    let target = url.as_str().to_ascii_lowercase();
    URL_KEYWORDS.iter().any(|kw| target.contains(kw))
}

pub(super) fn scrape(page: &Page) -> ScrapeResult {
    let document = page.document();
    let mut draft = Draft::new(page);

    if let Some(item) = microdata_vehicle(document) {
        tracing::debug!(adapter = NAME, "using microdata vehicle");
        draft.absorb_schema(schema_vehicle(&item));
    }

    let social = social_meta(document);
    if let Some(title) = social.title.as_deref() {
        draft.apply_title(title);
    }
    draft.absorb(RawVehicleData {
        price: social.price.map(Into::into),
        description: social.description,
        ..RawVehicleData::default()
    });
    for image in &social.images {
        draft.photos.add(image, None, None, false);
    }

    for vehicle in jsonld_vehicles(document) {
        tracing::debug!(adapter = NAME, "using JSON-LD vehicle data");
        draft.absorb_schema(schema_vehicle(&vehicle));
    }

    pipeline::run(&PROFILE, page, &mut draft);
    pipeline::finish(NAME, page, draft)
}
