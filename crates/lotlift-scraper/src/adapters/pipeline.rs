//! Extraction pipeline shared by every adapter.
//!
//! A [`SiteProfile`] lists ordered selectors per field; [`run`] walks the
//! steps (title, specs, price, mileage, VIN, stock number, description,
//! dealer, photos). Each step only fills fields still missing in the
//! [`Draft`], so structured pre-passes keep priority, and a step warns only
//! when its field is still missing afterwards.

use std::sync::LazyLock;

use chrono::Utc;
use lotlift_core::{Dealer, RawValue, RawVehicleData, ScrapeResult};
use rand::Rng;
use regex::Regex;
use scraper::ElementRef;

use crate::extract::{
    collapse_whitespace, find_all, find_labeled_value, page_text, parse_selector, select_attr,
    select_text, text_of,
};
use crate::normalize::{normalize_dealer, normalize_vehicle_data};
use crate::page::Page;
use crate::photos::PhotoSet;
use crate::structured::SchemaVehicle;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s+([A-Za-z]+)\s+([A-Za-z0-9\s]+?)(?:\s+([A-Za-z0-9\s]+))?$")
        .expect("valid title regex")
});
/// Looser shape for hyphenated makes and models (`Mercedes-Benz`, `F-150`).
static LOOSE_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s+(\S+)\s+(\S+)(?:\s+(.+))?$").expect("valid loose title regex")
});
pub(crate) static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").expect("valid VIN regex"));
static MILEAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*miles?\b").expect("valid mileage regex")
});
static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,3}(?:,\d{3})+|\d+)\s*(?:mi\.?)?$").expect("valid number regex")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*(\d{1,3}(?:,\d{3})+|\d+)").expect("valid price regex")
});
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z .'-]*?),\s*([A-Z]{2})\s+(\d{5}(?:-\d{4})?)")
        .expect("valid address regex")
});

pub(crate) const TITLE_NOT_FOUND: &str = "Vehicle title not found";
pub(crate) const PRICE_NOT_FOUND: &str = "Price not found";
pub(crate) const MILEAGE_NOT_FOUND: &str = "Mileage not found";
pub(crate) const VIN_NOT_FOUND: &str = "VIN not found";
pub(crate) const DESCRIPTION_NOT_FOUND: &str = "Description not found";
pub(crate) const DEALER_NOT_FOUND: &str = "Dealer information not found";
pub(crate) const SPECS_NOT_FOUND: &str = "Vehicle specifications not found";
pub(crate) const NO_PHOTOS: &str = "No photos found";

/// Static description of one listing site.
pub(crate) struct SiteProfile {
    pub title: &'static [&'static str],
    pub price: &'static [&'static str],
    pub mileage: &'static [&'static str],
    pub vin: &'static [&'static str],
    pub stock: &'static [&'static str],
    pub description: &'static [&'static str],
    /// Containers holding label/value rows (`dl`, spec tables, `ul`).
    pub specs: &'static [&'static str],
    pub dealer_name: &'static [&'static str],
    pub dealer_phone: &'static [&'static str],
    pub dealer_address: &'static [&'static str],
    pub photos: &'static [&'static str],
}

/// Fields collected so far for one scrape.
pub(crate) struct Draft {
    pub raw: RawVehicleData,
    pub dealer: Dealer,
    pub photos: PhotoSet,
    pub warnings: Vec<String>,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl Draft {
    pub(crate) fn new(page: &Page) -> Self {
        Self {
            raw: RawVehicleData::default(),
            dealer: Dealer::default(),
            photos: PhotoSet::new(page.url()),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    /// Fill every still-missing field from `other`.
    pub(crate) fn absorb(&mut self, other: RawVehicleData) {
        let raw = &mut self.raw;
        fill(&mut raw.year, other.year);
        fill(&mut raw.make, other.make);
        fill(&mut raw.model, other.model);
        fill(&mut raw.trim, other.trim);
        fill(&mut raw.body_style, other.body_style);
        fill(&mut raw.price, other.price);
        fill(&mut raw.mileage, other.mileage);
        fill(&mut raw.exterior_color, other.exterior_color);
        fill(&mut raw.interior_color, other.interior_color);
        fill(&mut raw.transmission, other.transmission);
        fill(&mut raw.drivetrain, other.drivetrain);
        fill(&mut raw.engine, other.engine);
        fill(&mut raw.fuel_type, other.fuel_type);
        fill(&mut raw.vin, other.vin);
        fill(&mut raw.stock_number, other.stock_number);
        fill(&mut raw.description, other.description);
        fill(&mut raw.condition, other.condition);
    }

    pub(crate) fn absorb_dealer(&mut self, other: Dealer) {
        let dealer = &mut self.dealer;
        fill(&mut dealer.name, other.name);
        fill(&mut dealer.phone, other.phone);
        fill(&mut dealer.city, other.city);
        fill(&mut dealer.state, other.state);
        fill(&mut dealer.zip, other.zip);
    }

    /// Merge a schema.org vehicle, deriving year/make/model/trim from its name
    /// when the explicit properties are missing.
    pub(crate) fn absorb_schema(&mut self, vehicle: SchemaVehicle) {
        self.absorb(vehicle.raw);
        if let Some(name) = vehicle.name.as_deref() {
            self.apply_title(name);
        }
        self.absorb_dealer(vehicle.dealer);
        for image in &vehicle.images {
            self.photos.add(image, None, None, false);
        }
    }

    /// Parse `text` as a listing title and fill missing name parts.
    pub(crate) fn apply_title(&mut self, text: &str) -> bool {
        let Some(title) = parse_title(text) else {
            return false;
        };
        fill(&mut self.raw.year, Some(RawValue::Text(title.year)));
        fill(&mut self.raw.make, Some(title.make));
        fill(&mut self.raw.model, Some(title.model));
        fill(&mut self.raw.trim, title.trim);
        true
    }

    fn has_title(&self) -> bool {
        self.raw.make.is_some() && self.raw.model.is_some()
    }

    /// Every part a title can supply is already known.
    fn title_complete(&self) -> bool {
        self.has_title() && self.raw.year.is_some() && self.raw.trim.is_some()
    }
}

/// Name parts parsed from a `YEAR MAKE MODEL [TRIM]` title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedTitle {
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
}

/// Parse a listing title. Site suffixes after ` | ` or ` - ` are dropped
/// first; the model is the first word after the make and the rest is trim.
pub(crate) fn parse_title(text: &str) -> Option<ParsedTitle> {
    let head = [" | ", " - "]
        .iter()
        .filter_map(|sep| text.find(sep))
        .min()
        .map_or(text, |idx| &text[..idx]);
    let head = collapse_whitespace(head);

    let caps = TITLE_RE.captures(&head).or_else(|| LOOSE_TITLE_RE.captures(&head))?;
    let year = caps.get(1)?.as_str().to_string();
    let make = caps.get(2)?.as_str().to_string();
    let mut rest = caps.get(3)?.as_str().split_whitespace();
    let model = rest.next()?.to_string();
    let trim_parts: Vec<&str> = rest
        .chain(caps.get(4).map_or("", |m| m.as_str()).split_whitespace())
        .collect();
    let trim = (!trim_parts.is_empty()).then(|| trim_parts.join(" "));
    Some(ParsedTitle {
        year,
        make,
        model,
        trim,
    })
}

/// Split `..., City, ST 12345` into city, state and zip.
pub(crate) fn parse_address(text: &str) -> Option<(String, String, String)> {
    let caps = ADDRESS_RE.captures(text)?;
    Some((
        caps[1].trim().to_string(),
        caps[2].to_string(),
        caps[3].to_string(),
    ))
}

/// First `$`-prefixed amount in `text`, so `"$25,999 $27,500 MSRP"` reads 25,999.
pub(crate) fn price_in(text: &str) -> Option<String> {
    PRICE_RE.captures(text).map(|c| c[1].to_string())
}

/// Mileage from `"15,234 miles"` or a bare `"15,234"`.
pub(crate) fn mileage_in(text: &str) -> Option<String> {
    MILEAGE_RE
        .captures(text)
        .or_else(|| BARE_NUMBER_RE.captures(text.trim()))
        .map(|c| c[1].to_string())
}

pub(crate) fn vin_in(text: &str) -> Option<String> {
    VIN_RE
        .find(&text.to_ascii_uppercase())
        .map(|m| m.as_str().to_string())
}

/// Try `selectors` in order and every match in document order, returning the
/// first text that `read` accepts.
pub(crate) fn scan_text<T>(
    root: ElementRef<'_>,
    selectors: &[&str],
    read: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        root.select(&selector).find_map(|el| read(&text_of(el)))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecField {
    Year,
    Make,
    Model,
    Trim,
    BodyStyle,
    Mileage,
    ExteriorColor,
    InteriorColor,
    Transmission,
    Drivetrain,
    Engine,
    FuelType,
    Vin,
    StockNumber,
    Condition,
}

/// Map a spec-row label onto a vehicle field by keyword.
fn spec_field(label: &str) -> Option<SpecField> {
    let label = label.trim().trim_end_matches(':').trim().to_lowercase();
    let field = match label.as_str() {
        "year" | "model year" => SpecField::Year,
        "make" => SpecField::Make,
        "model" => SpecField::Model,
        "trim" => SpecField::Trim,
        "color" => SpecField::ExteriorColor,
        "vin" => SpecField::Vin,
        l if l.starts_with("vin ") || l.starts_with("vin#") => SpecField::Vin,
        l if l.contains("exterior") => SpecField::ExteriorColor,
        l if l.contains("interior") => SpecField::InteriorColor,
        l if l.contains("transmission") => SpecField::Transmission,
        l if ["drivetrain", "drive type", "drive train", "driveline"]
            .iter()
            .any(|k| l.contains(k)) =>
        {
            SpecField::Drivetrain
        }
        l if l.contains("engine") => SpecField::Engine,
        l if l.contains("fuel")
            && !["economy", "mpg", "tank", "capacity"].iter().any(|k| l.contains(k)) =>
        {
            SpecField::FuelType
        }
        l if l.contains("body") => SpecField::BodyStyle,
        l if ["mileage", "odometer", "miles"].iter().any(|k| l.contains(k)) => SpecField::Mileage,
        l if l.contains("stock") => SpecField::StockNumber,
        l if l.contains("condition") => SpecField::Condition,
        _ => return None,
    };
    Some(field)
}

fn apply_spec(raw: &mut RawVehicleData, field: SpecField, value: String) {
    match field {
        SpecField::Year => fill(&mut raw.year, Some(value.into())),
        SpecField::Make => fill(&mut raw.make, Some(value)),
        SpecField::Model => fill(&mut raw.model, Some(value)),
        SpecField::Trim => fill(&mut raw.trim, Some(value)),
        SpecField::BodyStyle => fill(&mut raw.body_style, Some(value)),
        SpecField::Mileage => fill(&mut raw.mileage, Some(value.into())),
        SpecField::ExteriorColor => fill(&mut raw.exterior_color, Some(value)),
        SpecField::InteriorColor => fill(&mut raw.interior_color, Some(value)),
        SpecField::Transmission => fill(&mut raw.transmission, Some(value)),
        SpecField::Drivetrain => fill(&mut raw.drivetrain, Some(value)),
        SpecField::Engine => fill(&mut raw.engine, Some(value)),
        SpecField::FuelType => fill(&mut raw.fuel_type, Some(value)),
        SpecField::Vin => fill(&mut raw.vin, Some(value)),
        SpecField::StockNumber => fill(&mut raw.stock_number, Some(value)),
        SpecField::Condition => fill(&mut raw.condition, Some(value)),
    }
}

/// Label/value rows under `container`: `dt`/`dd`, two-cell table rows, and
/// list items written as `Label: value` or as two child elements.
pub(crate) fn spec_pairs(container: ElementRef<'_>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let is_row = |el: &ElementRef<'_>| matches!(el.value().name(), "dt" | "tr" | "li");
    let rows = std::iter::once(container)
        .filter(is_row)
        .chain(container.descendants().filter_map(ElementRef::wrap).filter(is_row));

    for row in rows {
        match row.value().name() {
            "dt" => {
                let value = row
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "dd")
                    .map(text_of);
                if let Some(value) = value {
                    pairs.push((text_of(row), value));
                }
            }
            "tr" => {
                let cells: Vec<String> = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| matches!(el.value().name(), "th" | "td"))
                    .map(text_of)
                    .collect();
                if let [label, value, ..] = cells.as_slice() {
                    pairs.push((label.clone(), value.clone()));
                }
            }
            _ => {
                let children: Vec<ElementRef<'_>> = row.children().filter_map(ElementRef::wrap).collect();
                if children.len() >= 2 {
                    let label = text_of(children[0]);
                    let value = text_of(children[children.len() - 1]);
                    pairs.push((label, value));
                } else if let Some((label, value)) = text_of(row).split_once(':') {
                    pairs.push((label.to_string(), value.trim().to_string()));
                }
            }
        }
    }
    pairs.retain(|(label, value)| !label.trim().is_empty() && !value.trim().is_empty());
    pairs
}

const LABELED_FALLBACKS: &[(&[&str], SpecField)] = &[
    (&["exterior color", "exterior"], SpecField::ExteriorColor),
    (&["interior color", "interior"], SpecField::InteriorColor),
    (&["transmission"], SpecField::Transmission),
    (&["drivetrain", "drive type"], SpecField::Drivetrain),
    (&["engine"], SpecField::Engine),
    (&["fuel type"], SpecField::FuelType),
    (&["body style", "body type"], SpecField::BodyStyle),
];

/// Run every extraction step for `profile` against `page`.
pub(crate) fn run(profile: &SiteProfile, page: &Page, draft: &mut Draft) {
    let root = page.document().root_element();

    // Title
    if !draft.title_complete() {
        let matched = profile.title.iter().any(|sel| {
            select_text(root, &[*sel]).is_some_and(|text| draft.apply_title(&text))
        });
        tracing::debug!(matched, "title step");
    }
    if !draft.has_title() {
        draft.warn(TITLE_NOT_FOUND);
    }

    // Specs
    let mut mapped = 0usize;
    for container in find_all(root, profile.specs) {
        for (label, value) in spec_pairs(container) {
            if let Some(field) = spec_field(&label) {
                apply_spec(&mut draft.raw, field, value);
                mapped += 1;
            }
        }
    }
    if mapped == 0 {
        for (labels, field) in LABELED_FALLBACKS {
            if let Some(value) = find_labeled_value(root, labels) {
                apply_spec(&mut draft.raw, *field, value);
                mapped += 1;
            }
        }
    }
    if mapped == 0 {
        draft.warn(SPECS_NOT_FOUND);
    }

    // Price
    if draft.raw.price.is_none() {
        draft.raw.price = scan_text(root, profile.price, price_in)
            .or_else(|| find_labeled_value(root, &["price"]).and_then(|v| price_in(&v)))
            .map(Into::into);
    }
    if draft.raw.price.is_none() {
        draft.warn(PRICE_NOT_FOUND);
    }

    // Mileage: selectors, then labels, then the whole page text.
    if draft.raw.mileage.is_none() {
        draft.raw.mileage = scan_text(root, profile.mileage, mileage_in)
            .or_else(|| {
                find_labeled_value(root, &["mileage", "odometer"]).and_then(|v| mileage_in(&v))
            })
            .or_else(|| {
                MILEAGE_RE
                    .captures(&page_text(page.document()))
                    .map(|c| c[1].to_string())
            })
            .map(Into::into);
    }
    if draft.raw.mileage.is_none() {
        draft.warn(MILEAGE_NOT_FOUND);
    }

    // VIN: a labeled value is kept as-is so a malformed one is reported.
    if draft.raw.vin.is_none() {
        draft.raw.vin = scan_text(root, profile.vin, vin_in)
            .or_else(|| find_labeled_value(root, &["vin"]))
            .or_else(|| {
                VIN_RE
                    .find(&page_text(page.document()))
                    .map(|m| m.as_str().to_string())
            });
    }
    if draft.raw.vin.is_none() {
        draft.warn(VIN_NOT_FOUND);
    }

    if draft.raw.stock_number.is_none() {
        draft.raw.stock_number = select_text(root, profile.stock)
            .or_else(|| find_labeled_value(root, &["stock #", "stock number", "stock"]));
    }

    // Description
    if draft.raw.description.is_none() {
        draft.raw.description = select_text(root, profile.description);
    }
    if draft.raw.description.is_none() {
        draft.warn(DESCRIPTION_NOT_FOUND);
    }

    // Dealer
    let phone = select_attr(root, profile.dealer_phone, "href")
        .and_then(|href| href.strip_prefix("tel:").map(str::to_string))
        .or_else(|| select_text(root, profile.dealer_phone));
    let address = select_text(root, profile.dealer_address).and_then(|a| parse_address(&a));
    let (city, state, zip) = match address {
        Some((city, state, zip)) => (Some(city), Some(state), Some(zip)),
        None => (None, None, None),
    };
    draft.absorb_dealer(Dealer {
        name: select_text(root, profile.dealer_name),
        phone,
        city,
        state,
        zip,
    });
    if draft.dealer.name.is_none() && draft.dealer.phone.is_none() {
        draft.warn(DEALER_NOT_FOUND);
    }

    // Photos
    draft.photos.collect(root, profile.photos);
    if draft.photos.is_empty() {
        draft.warn(NO_PHOTOS);
    }
}

/// Normalize the draft into the final result for adapter `name`.
pub(crate) fn finish(name: &str, page: &Page, mut draft: Draft) -> ScrapeResult {
    let vehicle = normalize_vehicle_data(&draft.raw);
    if let Some(raw_vin) = draft.raw.vin.as_deref() {
        if vehicle.vin.is_none() {
            let message = format!("Invalid VIN format: {raw_vin}");
            draft.warn(message);
        }
    }
    ScrapeResult {
        id: result_id(name),
        vehicle,
        dealer: normalize_dealer(&draft.dealer),
        photos: draft.photos.finish(),
        source_url: page.url().to_string(),
        scraped_at: Utc::now(),
        warnings: draft.warnings,
    }
}

/// `<adapter>_<unix millis>_<9 base-36 chars>`.
pub(crate) fn result_id(name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
        .collect();
    format!("{name}_{}_{suffix}", Utc::now().timestamp_millis())
}
