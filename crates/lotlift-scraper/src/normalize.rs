//! Normalization from [`RawVehicleData`] to [`Vehicle`], plus the marketplace
//! text generators.
//!
//! Every function here is total and idempotent: malformed input becomes an
//! absent field, and feeding normalized output back in changes nothing.

use std::sync::LazyLock;

use lotlift_core::{Condition, Dealer, RawValue, RawVehicleData, Vehicle};
use regex::Regex;

use crate::extract::collapse_whitespace;

static WORD_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w").expect("valid word-start regex"));
static NEW_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnew\b").expect("valid condition regex"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("valid zip regex"));
static STOCK_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^stock\s*(?:(?:#|no\.?|number)\s*:?|:)\s*").expect("valid stock regex")
});

/// Sentence tail shared by the boilerplate patterns: runs to the end of the
/// sentence, tolerating dots inside tokens such as domain names.
const SENTENCE_TAIL: &str = r"(?:[^.!?]|[.!?]\S)*[.!?]?";

static BOILERPLATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:call|text)\s+(?:us\s+)?(?:now|today)\b",
        r"(?i)\bcall\s+(?:us\s+)?(?:at\s+)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
        r"(?i)\bvisit\s+us\s+(?:at|online|today)\b",
        r"(?i)\bfinancing\s+(?:is\s+)?available\b",
        r"(?i)\btrade-?ins?\s+(?:are\s+)?welcome\b",
        r"(?i)\bextended\s+warrant(?:y|ies)\b",
    ]
    .iter()
    .map(|head| Regex::new(&format!("{head}{SENTENCE_TAIL}")).expect("valid boilerplate regex"))
    .collect()
});

const TRANSMISSION_TABLE: &[(&[&str], &str)] = &[
    (&["cvt"], "CVT"),
    (&["automatic"], "Automatic"),
    (&["manual"], "Manual"),
    (&["auto"], "Automatic"),
    (&["a/t"], "Automatic"),
    (&["m/t"], "Manual"),
];

const DRIVETRAIN_TABLE: &[(&[&str], &str)] = &[
    (&["all wheel", "all-wheel", "awd"], "AWD"),
    (
        &["4x4", "4wd", "four wheel", "four-wheel", "4 wheel"],
        "4WD",
    ),
    (&["front wheel", "front-wheel", "fwd"], "FWD"),
    (&["rear wheel", "rear-wheel", "rwd"], "RWD"),
];

const FUEL_TABLE: &[(&[&str], &str)] = &[
    (&["plug-in", "plug in", "phev"], "Plug-in Hybrid"),
    (&["hybrid"], "Hybrid"),
    (&["electric"], "Electric"),
    (&["diesel"], "Diesel"),
    (&["gas", "petrol"], "Gasoline"),
];

const BODY_STYLE_TABLE: &[(&[&str], &str)] = &[
    (&["suv", "sport utility", "crossover"], "SUV"),
    (&["pickup", "truck", "crew cab"], "Truck"),
    (&["minivan"], "Minivan"),
    (&["van"], "Van"),
    (&["convertible", "cabriolet"], "Convertible"),
    (&["coupe"], "Coupe"),
    (&["hatchback"], "Hatchback"),
    (&["wagon"], "Wagon"),
    (&["sedan"], "Sedan"),
];

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// Trimmed, whitespace-collapsed text; empty becomes `None`.
#[must_use]
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = collapse_whitespace(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Lowercase everything, then capitalize the first character of each word.
#[must_use]
pub fn title_case(raw: &str) -> String {
    let lower = collapse_whitespace(raw).to_lowercase();
    WORD_START_RE
        .replace_all(&lower, |caps: &regex::Captures<'_>| caps[0].to_uppercase())
        .into_owned()
}

/// Parse a leading integer after stripping `$`, `,` and whitespace, the way a
/// lenient integer parse reads `"15,234 miles"` as `15234`.
#[must_use]
pub fn parse_integer(raw: &RawValue) -> Option<i64> {
    let text = match raw {
        RawValue::Number(n) => return Some(*n),
        RawValue::Text(text) => text,
    };
    let stripped: String = text
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    let (negative, digits) = match stripped.as_bytes().first() {
        Some(b'-') => (true, &stripped[1..]),
        Some(b'+') => (false, &stripped[1..]),
        _ => (false, stripped.as_str()),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

fn parse_non_negative(raw: Option<&RawValue>) -> Option<u64> {
    raw.and_then(parse_integer)
        .and_then(|n| u64::try_from(n).ok())
}

/// Uppercase and drop everything outside the VIN alphabet; anything other
/// than exactly 17 remaining characters is rejected.
#[must_use]
pub fn normalize_vin(raw: &str) -> Option<String> {
    let vin: String = raw
        .to_ascii_uppercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q')))
        .collect();
    (vin.len() == 17).then_some(vin)
}

fn map_keywords(raw: &str, table: &[(&[&str], &str)]) -> Option<String> {
    let cleaned = clean_text(raw)?;
    let lower = cleaned.to_lowercase();
    let mapped = table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, canonical)| (*canonical).to_string());
    Some(mapped.unwrap_or_else(|| title_case(&cleaned)))
}

#[must_use]
pub fn normalize_transmission(raw: &str) -> Option<String> {
    map_keywords(raw, TRANSMISSION_TABLE)
}

#[must_use]
pub fn normalize_drivetrain(raw: &str) -> Option<String> {
    map_keywords(raw, DRIVETRAIN_TABLE)
}

#[must_use]
pub fn normalize_fuel_type(raw: &str) -> Option<String> {
    map_keywords(raw, FUEL_TABLE)
}

#[must_use]
pub fn normalize_body_style(raw: &str) -> Option<String> {
    map_keywords(raw, BODY_STYLE_TABLE)
}

/// `certified`/`cpo` wins over `new`; everything else, including absence, is used.
#[must_use]
pub fn normalize_condition(raw: Option<&str>) -> Condition {
    let Some(raw) = raw else {
        return Condition::default();
    };
    let lower = raw.to_lowercase();
    if lower.contains("certified") || lower.contains("cpo") {
        Condition::CertifiedPreOwned
    } else if NEW_WORD_RE.is_match(&lower) {
        Condition::New
    } else {
        Condition::Used
    }
}

/// Collapse whitespace, strip dealer boilerplate sentences, and end with a period.
#[must_use]
pub fn clean_description(raw: &str) -> Option<String> {
    let mut text = collapse_whitespace(raw);
    for re in BOILERPLATE_RES.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    let text = collapse_whitespace(&text);
    let text = text.trim_end_matches([',', ';', ':', '-', ' ']);
    if text.is_empty() {
        return None;
    }
    let mut text = text.to_string();
    if !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    Some(text)
}

fn clean_engine(raw: &str) -> Option<String> {
    let cleaned = collapse_whitespace(raw);
    let cleaned = cleaned.trim_end_matches([',', ';', ':', '-', '.', ' ']);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn clean_stock_number(raw: &str) -> Option<String> {
    let cleaned = collapse_whitespace(raw);
    let stripped = STOCK_PREFIX_RE.replace(&cleaned, "");
    (!stripped.is_empty()).then(|| stripped.into_owned())
}

// ---------------------------------------------------------------------------
// Aggregate normalization
// ---------------------------------------------------------------------------

/// Normalize every field of `raw`. Never fails; unparsable values are dropped.
#[must_use]
pub fn normalize_vehicle_data(raw: &RawVehicleData) -> Vehicle {
    Vehicle {
        year: raw
            .year
            .as_ref()
            .and_then(parse_integer)
            .and_then(|y| i32::try_from(y).ok()),
        make: raw.make.as_deref().and_then(clean_text).map(|m| title_case(&m)),
        model: raw.model.as_deref().and_then(clean_text).map(|m| title_case(&m)),
        trim: raw.trim.as_deref().and_then(clean_text),
        body_style: raw.body_style.as_deref().and_then(normalize_body_style),
        price: parse_non_negative(raw.price.as_ref()),
        mileage: parse_non_negative(raw.mileage.as_ref()),
        exterior_color: raw
            .exterior_color
            .as_deref()
            .and_then(clean_text)
            .map(|c| title_case(&c)),
        interior_color: raw
            .interior_color
            .as_deref()
            .and_then(clean_text)
            .map(|c| title_case(&c)),
        transmission: raw.transmission.as_deref().and_then(normalize_transmission),
        drivetrain: raw.drivetrain.as_deref().and_then(normalize_drivetrain),
        engine: raw.engine.as_deref().and_then(clean_engine),
        fuel_type: raw.fuel_type.as_deref().and_then(normalize_fuel_type),
        vin: raw.vin.as_deref().and_then(normalize_vin),
        stock_number: raw.stock_number.as_deref().and_then(clean_stock_number),
        description: raw.description.as_deref().and_then(clean_description),
        condition: normalize_condition(raw.condition.as_deref()),
    }
}

fn format_phone(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw)?;
    let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return Some(cleaned),
    };
    Some(format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]))
}

/// Normalize dealer contact fields: trimmed name and city, US phone format,
/// two-letter state, 5 or 9 digit zip.
#[must_use]
pub fn normalize_dealer(raw: &Dealer) -> Dealer {
    Dealer {
        name: raw.name.as_deref().and_then(clean_text),
        phone: raw.phone.as_deref().and_then(format_phone),
        city: raw.city.as_deref().and_then(clean_text),
        state: raw
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase),
        zip: raw
            .zip
            .as_deref()
            .and_then(|z| ZIP_RE.find(z))
            .map(|m| m.as_str().to_string()),
    }
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `25999` → `$25,999`.
#[must_use]
pub fn format_price(price: u64) -> String {
    format!("${}", group_thousands(price))
}

/// `15234` → `15,234 miles`. Always plural.
#[must_use]
pub fn format_mileage(mileage: u64) -> String {
    format!("{} miles", group_thousands(mileage))
}

/// `YEAR MAKE MODEL TRIM`, skipping absent parts.
#[must_use]
pub fn generate_facebook_title(vehicle: &Vehicle) -> String {
    let year = vehicle.year.map(|y| y.to_string());
    [
        year.as_deref(),
        vehicle.make.as_deref(),
        vehicle.model.as_deref(),
        vehicle.trim.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Marketplace listing body: a details block, the cleaned description, and a
/// dealer footer. Sections without content are left out.
#[must_use]
pub fn generate_facebook_description(
    vehicle: &Vehicle,
    dealer: &Dealer,
    stock_number: Option<&str>,
) -> String {
    let details: Vec<(&str, Option<String>)> = vec![
        ("Year", vehicle.year.map(|y| y.to_string())),
        ("Make", vehicle.make.clone()),
        ("Model", vehicle.model.clone()),
        ("Trim", vehicle.trim.clone()),
        ("Mileage", vehicle.mileage.map(format_mileage)),
        ("Exterior", vehicle.exterior_color.clone()),
        ("Interior", vehicle.interior_color.clone()),
        ("Transmission", vehicle.transmission.clone()),
        ("Drivetrain", vehicle.drivetrain.clone()),
        ("Engine", vehicle.engine.clone()),
        ("Fuel", vehicle.fuel_type.clone()),
        ("VIN", vehicle.vin.clone()),
        (
            "Stock #",
            stock_number
                .map(str::to_string)
                .or_else(|| vehicle.stock_number.clone()),
        ),
    ];

    let bullets: Vec<String> = details
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("• {label}: {v}"))
        })
        .collect();

    let mut sections = Vec::new();
    if !bullets.is_empty() {
        sections.push(format!("VEHICLE DETAILS:\n{}", bullets.join("\n")));
    }
    if let Some(description) = vehicle.description.as_deref().and_then(clean_description) {
        sections.push(format!("DESCRIPTION:\n{description}"));
    }
    if let Some(name) = dealer.name.as_deref().filter(|n| !n.trim().is_empty()) {
        let mut footer = format!("Offered by: {name}");
        if let Some(phone) = dealer.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            footer.push_str(&format!("\nContact: {phone}"));
        }
        sections.push(footer);
    }
    sections.join("\n\n")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
