//! Vehicle records on both sides of the normalizer.
//!
//! [`RawVehicleData`] is what a site adapter hands to the normalizer: every
//! field is optional and numeric fields may still be the scraped text
//! (`"$25,999"`, `"15,234 miles"`). [`Vehicle`] is the canonical shape that
//! leaves the normalizer.

use serde::{Deserialize, Serialize};

/// Listing condition. Scraped pages that say nothing are treated as used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    New,
    #[default]
    Used,
    CertifiedPreOwned,
}

impl Condition {
    /// Human-readable label used in marketplace text and form values.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::Used => "Used",
            Condition::CertifiedPreOwned => "Certified Pre-Owned",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A scraped numeric field that may not have been parsed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(i64),
    Text(String),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value)
    }
}

/// Adapter output before normalization. Created once per scrape and consumed
/// by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVehicleData {
    pub year: Option<RawValue>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub body_style: Option<String>,
    pub price: Option<RawValue>,
    pub mileage: Option<RawValue>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
}

impl RawVehicleData {
    /// Returns `true` when no field has been populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == RawVehicleData::default()
    }
}

/// Canonical, normalized vehicle record. Every field is independently
/// optional; missing data is reported as a warning, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    /// One of SUV, Truck, Sedan, Wagon, Coupe, Hatchback, Minivan, Van,
    /// Convertible, or the title-cased scraped text when nothing matched.
    pub body_style: Option<String>,
    /// Whole dollars.
    pub price: Option<u64>,
    pub mileage: Option<u64>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    /// Automatic, Manual, CVT, or title-cased passthrough.
    pub transmission: Option<String>,
    /// FWD, RWD, AWD, 4WD, or title-cased passthrough.
    pub drivetrain: Option<String>,
    pub engine: Option<String>,
    /// Gasoline, Diesel, Electric, Hybrid, Plug-in Hybrid, or title-cased passthrough.
    pub fuel_type: Option<String>,
    /// Exactly 17 characters from `[A-HJ-NPR-Z0-9]`.
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    /// Description with dealer boilerplate removed.
    pub description: Option<String>,
    /// Serialized by label, e.g. `"Certified Pre-Owned"`.
    #[serde(default, with = "condition_label")]
    pub condition: Condition,
}

mod condition_label {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Condition;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(
        condition: &Condition,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(condition.label())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Condition, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "New" => Ok(Condition::New),
            "Used" => Ok(Condition::Used),
            "Certified Pre-Owned" | "CertifiedPreOwned" => Ok(Condition::CertifiedPreOwned),
            other => Err(de::Error::unknown_variant(
                other,
                &["New", "Used", "Certified Pre-Owned"],
            )),
        }
    }
}

impl From<&Vehicle> for RawVehicleData {
    fn from(vehicle: &Vehicle) -> Self {
        let number = |n: u64| RawValue::Number(i64::try_from(n).unwrap_or(i64::MAX));
        RawVehicleData {
            year: vehicle.year.map(|y| RawValue::Number(i64::from(y))),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            trim: vehicle.trim.clone(),
            body_style: vehicle.body_style.clone(),
            price: vehicle.price.map(number),
            mileage: vehicle.mileage.map(number),
            exterior_color: vehicle.exterior_color.clone(),
            interior_color: vehicle.interior_color.clone(),
            transmission: vehicle.transmission.clone(),
            drivetrain: vehicle.drivetrain.clone(),
            engine: vehicle.engine.clone(),
            fuel_type: vehicle.fuel_type.clone(),
            vin: vehicle.vin.clone(),
            stock_number: vehicle.stock_number.clone(),
            description: vehicle.description.clone(),
            condition: Some(vehicle.condition.label().to_string()),
        }
    }
}
