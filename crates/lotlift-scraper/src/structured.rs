//! Readers for structured vehicle data embedded in listing pages:
//! schema.org microdata, JSON-LD blocks, and OpenGraph/Twitter meta tags.

use lotlift_core::{Dealer, RawVehicleData};
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use crate::extract::parse_selector;

/// schema.org type suffixes treated as vehicles (`Vehicle`, `MotorVehicle`, `Car`, ...).
const VEHICLE_TYPES: [&str; 3] = ["Vehicle", "Car", "Auto"];

/// Values lifted from OpenGraph and Twitter Card meta tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub images: Vec<String>,
}

/// A schema.org vehicle mapped onto the raw extraction types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaVehicle {
    /// The item's `name`, usually a "YEAR MAKE MODEL TRIM" title.
    pub name: Option<String>,
    pub raw: RawVehicleData,
    pub dealer: Dealer,
    pub images: Vec<String>,
}

fn type_name(raw: &str) -> &str {
    raw.trim_end_matches('/').rsplit('/').next().unwrap_or(raw)
}

fn is_vehicle_name(raw: &str) -> bool {
    let name = type_name(raw);
    VEHICLE_TYPES.iter().any(|t| name.ends_with(t))
}

fn is_vehicle_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => is_vehicle_name(s),
        Some(Value::Array(items)) => items.iter().any(|v| is_vehicle_type(Some(v))),
        _ => false,
    }
}

/// The first microdata item typed as a vehicle, as a JSON object.
#[must_use]
pub fn microdata_vehicle(document: &Html) -> Option<Value> {
    let selector = parse_selector("[itemscope][itemtype]")?;
    document
        .select(&selector)
        .find(|el| {
            el.value()
                .attr("itemtype")
                .is_some_and(|t| t.split_whitespace().any(is_vehicle_name))
        })
        .map(microdata_item)
}

fn microdata_item(scope: ElementRef<'_>) -> Value {
    let mut item = Map::new();
    if let Some(itemtype) = scope.value().attr("itemtype") {
        item.insert("@type".to_string(), Value::String(type_name(itemtype).to_string()));
    }
    let Some(selector) = parse_selector("[itemprop]") else {
        return Value::Object(item);
    };

    for prop in scope.select(&selector) {
        // Properties of a nested item belong to that item.
        let owner = prop
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().attr("itemscope").is_some());
        if owner.is_some_and(|o| o.id() != scope.id()) {
            continue;
        }
        let Some(name) = prop.value().attr("itemprop") else {
            continue;
        };
        let value = if prop.value().attr("itemscope").is_some() {
            microdata_item(prop)
        } else {
            Value::String(microdata_scalar(prop))
        };
        // Space-separated itemprop names share one value.
        for key in name.split_whitespace() {
            item.entry(key.to_string()).or_insert_with(|| value.clone());
        }
    }
    Value::Object(item)
}

fn microdata_scalar(prop: ElementRef<'_>) -> String {
    let el = prop.value();
    let attr = match el.name() {
        "meta" => el.attr("content"),
        "link" | "a" | "area" => el.attr("href"),
        "img" | "audio" | "video" | "source" => el.attr("src"),
        "time" => el.attr("datetime"),
        "data" | "meter" => el.attr("value"),
        _ => el.attr("content"),
    };
    attr.map_or_else(|| crate::extract::text_of(prop), |v| v.trim().to_string())
}

/// Every JSON-LD object typed as a vehicle, flattening arrays and `@graph`.
/// Unparsable blocks are skipped.
#[must_use]
pub fn jsonld_vehicles(document: &Html) -> Vec<Value> {
    let Some(selector) = parse_selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for script in document.select(&selector) {
        let body = script.text().collect::<String>();
        let body = body.trim();
        if body.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(json) => collect_vehicles(&json, &mut found),
            Err(err) => tracing::debug!(error = %err, "skipping malformed JSON-LD block"),
        }
    }
    found
}

fn collect_vehicles(value: &Value, found: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_vehicles(v, found)),
        Value::Object(obj) => {
            if let Some(graph) = obj.get("@graph") {
                collect_vehicles(graph, found);
            } else if is_vehicle_type(obj.get("@type")) {
                found.push(value.clone());
            }
        }
        _ => {}
    }
}

/// OpenGraph and Twitter Card values, OpenGraph first.
#[must_use]
pub fn social_meta(document: &Html) -> SocialMeta {
    let mut meta = SocialMeta::default();
    let Some(selector) = parse_selector("meta[content]") else {
        return meta;
    };

    let mut og_title = None;
    let mut tw_title = None;
    let mut og_desc = None;
    let mut tw_desc = None;
    let mut og_images = Vec::new();
    let mut tw_images = Vec::new();

    for el in document.select(&selector) {
        let el = el.value();
        let Some(key) = el.attr("property").or_else(|| el.attr("name")) else {
            continue;
        };
        let content = el.attr("content").unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let content = content.to_string();
        match key.to_ascii_lowercase().as_str() {
            "og:title" => {
                og_title.get_or_insert(content);
            }
            "twitter:title" => {
                tw_title.get_or_insert(content);
            }
            "og:description" => {
                og_desc.get_or_insert(content);
            }
            "twitter:description" => {
                tw_desc.get_or_insert(content);
            }
            "og:image" | "og:image:url" | "og:image:secure_url" => og_images.push(content),
            "twitter:image" | "twitter:image:src" => tw_images.push(content),
            "product:price:amount" | "og:price:amount" => {
                meta.price.get_or_insert(content);
            }
            _ => {}
        }
    }

    meta.title = og_title.or(tw_title);
    meta.description = og_desc.or(tw_desc);
    meta.images = og_images;
    meta.images.extend(tw_images);
    meta
}

/// Render a schema value as text: strings trimmed, numbers printed, objects
/// read through `name`/`value`, arrays through their first usable entry.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => ["name", "value", "@value"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(text_value)),
        Value::Array(items) => items.iter().find_map(text_value),
        _ => None,
    }
}

fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text_value))
}

/// `https://schema.org/FrontWheelDriveConfiguration` becomes
/// `Front Wheel Drive Configuration`; plain text passes through.
fn enum_text(raw: String) -> String {
    if !raw.contains("schema.org") {
        return raw;
    }
    let name = type_name(&raw);
    let mut spaced = String::with_capacity(name.len() + 8);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    spaced
}

fn first_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    match value? {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.iter().find_map(Value::as_object),
        _ => None,
    }
}

fn image_urls(value: Option<&Value>, out: &mut Vec<String>) {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => out.push(s.trim().to_string()),
        Some(Value::Array(items)) => items.iter().for_each(|v| image_urls(Some(v), out)),
        Some(Value::Object(obj)) => {
            image_urls(obj.get("url").or_else(|| obj.get("contentUrl")), out);
        }
        _ => {}
    }
}

fn dealer_from(obj: &Map<String, Value>) -> Dealer {
    let address = first_object(obj.get("address"));
    Dealer {
        name: field(obj, &["name", "legalName"]),
        phone: field(obj, &["telephone"]),
        city: address.and_then(|a| field(a, &["addressLocality"])),
        state: address.and_then(|a| field(a, &["addressRegion"])),
        zip: address.and_then(|a| field(a, &["postalCode"])),
    }
}

/// Map a schema.org `Vehicle`/`Car` object (from microdata or JSON-LD).
#[must_use]
pub fn schema_vehicle(value: &Value) -> SchemaVehicle {
    let Some(obj) = value.as_object() else {
        return SchemaVehicle::default();
    };
    let offer = first_object(obj.get("offers"));
    let engine = first_object(obj.get("vehicleEngine"));

    let price = offer
        .and_then(|o| {
            field(o, &["price", "lowPrice"]).or_else(|| {
                first_object(o.get("priceSpecification")).and_then(|p| field(p, &["price"]))
            })
        })
        .or_else(|| field(obj, &["price"]));

    let raw = RawVehicleData {
        year: field(obj, &["vehicleModelDate", "modelDate", "productionDate", "releaseDate"])
            .map(Into::into),
        make: field(obj, &["brand", "manufacturer"]),
        model: field(obj, &["model"]),
        trim: field(obj, &["vehicleConfiguration"]),
        body_style: field(obj, &["bodyType"]),
        price: price.map(Into::into),
        mileage: field(obj, &["mileageFromOdometer"]).map(Into::into),
        exterior_color: field(obj, &["color"]),
        interior_color: field(obj, &["vehicleInteriorColor"]),
        transmission: field(obj, &["vehicleTransmission"]).map(enum_text),
        drivetrain: field(obj, &["driveWheelConfiguration"]).map(enum_text),
        engine: obj.get("vehicleEngine").and_then(|e| match e {
            Value::String(_) => text_value(e),
            _ => engine.and_then(|en| field(en, &["name", "engineDisplacement"])),
        }),
        fuel_type: field(obj, &["fuelType"])
            .or_else(|| engine.and_then(|en| field(en, &["fuelType"])))
            .map(enum_text),
        vin: field(obj, &["vehicleIdentificationNumber", "vin", "serialNumber"]),
        stock_number: field(obj, &["sku", "productID"]),
        description: field(obj, &["description"]),
        condition: field(obj, &["itemCondition"])
            .or_else(|| offer.and_then(|o| field(o, &["itemCondition"])))
            .map(enum_text),
    };

    let seller = offer
        .and_then(|o| first_object(o.get("seller").or_else(|| o.get("offeredBy"))))
        .or_else(|| first_object(obj.get("seller")));

    let mut images = Vec::new();
    image_urls(obj.get("image"), &mut images);

    SchemaVehicle {
        name: field(obj, &["name"]),
        raw,
        dealer: seller.map(dealer_from).unwrap_or_default(),
        images,
    }
}

#[cfg(test)]
mod tests {
    use lotlift_core::RawValue;

    use super::*;

    #[test]
    fn jsonld_reads_graph_and_arrays() {
        let html = Html::parse_document(
            r#"<script type="application/ld+json">{"@graph":[{"@type":"Organization","name":"X"},{"@type":"Car","name":"2021 Toyota Camry SE"}]}</script>
               <script type="application/ld+json">[{"@type":["Product","Vehicle"],"name":"B"}]</script>
               <script type="application/ld+json">{not json</script>"#,
        );
        let found = jsonld_vehicles(&html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["name"], "2021 Toyota Camry SE");
        assert_eq!(found[1]["name"], "B");
    }

    #[test]
    fn schema_vehicle_maps_nested_values() {
        let value: Value = serde_json::from_str(
            r#"{
                "@type": "Car",
                "name": "2021 Toyota Camry SE",
                "brand": {"@type": "Brand", "name": "Toyota"},
                "model": "Camry",
                "vehicleModelDate": "2021",
                "mileageFromOdometer": {"@type": "QuantitativeValue", "value": 32100, "unitCode": "SMI"},
                "driveWheelConfiguration": "https://schema.org/FrontWheelDriveConfiguration",
                "vehicleEngine": {"@type": "EngineSpecification", "name": "2.5L I4", "fuelType": "Gasoline"},
                "vehicleIdentificationNumber": "4T1G11AK5MU000001",
                "image": ["https://cdn.example.com/1.jpg", {"url": "https://cdn.example.com/2.jpg"}],
                "offers": {
                    "@type": "Offer",
                    "price": 24500,
                    "itemCondition": "https://schema.org/UsedCondition",
                    "seller": {
                        "@type": "AutoDealer",
                        "name": "Metro Toyota",
                        "telephone": "555-010-2000",
                        "address": {"addressLocality": "Austin", "addressRegion": "TX", "postalCode": "78701"}
                    }
                }
            }"#,
        )
        .unwrap();

        let mapped = schema_vehicle(&value);
        assert_eq!(mapped.name.as_deref(), Some("2021 Toyota Camry SE"));
        assert_eq!(mapped.raw.make.as_deref(), Some("Toyota"));
        assert_eq!(mapped.raw.price, Some(RawValue::Text("24500".to_string())));
        assert_eq!(mapped.raw.mileage, Some(RawValue::Text("32100".to_string())));
        assert_eq!(
            mapped.raw.drivetrain.as_deref(),
            Some("Front Wheel Drive Configuration")
        );
        assert_eq!(mapped.raw.engine.as_deref(), Some("2.5L I4"));
        assert_eq!(mapped.raw.fuel_type.as_deref(), Some("Gasoline"));
        assert_eq!(mapped.raw.condition.as_deref(), Some("Used Condition"));
        assert_eq!(mapped.dealer.name.as_deref(), Some("Metro Toyota"));
        assert_eq!(mapped.dealer.state.as_deref(), Some("TX"));
        assert_eq!(mapped.images.len(), 2);
    }

    #[test]
    fn microdata_skips_nested_item_properties() {
        let html = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Car">
                 <h1 itemprop="name">2019 Subaru Outback Premium</h1>
                 <meta itemprop="vehicleIdentificationNumber" content="4S4BSAFC5K3000001">
                 <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                   <span itemprop="price" content="21995">$21,995</span>
                   <span itemprop="name">Offer name</span>
                 </div>
               </div>"#,
        );
        let item = microdata_vehicle(&html).unwrap();
        assert_eq!(item["name"], "2019 Subaru Outback Premium");
        assert_eq!(item["offers"]["price"], "21995");
        let mapped = schema_vehicle(&item);
        assert_eq!(mapped.raw.price, Some(RawValue::Text("21995".to_string())));
        assert_eq!(mapped.raw.vin.as_deref(), Some("4S4BSAFC5K3000001"));
    }

    #[test]
    fn microdata_ignores_non_vehicle_items() {
        let html = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Organization"><span itemprop="name">Dealer</span></div>"#,
        );
        assert!(microdata_vehicle(&html).is_none());
    }

    #[test]
    fn social_meta_prefers_opengraph() {
        let html = Html::parse_document(
            r#"<head>
                 <meta name="twitter:title" content="Twitter title">
                 <meta property="og:title" content="2022 Ford Bronco Sport">
                 <meta property="og:image" content="https://cdn.example.com/og.jpg">
                 <meta name="twitter:image" content="https://cdn.example.com/tw.jpg">
                 <meta property="product:price:amount" content="31,250">
               </head>"#,
        );
        let meta = social_meta(&html);
        assert_eq!(meta.title.as_deref(), Some("2022 Ford Bronco Sport"));
        assert_eq!(meta.price.as_deref(), Some("31,250"));
        assert_eq!(
            meta.images,
            vec![
                "https://cdn.example.com/og.jpg".to_string(),
                "https://cdn.example.com/tw.jpg".to_string()
            ]
        );
        assert!(meta.description.is_none());
    }
}
