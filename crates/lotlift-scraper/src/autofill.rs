//! Marketplace form replay.
//!
//! A [`ListingDraft`] is built from a [`ScrapeResult`] and replayed field by
//! field into a [`MarketplaceForm`]. Marketplace forms render lazily, so each
//! field is polled until the form accepts it or the poll times out.

use lotlift_core::{AutofillOptions, Photo, ScrapeResult};
use scraper::{ElementRef, Html};

use crate::download::PhotoFile;
use crate::extract::{find_by_label, find_element, is_visible, parse_selector};
use crate::normalize::{generate_facebook_description, generate_facebook_title};
use crate::poll::{poll_until, PollConfig};

const FILE_INPUT_SELECTORS: [&str; 2] = ["input[type='file'][accept*='image']", "input[type='file']"];

/// A marketplace vehicle-listing form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Year,
    Make,
    Model,
    Price,
    Mileage,
    BodyStyle,
    ExteriorColor,
    InteriorColor,
    FuelType,
    Transmission,
    Condition,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 13] = [
        FormField::Title,
        FormField::Year,
        FormField::Make,
        FormField::Model,
        FormField::Price,
        FormField::Mileage,
        FormField::BodyStyle,
        FormField::ExteriorColor,
        FormField::InteriorColor,
        FormField::FuelType,
        FormField::Transmission,
        FormField::Condition,
        FormField::Description,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Year => "year",
            FormField::Make => "make",
            FormField::Model => "model",
            FormField::Price => "price",
            FormField::Mileage => "mileage",
            FormField::BodyStyle => "body style",
            FormField::ExteriorColor => "exterior color",
            FormField::InteriorColor => "interior color",
            FormField::FuelType => "fuel type",
            FormField::Transmission => "transmission",
            FormField::Condition => "condition",
            FormField::Description => "description",
        }
    }

    /// Selectors tried before the label search, most specific first.
    #[must_use]
    pub fn selectors(self) -> &'static [&'static str] {
        match self {
            FormField::Title => &["input[aria-label='Title']", "input[name='title']"],
            FormField::Year => &["[aria-label='Year']", "select[name='year']", "input[name='year']"],
            FormField::Make => &["[aria-label='Make']", "input[name='make']"],
            FormField::Model => &["[aria-label='Model']", "input[name='model']"],
            FormField::Price => &["input[aria-label='Price']", "input[name='price']"],
            FormField::Mileage => &["input[aria-label='Mileage']", "input[name='mileage']"],
            FormField::BodyStyle => &["[aria-label='Body style']", "select[name='bodyStyle']"],
            FormField::ExteriorColor => &[
                "[aria-label='Exterior color']",
                "select[name='exteriorColor']",
            ],
            FormField::InteriorColor => &[
                "[aria-label='Interior color']",
                "select[name='interiorColor']",
            ],
            FormField::FuelType => &["[aria-label='Fuel type']", "select[name='fuelType']"],
            FormField::Transmission => &[
                "[aria-label='Transmission']",
                "select[name='transmission']",
            ],
            FormField::Condition => &[
                "[aria-label='Vehicle condition']",
                "[aria-label='Condition']",
                "select[name='condition']",
            ],
            FormField::Description => &[
                "textarea[aria-label='Description']",
                "textarea[name='description']",
                "textarea",
            ],
        }
    }

    /// Visible label texts for the proximity search.
    #[must_use]
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            FormField::Title => &["Title", "Listing title"],
            FormField::Year => &["Year"],
            FormField::Make => &["Make"],
            FormField::Model => &["Model"],
            FormField::Price => &["Price"],
            FormField::Mileage => &["Mileage", "Odometer"],
            FormField::BodyStyle => &["Body style", "Body type"],
            FormField::ExteriorColor => &["Exterior color"],
            FormField::InteriorColor => &["Interior color"],
            FormField::FuelType => &["Fuel type"],
            FormField::Transmission => &["Transmission"],
            FormField::Condition => &["Vehicle condition", "Condition"],
            FormField::Description => &["Description"],
        }
    }
}

/// Find the visible control for `field`: selectors first, then labels.
#[must_use]
pub fn locate_field(scope: ElementRef<'_>, field: FormField) -> Option<ElementRef<'_>> {
    field
        .selectors()
        .iter()
        .filter_map(|sel| parse_selector(sel))
        .find_map(|selector| scope.select(&selector).find(|el| is_visible(*el)))
        .or_else(|| find_by_label(scope, field.labels()))
}

/// Form values and photos for one marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    /// Non-empty values in form order.
    pub values: Vec<(FormField, String)>,
    pub photos: Vec<Photo>,
}

impl ListingDraft {
    #[must_use]
    pub fn from_result(result: &ScrapeResult, options: &AutofillOptions) -> Self {
        let vehicle = &result.vehicle;
        let candidates = [
            (FormField::Title, Some(generate_facebook_title(vehicle))),
            (FormField::Year, vehicle.year.map(|y| y.to_string())),
            (FormField::Make, vehicle.make.clone()),
            (FormField::Model, vehicle.model.clone()),
            (FormField::Price, vehicle.price.map(|p| p.to_string())),
            (FormField::Mileage, vehicle.mileage.map(|m| m.to_string())),
            (FormField::BodyStyle, vehicle.body_style.clone()),
            (FormField::ExteriorColor, vehicle.exterior_color.clone()),
            (FormField::InteriorColor, vehicle.interior_color.clone()),
            (FormField::FuelType, vehicle.fuel_type.clone()),
            (FormField::Transmission, vehicle.transmission.clone()),
            (FormField::Condition, Some(options.condition.label().to_string())),
            (
                FormField::Description,
                Some(generate_facebook_description(
                    vehicle,
                    &result.dealer,
                    vehicle.stock_number.as_deref(),
                )),
            ),
        ];
        let values = candidates
            .into_iter()
            .filter_map(|(field, value)| value.filter(|v| !v.is_empty()).map(|v| (field, v)))
            .collect();

        let photos = if options.upload_photos {
            result
                .photos
                .iter()
                .take(options.max_photos)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        Self { values, photos }
    }

    #[must_use]
    pub fn value(&self, field: FormField) -> Option<&str> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// The marketplace side of the replay. Each call returns `false` while the
/// target control is not available yet.
pub trait MarketplaceForm {
    fn try_fill(&mut self, field: FormField, value: &str) -> bool;
    fn try_attach_photos(&mut self, files: &[PhotoFile]) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutofillReport {
    pub filled: Vec<FormField>,
    /// Fields whose control never appeared.
    pub skipped: Vec<FormField>,
    pub photos_attached: usize,
}

/// Replay `draft` into `form`. A field that times out is recorded in
/// [`AutofillReport::skipped`] and the run continues.
pub async fn replay<F>(
    form: &mut F,
    draft: &ListingDraft,
    files: &[PhotoFile],
    config: PollConfig,
) -> AutofillReport
where
    F: MarketplaceForm + ?Sized,
{
    let mut report = AutofillReport::default();
    for (field, value) in &draft.values {
        let outcome = poll_until(config, field.name(), || {
            form.try_fill(*field, value).then_some(())
        })
        .await;
        match outcome {
            Ok(()) => report.filled.push(*field),
            Err(err) => {
                tracing::warn!(field = field.name(), error = %err, "skipping form field");
                report.skipped.push(*field);
            }
        }
    }

    if !files.is_empty() {
        match poll_until(config, "photo upload input", || {
            form.try_attach_photos(files).then_some(())
        })
        .await
        {
            Ok(()) => report.photos_attached = files.len(),
            Err(err) => tracing::warn!(error = %err, "photos not attached"),
        }
    }

    tracing::info!(
        filled = report.filled.len(),
        skipped = report.skipped.len(),
        photos = report.photos_attached,
        "autofill finished"
    );
    report
}

/// A saved form page used to preview which fields a draft would fill.
pub struct SnapshotForm {
    document: Html,
    /// Field, value, and the tag of the control that would receive it.
    pub filled: Vec<(FormField, String, String)>,
}

impl SnapshotForm {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            filled: Vec::new(),
        }
    }
}

impl MarketplaceForm for SnapshotForm {
    fn try_fill(&mut self, field: FormField, value: &str) -> bool {
        let Some(control) = locate_field(self.document.root_element(), field) else {
            return false;
        };
        let tag = control.value().name().to_string();
        self.filled.push((field, value.to_string(), tag));
        true
    }

    fn try_attach_photos(&mut self, _files: &[PhotoFile]) -> bool {
        find_element(self.document.root_element(), &FILE_INPUT_SELECTORS).is_some()
    }
}
