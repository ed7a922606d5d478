//! Vehicle listing extraction: page adapters, normalization, photo download,
//! and marketplace form replay.

pub mod adapters;
pub mod autofill;
pub mod download;
pub mod engine;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod page;
pub mod photos;
pub mod poll;
pub mod structured;

pub use adapters::Adapter;
pub use autofill::{
    locate_field, replay, AutofillReport, FormField, ListingDraft, MarketplaceForm, SnapshotForm,
};
pub use download::{download_photos, PhotoFile};
pub use engine::{validate_result, ScrapingEngine};
pub use error::ScraperError;
pub use normalize::{
    generate_facebook_description, generate_facebook_title, normalize_vehicle_data,
};
pub use page::{fetch_page, Page};
pub use photos::extract_photos;
pub use poll::{poll_until, PollConfig};
