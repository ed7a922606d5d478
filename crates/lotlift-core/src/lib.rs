mod app_config;
mod config;
mod error;
pub mod history;
pub mod listing;
pub mod settings;
pub mod vehicle;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, HistoryError};
pub use history::{ExportDocument, HistoryStore, HISTORY_LIMIT};
pub use listing::{Dealer, Photo, ScrapeResult};
pub use settings::{load_settings, validate_settings, AutofillOptions, Settings, SITE_NAMES};
pub use vehicle::{Condition, RawValue, RawVehicleData, Vehicle};
