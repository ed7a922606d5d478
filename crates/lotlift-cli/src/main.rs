use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod history;
mod listing;
mod scrape;

#[derive(Debug, Parser)]
#[command(name = "lotlift")]
#[command(about = "Extract vehicle listings from dealer and marketplace pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a vehicle detail page and store the result in history.
    Scrape {
        /// Page URL. Fetched unless `--html` is given.
        url: String,
        /// Read the page from a saved HTML file instead of fetching it.
        #[arg(long)]
        html: Option<PathBuf>,
        /// Print the result without saving it to history.
        #[arg(long)]
        no_save: bool,
    },
    /// Inspect or clear the scrape history.
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Print the marketplace title and description for a stored result.
    Listing { id: String },
    /// Download a stored result's photos into a directory.
    Photos {
        id: String,
        #[arg(long, default_value = "photos")]
        out: PathBuf,
    },
    /// Preview which fields of a saved marketplace form a result would fill.
    Preview {
        id: String,
        /// Saved HTML of the marketplace listing form.
        #[arg(long)]
        form: PathBuf,
    },
    /// Write history and settings to a JSON export file.
    Export { path: PathBuf },
    /// Replace history from a JSON export file.
    Import { path: PathBuf },
}

#[derive(Debug, Subcommand)]
enum HistoryCommands {
    List,
    Show { id: String },
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = lotlift_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = lotlift_core::load_settings(&config.settings_path)?;
    let store = lotlift_core::HistoryStore::new(&config.history_path);

    match cli.command {
        Some(Commands::Scrape { url, html, no_save }) => {
            let options = scrape::ScrapeOptions {
                url: &url,
                html: html.as_deref(),
                save: !no_save,
            };
            scrape::run_scrape(&config, &settings, &store, &options).await?;
        }
        Some(Commands::History { command }) => match command {
            HistoryCommands::List => history::run_list(&store)?,
            HistoryCommands::Show { id } => history::run_show(&store, &id)?,
            HistoryCommands::Clear => history::run_clear(&store)?,
        },
        Some(Commands::Listing { id }) => listing::run_listing(&store, &id)?,
        Some(Commands::Photos { id, out }) => {
            listing::run_photos(&config, &settings, &store, &id, &out).await?;
        }
        Some(Commands::Preview { id, form }) => {
            listing::run_preview(&config, &settings, &store, &id, &form).await?;
        }
        Some(Commands::Export { path }) => history::run_export(&store, &settings, &path)?,
        Some(Commands::Import { path }) => history::run_import(&store, &path)?,
        None => println!("lotlift ready; see --help"),
    }

    Ok(())
}
