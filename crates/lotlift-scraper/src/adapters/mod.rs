//! Site adapters.
//!
//! Each listing site is one variant of [`Adapter`]. Site variants are tried
//! by the engine in [`Adapter::SITE_ADAPTERS`] order; [`Adapter::Generic`]
//! is the fallback for any other dealer page.

mod autotrader;
mod cargurus;
mod cars_com;
mod dealer_com;
mod generic;
pub(crate) mod pipeline;

use std::fmt;

use lotlift_core::ScrapeResult;
use reqwest::Url;

use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapter {
    AutoTrader,
    CarsDotCom,
    CarGurus,
    DealerDotCom,
    Generic,
}

/// `host` is `domain` or one of its subdomains.
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

impl Adapter {
    /// Site-specific adapters in selection order.
    pub const SITE_ADAPTERS: [Adapter; 4] = [
        Adapter::AutoTrader,
        Adapter::CarsDotCom,
        Adapter::CarGurus,
        Adapter::DealerDotCom,
    ];

    pub const ALL: [Adapter; 5] = [
        Adapter::AutoTrader,
        Adapter::CarsDotCom,
        Adapter::CarGurus,
        Adapter::DealerDotCom,
        Adapter::Generic,
    ];

    /// Stable name, used in result ids and in `enabledSites`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Adapter::AutoTrader => autotrader::NAME,
            Adapter::CarsDotCom => cars_com::NAME,
            Adapter::CarGurus => cargurus::NAME,
            Adapter::DealerDotCom => dealer_com::NAME,
            Adapter::Generic => generic::NAME,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|adapter| adapter.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether `host` (lowercase, without `www.`) belongs to this site.
    /// The generic adapter accepts any host.
    #[must_use]
    pub fn matches_host(self, host: &str) -> bool {
        match self {
            Adapter::AutoTrader => domain_matches(host, "autotrader.com"),
            Adapter::CarsDotCom => domain_matches(host, "cars.com"),
            Adapter::CarGurus => domain_matches(host, "cargurus.com"),
            // Dealer.com sites run on many dealer-owned hostnames.
            Adapter::DealerDotCom => host.contains("dealer.com"),
            Adapter::Generic => true,
        }
    }

    /// Whether `url` looks like a vehicle detail page for this adapter.
    #[must_use]
    pub fn is_vehicle_page(self, url: &Url) -> bool {
        match self {
            Adapter::AutoTrader => autotrader::is_vehicle_page(url),
            Adapter::CarsDotCom => cars_com::is_vehicle_page(url),
            Adapter::CarGurus => cargurus::is_vehicle_page(url),
            Adapter::DealerDotCom => dealer_com::is_vehicle_page(url),
            Adapter::Generic => generic::is_vehicle_page(url),
        }
    }

    /// Extract a listing from `page`. Missing data becomes warnings; this
    /// never fails for an unusual page.
    #[must_use]
    pub fn scrape(self, page: &Page) -> ScrapeResult {
        match self {
            Adapter::AutoTrader => autotrader::scrape(page),
            Adapter::CarsDotCom => cars_com::scrape(page),
            Adapter::CarGurus => cargurus::scrape(page),
            Adapter::DealerDotCom => dealer_com::scrape(page),
            Adapter::Generic => generic::scrape(page),
        }
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
