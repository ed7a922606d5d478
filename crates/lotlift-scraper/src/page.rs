//! Read-only page snapshot handed to the adapters.

use reqwest::Url;
use scraper::Html;

use crate::error::ScraperError;

/// A parsed document together with the URL it was loaded from.
///
/// Nothing in the extraction path mutates the document.
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    /// Parse `html` as the document found at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `url` is not an absolute
    /// http(s) URL.
    pub fn parse(url: &str, html: &str) -> Result<Self, ScraperError> {
        let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(Self {
            url: parsed,
            document: Html::parse_document(html),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Lowercased host name without a leading `www.`.
    #[must_use]
    pub fn hostname(&self) -> String {
        let host = self.url.host_str().unwrap_or_default().to_ascii_lowercase();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    }
}

/// Fetch a page over HTTP and parse it.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] on transport failure,
/// [`ScraperError::UnexpectedStatus`] for non-2xx responses, and
/// [`ScraperError::InvalidUrl`] if `url` cannot be parsed.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<Page, ScraperError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    // Redirects may land on a different listing URL; extraction resolves
    // relative photo URLs against the final one.
    let final_url = response.url().to_string();
    let body = response.text().await?;
    Page::parse(&final_url, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_relative_url() {
        let err = Page::parse("/inventory/1", "<html></html>").err().unwrap();
        assert!(matches!(err, ScraperError::InvalidUrl { .. }));
    }

    #[test]
    fn parse_rejects_non_http_scheme() {
        let err = Page::parse("file:///tmp/page.html", "<html></html>")
            .err()
            .unwrap();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn hostname_strips_www() {
        let page = Page::parse("https://WWW.Cars.com/vehicledetail/123/", "").unwrap();
        assert_eq!(page.hostname(), "cars.com");
    }
}
