//! Photo discovery: candidate URLs from image attributes, `srcset`, lazy-load
//! attributes, and inline background images, resolved, cleaned, deduplicated
//! and ordered main-first then by size.

use std::collections::HashSet;
use std::sync::LazyLock;

use lotlift_core::Photo;
use regex::Regex;
use reqwest::Url;
use scraper::ElementRef;

use crate::extract::find_all;

static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*?url\(\s*['"]?([^'")]+?)['"]?\s*\)"#)
        .expect("valid background regex")
});

const LAZY_ATTRS: [&str; 5] = [
    "data-src",
    "data-original",
    "data-lazy",
    "data-full",
    "data-large",
];
const TRACKING_PARAMS: [&str; 5] = ["gclid", "fbclid", "_ga", "ref", "referrer"];
const IMAGE_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif", ".bmp", ".svg",
];
const IMAGE_INDICATORS: [&str; 9] = [
    "/image/", "/img/", "/photo/", "/picture/", "/gallery/", "images.", "photos.", "media.",
    "cdn.",
];
const MAIN_KEYWORDS: [&str; 8] = [
    "hero", "main", "primary", "featured", "highlight", "large", "big", "banner",
];
const MAIN_AREA_THRESHOLD: u64 = 500_000;
const MAIN_ANCESTOR_DEPTH: usize = 3;
/// Width assumed for a `1x` srcset density.
const DENSITY_BASE_WIDTH: f64 = 1920.0;

/// One `srcset` entry with its effective width.
#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetCandidate {
    pub url: String,
    pub width: u32,
    /// True when the width came from a `w` descriptor.
    pub exact: bool,
}

/// Parse a `srcset` attribute, widest first. `x` densities are scaled
/// against a 1920px base width; a missing descriptor counts as `1x`.
#[must_use]
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate> {
    let mut candidates: Vec<SrcsetCandidate> = srcset
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?.to_string();
            let descriptor = parts.next().unwrap_or("1x").to_ascii_lowercase();
            if let Some(w) = descriptor.strip_suffix('w') {
                let width = w.parse::<u32>().ok()?;
                Some(SrcsetCandidate { url, width, exact: true })
            } else {
                let density = descriptor.strip_suffix('x')?.parse::<f64>().ok()?;
                if !density.is_finite() || density <= 0.0 {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let width = (density * DENSITY_BASE_WIDTH).round() as u32;
                Some(SrcsetCandidate { url, width, exact: false })
            }
        })
        .collect();
    candidates.sort_by(|a, b| b.width.cmp(&a.width));
    candidates
}

/// Resolve `raw` against `base`, keeping only http(s) results.
#[must_use]
pub fn absolutize(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let url = base.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Drop tracking query parameters and the fragment. The query is only
/// rebuilt when something was removed, so untouched URLs keep their exact
/// encoding.
#[must_use]
pub fn clean_url(mut url: Url) -> Url {
    url.set_fragment(None);
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| !is_tracking_param(k)).collect();
    if kept.len() != pairs.len() {
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }
    url
}

/// Whether a URL plausibly points at an image, by extension or by a
/// path/host indicator.
#[must_use]
pub fn looks_like_image(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    let host_and_path = format!("{}{}", url.host_str().unwrap_or_default(), path).to_ascii_lowercase();
    IMAGE_INDICATORS.iter().any(|hint| host_and_path.contains(hint))
}

/// Ordered, deduplicated photo accumulator shared by every photo source of
/// one scrape.
#[derive(Debug, Clone)]
pub struct PhotoSet {
    base: Url,
    seen: HashSet<String>,
    photos: Vec<Photo>,
}

impl PhotoSet {
    #[must_use]
    pub fn new(base: &Url) -> Self {
        Self {
            base: base.clone(),
            seen: HashSet::new(),
            photos: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Add one candidate. Returns `false` if it was rejected or already seen.
    pub fn add(&mut self, raw: &str, width: Option<u32>, height: Option<u32>, main_hint: bool) -> bool {
        let Some(url) = absolutize(&self.base, raw).map(clean_url) else {
            return false;
        };
        if !looks_like_image(&url) {
            return false;
        }
        let url = url.to_string();
        if !self.seen.insert(url.clone()) {
            return false;
        }
        let mut photo = Photo {
            url,
            width,
            height,
            is_main: main_hint,
        };
        photo.is_main |= photo.area() > MAIN_AREA_THRESHOLD;
        self.photos.push(photo);
        true
    }

    /// Add every candidate found on elements matching `selectors`.
    pub fn collect(&mut self, scope: ElementRef<'_>, selectors: &[&str]) {
        for element in find_all(scope, selectors) {
            self.collect_element(element);
        }
    }

    fn collect_element(&mut self, element: ElementRef<'_>) {
        let el = element.value();
        let main_hint = has_main_marker(element);
        let (width, height) = declared_size(element);

        if let Some(src) = el.attr("src") {
            self.add(src, width, height, main_hint);
        }
        if let Some(srcset) = el.attr("srcset").or_else(|| el.attr("data-srcset")) {
            for candidate in parse_srcset(srcset) {
                let (w, h) = scaled_size(&candidate, width, height);
                self.add(&candidate.url, w, h, main_hint);
            }
        }
        for attr in LAZY_ATTRS {
            if let Some(value) = el.attr(attr) {
                self.add(value, width, height, main_hint);
            }
        }

        let styled = std::iter::once(element).chain(
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|a| !matches!(a.value().name(), "body" | "html")),
        );
        for node in styled {
            let Some(style) = node.value().attr("style") else {
                continue;
            };
            for capture in BACKGROUND_URL_RE.captures_iter(style) {
                self.add(&capture[1], None, None, main_hint);
            }
        }
    }

    /// Final ordering: main photos first, then by area descending. Stable, so
    /// equal photos keep discovery order.
    #[must_use]
    pub fn finish(mut self) -> Vec<Photo> {
        self.photos
            .sort_by(|a, b| b.is_main.cmp(&a.is_main).then_with(|| b.area().cmp(&a.area())));
        self.photos
    }
}

/// Collect photos from `selectors` under `scope`, resolved against `base`.
#[must_use]
pub fn extract_photos(scope: ElementRef<'_>, base: &Url, selectors: &[&str]) -> Vec<Photo> {
    let mut set = PhotoSet::new(base);
    set.collect(scope, selectors);
    set.finish()
}

fn parse_dimension(value: Option<&str>) -> Option<u32> {
    let value = value?.trim().trim_end_matches("px");
    value.parse::<u32>().ok().filter(|v| *v > 0)
}

fn declared_size(element: ElementRef<'_>) -> (Option<u32>, Option<u32>) {
    let el = element.value();
    let width = parse_dimension(el.attr("width")).or_else(|| parse_dimension(el.attr("data-width")));
    let height =
        parse_dimension(el.attr("height")).or_else(|| parse_dimension(el.attr("data-height")));
    (width, height)
}

/// Dimensions for a srcset candidate. `w` descriptors give the width and the
/// height follows the element's aspect ratio when it is declared.
fn scaled_size(
    candidate: &SrcsetCandidate,
    width: Option<u32>,
    height: Option<u32>,
) -> (Option<u32>, Option<u32>) {
    if !candidate.exact {
        return (width, height);
    }
    let scaled_height = match (width, height) {
        (Some(w), Some(h)) if w > 0 => {
            let h = u64::from(candidate.width) * u64::from(h) / u64::from(w);
            u32::try_from(h).ok()
        }
        _ => None,
    };
    (Some(candidate.width), scaled_height)
}

fn has_main_marker(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take(MAIN_ANCESTOR_DEPTH),
        )
        .any(|node| {
            let el = node.value();
            let markers = format!(
                "{} {}",
                el.attr("class").unwrap_or_default(),
                el.attr("id").unwrap_or_default()
            )
            .to_ascii_lowercase();
            MAIN_KEYWORDS.iter().any(|kw| markers.contains(kw))
        })
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn base() -> Url {
        Url::parse("https://dealer.example.com/inventory/123").unwrap()
    }

    fn collect(html: &str, selectors: &[&str]) -> Vec<Photo> {
        let doc = Html::parse_document(html);
        extract_photos(doc.root_element(), &base(), selectors)
    }

    #[test]
    fn srcset_sorts_widest_first_and_scales_density() {
        let parsed = parse_srcset("a.jpg 480w, b.jpg 1200w, c.jpg 2x");
        let widths: Vec<u32> = parsed.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![3840, 1200, 480]);
        assert_eq!(parsed[0].url, "c.jpg");
        assert!(!parsed[0].exact);
    }

    #[test]
    fn srcset_ignores_garbage_descriptors() {
        let parsed = parse_srcset("a.jpg huge, b.jpg 800w,");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].url, "b.jpg");
    }

    #[test]
    fn clean_url_strips_tracking_and_fragment() {
        let url = Url::parse("https://cdn.example.com/p/1.jpg?w=800&utm_source=x&fbclid=y#top").unwrap();
        assert_eq!(clean_url(url).as_str(), "https://cdn.example.com/p/1.jpg?w=800");
    }

    #[test]
    fn clean_url_drops_query_when_only_tracking() {
        let url = Url::parse("https://cdn.example.com/p/1.jpg?utm_campaign=a&gclid=b").unwrap();
        assert_eq!(clean_url(url).as_str(), "https://cdn.example.com/p/1.jpg");
    }

    #[test]
    fn clean_url_keeps_untouched_query_verbatim() {
        let url = Url::parse("https://cdn.example.com/p/1.jpg?size=large&crop=a%2Cb").unwrap();
        assert_eq!(
            clean_url(url).as_str(),
            "https://cdn.example.com/p/1.jpg?size=large&crop=a%2Cb"
        );
    }

    #[test]
    fn absolutize_rejects_non_http() {
        assert!(absolutize(&base(), "data:image/png;base64,AAAA").is_none());
        assert!(absolutize(&base(), "javascript:void(0)").is_none());
        assert_eq!(
            absolutize(&base(), "/photos/1.jpg").unwrap().as_str(),
            "https://dealer.example.com/photos/1.jpg"
        );
    }

    #[test]
    fn looks_like_image_by_extension_or_indicator() {
        let yes = ["https://x.com/a/b.JPG", "https://images.x.com/abc", "https://x.com/photo/123"];
        for raw in yes {
            assert!(looks_like_image(&Url::parse(raw).unwrap()), "{raw}");
        }
        assert!(!looks_like_image(&Url::parse("https://x.com/track?id=1").unwrap()));
    }

    #[test]
    fn duplicate_urls_are_kept_once() {
        let photos = collect(
            r#"<div class="gallery">
                 <img src="/photos/1.jpg?utm_source=feed">
                 <img src="https://dealer.example.com/photos/1.jpg#zoom">
                 <img data-src="/photos/2.jpg">
               </div>"#,
            &[".gallery img"],
        );
        let urls: Vec<&str> = photos.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://dealer.example.com/photos/1.jpg",
                "https://dealer.example.com/photos/2.jpg"
            ]
        );
    }

    #[test]
    fn main_photos_sort_first_then_by_area() {
        let photos = collect(
            r#"<div class="gallery">
                 <img src="/photos/small.jpg" width="320" height="240">
                 <img src="/photos/big.jpg" width="1024" height="768">
                 <div class="hero"><img src="/photos/hero.jpg" width="100" height="100"></div>
               </div>"#,
            &[".gallery img"],
        );
        let urls: Vec<&str> = photos.iter().map(|p| p.url.rsplit('/').next().unwrap()).collect();
        assert_eq!(urls, vec!["big.jpg", "hero.jpg", "small.jpg"]);
        assert!(photos[0].is_main, "area above threshold marks main");
        assert!(photos[1].is_main, "hero ancestor marks main");
        assert!(!photos[2].is_main);
    }

    #[test]
    fn srcset_candidates_take_descriptor_width() {
        let photos = collect(
            r#"<img class="slide" src="/p/s.jpg" srcset="/p/m.jpg 800w, /p/l.jpg 1600w" width="400" height="300">"#,
            &["img.slide"],
        );
        let large = photos.iter().find(|p| p.url.ends_with("l.jpg")).unwrap();
        assert_eq!((large.width, large.height), (Some(1600), Some(1200)));
        assert!(large.is_main);
    }

    #[test]
    fn background_images_are_collected_from_ancestors() {
        let photos = collect(
            r#"<body style="background-image:url(/p/body.jpg)">
                 <div style="background-image: url('/p/bg.jpg')"><span class="tile"></span></div>
               </body>"#,
            &[".tile"],
        );
        assert_eq!(photos.len(), 1);
        assert!(photos[0].url.ends_with("/p/bg.jpg"));
    }

    #[test]
    fn non_image_urls_are_rejected() {
        let photos = collect(r#"<img class="x" src="/track?id=1">"#, &["img.x"]);
        assert!(photos.is_empty());
    }
}
