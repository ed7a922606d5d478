//! Field extraction primitives over a parsed document.
//!
//! Every lookup takes an ordered list of CSS selectors and returns the first
//! hit. Invalid selectors are logged and skipped. Label search works on the
//! read-only tree: semantic `<label>`/`data-label` association first, then
//! proximity to a text node containing the label.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ZERO_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|;)(?:width|height):0(?:px|%|em|rem)?(?:;|$)").expect("valid size regex")
});
static ZERO_OPACITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|;)opacity:0(?:\.0+)?(?:;|$)").expect("valid opacity regex"));

const CONTROL_SELECTOR: &str = "input, select, textarea";
const NON_TEXT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
const EXCLUDED_INPUT_TYPES: [&str; 4] = ["hidden", "submit", "button", "reset"];
const SIBLING_SCAN_LIMIT: usize = 3;
const ANCESTOR_SCAN_LIMIT: usize = 3;

/// Parse a selector, logging and discarding malformed ones.
#[must_use]
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(selector, error = ?err, "skipping invalid CSS selector");
            None
        }
    }
}

/// First element under `scope` matching any of `selectors`, trying them in order.
#[must_use]
pub fn find_element<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        scope.select(&selector).next()
    })
}

/// Every element under `scope` matching any selector, in selector order then
/// document order, without duplicates.
#[must_use]
pub fn find_all<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    let mut seen = std::collections::HashSet::new();
    let mut found = Vec::new();
    for raw in selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        for element in scope.select(&selector) {
            if seen.insert(element.id()) {
                found.push(element);
            }
        }
    }
    found
}

/// Collapse runs of whitespace to single spaces and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Visible text of `element`, with text nodes joined by spaces.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    let joined = element
        .descendants()
        .filter(|node| !node.parent().and_then(ElementRef::wrap).is_some_and(within_non_text))
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect::<Vec<&str>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Non-empty text of the first element matching `selectors`.
#[must_use]
pub fn select_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        scope
            .select(&selector)
            .map(text_of)
            .find(|text| !text.is_empty())
    })
}

/// Non-empty `attr` value of the first element matching `selectors`.
#[must_use]
pub fn select_attr(scope: ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        scope
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Content of the first `<meta>` whose `property` or `name` equals one of `keys`.
#[must_use]
pub fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    let selector = parse_selector("meta[content]")?;
    keys.iter().find_map(|key| {
        document.select(&selector).find_map(|meta| {
            let el = meta.value();
            let matches = el
                .attr("property")
                .or_else(|| el.attr("name"))
                .is_some_and(|k| k.eq_ignore_ascii_case(key));
            matches
                .then(|| el.attr("content").unwrap_or_default().trim().to_string())
                .filter(|c| !c.is_empty())
        })
    })
}

/// Whitespace-collapsed text of the whole body, excluding scripts and styles.
#[must_use]
pub fn page_text(document: &Html) -> String {
    let root = document.root_element();
    let body = parse_selector("body")
        .and_then(|sel| root.select(&sel).next())
        .unwrap_or(root);
    text_of(body)
}

fn within_non_text(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| NON_TEXT_TAGS.contains(&el.value().name()))
}

fn compact_style(element: ElementRef<'_>) -> String {
    element
        .value()
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Markup-level visibility: no `hidden` attribute or hiding inline style on
/// the element or its ancestors, no zero opacity, and no declared zero size.
#[must_use]
pub fn is_visible(element: ElementRef<'_>) -> bool {
    let style = compact_style(element);
    if ZERO_OPACITY_RE.is_match(&style) || ZERO_SIZE_RE.is_match(&style) {
        return false;
    }
    let el = element.value();
    if el.attr("width") == Some("0") || el.attr("height") == Some("0") {
        return false;
    }

    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|node| {
            let style = compact_style(node);
            node.value().attr("hidden").is_none()
                && !style.contains("display:none")
                && !style.contains("visibility:hidden")
        })
}

fn is_form_control(element: ElementRef<'_>) -> bool {
    let el = element.value();
    match el.name() {
        "select" | "textarea" => true,
        "input" => {
            let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            !EXCLUDED_INPUT_TYPES.contains(&kind.as_str())
        }
        _ => false,
    }
}

fn usable_control(element: ElementRef<'_>) -> bool {
    is_form_control(element) && is_visible(element)
}

fn first_control_within(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let selector = parse_selector(CONTROL_SELECTOR)?;
    element.select(&selector).find(|el| usable_control(*el))
}

fn control_at_or_within(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if usable_control(element) {
        Some(element)
    } else {
        first_control_within(element)
    }
}

/// Locate the form control associated with any of `labels`.
///
/// For each label, in order: a `<label>` or `[data-label]` element containing
/// the text and its control (`for` target, nested control, or next sibling);
/// then proximity search around text nodes containing the label. Matching is
/// case-insensitive substring.
#[must_use]
pub fn find_by_label<'a>(scope: ElementRef<'a>, labels: &[&str]) -> Option<ElementRef<'a>> {
    labels.iter().find_map(|label| {
        let needle = label.to_lowercase();
        if needle.trim().is_empty() {
            return None;
        }
        find_by_semantic_label(scope, &needle).or_else(|| find_by_proximity(scope, &needle))
    })
}

fn find_by_semantic_label<'a>(scope: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector("label, [data-label]")?;
    scope.select(&selector).find_map(|label_el| {
        let text_hit = text_of(label_el).to_lowercase().contains(needle);
        let data_hit = label_el
            .value()
            .attr("data-label")
            .is_some_and(|v| v.to_lowercase().contains(needle));
        if !text_hit && !data_hit {
            return None;
        }

        if let Some(target_id) = label_el.value().attr("for") {
            let target = scope
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().id() == Some(target_id));
            if let Some(control) = target.filter(|el| usable_control(*el)) {
                return Some(control);
            }
        }

        first_control_within(label_el).or_else(|| {
            label_el
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .and_then(control_at_or_within)
        })
    })
}

fn find_by_proximity<'a>(scope: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    scope
        .descendants()
        .filter(|node| {
            node.value()
                .as_text()
                .is_some_and(|t| t.to_lowercase().contains(needle))
        })
        .filter_map(|node| node.parent().and_then(ElementRef::wrap))
        .filter(|parent| !within_non_text(*parent))
        .find_map(scan_around)
}

fn scan_around(container: ElementRef<'_>) -> Option<ElementRef<'_>> {
    // The container itself, then up to three ancestors.
    let mut level = Some(container);
    for _ in 0..=ANCESTOR_SCAN_LIMIT {
        let current = level?;
        if let Some(control) = first_control_within(current) {
            return Some(control);
        }
        level = current.parent().and_then(ElementRef::wrap);
    }

    let next = container
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_SCAN_LIMIT);
    let prev = container
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .take(SIBLING_SCAN_LIMIT);
    next.chain(prev).find_map(control_at_or_within)
}

/// Read the value displayed next to a label, e.g. in a spec table.
///
/// Handles `<dt>`/`<dd>` and `<th>`/`<td>` pairs, label/value sibling spans,
/// and single elements of the form `Label: value`.
#[must_use]
pub fn find_labeled_value(scope: ElementRef<'_>, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| {
        let needle = label.to_lowercase();
        scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| !NON_TEXT_TAGS.contains(&el.value().name()))
            .find_map(|el| labeled_value_at(el, &needle))
    })
}

fn labeled_value_at(element: ElementRef<'_>, needle: &str) -> Option<String> {
    let text = text_of(element);
    if text.is_empty() || text.len() > 200 {
        return None;
    }
    let lower = text.to_lowercase();
    let bare = lower.trim_end_matches(':').trim();

    if bare == needle {
        let sibling = element
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(text_of)
            .find(|t| !t.is_empty());
        return sibling.or_else(|| parent_remainder(element, &text));
    }

    // Labels are ASCII, so the original text can be sliced at the needle's length.
    let head = text.get(..needle.len())?;
    if !head.eq_ignore_ascii_case(needle) {
        return None;
    }
    let value = text[needle.len()..].trim_start().strip_prefix(':')?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `<li><b>Mileage:</b> 15,234</li>`: the parent's text after the label.
fn parent_remainder(element: ElementRef<'_>, label_text: &str) -> Option<String> {
    let parent = element.parent().and_then(ElementRef::wrap)?;
    let parent_text = text_of(parent);
    let rest = parent_text.strip_prefix(label_text)?.trim_start().trim_start_matches(':').trim();
    (!rest.is_empty()).then(|| rest.to_string())
}
