//! Obituary image extraction from a fetched page's raw HTML (§4.6).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Patterns that flag an Open Graph image as a site logo or
/// placeholder rather than a photo of the decedent.
static LOGO_OR_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)logo|placeholder|default-avatar|no-photo|icon\.png").unwrap());

static OBIT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)obit|photo|portrait|deceased|memorial").unwrap());

/// Try, in priority order: a site-specific obituary-photo selector,
/// the Open Graph image (filtered against logo/placeholder patterns),
/// the Twitter card image, then any `<img>` nested in a container
/// whose class matches `obit|photo|portrait|deceased|memorial`.
/// Relative URLs are resolved against `page_url`.
pub fn extract_image(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    if let Some(src) = select_attr(&document, ".obituary-photo img, .decedent-photo img", "src") {
        return resolve(&base, &src);
    }

    if let Some(content) = select_attr(&document, r#"meta[property="og:image"]"#, "content") {
        if !LOGO_OR_PLACEHOLDER.is_match(&content) {
            return resolve(&base, &content);
        }
    }

    if let Some(content) = select_attr(&document, r#"meta[name="twitter:image"]"#, "content") {
        return resolve(&base, &content);
    }

    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            let class = element.value().attr("class").unwrap_or_default();
            let parent_class = element
                .parent()
                .and_then(|p| p.value().as_element())
                .and_then(|e| e.attr("class"))
                .unwrap_or_default();
            if OBIT_CLASS.is_match(class) || OBIT_CLASS.is_match(parent_class) {
                if let Some(src) = element.value().attr("src") {
                    return resolve(&base, src);
                }
            }
        }
    }

    None
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.to_string())
}

fn resolve(base: &Option<Url>, candidate: &str) -> Option<String> {
    match base {
        Some(base) => base.join(candidate).ok().map(|u| u.to_string()),
        None => Some(candidate.to_string()),
    }
}
