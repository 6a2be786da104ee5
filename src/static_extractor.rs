//! Image discovery from raw markup, without running any page script
//!
//! The static pass looks at `<img>` and `<source srcset>` elements in
//! document order. For images the source chain is `src`, then `data-src`,
//! since lazy-loading libraries usually park the real URL in `data-src`
//! while `src` is empty or absent. For `<source>` only the first `srcset`
//! candidate is taken; the dynamic pass collects the full candidate list.

use crate::{first_srcset_candidate, ResultSet};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Attributes consulted for `<img>`, in priority order.
const IMG_SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src"];

fn image_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse("img, source[srcset]").expect("static image selector is valid")
    })
}

/// Extract absolute image URLs from `html`, resolving against `base_url`.
///
/// Never fails: malformed markup is parsed leniently and simply yields fewer
/// matches.
pub fn extract_static(html: &str, base_url: &Url) -> ResultSet {
    let document = Html::parse_document(html);
    let mut images = ResultSet::new();

    for element in document.select(image_selector()) {
        if let Some(raw) = raw_reference(&element) {
            images.insert_resolved(base_url, raw);
        }
    }

    images
}

fn raw_reference<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    let value = element.value();
    match value.name() {
        "source" => value.attr("srcset").and_then(first_srcset_candidate),
        _ => IMG_SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|name| value.attr(name))
            .find(|candidate| !candidate.trim().is_empty()),
    }
}
