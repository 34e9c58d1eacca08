//! Query half of the HTML adapter.
//!
//! Thin helpers over `scraper` with the semantics the extractors expect:
//! missing attributes read as empty strings, text is whitespace-trimmed, and
//! relative links are resolved against the page they came from.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{Error, Result};

/// A parsed page or fragment.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn fragment(body: &str) -> Self {
        Self {
            html: Html::parse_fragment(body),
        }
    }

    /// All elements matching `css`, in document order.
    pub fn query(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).collect())
    }
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| Error::Selector(css.to_string()))
}

/// Attribute value, or an empty string when absent.
pub fn attr(el: &ElementRef<'_>, name: &str) -> String {
    el.value().attr(name).unwrap_or_default().to_string()
}

/// Concatenated, trimmed text of an element.
pub fn text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first descendant matching `sel`.
pub fn child_text(el: &ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel).next().map(|c| text(&c)).unwrap_or_default()
}

/// Attribute of the first descendant matching `sel`.
pub fn child_attr(el: &ElementRef<'_>, sel: &Selector, name: &str) -> String {
    el.select(sel).next().map(|c| attr(&c, name)).unwrap_or_default()
}

/// Resolve `href` against `base`, leaving it untouched if either is unusable.
pub fn absolutize(base: &str, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map_or_else(|_| href.to_string(), |u| u.to_string())
}
