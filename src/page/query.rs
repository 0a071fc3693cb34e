//! Selector expressions for static HTML documents
//!
//! Expressions evaluated against a `StaticPage` use a small `kind:selector`
//! syntax instead of script:
//!
//! | Expression | Result |
//! |------------|--------|
//! | JSON literal (`true`, `3`, `"text"`, `[..]`) | the literal |
//! | `title` | document title, or null |
//! | `url` | the loaded URL |
//! | `exists:SEL` | whether any element matches |
//! | `count:SEL` | number of matches |
//! | `text:SEL` | trimmed text of the first match, or null |
//! | `texts:SEL` | trimmed text of every match |
//! | `html:SEL` | inner HTML of the first match, or null |
//! | `attr:SEL@NAME` | attribute values of every match carrying it |
//! | `links:SEL` | absolute http(s) URLs from `href` of every match |

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// A parsed selector expression
#[derive(Debug, Clone)]
pub enum Query {
    Literal(Value),
    Title,
    Url,
    Exists(Selector),
    Count(Selector),
    Text(Selector),
    Texts(Selector),
    Html(Selector),
    Attr(Selector, String),
    Links(Selector),
}

impl Query {
    /// Parses an expression
    ///
    /// # Returns
    ///
    /// * `Ok(Query)` - The parsed expression
    /// * `Err(String)` - Unknown expression kind or invalid selector
    ///
    /// # Example
    ///
    /// ```
    /// use suitecrawl::page::Query;
    ///
    /// assert!(Query::parse("texts:h1.title").is_ok());
    /// assert!(Query::parse("frobnicate:h1").is_err());
    /// ```
    pub fn parse(expr: &str) -> Result<Self, String> {
        let expr = expr.trim();

        match expr {
            "title" => return Ok(Self::Title),
            "url" => return Ok(Self::Url),
            _ => {}
        }

        if let Ok(literal) = serde_json::from_str::<Value>(expr) {
            return Ok(Self::Literal(literal));
        }

        let (kind, rest) = expr
            .split_once(':')
            .ok_or_else(|| format!("unrecognized expression '{}'", expr))?;

        match kind.trim() {
            "exists" => Ok(Self::Exists(parse_selector(rest)?)),
            "count" => Ok(Self::Count(parse_selector(rest)?)),
            "text" => Ok(Self::Text(parse_selector(rest)?)),
            "texts" => Ok(Self::Texts(parse_selector(rest)?)),
            "html" => Ok(Self::Html(parse_selector(rest)?)),
            "links" => Ok(Self::Links(parse_selector(rest)?)),
            "attr" => {
                let (selector, name) = rest
                    .rsplit_once('@')
                    .ok_or_else(|| format!("attr expression needs SEL@NAME, got '{}'", rest))?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(format!("attr expression has an empty name: '{}'", rest));
                }
                Ok(Self::Attr(parse_selector(selector)?, name.to_string()))
            }
            other => Err(format!("unknown expression kind '{}'", other)),
        }
    }

    /// Evaluates the expression against a parsed document
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed HTML
    /// * `base_url` - The document URL, used to resolve relative links
    pub fn evaluate(&self, document: &Html, base_url: &Url) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Title => extract_title(document).map(Value::String).unwrap_or(Value::Null),
            Self::Url => Value::String(base_url.to_string()),
            Self::Exists(selector) => Value::Bool(document.select(selector).next().is_some()),
            Self::Count(selector) => Value::from(document.select(selector).count()),
            Self::Text(selector) => document
                .select(selector)
                .next()
                .map(|element| Value::String(element_text(&element)))
                .unwrap_or(Value::Null),
            Self::Texts(selector) => Value::Array(
                document
                    .select(selector)
                    .map(|element| Value::String(element_text(&element)))
                    .collect(),
            ),
            Self::Html(selector) => document
                .select(selector)
                .next()
                .map(|element| Value::String(element.inner_html()))
                .unwrap_or(Value::Null),
            Self::Attr(selector, name) => Value::Array(
                document
                    .select(selector)
                    .filter_map(|element| element.value().attr(name))
                    .map(|value| Value::String(value.to_string()))
                    .collect(),
            ),
            Self::Links(selector) => Value::Array(
                extract_links(document, selector, base_url)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
        }
    }
}

fn parse_selector(raw: &str) -> Result<Selector, String> {
    let raw = raw.trim();
    Selector::parse(raw).map_err(|e| format!("invalid selector '{}': {:?}", raw, e))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts absolute links from the `href` of every matching element
fn extract_links(document: &Html, selector: &Selector, base_url: &Url) -> Vec<String> {
    document
        .select(selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
