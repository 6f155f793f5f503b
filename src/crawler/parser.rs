//! HTML parser for extracting the image and next-page links
//!
//! Each page yields at most two links:
//! - the `src` of the first element matching the image selector
//! - the `href` of the first element matching the next-page selector
//!
//! Both are resolved against the origin of the series, so relative links such
//! as `/2` or `/comics/2.png` work as well as absolute ones.

use scraper::{Html, Selector};
use url::Url;

/// Attribute holding the image location
pub const IMAGE_ATTRIBUTE: &str = "src";

/// Attribute holding the next-page location
pub const NEXT_ATTRIBUTE: &str = "href";

/// A parsed document that can be queried by selector
pub trait QueryableDocument {
    /// Returns `attribute` of the first element matching `selector`
    ///
    /// `None` if nothing matches or the matching element lacks the attribute.
    fn first_attribute(&self, selector: &Selector, attribute: &str) -> Option<&str>;
}

impl QueryableDocument for Html {
    fn first_attribute(&self, selector: &Selector, attribute: &str) -> Option<&str> {
        self.select(selector).next()?.value().attr(attribute)
    }
}

/// Links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub image: Option<Url>,
    pub next: Option<Url>,
}

/// Parses HTML text into a queryable document
pub fn parse_page(html: &str) -> Html {
    Html::parse_document(html)
}

/// Finds a link in a document and resolves it against `base`
///
/// # Example
///
/// ```
/// use scraper::Selector;
/// use sturdywcdl::crawler::{find_link, parse_page};
/// use url::Url;
///
/// let page = parse_page(r#"<html><img src="/img.png"></html>"#);
/// let selector = Selector::parse("img").unwrap();
/// let base = Url::parse("https://test.com").unwrap();
///
/// let link = find_link(&page, &selector, "src", &base).unwrap();
/// assert_eq!(link.as_str(), "https://test.com/img.png");
/// ```
pub fn find_link<D: QueryableDocument>(
    document: &D,
    selector: &Selector,
    attribute: &str,
    base: &Url,
) -> Option<Url> {
    let link = document.first_attribute(selector, attribute)?;

    match base.join(link.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Ignoring unresolvable link '{}': {}", link, e);
            None
        }
    }
}

/// Extracts the image and next-page links from raw page text
pub fn extract_page_links(
    html: &str,
    image_selector: &Selector,
    next_selector: &Selector,
    base: &Url,
) -> PageLinks {
    let document = parse_page(html);

    PageLinks {
        image: find_link(&document, image_selector, IMAGE_ATTRIBUTE, base),
        next: find_link(&document, next_selector, NEXT_ATTRIBUTE, base),
    }
}
