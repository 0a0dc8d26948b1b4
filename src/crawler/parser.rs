//! HTML parser for gallery pages
//!
//! This module extracts two things from a listing page:
//! - Direct image links (`<img src>` values that are absolute and carry the
//!   image suffix)
//! - The pagination anchor whose text is a given page number

use scraper::{Html, Selector};
use url::Url;

/// Extracts direct image links from a gallery page, in document order
///
/// # Link Rules
///
/// **Include** `<img src="...">` values that:
/// - start with `http://` or `https://`
/// - end with `suffix` (e.g. `.jpg`)
///
/// **Skip** (not an error):
/// - `<img>` without `src`
/// - relative or protocol-relative sources
/// - any other suffix
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::extract_image_links;
///
/// let html = r#"<img src="https://x/a.jpg"><img src="/relative.jpg"><img src="https://x/b.png">"#;
/// assert_eq!(extract_image_links(html, ".jpg"), vec!["https://x/a.jpg".to_string()]);
/// ```
pub fn extract_image_links(html: &str, suffix: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(img_selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&img_selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| is_direct_image_link(src, suffix))
        .map(str::to_string)
        .collect()
}

fn is_direct_image_link(src: &str, suffix: &str) -> bool {
    (src.starts_with("http://") || src.starts_with("https://")) && src.ends_with(suffix)
}

/// Finds the pager anchor for `page_number` and resolves it against `base_url`
///
/// The gallery labels its pager anchors with literal page numbers, so the
/// match is on an `<a>` carrying `pager_class` whose text (surrounding
/// whitespace trimmed) is exactly the decimal `page_number`.
///
/// # Returns
///
/// * `Some(Url)` - Absolute http(s) URL of the first matching anchor with an `href`
/// * `None` - No such anchor; the gallery has no further pages
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::find_pagination_link;
/// use url::Url;
///
/// let html = r#"<a class="pager__link" href="/page2">2</a>"#;
/// let base = Url::parse("https://gallery.example.com/").unwrap();
/// let next = find_pagination_link(html, "pager__link", 2, &base).unwrap();
/// assert_eq!(next.as_str(), "https://gallery.example.com/page2");
/// ```
pub fn find_pagination_link(
    html: &str,
    pager_class: &str,
    page_number: u32,
    base_url: &Url,
) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("a.{}", pager_class)).ok()?;
    let wanted = page_number.to_string();

    document
        .select(&selector)
        .filter(|element| element.text().collect::<String>().trim() == wanted)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| resolve_link(href, base_url))
}

/// Resolves an href against the page it appeared on
///
/// Returns None for unparseable or non-HTTP(S) results.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
