//! Admin API cursor pagination via the `Link` response header.
//!
//! Shopify's Admin REST endpoints page with the `Link` header; each response
//! carries URLs for adjacent pages and the cursor is the `page_info` query
//! parameter of the `rel="next"` URL.
//!
//! ## Header format
//!
//! Single next link:
//! ```text
//! <https://shop.myshopify.com/admin/api/2025-01/products.json?limit=250&page_info=CURSOR>; rel="next"
//! ```
//!
//! Combined previous and next:
//! ```text
//! <...page_info=PREV>; rel="previous", <...page_info=NEXT>; rel="next"
//! ```

/// Parses a `Link` header value and extracts the `page_info` cursor for the
/// next page.
///
/// Returns `None` if:
/// - `link_header` is `None` (no header was present),
/// - there is no `rel="next"` segment (last page reached),
/// - the URL in the next segment has no `page_info` query parameter.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    // Split on "," to separate individual link directives.
    for segment in header.split(',') {
        let segment = segment.trim();

        if !segment.contains(r#"rel="next""#) {
            continue;
        }

        let url = extract_angle_bracket_url(segment)?;
        return extract_query_param(url, "page_info");
    }

    None
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}

/// Extracts the value of a named query parameter from a URL string.
///
/// Does not decode percent-encoded characters — Shopify cursors are
/// base64url-encoded and contain none that require decoding.
fn extract_query_param(url: &str, param: &str) -> Option<String> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];

    let needle = format!("{param}=");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(needle.as_str()) {
            let value = value.split('#').next().unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cursor_from_single_next_link() {
        let header = r#"<https://x.myshopify.com/admin/api/2025-01/products.json?limit=250&page_info=abc123>; rel="next""#;
        assert_eq!(extract_next_cursor(Some(header)), Some("abc123".to_owned()));
    }

    #[test]
    fn extracts_next_from_combined_links() {
        let header = r#"<https://x.myshopify.com/admin/api/2025-01/products.json?page_info=PREV>; rel="previous", <https://x.myshopify.com/admin/api/2025-01/products.json?page_info=NEXT>; rel="next""#;
        assert_eq!(extract_next_cursor(Some(header)), Some("NEXT".to_owned()));
    }

    #[test]
    fn none_when_only_previous_link() {
        let header = r#"<https://x.myshopify.com/admin/api/2025-01/products.json?page_info=PREV>; rel="previous""#;
        assert_eq!(extract_next_cursor(Some(header)), None);
    }

    #[test]
    fn none_when_header_absent() {
        assert_eq!(extract_next_cursor(None), None);
    }

    #[test]
    fn none_when_cursor_param_missing() {
        let header = r#"<https://x.myshopify.com/admin/api/2025-01/products.json?limit=250>; rel="next""#;
        assert_eq!(extract_next_cursor(Some(header)), None);
    }
}
