//! Pagination header parsing.
//!
//! Both providers send RFC 8288 `Link` headers. GitLab additionally sends
//! `x-next-page`, `x-prev-page`, `x-total-pages` and `x-total`, and omits
//! `Link` on some endpoints (keyset pagination, very large collections).

use url::Url;

use crate::http::{HttpHeaders, header_get};

/// Uniform description of where a page sits in a collection.
///
/// A relation that was not advertised leaves its page field `None`; nothing
/// is guessed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<u32>,
    pub previous_page: Option<u32>,
    pub last_page: Option<u32>,
    /// Total number of items, when the provider reports it.
    pub total_count: Option<u64>,
}

impl PageInfo {
    /// Returns the total number of pages if known.
    #[must_use]
    pub fn total_pages(&self) -> Option<u32> {
        self.last_page
    }
}

/// Split a `Link` header into its comma-separated values, ignoring commas
/// inside `<...>` URLs.
fn link_values(header: &str) -> impl Iterator<Item = &str> {
    let mut depth = 0usize;
    header.split(move |c| match c {
        '<' => {
            depth += 1;
            false
        }
        '>' => {
            depth = depth.saturating_sub(1);
            false
        }
        ',' => depth == 0,
        _ => false,
    })
}

/// Parse a `Link` header.
///
/// Looks like:
/// `<https://api.github.com/repositories/1/issues?page=2>; rel="next", <...&page=5>; rel="last"`
#[must_use]
pub fn parse_link_header(link_header: &str) -> PageInfo {
    let mut info = PageInfo::default();

    for part in link_values(link_header) {
        let part = part.trim();
        let Some(rest) = part.strip_prefix('<') else {
            continue;
        };
        let Some((url, params)) = rest.split_once('>') else {
            continue;
        };

        let mut rels: Vec<&str> = Vec::new();
        for param in params.split(';') {
            if let Some((name, value)) = param.split_once('=')
                && name.trim().eq_ignore_ascii_case("rel")
            {
                rels.extend(value.trim().trim_matches('"').split_whitespace());
            }
        }

        let page = extract_page_from_url(url);

        for rel in rels {
            match rel.to_ascii_lowercase().as_str() {
                "next" => {
                    info.has_next = true;
                    info.next_page = page;
                }
                "prev" | "previous" => {
                    info.has_previous = true;
                    info.previous_page = page;
                }
                "last" => info.last_page = page,
                _ => {}
            }
        }
    }

    info
}

/// Extract the `page` query parameter from a URL.
fn extract_page_from_url(url: &str) -> Option<u32> {
    if let Ok(parsed) = Url::parse(url) {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok());
    }

    // Relative URLs: fall back to scanning the query string.
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("page="))
        .and_then(|v| v.parse().ok())
}

fn header_number<T: std::str::FromStr>(headers: &HttpHeaders, name: &str) -> Option<T> {
    header_get(headers, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Page information from a full header set.
///
/// `Link` is preferred. GitLab's `x-*` headers fill in whatever `Link` did
/// not provide, and `x-total` / `x-total-count` supply the item count.
#[must_use]
pub fn page_info_from_headers(headers: &HttpHeaders) -> PageInfo {
    let mut info = header_get(headers, "link")
        .map(parse_link_header)
        .unwrap_or_default();

    if !info.has_next
        && let Some(next) = header_number::<u32>(headers, "x-next-page")
    {
        info.has_next = true;
        info.next_page = Some(next);
    }
    if !info.has_previous
        && let Some(prev) = header_number::<u32>(headers, "x-prev-page")
    {
        info.has_previous = true;
        info.previous_page = Some(prev);
    }
    if info.last_page.is_none() {
        info.last_page = header_number(headers, "x-total-pages");
    }
    info.total_count =
        header_number(headers, "x-total").or_else(|| header_number(headers, "x-total-count"));

    info
}
