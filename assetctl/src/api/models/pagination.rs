//! Shared pagination types for list endpoints.
//!
//! Lists are page-based: `page` is zero-based and `size` is capped at [`MAX_SIZE`]. Values that
//! are missing, malformed or out of range fall back to the defaults instead of failing the
//! request.

use serde::{
    Deserialize, Serialize,
    ser::{SerializeMap, Serializer},
};
use utoipa::IntoParams;

/// Default number of items per page.
pub const DEFAULT_SIZE: i64 = 10;

/// Maximum number of items per page.
pub const MAX_SIZE: i64 = 10;

/// Integer prefix of `raw`, so `"5x"` reads as 5 and `"1.9"` as 1. `None` when no digits lead.
fn leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let digits = unsigned.len() - unsigned.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let sign = raw.len() - unsigned.len();
    raw[..sign + digits].parse().ok()
}

/// Query parameters shared by list endpoints.
///
/// Everything arrives as text so that `?page=abc` is read as the default rather than rejected.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Zero-based page (default: 0)
    #[param(value_type = Option<i64>, default = 0, minimum = 0)]
    pub page: Option<String>,

    /// Items per page (default: 10, max: 10)
    #[param(value_type = Option<i64>, default = 10, minimum = 1, maximum = 10)]
    pub size: Option<String>,

    /// Case-insensitive substring filter on the entity's name
    pub search: Option<String>,

    /// `false` returns every match without paging, where the endpoint supports it
    #[param(value_type = Option<bool>)]
    pub pagination: Option<String>,
}

impl ListQuery {
    /// Page number; negative or non-numeric values read as 0.
    pub fn page(&self) -> i64 {
        match self.page.as_deref().and_then(leading_int) {
            Some(page) if page >= 0 => page,
            _ => 0,
        }
    }

    /// Page size; anything outside `1..=MAX_SIZE` reads as [`DEFAULT_SIZE`].
    pub fn size(&self) -> i64 {
        match self.size.as_deref().and_then(leading_int) {
            Some(size) if (1..=MAX_SIZE).contains(&size) => size,
            _ => DEFAULT_SIZE,
        }
    }

    /// Number of rows to skip for the current page.
    pub fn skip(&self) -> i64 {
        self.page().saturating_mul(self.size())
    }

    pub fn search(&self) -> Option<String> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
    }

    /// Whether the caller asked for a paged response (anything but `pagination=false`).
    pub fn paginated(&self) -> bool {
        !matches!(self.pagination.as_deref().map(str::trim), Some("false"))
    }
}

/// Items that can be listed page by page. The total is reported under an entity-specific key.
pub trait Counted {
    const TOTAL_FIELD: &'static str;
}

/// One page of a list: `{content, page, size, totalPages, total<Entity>}`.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(content: Vec<T>, query: &ListQuery, total: i64) -> Self {
        Self {
            content,
            page: query.page(),
            size: query.size(),
            total,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.size <= 0 { 0 } else { (self.total + self.size - 1) / self.size }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

impl<T: Serialize + Counted> Serialize for Paginated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("content", &self.content)?;
        map.serialize_entry("page", &self.page)?;
        map.serialize_entry("size", &self.size)?;
        map.serialize_entry("totalPages", &self.total_pages())?;
        map.serialize_entry(T::TOTAL_FIELD, &self.total)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, size: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(str::to_owned),
            size: size.map(str::to_owned),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_values() {
        let q = ListQuery::default();
        assert_eq!(q.page(), 0);
        assert_eq!(q.size(), DEFAULT_SIZE);
        assert_eq!(q.skip(), 0);
        assert!(q.paginated());
        assert_eq!(q.search(), None);
    }

    #[test]
    fn test_page_fallbacks() {
        assert_eq!(query(Some("-2"), None).page(), 0);
        assert_eq!(query(Some("abc"), None).page(), 0);
        assert_eq!(query(Some("3"), None).page(), 3);
        assert_eq!(query(Some("1abc"), None).page(), 1);
        assert_eq!(query(Some(" 2.7"), None).page(), 2);
        assert_eq!(query(Some("-2x"), None).page(), 0);
    }

    #[test]
    fn test_size_fallbacks() {
        assert_eq!(query(None, Some("1000")).size(), 10);
        assert_eq!(query(None, Some("0")).size(), 10);
        assert_eq!(query(None, Some("-5")).size(), 10);
        assert_eq!(query(None, Some("five")).size(), 10);
        assert_eq!(query(None, Some("5")).size(), 5);
        assert_eq!(query(None, Some("5x")).size(), 5);
        assert_eq!(query(None, Some("+4")).size(), 4);
        assert_eq!(query(None, Some("x5")).size(), 10);
        assert_eq!(query(Some("2"), Some("5")).skip(), 10);
    }

    #[test]
    fn test_pagination_flag_and_search() {
        let q = ListQuery {
            pagination: Some("false".to_string()),
            search: Some("  lap ".to_string()),
            ..Default::default()
        };
        assert!(!q.paginated());
        assert_eq!(q.search().as_deref(), Some("lap"));

        let q = ListQuery {
            pagination: Some("true".to_string()),
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(q.paginated());
        assert_eq!(q.search(), None);
    }

    #[derive(Serialize)]
    struct Widget {
        id: i32,
    }

    impl Counted for Widget {
        const TOTAL_FIELD: &'static str = "totalWidgets";
    }

    #[test]
    fn test_paginated_shape() {
        let page = Paginated::new(vec![Widget { id: 1 }], &query(Some("2"), Some("10")), 22);
        assert_eq!(page.total_pages(), 3);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["content"][0]["id"], 1);
        assert_eq!(json["page"], 2);
        assert_eq!(json["size"], 10);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalWidgets"], 22);
    }

    #[test]
    fn test_total_pages_edges() {
        let empty: Paginated<Widget> = Paginated::new(vec![], &ListQuery::default(), 0);
        assert_eq!(empty.total_pages(), 0);
        let exact: Paginated<Widget> = Paginated::new(vec![], &ListQuery::default(), 20);
        assert_eq!(exact.total_pages(), 2);
    }
}
