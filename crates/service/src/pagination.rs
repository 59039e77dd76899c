//! List query parameters shared by every resource screen.

use gateway::endpoint::build_query;
use serde::Serialize;

/// Filters and paging for a list call. Unset fields never reach the query string.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ListQuery {
    /// 1-based page index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// items per page
    #[serde(rename = "limit", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Repeated as `status=a&status=b`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

impl ListQuery {
    pub fn new() -> Self { Self::default() }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status.push(status.into());
        self
    }

    /// Clamp page to >= 1 and page size to 1..=100.
    pub fn normalize(mut self) -> Self {
        if let Some(page) = self.page {
            self.page = Some(page.max(1));
        }
        if let Some(per_page) = self.per_page {
            self.per_page = Some(per_page.clamp(1, 100));
        }
        if let Some(search) = &self.search {
            let trimmed = search.trim();
            self.search = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        serde_json::to_value(self.clone().normalize())
            .map(|v| build_query(&v))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::ListQuery;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let q = ListQuery::new().page(0, 0).normalize();
        assert_eq!(q.page, Some(1));
        assert_eq!(q.per_page, Some(1));
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let q = ListQuery::new().page(5, 1000).normalize();
        assert_eq!(q.page, Some(5));
        assert_eq!(q.per_page, Some(100));
    }

    #[test]
    fn empty_query_renders_nothing() {
        assert_eq!(ListQuery::default().to_query_string(), "");
        assert_eq!(ListQuery::new().search("   ").to_query_string(), "");
    }

    #[test]
    fn query_string_keeps_field_order_and_repeats_status() {
        let q = ListQuery::new().page(2, 20).search("Pérez").status("pending").status("in_progress");
        assert_eq!(
            q.to_query_string(),
            "page=2&limit=20&search=P%C3%A9rez&status=pending&status=in_progress"
        );
    }
}
