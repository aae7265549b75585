//! Query parameters for paginated, sorted list endpoints.

use serde::Deserialize;

use warden_core::AppResult;
use warden_core::types::pagination::PageRequest;
use warden_core::types::sorting::SortOrder;
use warden_database::stores::LicenseSortKey;

/// `?page&per_page&sort_by&sort_order` query string.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page.
    pub per_page: Option<u64>,
    /// Sort column.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
}

impl ListQuery {
    /// Resolve into validated pagination and sorting values.
    pub fn resolve(&self) -> AppResult<(PageRequest, LicenseSortKey, SortOrder)> {
        let page = PageRequest::new(self.page.unwrap_or(1), self.per_page.unwrap_or(25));
        let sort_by = match self.sort_by.as_deref() {
            Some(raw) => LicenseSortKey::parse(raw)?,
            None => LicenseSortKey::default(),
        };
        let order = self.sort_order.unwrap_or_default();
        Ok((page, sort_by, order))
    }
}
