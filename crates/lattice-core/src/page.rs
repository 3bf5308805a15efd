//! Pagination arithmetic and the page payload

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a paginated list response. `items` holds one value-list per
/// row, in the selection's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub total: u64,
    pub size: u64,
    pub page: u64,
    pub pages: u64,
    pub items: Vec<Vec<Value>>,
}

/// Derive the page block for `(total, size, page)`, items left empty.
///
/// `size` and `page` are 1-based; callers validate them before arithmetic.
pub fn pagination_calc(total: u64, size: u64, page: u64) -> PageBlock {
    debug_assert!(size >= 1, "page size must be at least 1");
    debug_assert!(page >= 1, "page number must be at least 1");

    PageBlock {
        total,
        size,
        page,
        pages: total.div_ceil(size),
        items: Vec::new(),
    }
}

/// Row offset of the requested page
pub fn page_offset(size: u64, page: u64) -> u64 {
    size * (page - 1)
}
