use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Single-column sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Mutable configuration of one mounted view.
///
/// Invariants: `page` stays within `[1, total_pages]` after any change to the
/// filtered set; `page_size` is a positive constant for the view's lifetime.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub search_term: String,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub page_size: u32,
    pub column_visibility: BTreeMap<String, bool>,
}

impl ViewState {
    pub fn new(page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            search_term: String::new(),
            sort: None,
            page: 1,
            page_size,
            column_visibility: BTreeMap::new(),
        }
    }
}

/// One rendered page of a view: the visible slice plus pagination totals.
#[derive(Debug, Clone)]
pub struct PageView<R> {
    pub rows: Vec<R>,
    pub page: u32,
    /// Row count after filtering, before pagination.
    pub total_count: usize,
    pub total_pages: u32,
}

/// `max(1, ceil(total_count / page_size))`: an empty set still has one page.
pub fn total_pages(total_count: usize, page_size: u32) -> u32 {
    (total_count as u64)
        .div_ceil(page_size as u64)
        .max(1)
        .try_into()
        .unwrap_or(u32::MAX)
}
