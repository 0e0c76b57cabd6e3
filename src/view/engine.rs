use std::sync::Arc;

use crate::prefs::PrefStore;

use super::record::Record;
use super::state::{total_pages, PageView, SortDirection, SortSpec, ViewState};

/// Derived-state pipeline for one list view: raw rows, search filter, stable
/// sort, fixed-size pagination, and persisted column visibility.
///
/// The engine exclusively owns its [`ViewState`]; all operations run on the
/// single UI-interaction thread, so no internal locking is needed. Using an
/// engine before [`ListViewEngine::initialize`] is a programmer error and
/// panics.
pub struct ListViewEngine<R: Record> {
    view_key: String,
    columns: Vec<String>,
    prefs: Arc<PrefStore>,
    rows: Vec<R>,
    state: ViewState,
    initialized: bool,
}

impl<R: Record> ListViewEngine<R> {
    pub fn new(
        view_key: impl Into<String>,
        columns: Vec<String>,
        page_size: u32,
        prefs: Arc<PrefStore>,
    ) -> Self {
        Self {
            view_key: view_key.into(),
            columns,
            prefs,
            rows: Vec::new(),
            state: ViewState::new(page_size),
            initialized: false,
        }
    }

    /// Load rows and reset to the first page with no search and no sort.
    /// Column visibility comes from the Preference Store, defaulting to
    /// all-visible for columns without a persisted snapshot.
    pub fn initialize(&mut self, rows: Vec<R>) {
        self.state.column_visibility = self.prefs.load_visibility(&self.view_key, &self.columns);
        self.rows = rows;
        self.state.search_term.clear();
        self.state.sort = None;
        self.state.page = 1;
        self.initialized = true;
    }

    /// Swap in freshly fetched rows, resetting to page 1 but preserving the
    /// search term, sort spec, and column visibility.
    pub fn replace_rows(&mut self, rows: Vec<R>) {
        self.assert_initialized();
        self.rows = rows;
        self.state.page = 1;
    }

    /// A row matches when any field's string form contains `term`
    /// case-insensitively. Resets to page 1.
    pub fn set_search_term(&mut self, term: &str) {
        self.assert_initialized();
        self.state.search_term = term.to_string();
        self.state.page = 1;
    }

    /// Replace the sort spec. Sorting is stable: rows with equal keys keep
    /// their prior relative order.
    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.assert_initialized();
        self.state.sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
    }

    pub fn clear_sort(&mut self) {
        self.assert_initialized();
        self.state.sort = None;
    }

    /// Jump to page `n`, clamped into `[1, total_pages]`.
    pub fn set_page(&mut self, n: u32) {
        self.assert_initialized();
        self.state.page = n.clamp(1, self.total_pages());
    }

    /// Toggle one column and synchronously persist the whole map under the
    /// view's key. The write is fire-and-forget: a storage failure is logged
    /// and the in-memory state stands.
    pub fn set_column_visible(&mut self, column: &str, visible: bool) {
        self.assert_initialized();
        self.state
            .column_visibility
            .insert(column.to_string(), visible);
        if let Err(e) = self.prefs.set(&self.view_key, &self.state.column_visibility) {
            tracing::warn!("failed to persist column prefs for '{}': {e}", self.view_key);
        }
    }

    /// The page-size slice of filter then sort applied to all rows, plus the
    /// post-filter total count and page count.
    pub fn current_page(&self) -> PageView<R> {
        self.assert_initialized();
        let matched = self.filtered_sorted();
        let total_count = matched.len();
        let total_pages = total_pages(total_count, self.state.page_size);
        let page = self.state.page.clamp(1, total_pages);
        let start = ((page - 1) * self.state.page_size) as usize;
        let rows = matched
            .into_iter()
            .skip(start)
            .take(self.state.page_size as usize)
            .cloned()
            .collect();

        PageView {
            rows,
            page,
            total_count,
            total_pages,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.filtered_sorted().len(), self.state.page_size)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view_key(&self) -> &str {
        &self.view_key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns currently visible, in the view's display order.
    pub fn visible_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| *self.state.column_visibility.get(*c).unwrap_or(&true))
            .cloned()
            .collect()
    }

    fn filtered_sorted(&self) -> Vec<&R> {
        let term = self.state.search_term.to_lowercase();
        let mut matched: Vec<&R> = self
            .rows
            .iter()
            .filter(|row| {
                term.is_empty()
                    || self
                        .columns
                        .iter()
                        .any(|c| row.field(c).as_text().to_lowercase().contains(&term))
            })
            .collect();

        if let Some(sort) = &self.state.sort {
            // Vec::sort_by is stable, as the contract requires.
            matched.sort_by(|a, b| {
                let ordering = a.field(&sort.field).compare(&b.field(&sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        matched
    }

    fn assert_initialized(&self) {
        assert!(
            self.initialized,
            "view '{}' used before initialize",
            self.view_key
        );
    }
}
