//! Load intents and the loading state they drive.

use serde::{Deserialize, Serialize};

/// The reason a load was requested. Governs how the resulting page is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadIntent {
    /// First page.
    Initial,
    /// Next page after the current cursor.
    More,
    /// Refresh in place, diffed against the current rows.
    Replace,
    /// Empty the rows, then load from scratch. Overrides an in-flight load.
    ClearAndReplace,
    /// Rows newer than the current top of the list.
    NewRows,
}

impl LoadIntent {
    /// Returns true for the intents that replace the whole row set.
    pub fn replaces_rows(&self) -> bool {
        matches!(
            self,
            LoadIntent::Initial | LoadIntent::Replace | LoadIntent::ClearAndReplace
        )
    }

    /// Returns true if the request should carry the pagination cursor.
    pub fn uses_cursor(&self) -> bool {
        matches!(self, LoadIntent::More)
    }
}

/// Observable loading flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    /// A query is in flight.
    pub is_loading: bool,
    /// At least one load has completed since creation or the last clear.
    pub has_loaded_once: bool,
    /// The last page was full and pagination is enabled.
    pub might_have_more: bool,
    /// Search text sent with the next query.
    pub pending_search_text: Option<String>,
}

impl LoadingState {
    /// Creates the initial state for a source with or without pagination.
    pub fn new(paginate: bool) -> Self {
        Self {
            is_loading: false,
            has_loaded_once: false,
            might_have_more: paginate,
            pending_search_text: None,
        }
    }
}
