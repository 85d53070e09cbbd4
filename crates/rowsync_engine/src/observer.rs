//! Change notifications for the presentation layer.

use crate::intent::LoadIntent;
use crate::error::ListError;
use rowsync_diff::Edit;
use serde::Serialize;

/// Receives row-set changes from a synchronizer.
///
/// Every callback runs on the synchronizer's owning context, synchronously
/// within the operation that caused it. All methods default to doing nothing.
pub trait ListObserver<R> {
    /// A load completed with a precise edit script.
    fn on_edits_applied(&mut self, _edits: &[Edit<R>], _intent: LoadIntent) {}

    /// A load completed without an edit script; redraw everything.
    fn on_full_refresh(&mut self, _intent: LoadIntent) {}

    /// A single row was inserted by a CRUD event.
    fn on_row_inserted(&mut self, _index: usize) {}

    /// A single row was replaced in place by a CRUD event.
    fn on_row_updated(&mut self, _index: usize) {}

    /// A single row was removed by a CRUD event.
    fn on_row_removed(&mut self, _index: usize) {}

    /// A query was issued.
    fn on_load_started(&mut self, _intent: LoadIntent) {}

    /// Results for the current query arrived and are about to be merged.
    fn on_results_received(&mut self, _intent: LoadIntent) {}

    /// The current query failed.
    fn on_load_failed(&mut self, _error: &ListError) {}

    /// All rows were dropped ahead of a `ClearAndReplace` load.
    fn on_rows_cleared(&mut self) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<R> ListObserver<R> for NoopObserver {}

/// One observer callback, captured as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ListEvent<R> {
    /// See [`ListObserver::on_edits_applied`].
    EditsApplied {
        /// The edit script.
        edits: Vec<Edit<R>>,
        /// Intent of the completed load.
        intent: LoadIntent,
    },
    /// See [`ListObserver::on_full_refresh`].
    FullRefresh {
        /// Intent of the completed load.
        intent: LoadIntent,
    },
    /// See [`ListObserver::on_row_inserted`].
    RowInserted {
        /// Index of the new row.
        index: usize,
    },
    /// See [`ListObserver::on_row_updated`].
    RowUpdated {
        /// Index of the replaced row.
        index: usize,
    },
    /// See [`ListObserver::on_row_removed`].
    RowRemoved {
        /// Index the row was removed from.
        index: usize,
    },
    /// See [`ListObserver::on_load_started`].
    LoadStarted {
        /// Intent of the issued load.
        intent: LoadIntent,
    },
    /// See [`ListObserver::on_results_received`].
    ResultsReceived {
        /// Intent of the answered load.
        intent: LoadIntent,
    },
    /// See [`ListObserver::on_load_failed`].
    LoadFailed {
        /// Rendered error.
        error: String,
    },
    /// See [`ListObserver::on_rows_cleared`].
    RowsCleared,
}

/// An observer that records every callback in order.
#[derive(Debug, Clone)]
pub struct EventLog<R> {
    events: Vec<ListEvent<R>>,
}

impl<R> EventLog<R> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> &[ListEvent<R>] {
        &self.events
    }

    /// Removes and returns all recorded events.
    pub fn take(&mut self) -> Vec<ListEvent<R>> {
        std::mem::take(&mut self.events)
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<R> Default for EventLog<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> ListObserver<R> for EventLog<R> {
    fn on_edits_applied(&mut self, edits: &[Edit<R>], intent: LoadIntent) {
        self.events.push(ListEvent::EditsApplied {
            edits: edits.to_vec(),
            intent,
        });
    }

    fn on_full_refresh(&mut self, intent: LoadIntent) {
        self.events.push(ListEvent::FullRefresh { intent });
    }

    fn on_row_inserted(&mut self, index: usize) {
        self.events.push(ListEvent::RowInserted { index });
    }

    fn on_row_updated(&mut self, index: usize) {
        self.events.push(ListEvent::RowUpdated { index });
    }

    fn on_row_removed(&mut self, index: usize) {
        self.events.push(ListEvent::RowRemoved { index });
    }

    fn on_load_started(&mut self, intent: LoadIntent) {
        self.events.push(ListEvent::LoadStarted { intent });
    }

    fn on_results_received(&mut self, intent: LoadIntent) {
        self.events.push(ListEvent::ResultsReceived { intent });
    }

    fn on_load_failed(&mut self, error: &ListError) {
        self.events.push(ListEvent::LoadFailed {
            error: error.to_string(),
        });
    }

    fn on_rows_cleared(&mut self) {
        self.events.push(ListEvent::RowsCleared);
    }
}
