//! In-memory query source.

use crate::error::{ListError, ListResult};
use crate::intent::LoadIntent;
use crate::query::{Cursor, Page, PageRequest, QuerySource};
use crate::row::Row;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

struct MemoryState<R> {
    rows: Vec<R>,
    requests: Vec<PageRequest<R>>,
    failures: VecDeque<ListError>,
    delay: Option<Duration>,
}

/// A query source over a vector of rows, newest first.
///
/// Search matches display names case-insensitively. Filters are evaluated
/// with [`Filter::matches`](crate::Filter::matches). Pages are cut by offset;
/// `NewRows` returns the rows ahead of the request's anchor.
///
/// Cloning yields another handle to the same dataset, so a test can keep one
/// handle while the synchronizer owns the other.
pub struct MemorySource<R> {
    inner: Arc<Mutex<MemoryState<R>>>,
}

impl<R: Row> MemorySource<R> {
    /// Creates a source over `rows`.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                rows,
                requests: Vec::new(),
                failures: VecDeque::new(),
                delay: None,
            })),
        }
    }

    /// Replaces the dataset.
    pub fn set_rows(&self, rows: Vec<R>) {
        self.inner.lock().rows = rows;
    }

    /// Adds a row at the front of the dataset, as the newest row.
    pub fn push_front(&self, row: R) {
        self.inner.lock().rows.insert(0, row);
    }

    /// Copy of the dataset.
    pub fn rows(&self) -> Vec<R> {
        self.inner.lock().rows.clone()
    }

    /// Makes the next fetch fail with `error`. Calls queue up.
    pub fn fail_next(&self, error: ListError) {
        self.inner.lock().failures.push_back(error);
    }

    /// Delays every fetch by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.inner.lock().delay = delay;
    }

    /// Number of fetches received.
    pub fn call_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<PageRequest<R>> {
        self.inner.lock().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<PageRequest<R>> {
        self.inner.lock().requests.last().cloned()
    }

    fn page_for(&self, request: &PageRequest<R>) -> ListResult<Page<R>> {
        let state = self.inner.lock();
        let needle = request
            .search_text
            .as_deref()
            .map(str::to_lowercase)
            .filter(|text| !text.is_empty());

        let matching: Vec<&R> = state
            .rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => row
                    .display_name()
                    .is_some_and(|name| name.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .filter(|row| request.filters.iter().all(|filter| filter.matches(*row)))
            .collect();

        let (start, bound) = match request.intent {
            LoadIntent::More => match &request.cursor {
                Some(Cursor::Offset(offset)) => (*offset, matching.len()),
                Some(Cursor::Token(token)) => {
                    return Err(ListError::query_fatal(format!(
                        "unsupported cursor token {token:?}"
                    )))
                }
                None => (0, matching.len()),
            },
            LoadIntent::NewRows => {
                let anchor = request.anchor.as_ref().and_then(|row| row.identity());
                let bound = anchor
                    .and_then(|id| {
                        matching
                            .iter()
                            .position(|row| row.identity().as_ref() == Some(&id))
                    })
                    .unwrap_or(matching.len());
                (0, bound)
            }
            _ => (0, matching.len()),
        };

        let limit = request.limit.unwrap_or(usize::MAX);
        let end = start.saturating_add(limit).min(bound);
        let start = start.min(end);
        let rows = matching[start..end].iter().map(|row| (*row).clone()).collect();

        let page = Page::new(rows);
        Ok(match request.intent {
            LoadIntent::NewRows => page,
            _ => page.with_cursor(Cursor::Offset(end)),
        })
    }
}

impl<R> Clone for MemorySource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<R: Row> QuerySource<R> for MemorySource<R> {
    async fn fetch_page(&self, request: PageRequest<R>) -> ListResult<Page<R>> {
        let delay = {
            let mut state = self.inner.lock();
            state.requests.push(request.clone());
            if let Some(error) = state.failures.pop_front() {
                return Err(error);
            }
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.page_for(&request)
    }
}
