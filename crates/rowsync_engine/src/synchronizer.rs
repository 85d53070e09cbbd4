//! The list synchronizer state machine.

use crate::config::{ListConfig, NewRowsPosition, RetryConfig};
use crate::crud::{CrudEvent, CrudReceiver};
use crate::error::{ListError, ListResult};
use crate::intent::{LoadIntent, LoadingState};
use crate::merge::{catch_up, merge_page, Notice};
use crate::observer::{ListObserver, NoopObserver};
use crate::query::{CancelHandle, Cursor, Filter, Page, PagePipeline, PageRequest, QuerySource};
use crate::row::{Row, RowMatcher};
use crate::rowset::RowSet;
use rowsync_diff::Edit;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

/// Identifies one issued load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
    intent: LoadIntent,
}

impl LoadTicket {
    /// Monotonic load number within one synchronizer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Intent the load was issued with.
    pub fn intent(&self) -> LoadIntent {
        self.intent
    }
}

/// What happened to a completed load.
#[derive(Debug)]
pub enum LoadStatus<R> {
    /// The page was merged and the observer received this edit script.
    Applied {
        /// Edits delivered to the observer.
        edits: Vec<Edit<R>>,
    },
    /// The page was merged and the observer was asked for a full refresh.
    FullRefresh,
    /// The query failed; rows are unchanged.
    Failed(ListError),
    /// A newer load superseded this one; its result was discarded.
    Stale,
}

impl<R> LoadStatus<R> {
    /// Returns true if the page was merged.
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadStatus::Applied { .. } | LoadStatus::FullRefresh)
    }

    /// Returns true if the result was discarded as superseded.
    pub fn is_stale(&self) -> bool {
        matches!(self, LoadStatus::Stale)
    }
}

/// A load paired with its resolution.
#[derive(Debug)]
pub struct LoadOutcome<R> {
    /// The load this outcome belongs to.
    pub ticket: LoadTicket,
    /// How it resolved.
    pub status: LoadStatus<R>,
}

struct FetchedPage<R> {
    rows: Vec<R>,
    raw_len: usize,
    next_cursor: Option<Cursor>,
}

struct Completion<R> {
    ticket: LoadTicket,
    result: ListResult<FetchedPage<R>>,
}

/// Owns an identity-unique row list and keeps it in sync with a query source.
///
/// All state lives on the owner. Queries run on spawned tokio tasks and hand
/// their results back over a channel; nothing is merged until the owner calls
/// [`next_completion`](Self::next_completion) or
/// [`drain_completions`](Self::drain_completions). Observer callbacks run
/// synchronously inside those calls and inside the CRUD operations.
///
/// At most one load is in flight. A new load is refused while one is pending,
/// except `ClearAndReplace`, which supersedes it. Results of superseded loads
/// are discarded without touching rows, state or the observer.
pub struct ListSynchronizer<R: Row, S: QuerySource<R>, O: ListObserver<R> = NoopObserver> {
    config: ListConfig,
    source: Arc<S>,
    observer: O,
    pipeline: PagePipeline<R>,
    rows: RowSet<R>,
    state: LoadingState,
    cursor: Option<Cursor>,
    filters: Vec<Filter>,
    last_error: Option<String>,
    generation: Arc<AtomicU64>,
    in_flight: Option<LoadTicket>,
    outstanding: usize,
    completions_tx: UnboundedSender<Completion<R>>,
    completions_rx: UnboundedReceiver<Completion<R>>,
    crud_rx: Option<CrudReceiver<R>>,
}

impl<R: Row, S: QuerySource<R>, O: ListObserver<R>> ListSynchronizer<R, S, O> {
    /// Creates a synchronizer with no rows, matching rows by identity.
    pub fn new(config: ListConfig, source: S, observer: O) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: LoadingState::new(config.paginate),
            config,
            source: Arc::new(source),
            observer,
            pipeline: PagePipeline::new(),
            rows: RowSet::new(RowMatcher::Identity),
            cursor: None,
            filters: Vec::new(),
            last_error: None,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            outstanding: 0,
            completions_tx,
            completions_rx,
            crud_rx: None,
        }
    }

    /// Uses `matcher` to decide row sameness. Existing rows are re-deduplicated.
    pub fn with_matcher(mut self, matcher: RowMatcher<R>) -> Self {
        let rows = self.rows.to_vec();
        self.rows = RowSet::new(matcher);
        self.rows.adopt(rows);
        self
    }

    /// Applies `pipeline` to every page before it is merged.
    pub fn with_pipeline(mut self, pipeline: PagePipeline<R>) -> Self {
        self.pipeline = pipeline;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current rows, read-only.
    pub fn rows(&self) -> &[R] {
        self.rows.as_slice()
    }

    /// Owned copy of the current rows.
    pub fn snapshot(&self) -> Vec<R> {
        self.rows.to_vec()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Loading flags.
    pub fn state(&self) -> &LoadingState {
        &self.state
    }

    /// Configuration.
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Message of the last failed load, cleared when the next load starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Search text sent with every query.
    pub fn search_text(&self) -> Option<&str> {
        self.state.pending_search_text.as_deref()
    }

    /// Filters sent with every query.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Pagination cursor for the next `More` load.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// The load currently in flight.
    pub fn in_flight(&self) -> Option<LoadTicket> {
        self.in_flight
    }

    /// Number of issued loads whose completion has not been processed yet,
    /// superseded ones included.
    pub fn pending_completions(&self) -> usize {
        self.outstanding
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The observer, mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// The query source.
    pub fn source(&self) -> &S {
        &self.source
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Issues a load.
    ///
    /// Returns `None` without querying when another load is in flight (unless
    /// `intent` is `ClearAndReplace`) or when `intent` is `More` and the last
    /// page was short. `ClearAndReplace` empties the rows first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&mut self, intent: LoadIntent) -> Option<LoadTicket> {
        if self.state.is_loading && intent != LoadIntent::ClearAndReplace {
            debug!(?intent, "load refused, another load is in flight");
            return None;
        }
        if intent == LoadIntent::More && !self.state.might_have_more {
            debug!("load refused, no further pages");
            return None;
        }

        if intent == LoadIntent::ClearAndReplace {
            self.clear();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = LoadTicket { generation, intent };
        self.state.is_loading = true;
        self.last_error = None;
        self.in_flight = Some(ticket);
        self.outstanding += 1;
        self.observer.on_load_started(intent);

        let cancel = CancelHandle::new(generation, Arc::clone(&self.generation));
        let request = self.request_for(intent, cancel);
        debug!(
            generation,
            ?intent,
            search = ?request.search_text,
            filters = request.filters.len(),
            "issuing load"
        );

        let source = Arc::clone(&self.source);
        let pipeline = self.pipeline.clone();
        let retry = self.config.retry.clone();
        let timeout = self.config.query_timeout;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = fetch_with_retry(&*source, request, &retry, timeout)
                .await
                .map(|page| FetchedPage {
                    raw_len: page.rows.len(),
                    rows: pipeline.process(page.rows),
                    next_cursor: page.next_cursor,
                });
            // Fails only if the synchronizer was dropped; the result goes with it.
            let _ = tx.send(Completion { ticket, result });
        });

        Some(ticket)
    }

    /// Waits for the next issued load to finish and processes it.
    ///
    /// Returns `None` when no load is outstanding.
    pub async fn next_completion(&mut self) -> Option<LoadOutcome<R>> {
        if self.outstanding == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        Some(self.complete(completion))
    }

    /// Processes every load that already finished, without waiting.
    pub fn drain_completions(&mut self) -> Vec<LoadOutcome<R>> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            outcomes.push(self.complete(completion));
        }
        outcomes
    }

    /// Issues a load and processes completions until that load resolves.
    ///
    /// Returns `None` if the load was refused.
    pub async fn load_and_wait(&mut self, intent: LoadIntent) -> Option<LoadOutcome<R>> {
        let ticket = self.load(intent)?;
        self.wait_for(ticket).await
    }

    /// Processes completions until `ticket` resolves.
    ///
    /// Returns `None` if no outstanding load carries `ticket`.
    pub async fn wait_for(&mut self, ticket: LoadTicket) -> Option<LoadOutcome<R>> {
        while let Some(outcome) = self.next_completion().await {
            if outcome.ticket == ticket {
                return Some(outcome);
            }
        }
        None
    }

    /// Stores `text` as the search text and reloads with the configured
    /// search intent.
    ///
    /// The text is forwarded as given; an empty string is not the same as
    /// `None` and it is up to the source to decide what it matches.
    pub fn search_by_text(&mut self, text: Option<String>) -> Option<LoadTicket> {
        self.state.pending_search_text = text;
        self.load(self.config.search_intent)
    }

    /// Replaces the filters sent with future queries. Does not reload.
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
    }

    /// Empties the rows and resets the loading flags.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.cursor = None;
        self.state.has_loaded_once = false;
        self.state.might_have_more = self.config.paginate;
        self.observer.on_rows_cleared();
    }

    fn request_for(&self, intent: LoadIntent, cancel: CancelHandle) -> PageRequest<R> {
        let mut request = PageRequest::new(intent);
        request.search_text = self.state.pending_search_text.clone();
        request.filters = self.filters.clone();
        request.limit = self.config.page_limit;
        request.cancel = cancel;
        if intent.uses_cursor() {
            request.cursor = self
                .cursor
                .clone()
                .or(Some(Cursor::Offset(self.rows.len())));
        }
        if intent == LoadIntent::NewRows {
            request.anchor = self.anchor();
        }
        request
    }

    fn anchor(&self) -> Option<R> {
        let rows = self.rows.as_slice();
        match self.config.new_rows_position {
            NewRowsPosition::Beginning => rows.first(),
            NewRowsPosition::End => rows.last(),
        }
        .cloned()
    }

    fn complete(&mut self, completion: Completion<R>) -> LoadOutcome<R> {
        self.outstanding = self.outstanding.saturating_sub(1);
        let ticket = completion.ticket;

        if ticket.generation != self.generation.load(Ordering::SeqCst) {
            trace!(generation = ticket.generation, "discarding superseded load");
            return LoadOutcome {
                ticket,
                status: LoadStatus::Stale,
            };
        }

        self.in_flight = None;
        self.state.is_loading = false;

        let status = match completion.result {
            Err(error) => {
                warn!(intent = ?ticket.intent, %error, "load failed");
                self.last_error = Some(error.to_string());
                self.observer.on_load_failed(&error);
                LoadStatus::Failed(error)
            }
            Ok(page) => {
                self.observer.on_results_received(ticket.intent);
                self.state.might_have_more = self.config.page_is_full(page.raw_len);
                if ticket.intent != LoadIntent::NewRows {
                    self.cursor = page.next_cursor;
                }
                self.merge(page.rows, ticket.intent)
            }
        };

        LoadOutcome { ticket, status }
    }

    fn merge(&mut self, page: Vec<R>, intent: LoadIntent) -> LoadStatus<R> {
        let merged = merge_page(&self.rows, page, intent, &self.config);
        self.rows.set_unique(merged.rows);
        self.state.has_loaded_once = true;

        match merged.notice {
            Notice::Edits(edits) => {
                debug!(?intent, edits = edits.len(), rows = self.rows.len(), "merged page");
                self.observer.on_edits_applied(&edits, intent);
                LoadStatus::Applied { edits }
            }
            Notice::FullRefresh => {
                debug!(?intent, rows = self.rows.len(), "merged page, full refresh");
                self.observer.on_full_refresh(intent);
                LoadStatus::FullRefresh
            }
        }
    }

    // ========================================================================
    // Direct row manipulation
    // ========================================================================

    /// Installs rows without notifying the observer, as if they were loaded.
    pub fn preset_rows(&mut self, rows: Vec<R>) {
        self.rows.adopt(rows);
        self.state.has_loaded_once = true;
    }

    /// Replaces the rows and notifies the observer as for a `Replace` load.
    pub fn replace_rows(&mut self, rows: Vec<R>) {
        self.merge(rows, LoadIntent::Replace);
    }

    /// Edit script building the current rows from nothing.
    pub fn catch_up_edits(&self) -> Vec<Edit<R>> {
        catch_up(self.rows.as_slice())
    }

    /// Sorts rows in place. The observer is not notified.
    pub fn sort_by(&mut self, compare: impl FnMut(&R, &R) -> CmpOrdering) {
        self.rows.sort_by(compare);
    }

    // ========================================================================
    // CRUD reconciliation
    // ========================================================================

    /// Inserts a created row at the new-rows end. No-op if already present.
    pub fn apply_create(&mut self, row: R) -> Option<usize> {
        let index = match self.config.new_rows_position {
            NewRowsPosition::Beginning => self.rows.insert(0, row),
            NewRowsPosition::End => self.rows.push(row),
        }?;
        self.observer.on_row_inserted(index);
        Some(index)
    }

    /// Replaces the matching row in place. No-op if absent.
    pub fn apply_update(&mut self, row: R) -> Option<usize> {
        let index = self.rows.replace(row)?;
        self.observer.on_row_updated(index);
        Some(index)
    }

    /// Removes the matching row. No-op if absent.
    pub fn apply_delete(&mut self, row: &R) -> Option<usize> {
        let (index, _) = self.rows.remove(row)?;
        self.observer.on_row_removed(index);
        Some(index)
    }

    /// Reconciles one CRUD event. Returns the affected index, if any.
    pub fn apply_event(&mut self, event: CrudEvent<R>) -> Option<usize> {
        trace!(kind = event.kind(), "applying crud event");
        match event {
            CrudEvent::Create(row) => self.apply_create(row),
            CrudEvent::Update(row) => self.apply_update(row),
            CrudEvent::Delete(row) => self.apply_delete(&row),
        }
    }

    /// Attaches a CRUD subscription, replacing any previous one.
    pub fn attach_crud_feed(&mut self, receiver: CrudReceiver<R>) {
        self.crud_rx = Some(receiver);
    }

    /// Applies every CRUD event received so far. Returns how many were read.
    pub fn drain_crud_events(&mut self) -> usize {
        let mut events = Vec::new();
        if let Some(rx) = self.crud_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        let count = events.len();
        for event in events {
            self.apply_event(event);
        }
        count
    }
}

/// Runs one fetch, retrying retryable errors with backoff.
async fn fetch_with_retry<R: Row, S: QuerySource<R> + ?Sized>(
    source: &S,
    request: PageRequest<R>,
    retry: &RetryConfig,
    timeout: Option<Duration>,
) -> ListResult<Page<R>> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if request.cancel.is_cancelled() {
            return Err(ListError::Cancelled);
        }

        let fetch = source.fetch_page(request.clone());
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or_else(|_| Err(ListError::Timeout)),
            None => fetch.await,
        };

        match result {
            Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;
                let delay = retry.delay_for_attempt(attempt);
                debug!(attempt, ?delay, %error, "retrying query");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
