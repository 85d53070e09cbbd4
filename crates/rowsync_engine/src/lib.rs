//! # rowsync engine
//!
//! A paginated, searchable list that stays in sync with a remote query source
//! and reports every change as a precise edit script.
//!
//! This crate provides:
//! - [`ListSynchronizer`]: the load state machine and the owner of the rows
//! - Five load intents with their own merge rules ([`LoadIntent`])
//! - Stale-result suppression through load generations
//! - CRUD reconciliation, fed directly or through a [`CrudFeed`]
//! - [`ListObserver`] callbacks, plus an [`EventLog`] that records them
//! - [`MemorySource`], an in-memory [`QuerySource`] for tests and tooling
//!
//! ## Architecture
//!
//! The synchronizer is single-owner. Loads spawn a tokio task that runs the
//! query (with optional timeout and retry) and the client-side page pipeline,
//! then sends the result back over a channel. The owner merges it when it
//! polls for completions, so every state change and observer callback happens
//! on the owner's context.
//!
//! ```no_run
//! use rowsync_engine::{EventLog, ListConfig, ListSynchronizer, LoadIntent, MemorySource, Record};
//!
//! # async fn demo() {
//! let source = MemorySource::new(vec![Record::new("1", 1), Record::new("2", 1)]);
//! let mut list = ListSynchronizer::new(ListConfig::paginated(50), source, EventLog::new());
//!
//! list.load_and_wait(LoadIntent::Initial).await;
//! assert_eq!(list.len(), 2);
//! # }
//! ```
//!
//! ## Key Invariants
//!
//! - No two rows are the same entity
//! - At most one load is in flight; `ClearAndReplace` supersedes it
//! - A superseded load never mutates state or notifies the observer
//! - A failed load leaves the rows untouched
//! - CRUD reconciliation is idempotent

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod crud;
mod error;
mod intent;
mod memory;
mod merge;
mod observer;
mod query;
mod row;
mod rowset;
mod synchronizer;

pub use config::{ListConfig, NewRowsPosition, RetryConfig};
pub use crud::{CrudEvent, CrudFeed, CrudReceiver};
pub use error::{ListError, ListResult};
pub use intent::{LoadIntent, LoadingState};
pub use memory::MemorySource;
pub use merge::{catch_up, merge_page, MergeOutcome, Notice};
pub use observer::{EventLog, ListEvent, ListObserver, NoopObserver};
pub use query::{CancelHandle, Cursor, Filter, FilterOp, Page, PagePipeline, PageRequest, QuerySource};
pub use row::{Record, Row, RowMatcher};
pub use rowset::RowSet;
pub use rowsync_diff::{Edit, EditKind};
pub use synchronizer::{ListSynchronizer, LoadOutcome, LoadStatus, LoadTicket};
