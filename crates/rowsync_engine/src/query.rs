//! Query source abstraction.

use crate::error::ListResult;
use crate::intent::LoadIntent;
use crate::row::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque pagination position owned by the query source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Number of rows to skip.
    Offset(usize),
    /// Source-specific continuation token.
    Token(String),
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals value.
    Eq,
    /// Field differs from value (or is missing).
    NotEq,
    /// Field is less than value.
    Lt,
    /// Field is less than or equal to value.
    Lte,
    /// Field is greater than value.
    Gt,
    /// Field is greater than or equal to value.
    Gte,
    /// String field contains value, or array field contains value.
    Contains,
    /// Field is one of the values in an array.
    In,
}

/// A structured filter forwarded to the query source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Comparison.
    pub op: FilterOp,
    /// Operand.
    pub value: Value,
}

impl Filter {
    /// Creates a filter.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Evaluates the filter against a row's field.
    pub fn matches<R: Row>(&self, row: &R) -> bool {
        self.matches_value(row.field(&self.field).as_ref())
    }

    /// Evaluates the filter against a field value.
    pub fn matches_value(&self, field: Option<&Value>) -> bool {
        let Some(field) = field else {
            return self.op == FilterOp::NotEq;
        };
        match self.op {
            FilterOp::Eq => field == &self.value,
            FilterOp::NotEq => field != &self.value,
            FilterOp::Lt => compare(field, &self.value) == Some(CmpOrdering::Less),
            FilterOp::Lte => matches!(
                compare(field, &self.value),
                Some(CmpOrdering::Less | CmpOrdering::Equal)
            ),
            FilterOp::Gt => compare(field, &self.value) == Some(CmpOrdering::Greater),
            FilterOp::Gte => matches!(
                compare(field, &self.value),
                Some(CmpOrdering::Greater | CmpOrdering::Equal)
            ),
            FilterOp::Contains => match (field, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Value::Array(items), needle) => items.contains(needle),
                _ => false,
            },
            FilterOp::In => match &self.value {
                Value::Array(options) => options.contains(field),
                _ => false,
            },
        }
    }
}

fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Cooperative cancellation check handed to the query source.
///
/// A handle is cancelled as soon as the synchronizer starts a newer load.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl CancelHandle {
    pub(crate) fn new(generation: u64, current: Arc<AtomicU64>) -> Self {
        Self {
            generation,
            current,
        }
    }

    /// Creates a handle that is never cancelled.
    pub fn detached() -> Self {
        Self::new(0, Arc::new(AtomicU64::new(0)))
    }

    /// Load generation this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once a newer load has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }
}

/// Parameters for one page fetch.
#[derive(Debug, Clone)]
pub struct PageRequest<R> {
    /// Why the page is requested.
    pub intent: LoadIntent,
    /// Search text, applied by the source.
    pub search_text: Option<String>,
    /// Structured filters, applied by the source.
    pub filters: Vec<Filter>,
    /// Position after the previous page (`More` only).
    pub cursor: Option<Cursor>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
    /// Row currently at the new-rows end of the list (`NewRows` only).
    pub anchor: Option<R>,
    /// Cancellation check for this request.
    pub cancel: CancelHandle,
}

impl<R> PageRequest<R> {
    /// Creates a bare request with no search, filters, cursor or anchor.
    pub fn new(intent: LoadIntent) -> Self {
        Self {
            intent,
            search_text: None,
            filters: Vec::new(),
            cursor: None,
            limit: None,
            anchor: None,
            cancel: CancelHandle::detached(),
        }
    }

    /// Sets the search text.
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Sets the cursor.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the anchor row.
    pub fn with_anchor(mut self, anchor: R) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Rows in source order.
    pub rows: Vec<R>,
    /// Position after this page, if the source tracks one.
    pub next_cursor: Option<Cursor>,
}

impl<R> Page<R> {
    /// Creates a page without a continuation cursor.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            next_cursor: None,
        }
    }

    /// Sets the continuation cursor.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.next_cursor = Some(cursor);
        self
    }
}

/// Executes page fetches for a synchronizer.
///
/// Implementations must return at most `request.limit` rows. A short page is
/// a complete page, not an error. The source may poll `request.cancel` and
/// give up early; its result is discarded either way once superseded.
#[async_trait]
pub trait QuerySource<R: Row>: Send + Sync + 'static {
    /// Fetches one page.
    async fn fetch_page(&self, request: PageRequest<R>) -> ListResult<Page<R>>;
}

#[async_trait]
impl<R: Row, S: QuerySource<R> + ?Sized> QuerySource<R> for Arc<S> {
    async fn fetch_page(&self, request: PageRequest<R>) -> ListResult<Page<R>> {
        (**self).fetch_page(request).await
    }
}

type RowPredicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;
type RowComparator<R> = Arc<dyn Fn(&R, &R) -> CmpOrdering + Send + Sync>;

/// Client-side filter and sort applied to every incoming page before merge.
///
/// Both run inside the fetch task, off the owning context, and must be pure.
pub struct PagePipeline<R> {
    filter: Option<RowPredicate<R>>,
    sort: Option<RowComparator<R>>,
}

impl<R> PagePipeline<R> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            filter: None,
            sort: None,
        }
    }

    /// Keeps only rows for which `f` returns true.
    pub fn with_filter(mut self, f: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(f));
        self
    }

    /// Sorts rows with `f` (stable).
    pub fn with_sort(mut self, f: impl Fn(&R, &R) -> CmpOrdering + Send + Sync + 'static) -> Self {
        self.sort = Some(Arc::new(f));
        self
    }

    /// Returns true if neither a filter nor a sort is set.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.sort.is_none()
    }

    /// Applies the filter then the sort.
    pub fn process(&self, mut rows: Vec<R>) -> Vec<R> {
        if let Some(filter) = &self.filter {
            rows.retain(|row| filter(row));
        }
        if let Some(sort) = &self.sort {
            rows.sort_by(|a, b| sort(a, b));
        }
        rows
    }
}

impl<R> Clone for PagePipeline<R> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
        }
    }
}

impl<R> Default for PagePipeline<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for PagePipeline<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagePipeline")
            .field("filter", &self.filter.is_some())
            .field("sort", &self.sort.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Record;
    use serde_json::json;

    #[test]
    fn filter_comparisons() {
        let row = Record::new("1", 4).with_field("price", 12.5).with_field("tags", json!(["a", "b"]));

        assert!(Filter::eq("id", "1").matches(&row));
        assert!(Filter::new("price", FilterOp::Gt, 10).matches(&row));
        assert!(Filter::new("price", FilterOp::Lte, 12.5).matches(&row));
        assert!(!Filter::new("price", FilterOp::Lt, 12.5).matches(&row));
        assert!(Filter::new("tags", FilterOp::Contains, "b").matches(&row));
        assert!(Filter::new("rev", FilterOp::In, json!([1, 4])).matches(&row));
    }

    #[test]
    fn missing_field_only_matches_not_eq() {
        let row = Record::new("1", 1);
        assert!(!Filter::eq("color", "red").matches(&row));
        assert!(Filter::new("color", FilterOp::NotEq, "red").matches(&row));
        assert!(!Filter::new("color", FilterOp::Gt, 0).matches(&row));
    }

    #[test]
    fn filter_json_shape() {
        let filter: Filter =
            serde_json::from_str(r#"{"field":"status","op":"not_eq","value":"archived"}"#).unwrap();
        assert_eq!(filter, Filter::new("status", FilterOp::NotEq, "archived"));
    }

    #[test]
    fn cancel_handle_tracks_generation() {
        let current = Arc::new(AtomicU64::new(3));
        let handle = CancelHandle::new(3, Arc::clone(&current));
        assert!(!handle.is_cancelled());
        current.store(4, Ordering::SeqCst);
        assert!(handle.is_cancelled());
        assert!(!CancelHandle::detached().is_cancelled());
    }

    #[test]
    fn pipeline_filters_then_sorts() {
        let pipeline = PagePipeline::new()
            .with_filter(|r: &Record| r.rev.unwrap_or(0) > 1)
            .with_sort(|a: &Record, b: &Record| b.rev.cmp(&a.rev));
        let rows = vec![Record::new("a", 2), Record::new("b", 1), Record::new("c", 5)];
        let ids: Vec<_> = pipeline
            .process(rows)
            .into_iter()
            .filter_map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
