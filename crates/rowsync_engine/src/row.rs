//! Row model and entity comparators.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// An entity in a synchronized list.
///
/// Identity decides whether two rows are the same entity; revision decides
/// whether that entity changed between two loads.
pub trait Row: Clone + Send + Sync + 'static {
    /// Stable identifier type.
    type Id: Eq + Hash + Clone + fmt::Debug + Send + Sync;
    /// Last-modified marker type.
    type Revision: PartialEq + Clone + fmt::Debug + Send + Sync;

    /// Stable identifier, if the row has one.
    fn identity(&self) -> Option<Self::Id>;

    /// Last-modified marker, if known.
    fn revision(&self) -> Option<Self::Revision>;

    /// Human-readable name, used by the name fallback comparator and text search.
    fn display_name(&self) -> Option<&str> {
        None
    }

    /// Named field lookup for filters evaluated in memory.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Decides whether two rows are the same entity.
pub enum RowMatcher<R> {
    /// Same entity iff both identities are present and equal.
    Identity,
    /// Identities when both rows carry one, otherwise display-name equality.
    ///
    /// Fragile: two distinct entities without identities but with the same
    /// display name are treated as one, and so are two rows with neither.
    ///
    /// The relation is not transitive. A row without an id, `B{name: x}`, matches
    /// both `A{id: 1, name: x}` and `C{id: 2, name: x}` while `A` and `C` are
    /// distinct, so updating `[A, C]` with `B` replaces `A` and leaves two rows
    /// that match each other.
    IdentityOrName,
    /// Caller-supplied comparison.
    Custom(Arc<dyn Fn(&R, &R) -> bool + Send + Sync>),
}

impl<R: Row> RowMatcher<R> {
    /// Wraps a custom comparison.
    pub fn custom(f: impl Fn(&R, &R) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Returns true if `a` and `b` are the same entity.
    pub fn matches(&self, a: &R, b: &R) -> bool {
        match self {
            RowMatcher::Identity => match (a.identity(), b.identity()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            RowMatcher::IdentityOrName => match (a.identity(), b.identity()) {
                (Some(x), Some(y)) => x == y,
                _ => a.display_name() == b.display_name(),
            },
            RowMatcher::Custom(f) => f(a, b),
        }
    }
}

impl<R> Clone for RowMatcher<R> {
    fn clone(&self) -> Self {
        match self {
            RowMatcher::Identity => RowMatcher::Identity,
            RowMatcher::IdentityOrName => RowMatcher::IdentityOrName,
            RowMatcher::Custom(f) => RowMatcher::Custom(Arc::clone(f)),
        }
    }
}

impl<R> Default for RowMatcher<R> {
    fn default() -> Self {
        RowMatcher::Identity
    }
}

impl<R> fmt::Debug for RowMatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMatcher::Identity => f.write_str("Identity"),
            RowMatcher::IdentityOrName => f.write_str("IdentityOrName"),
            RowMatcher::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A JSON-backed row.
///
/// `id`, `rev` and `name` map onto identity, revision and display name; any
/// other keys are kept in `fields`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Revision counter or timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<i64>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with an identity and a revision.
    pub fn new(id: impl Into<String>, rev: i64) -> Self {
        Self {
            id: Some(id.into()),
            rev: Some(rev),
            ..Self::default()
        }
    }

    /// Creates a record identified only by its display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets an extra attribute.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl Row for Record {
    type Id = String;
    type Revision = i64;

    fn identity(&self) -> Option<String> {
        self.id.clone()
    }

    fn revision(&self) -> Option<i64> {
        self.rev
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => self.id.clone().map(Value::String),
            "rev" => self.rev.map(Value::from),
            "name" => self.name.clone().map(Value::String),
            other => self.fields.get(other).cloned(),
        }
    }
}
