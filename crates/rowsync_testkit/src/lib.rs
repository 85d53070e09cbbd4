//! # rowsync testkit
//!
//! Test utilities for rowsync.
//!
//! This crate provides:
//! - Row fixtures and edit-script assertions
//! - Property-based test generators using proptest
//! - A scripted query source whose answers the test releases by hand
//! - Temporary scenario files for command-line tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn answers_out_of_order() {
//!     let source = ScriptedSource::new();
//!     let mut list = ListSynchronizer::new(ListConfig::default(), source.clone(), EventLog::new());
//!     list.load(LoadIntent::Replace);
//!     source.wait_for_calls(1).await;
//!     source.respond_rows(0, rows(&[("1", 1)]));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scenario;
pub mod scripted;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scenario::*;
    pub use crate::scripted::*;
}

pub use fixtures::*;
pub use generators::*;
pub use scenario::*;
pub use scripted::*;
