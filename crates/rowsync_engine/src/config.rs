//! Configuration for the list synchronizer.

use crate::intent::LoadIntent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which end of the list receives newly discovered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewRowsPosition {
    /// New rows are prepended.
    #[default]
    Beginning,
    /// New rows are appended.
    End,
}

/// Configuration for a [`ListSynchronizer`](crate::ListSynchronizer).
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Rows requested per page. `None` means pages are never considered full.
    pub page_limit: Option<usize>,
    /// Whether the source supports fetching further pages.
    pub paginate: bool,
    /// Where created and newer rows are placed.
    pub new_rows_position: NewRowsPosition,
    /// Intent issued by `search_by_text`.
    pub search_intent: LoadIntent,
    /// Per-attempt query timeout.
    pub query_timeout: Option<Duration>,
    /// Retry configuration for retryable query errors.
    pub retry: RetryConfig,
    /// Upper bound on `old.len() * new.len()` for computing an edit script.
    /// Larger merges are reported as a full refresh.
    pub max_diff_cells: usize,
}

impl ListConfig {
    /// Creates a configuration for a paginated source.
    pub fn paginated(page_limit: usize) -> Self {
        Self {
            page_limit: Some(page_limit),
            paginate: true,
            ..Self::default()
        }
    }

    /// Sets the page limit.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Enables or disables pagination.
    pub fn with_paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Sets where new rows are placed.
    pub fn with_new_rows_position(mut self, position: NewRowsPosition) -> Self {
        self.new_rows_position = position;
        self
    }

    /// Sets the intent used for text searches.
    pub fn with_search_intent(mut self, intent: LoadIntent) -> Self {
        self.search_intent = intent;
        self
    }

    /// Sets the per-attempt query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the diff size limit.
    pub fn with_max_diff_cells(mut self, cells: usize) -> Self {
        self.max_diff_cells = cells;
        self
    }

    /// Returns true when a page of `len` rows suggests more are available.
    pub fn page_is_full(&self, len: usize) -> bool {
        self.paginate && self.page_limit.is_some_and(|limit| len >= limit)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_limit: None,
            paginate: false,
            new_rows_position: NewRowsPosition::Beginning,
            search_intent: LoadIntent::ClearAndReplace,
            query_timeout: None,
            retry: RetryConfig::no_retry(),
            max_diff_cells: 4_000_000,
        }
    }
}

/// How a load retries a query that failed with a retryable error.
///
/// Retries happen inside the load's task, so a superseded load stops retrying
/// at its next cancellation check. Only [`ListError::is_retryable`] errors are
/// retried.
///
/// [`ListError::is_retryable`]: crate::ListError::is_retryable
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Queries per load, counting the first one. `1` disables retries.
    pub max_attempts: u32,
    /// Pause before the second query.
    pub initial_delay: Duration,
    /// Upper bound on any pause.
    pub max_delay: Duration,
    /// Growth factor of the pause from one retry to the next.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Up to `max_attempts` queries per load, pausing 100ms and doubling up to 30s.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// A single query per load.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Pause before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Cap on the pause.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Factor applied to the pause after every retry.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Pause before query number `attempt`, counting the first query as 0.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(retry) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let pause = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(pause.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_config_builder() {
        let config = ListConfig::paginated(25)
            .with_new_rows_position(NewRowsPosition::End)
            .with_search_intent(LoadIntent::Replace)
            .with_query_timeout(Duration::from_secs(5));

        assert_eq!(config.page_limit, Some(25));
        assert!(config.paginate);
        assert_eq!(config.new_rows_position, NewRowsPosition::End);
        assert_eq!(config.search_intent, LoadIntent::Replace);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn full_page_requires_pagination_and_limit() {
        assert!(ListConfig::paginated(2).page_is_full(2));
        assert!(ListConfig::paginated(2).page_is_full(3));
        assert!(!ListConfig::paginated(2).page_is_full(1));
        assert!(!ListConfig::paginated(2).with_paginate(false).page_is_full(2));
        assert!(!ListConfig::default().with_paginate(true).page_is_full(100));
    }

    #[test]
    fn default_retry_is_a_single_query() {
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
        assert_eq!(RetryConfig::default().max_attempts, 1);
        assert_eq!(ListConfig::default().retry.max_attempts, 1);
    }

    #[test]
    fn pauses_grow_from_the_first_retry() {
        let retry = RetryConfig::new(4).with_initial_delay(Duration::from_millis(50));

        let pauses: Vec<u128> = (0..4).map(|n| retry.delay_for_attempt(n).as_millis()).collect();
        assert_eq!(pauses, vec![0, 50, 100, 200]);
    }

    #[test]
    fn pauses_are_capped() {
        let retry = RetryConfig::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(10.0);

        assert_eq!(retry.delay_for_attempt(5), Duration::from_secs(5));
        assert_eq!(retry.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }
}
