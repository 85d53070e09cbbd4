//! Replay command implementation.
//!
//! A scenario describes a dataset served by an in-memory source and a list of
//! steps driven against a synchronizer. Every step reports the observer
//! events it caused.

use crate::output::{describe_event, label};
use rowsync_engine::{
    EventLog, Filter, ListConfig, ListError, ListEvent, ListResult, ListSynchronizer, LoadIntent,
    LoadOutcome, LoadStatus, MemorySource, NewRowsPosition, Record, Row, RowMatcher,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// A scenario file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Synchronizer settings.
    #[serde(default)]
    pub config: ScenarioConfig,
    /// Rows served by the source, newest first.
    #[serde(default)]
    pub dataset: Vec<Record>,
    /// Steps to run in order.
    pub steps: Vec<Step>,
}

/// Synchronizer settings of a scenario.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Rows per page.
    pub page_limit: Option<usize>,
    /// Whether more pages may be requested.
    pub paginate: bool,
    /// Where new rows go.
    pub new_rows_position: NewRowsPosition,
    /// Intent used by search steps.
    pub search_intent: Option<LoadIntent>,
    /// Per-query timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Artificial latency of the source in milliseconds.
    pub latency_ms: Option<u64>,
    /// Diff size limit before falling back to a full refresh.
    pub max_diff_cells: Option<usize>,
    /// Fall back to display-name equality for rows without an id.
    pub match_by_name: bool,
}

impl ScenarioConfig {
    /// Builds the synchronizer configuration.
    pub fn list_config(&self) -> ListResult<ListConfig> {
        if self.paginate && self.page_limit.is_none() {
            return Err(ListError::InvalidScenario(
                "paginate requires page_limit".into(),
            ));
        }
        if self.page_limit == Some(0) {
            return Err(ListError::InvalidScenario(
                "page_limit must be positive".into(),
            ));
        }

        let mut config = ListConfig::default()
            .with_paginate(self.paginate)
            .with_new_rows_position(self.new_rows_position);
        config.page_limit = self.page_limit;
        if let Some(intent) = self.search_intent {
            config = config.with_search_intent(intent);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_query_timeout(Duration::from_millis(ms));
        }
        if let Some(cells) = self.max_diff_cells {
            config = config.with_max_diff_cells(cells);
        }
        Ok(config)
    }
}

/// One scenario step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Issue a load and wait for it.
    Load {
        /// Load intent.
        intent: LoadIntent,
    },
    /// Search and wait for the resulting load.
    Search {
        /// Search text; absent clears the search.
        #[serde(default)]
        text: Option<String>,
    },
    /// Replace the filters for future loads.
    Filter {
        /// New filters.
        filters: Vec<Filter>,
    },
    /// Reconcile a created row.
    Create {
        /// The row.
        row: Record,
    },
    /// Reconcile an updated row.
    Update {
        /// The row.
        row: Record,
    },
    /// Reconcile a deleted row.
    Delete {
        /// The row.
        row: Record,
    },
    /// Replace the rows served by the source.
    SetDataset {
        /// New dataset, newest first.
        rows: Vec<Record>,
    },
    /// Add a row to the front of the source's dataset.
    PushFront {
        /// The new row.
        row: Record,
    },
    /// Make the next query fail.
    FailNext {
        /// Error message.
        message: String,
        /// Whether the error is retryable.
        #[serde(default)]
        retryable: bool,
    },
    /// Sort the rows by a field.
    Sort {
        /// Field name.
        field: String,
        /// Sort descending.
        #[serde(default)]
        descending: bool,
    },
    /// Empty the rows.
    Clear,
}

/// What one step did.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// The step.
    pub step: Step,
    /// Load resolution, for steps that load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Observer events caused by the step.
    pub events: Vec<ListEvent<Record>>,
    /// Row count after the step.
    pub row_count: usize,
}

/// Result of a replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Per-step reports.
    pub steps: Vec<StepReport>,
    /// Final rows.
    pub rows: Vec<Record>,
    /// Final `has_loaded_once` flag.
    pub has_loaded_once: bool,
    /// Final `might_have_more` flag.
    pub might_have_more: bool,
}

/// Parses a scenario file.
pub fn read_scenario(path: &Path) -> Result<Scenario, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text).map_err(ListError::from)?)
}

/// Runs a scenario to completion.
pub async fn replay(scenario: Scenario) -> ListResult<ReplayReport> {
    let config = scenario.config.list_config()?;
    let source = MemorySource::new(scenario.dataset);
    source.set_delay(scenario.config.latency_ms.map(Duration::from_millis));

    let mut list = ListSynchronizer::new(config, source.clone(), EventLog::new());
    if scenario.config.match_by_name {
        list = list.with_matcher(RowMatcher::IdentityOrName);
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.into_iter().enumerate() {
        debug!(index, ?step, "running step");
        let outcome = match step.clone() {
            Step::Load { intent } => Some(describe_outcome(list.load_and_wait(intent).await)),
            Step::Search { text } => {
                let outcome = match list.search_by_text(text) {
                    Some(ticket) => list.wait_for(ticket).await,
                    None => None,
                };
                Some(describe_outcome(outcome))
            }
            Step::Filter { filters } => {
                list.set_filters(filters);
                None
            }
            Step::Create { row } => Some(describe_index(list.apply_create(row))),
            Step::Update { row } => Some(describe_index(list.apply_update(row))),
            Step::Delete { row } => Some(describe_index(list.apply_delete(&row))),
            Step::SetDataset { rows } => {
                source.set_rows(rows);
                None
            }
            Step::PushFront { row } => {
                source.push_front(row);
                None
            }
            Step::FailNext { message, retryable } => {
                source.fail_next(ListError::Query { message, retryable });
                None
            }
            Step::Sort { field, descending } => {
                list.sort_by(|a, b| {
                    let order = compare_fields(a.field(&field), b.field(&field));
                    if descending {
                        order.reverse()
                    } else {
                        order
                    }
                });
                None
            }
            Step::Clear => {
                list.clear();
                None
            }
        };

        steps.push(StepReport {
            step,
            outcome,
            events: list.observer_mut().take(),
            row_count: list.len(),
        });
    }

    info!(steps = steps.len(), rows = list.len(), "replay finished");
    Ok(ReplayReport {
        steps,
        rows: list.snapshot(),
        has_loaded_once: list.state().has_loaded_once,
        might_have_more: list.state().might_have_more,
    })
}

fn describe_outcome(outcome: Option<LoadOutcome<Record>>) -> String {
    match outcome.map(|o| o.status) {
        None => "refused".to_string(),
        Some(LoadStatus::Applied { edits }) => format!("applied ({} edits)", edits.len()),
        Some(LoadStatus::FullRefresh) => "full refresh".to_string(),
        Some(LoadStatus::Failed(error)) => format!("failed: {error}"),
        Some(LoadStatus::Stale) => "stale".to_string(),
    }
}

fn describe_index(index: Option<usize>) -> String {
    match index {
        Some(index) => format!("index {index}"),
        None => "no-op".to_string(),
    }
}

/// Orders missing values first, then numbers, strings and booleans by value.
fn compare_fields(a: Option<Value>, b: Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(&y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(&y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Renders a replay report.
pub fn render(report: &ReplayReport, format: &str) -> Result<String, serde_json::Error> {
    if format == "json" {
        return serde_json::to_string_pretty(report);
    }

    let mut lines = Vec::new();
    for (index, step) in report.steps.iter().enumerate() {
        let name = serde_json::to_value(&step.step)?
            .get("step")
            .and_then(Value::as_str)
            .unwrap_or("step")
            .to_string();
        let mut header = format!("step {}: {name}", index + 1);
        if let Some(outcome) = &step.outcome {
            header.push_str(&format!(" -> {outcome}"));
        }
        lines.push(header);
        for event in &step.events {
            lines.extend(describe_event(event).into_iter().map(|line| format!("  {line}")));
        }
    }

    lines.push(format!("rows ({}):", report.rows.len()));
    lines.extend(report.rows.iter().map(|row| match &row.name {
        Some(name) => format!("  {} {name}", label(row)),
        None => format!("  {}", label(row)),
    }));
    Ok(lines.join("\n"))
}

/// Runs the replay command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = read_scenario(path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(replay(scenario))?;
    println!("{}", render(&report, format)?);
    Ok(())
}
