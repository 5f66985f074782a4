//! Run orchestration for a single catalog refresh.
//!
//! # States
//!
//! ```text
//! Init ──► SourceFetching ──► Aggregating ──► Publishing ──► Done
//!   │            │                 │               │
//!   └────────────┴─────────────────┴───────────────┴──► Failed
//! ```
//!
//! - `Init`: health-check the sink; an unreachable sink fails the run before the
//!   source is queried.
//! - `SourceFetching`: run the metadata query. Zero rows ends the run as a
//!   warning-level failure and nothing is published.
//! - `Aggregating`: fold rows into table records and build documents.
//! - `Publishing`: one bulk upsert. Item rejections still reach `Done`; a
//!   failure of the call itself does not.
//!
//! Cancellation is honoured between stages only. Once publishing has started
//! it runs to completion so the index is never left half-written by us.
//!
//! The core does not serialise concurrent runs; callers must not run two
//! refreshes against the same index and database at once.

use catalog_core::{aggregate, build, MetadataSource, SourceError};
use catalog_sink::DocumentSink;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::CatalogConfig;
use crate::publish::{publish, PublishResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    SourceFetching,
    Aggregating,
    Publishing,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            RunState::Init => "init",
            RunState::SourceFetching => "source_fetching",
            RunState::Aggregating => "aggregating",
            RunState::Publishing => "publishing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Health check failed or timed out
    SinkUnreachable,
    /// Connection, query or timeout error from the metadata source
    SourceQueryFailed,
    /// The source returned no rows
    EmptySource,
    /// The bulk call could not be completed
    PublishFailed,
    /// The run was cancelled between stages
    Cancelled,
}

impl FailureKind {
    /// Warning-level failures produce nothing but are not errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, FailureKind::EmptySource)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub kind: FailureKind,
    /// State the run was in when it failed
    pub stage: RunState,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done(PublishResult),
    Failed(RunFailure),
}

/// Terminal status of a run plus the path it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every state entered, starting with `Init`
    pub states: Vec<RunState>,
    pub row_count: usize,
    pub table_count: usize,
}

impl RunReport {
    pub fn final_state(&self) -> RunState {
        match self.outcome {
            RunOutcome::Done(_) => RunState::Done,
            RunOutcome::Failed(_) => RunState::Failed,
        }
    }

    pub fn publish_result(&self) -> Option<&PublishResult> {
        match &self.outcome {
            RunOutcome::Done(result) => Some(result),
            RunOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match &self.outcome {
            RunOutcome::Done(_) => None,
            RunOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Process exit code: 0 for a clean `Done`, 2 for the empty-source
    /// warning, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            RunOutcome::Done(result) if result.is_clean() => 0,
            RunOutcome::Done(_) => 1,
            RunOutcome::Failed(failure) if failure.kind.is_warning() => 2,
            RunOutcome::Failed(_) => 1,
        }
    }

    /// Human readable one-line summary for stderr.
    pub fn summary(&self) -> String {
        match &self.outcome {
            RunOutcome::Done(result) => format!(
                "done: {} tables from {} rows, {} succeeded, {} failed",
                self.table_count, self.row_count, result.succeeded_count, result.failed_count
            ),
            RunOutcome::Failed(failure) => {
                format!("failed during {}: {}", failure.stage, failure.reason)
            }
        }
    }
}

struct RunTracker {
    states: Vec<RunState>,
    row_count: usize,
    table_count: usize,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            states: vec![RunState::Init],
            row_count: 0,
            table_count: 0,
        }
    }

    fn current(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Init)
    }

    fn enter(&mut self, state: RunState) {
        info!("Catalog run: {} -> {}", self.current(), state);
        self.states.push(state);
    }

    fn fail(mut self, kind: FailureKind, reason: String) -> RunReport {
        let stage = self.current();
        if kind.is_warning() {
            warn!("Catalog run ended during {stage}: {reason}");
        } else {
            error!("Catalog run failed during {stage}: {reason}");
        }
        self.states.push(RunState::Failed);
        RunReport {
            outcome: RunOutcome::Failed(RunFailure {
                kind,
                stage,
                reason,
            }),
            states: self.states,
            row_count: self.row_count,
            table_count: self.table_count,
        }
    }

    fn done(mut self, result: PublishResult) -> RunReport {
        self.enter(RunState::Done);
        RunReport {
            outcome: RunOutcome::Done(result),
            states: self.states,
            row_count: self.row_count,
            table_count: self.table_count,
        }
    }
}

/// Run one refresh: check the sink, fetch rows, aggregate, build, publish.
///
/// Never returns an error; every failure is reported through the returned
/// [`RunReport`].
pub async fn run_catalog_sync<M, S>(
    config: &CatalogConfig,
    source: &M,
    sink: &S,
    cancel: &CancellationToken,
) -> RunReport
where
    M: MetadataSource,
    S: DocumentSink,
{
    let mut run = RunTracker::new();
    let started_at = Utc::now();
    let database = config.source.database.as_str();

    info!(
        "Starting catalog refresh of '{database}' into index '{}'",
        config.sink.index
    );

    if cancel.is_cancelled() {
        return run.fail(FailureKind::Cancelled, "cancelled before start".to_string());
    }

    let healthy = tokio::time::timeout(config.sink.timeout, sink.health_check())
        .await
        .unwrap_or(false);
    if !healthy {
        return run.fail(FailureKind::SinkUnreachable, "sink unreachable".to_string());
    }

    if cancel.is_cancelled() {
        return run.fail(FailureKind::Cancelled, "cancelled before source fetch".to_string());
    }
    run.enter(RunState::SourceFetching);

    let fetched = tokio::time::timeout(config.source.timeout, source.fetch_rows(database))
        .await
        .unwrap_or(Err(SourceError::TimedOut(config.source.timeout)));
    let rows = match fetched {
        Ok(rows) => rows,
        Err(e) => {
            return run.fail(
                FailureKind::SourceQueryFailed,
                format!("source query failed: {e}"),
            )
        }
    };
    run.row_count = rows.len();

    if rows.is_empty() {
        return run.fail(
            FailureKind::EmptySource,
            format!("no tables found in database '{database}'"),
        );
    }
    info!("Fetched {} column rows", rows.len());

    if cancel.is_cancelled() {
        return run.fail(FailureKind::Cancelled, "cancelled before aggregation".to_string());
    }
    run.enter(RunState::Aggregating);

    let records = aggregate(rows, database);
    let documents: Vec<_> = records
        .into_values()
        .map(|record| {
            build(
                record,
                source.source_kind(),
                started_at,
                &config.owner_default,
            )
        })
        .collect();
    run.table_count = documents.len();
    info!("Built {} table documents", documents.len());

    if cancel.is_cancelled() {
        return run.fail(FailureKind::Cancelled, "cancelled before publish".to_string());
    }
    run.enter(RunState::Publishing);

    match publish(documents, sink, &config.sink.index, config.sink.timeout).await {
        Ok(result) => {
            if !result.is_clean() {
                warn!(
                    "{} of {} documents were rejected by the sink",
                    result.failed_count,
                    result.failed_count + result.succeeded_count
                );
            }
            run.done(result)
        }
        Err(e) => run.fail(FailureKind::PublishFailed, format!("publish failed: {e}")),
    }
}
