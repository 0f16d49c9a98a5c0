use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::sync::diff::ChangeSet;
use crate::sync::repository::EventPublisher;

/// Which kind of synchronization a run performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Tournaments,
    Ladder,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub success: bool,
    pub changes: ChangeSet,
    /// Tournaments whose detail page could not be downloaded or parsed.
    pub failed: Vec<u32>,
}

impl RunReport {
    pub(crate) fn new(kind: RunKind, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            started_at,
            duration: Duration::ZERO,
            success: true,
            changes: ChangeSet::default(),
            failed: vec![],
        }
    }

    pub(crate) fn finish(mut self, success: bool) -> Self {
        self.duration = (Utc::now() - self.started_at).to_std().unwrap_or_default();
        self.success = success;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncEvent {
    Started { kind: RunKind, at: DateTime<Utc> },
    Finished(RunReport),
}

impl SyncEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "scrape-start",
            Self::Finished(_) => "scrape-end",
        }
    }
}

/// Logs events instead of sending them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Started { kind, at } => {
                info!(event = event.name(), %kind, %at, "sync run started");
            }
            SyncEvent::Finished(report) => {
                let changes = &report.changes;
                info!(
                    event = event.name(),
                    kind = %report.kind,
                    success = report.success,
                    duration_ms = report.duration.as_millis() as u64,
                    tournaments_new = changes.tournaments.new.len(),
                    tournaments_updated = changes.tournaments.updated.len(),
                    tournaments_deleted = changes.tournaments.deleted.len(),
                    teams_new = changes.teams.new.len(),
                    teams_updated = changes.teams.updated.len(),
                    teams_deleted = changes.teams.deleted.len(),
                    players_new = changes.players.new.len(),
                    players_updated = changes.players.updated.len(),
                    failed = report.failed.len(),
                    "sync run finished"
                );
            }
        }
    }
}
