//! Reconciliation of volleynet data with local storage.
//!
//! A run lists a league season, decides per tournament whether the detail
//! page has to be downloaded, diffs the downloads against the persisted state
//! and writes the resulting [`ChangeSet`]. Every run is announced and
//! reported through an [`EventPublisher`].

mod classify;
mod diff;
mod memory;
mod report;
mod repository;
mod service;

pub use classify::{classify, SyncClassification};
pub use diff::{
    diff, merge_player, merge_team, merge_tournament, ChangeSet, PlayerChanges, TeamChanges,
    TournamentChanges,
};
pub use memory::{
    MemoryPlayerRepository, MemoryPublisher, MemoryTeamRepository, MemoryTournamentRepository,
};
pub use report::{RunKind, RunReport, SyncEvent, TracingPublisher};
pub use repository::{
    EventPublisher, PlayerRepository, StoreError, StoreResult, TeamRepository,
    TournamentRepository, TournamentSource,
};
pub use service::{PersistStage, SyncError, SyncService};
