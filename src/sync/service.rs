use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::{stream, StreamExt};
use itertools::Itertools;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::VolleynetError;
use crate::model::{Gender, Player, TournamentDetail};
use crate::sync::classify::classify;
use crate::sync::diff::{diff, merge_player, ChangeSet};
use crate::sync::report::{RunKind, RunReport, SyncEvent};
use crate::sync::repository::{
    EventPublisher, PlayerRepository, StoreError, TeamRepository, TournamentRepository,
    TournamentSource,
};

/// The write step that failed while persisting a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PersistStage {
    #[strum(serialize = "players")]
    Players,
    #[strum(serialize = "tournaments")]
    Tournaments,
    #[strum(serialize = "teams")]
    Teams,
    #[strum(serialize = "deleted tournaments")]
    DeletedTournaments,
}

/// A sync run aborted. Writes made before the failure are kept.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("loading the tournament list failed: {0}")]
    Listing(#[source] VolleynetError),

    #[error("loading persisted tournament {id} failed: {source}")]
    LoadPersisted { id: u32, source: StoreError },

    #[error("loading persisted teams of tournament {id} failed: {source}")]
    LoadTeams { id: u32, source: StoreError },

    #[error("loading persisted upcoming tournaments failed: {0}")]
    LoadUpcoming(#[source] StoreError),

    #[error("loading the ladder failed: {0}")]
    Ladder(#[source] VolleynetError),

    #[error("persisting {stage} failed: {source}")]
    Persist {
        stage: PersistStage,
        source: StoreError,
    },
}

fn persist_failed(stage: PersistStage) -> impl FnOnce(StoreError) -> SyncError {
    move |source| SyncError::Persist { stage, source }
}

/// Reconciles volleynet with the local stores.
///
/// Callers must not run two syncs of the same scope at the same time.
pub struct SyncService {
    source: Arc<dyn TournamentSource>,
    tournaments: Arc<dyn TournamentRepository>,
    teams: Arc<dyn TeamRepository>,
    players: Arc<dyn PlayerRepository>,
    publisher: Arc<dyn EventPublisher>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        source: Arc<dyn TournamentSource>,
        tournaments: Arc<dyn TournamentRepository>,
        teams: Arc<dyn TeamRepository>,
        players: Arc<dyn PlayerRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            source,
            tournaments,
            teams,
            players,
            publisher,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Synchronize one league season.
    ///
    /// Tournaments whose detail page fails to download are left untouched and
    /// listed in [`RunReport::failed`]; the run still succeeds.
    #[instrument(skip(self))]
    pub async fn tournaments(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> Result<RunReport, SyncError> {
        let mut report = self.start(RunKind::Tournaments);

        match self
            .sync_tournaments(gender, league, season, &mut report)
            .await
        {
            Ok(()) => Ok(self.finish(report, true)),
            Err(e) => {
                error!(error = %e, "tournament sync failed");
                self.finish(report, false);
                Err(e)
            }
        }
    }

    /// Merge the ranking ladder into the player store.
    #[instrument(skip(self))]
    pub async fn ladder(&self, gender: Gender) -> Result<RunReport, SyncError> {
        let mut report = self.start(RunKind::Ladder);

        match self.sync_ladder(gender, &mut report.changes).await {
            Ok(()) => Ok(self.finish(report, true)),
            Err(e) => {
                error!(error = %e, "ladder sync failed");
                self.finish(report, false);
                Err(e)
            }
        }
    }

    fn start(&self, kind: RunKind) -> RunReport {
        let at = Utc::now();
        info!(%kind, "starting sync run");
        self.publisher.publish(&SyncEvent::Started { kind, at });
        RunReport::new(kind, at)
    }

    fn finish(&self, report: RunReport, success: bool) -> RunReport {
        let report = report.finish(success);
        info!(
            kind = %report.kind,
            success,
            duration_ms = report.duration.as_millis() as u64,
            failed = report.failed.len(),
            "finished sync run"
        );
        self.publisher.publish(&SyncEvent::Finished(report.clone()));
        report
    }

    async fn sync_tournaments(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
        report: &mut RunReport,
    ) -> Result<(), SyncError> {
        let listed = self
            .source
            .list_tournaments(gender, league, season)
            .await
            .map_err(SyncError::Listing)?;
        debug!(count = listed.len(), "listed tournaments");

        let mut old = BTreeMap::new();
        let mut to_download = vec![];

        for listing in &listed {
            let persisted = match self.tournaments.get(listing.id).await {
                Ok(tournament) => Some(tournament),
                Err(StoreError::NotFound) => None,
                Err(source) => {
                    return Err(SyncError::LoadPersisted {
                        id: listing.id,
                        source,
                    })
                }
            };

            let classification = classify(persisted.as_ref(), listing);
            debug!(id = listing.id, %classification, "classified tournament");
            if !classification.needs_download() {
                continue;
            }

            if let Some(persisted) = persisted {
                old.insert(listing.id, self.with_teams(persisted).await?);
            }
            to_download.push(listing);
        }

        let listed_ids: HashSet<u32> = listed.iter().map(|l| l.id).collect();
        let upcoming = self
            .tournaments
            .upcoming(gender, league, season)
            .await
            .map_err(SyncError::LoadUpcoming)?;
        for tournament in upcoming {
            if listed_ids.contains(&tournament.id()) {
                continue;
            }
            info!(id = tournament.id(), "upcoming tournament is no longer listed");
            old.insert(tournament.id(), self.with_teams(tournament).await?);
        }

        if to_download.is_empty() && old.is_empty() {
            debug!("nothing to synchronize");
            return Ok(());
        }

        let downloads: Vec<_> = stream::iter(to_download)
            .map(|listing| async move { (listing.id, self.source.fetch_detail(listing).await) })
            .buffer_unordered(self.config.workers())
            .collect()
            .await;

        let mut new = BTreeMap::new();
        for (id, result) in downloads {
            match result {
                Ok(tournament) => {
                    new.insert(id, tournament);
                }
                Err(e) => {
                    warn!(id, error = %e, "skipping tournament that could not be downloaded");
                    old.remove(&id);
                    report.failed.push(id);
                }
            }
        }
        report.failed.sort_unstable();

        report.changes = diff(&old, &new);
        self.persist(&mut report.changes).await
    }

    async fn with_teams(&self, mut tournament: TournamentDetail) -> Result<TournamentDetail, SyncError> {
        let id = tournament.id();
        tournament.teams = self
            .teams
            .by_tournament(id)
            .await
            .map_err(|source| SyncError::LoadTeams { id, source })?;
        Ok(tournament)
    }

    async fn persist(&self, changes: &mut ChangeSet) -> Result<(), SyncError> {
        let players: BTreeMap<u32, Player> = changes
            .teams
            .new
            .iter()
            .chain(&changes.teams.updated)
            .flat_map(|team| [&team.player1, &team.player2])
            .map(|player| (player.id, player.clone()))
            .collect();

        for player in players.into_values() {
            match self.players.get(player.id).await {
                Ok(_) => {}
                Err(StoreError::NotFound) => {
                    self.players
                        .create(&player)
                        .await
                        .map_err(persist_failed(PersistStage::Players))?;
                    changes.players.new.push(player);
                }
                Err(source) => return Err(persist_failed(PersistStage::Players)(source)),
            }
        }

        for tournament in &changes.tournaments.new {
            self.tournaments
                .create(tournament)
                .await
                .map_err(persist_failed(PersistStage::Tournaments))?;
        }
        for tournament in &changes.tournaments.updated {
            self.tournaments
                .update(tournament)
                .await
                .map_err(persist_failed(PersistStage::Tournaments))?;
        }

        for team in &changes.teams.new {
            self.teams
                .create(team)
                .await
                .map_err(persist_failed(PersistStage::Teams))?;
        }
        for team in &changes.teams.updated {
            self.teams
                .update(team)
                .await
                .map_err(persist_failed(PersistStage::Teams))?;
        }
        for team in &changes.teams.deleted {
            self.teams
                .delete(team)
                .await
                .map_err(persist_failed(PersistStage::Teams))?;
        }

        for tournament in &changes.tournaments.deleted {
            self.tournaments
                .delete(tournament.id())
                .await
                .map_err(persist_failed(PersistStage::DeletedTournaments))?;
        }

        info!(
            tournaments_new = changes.tournaments.new.len(),
            tournaments_updated = changes.tournaments.updated.len(),
            tournaments_deleted = changes.tournaments.deleted.len(),
            teams_new = changes.teams.new.len(),
            teams_updated = changes.teams.updated.len(),
            teams_deleted = changes.teams.deleted.len(),
            players_new = changes.players.new.len(),
            "persisted changes"
        );
        Ok(())
    }

    async fn sync_ladder(&self, gender: Gender, changes: &mut ChangeSet) -> Result<(), SyncError> {
        let ranked = self
            .source
            .fetch_ladder(gender)
            .await
            .map_err(SyncError::Ladder)?;
        debug!(count = ranked.len(), "downloaded ladder");

        let ranked = ranked
            .into_iter()
            .sorted_by_key(|p| p.id)
            .dedup_by(|a, b| a.id == b.id);

        for player in ranked {
            match self.players.get(player.id).await {
                Ok(persisted) => {
                    let merged = merge_player(&persisted, &player);
                    if merged != persisted {
                        self.players
                            .update(&merged)
                            .await
                            .map_err(persist_failed(PersistStage::Players))?;
                        changes.players.updated.push(merged);
                    }
                }
                Err(StoreError::NotFound) => {
                    self.players
                        .create(&player)
                        .await
                        .map_err(persist_failed(PersistStage::Players))?;
                    changes.players.new.push(player);
                }
                Err(source) => return Err(persist_failed(PersistStage::Players)(source)),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TournamentListing, TournamentStatus};
    use crate::sync::memory::{
        MemoryPlayerRepository, MemoryPublisher, MemoryTeamRepository, MemoryTournamentRepository,
    };
    use async_trait::async_trait;

    struct FailingListing;

    #[async_trait]
    impl TournamentSource for FailingListing {
        async fn list_tournaments(
            &self,
            _gender: Gender,
            _league: &str,
            _season: u16,
        ) -> crate::Result<Vec<TournamentListing>> {
            Err(VolleynetError::ElementNotFound {
                context: "tournament table",
            })
        }

        async fn fetch_detail(&self, listing: &TournamentListing) -> crate::Result<TournamentDetail> {
            Ok(TournamentDetail::new(listing.clone()))
        }

        async fn fetch_ladder(&self, _gender: Gender) -> crate::Result<Vec<Player>> {
            Ok(vec![])
        }
    }

    fn service(source: impl TournamentSource + 'static) -> (SyncService, MemoryPublisher) {
        let publisher = MemoryPublisher::new();
        let service = SyncService::new(
            Arc::new(source),
            Arc::new(MemoryTournamentRepository::new()),
            Arc::new(MemoryTeamRepository::new()),
            Arc::new(MemoryPlayerRepository::new()),
            Arc::new(publisher.clone()),
        );
        (service, publisher)
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_and_reports() {
        let (service, publisher) = service(FailingListing);

        let err = service
            .tournaments(Gender::Male, "AMATEUR TOUR", 2024)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Listing(_)));

        let events = publisher.events();
        assert_eq!(events.len(), 2);
        match &events[1] {
            SyncEvent::Finished(report) => assert!(!report.success),
            other => panic!("expected finished event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_listing_is_a_successful_noop() {
        struct Empty;

        #[async_trait]
        impl TournamentSource for Empty {
            async fn list_tournaments(
                &self,
                _gender: Gender,
                _league: &str,
                _season: u16,
            ) -> crate::Result<Vec<TournamentListing>> {
                Ok(vec![])
            }

            async fn fetch_detail(
                &self,
                listing: &TournamentListing,
            ) -> crate::Result<TournamentDetail> {
                let mut detail = TournamentDetail::new(listing.clone());
                detail.info.status = TournamentStatus::Done;
                Ok(detail)
            }

            async fn fetch_ladder(&self, _gender: Gender) -> crate::Result<Vec<Player>> {
                Ok(vec![])
            }
        }

        let (service, _) = service(Empty);
        let report = service
            .tournaments(Gender::Female, "AMATEUR TOUR", 2024)
            .await
            .unwrap();
        assert!(report.success);
        assert!(report.changes.is_empty());
        assert_eq!(report.kind, RunKind::Tournaments);
    }

    #[test]
    fn test_persist_stage_display() {
        let err = SyncError::Persist {
            stage: PersistStage::DeletedTournaments,
            source: StoreError::NotFound,
        };
        assert_eq!(
            err.to_string(),
            "persisting deleted tournaments failed: record not found"
        );
    }
}
