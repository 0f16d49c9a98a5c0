//! In-memory stores. They stamp `created_at` / `updated_at` the way a
//! database would, so a run against them behaves like one against real storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{Gender, Player, TeamKey, TournamentDetail, TournamentStatus, TournamentTeam};
use crate::sync::report::SyncEvent;
use crate::sync::repository::{
    EventPublisher, PlayerRepository, StoreError, StoreResult, TeamRepository,
    TournamentRepository,
};

#[derive(Debug, Default, Clone)]
pub struct MemoryTournamentRepository {
    tournaments: Arc<RwLock<BTreeMap<u32, TournamentDetail>>>,
}

impl MemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored tournaments, ordered by id.
    pub async fn all(&self) -> Vec<TournamentDetail> {
        self.tournaments.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TournamentRepository for MemoryTournamentRepository {
    async fn get(&self, id: u32) -> StoreResult<TournamentDetail> {
        self.tournaments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn upcoming(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> StoreResult<Vec<TournamentDetail>> {
        let tournaments = self.tournaments.read().await;
        Ok(tournaments
            .values()
            .filter(|t| {
                t.status() == TournamentStatus::Upcoming
                    && t.info.gender == gender
                    && t.info.league == league
                    && t.info.season == season
            })
            .cloned()
            .collect())
    }

    async fn create(&self, tournament: &TournamentDetail) -> StoreResult<TournamentDetail> {
        let mut tournaments = self.tournaments.write().await;
        let now = Utc::now();
        let created_at = tournaments
            .get(&tournament.id())
            .and_then(|t| t.created_at)
            .unwrap_or(now);

        let stored = TournamentDetail {
            teams: vec![],
            created_at: Some(created_at),
            updated_at: Some(now),
            ..tournament.clone()
        };
        tournaments.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, tournament: &TournamentDetail) -> StoreResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&tournament.id())
            .ok_or(StoreError::NotFound)?;

        *stored = TournamentDetail {
            teams: vec![],
            created_at: stored.created_at,
            updated_at: Some(Utc::now()),
            ..tournament.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: u32) -> StoreResult<()> {
        self.tournaments.write().await.remove(&id);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTeamRepository {
    teams: Arc<RwLock<BTreeMap<(u32, TeamKey), TournamentTeam>>>,
}

impl MemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored teams, ordered by tournament and player pair.
    pub async fn all(&self) -> Vec<TournamentTeam> {
        self.teams.read().await.values().cloned().collect()
    }
}

fn team_id(team: &TournamentTeam) -> (u32, TeamKey) {
    (team.tournament_id, team.key())
}

#[async_trait]
impl TeamRepository for MemoryTeamRepository {
    async fn by_tournament(&self, tournament_id: u32) -> StoreResult<Vec<TournamentTeam>> {
        let teams = self.teams.read().await;
        Ok(teams
            .range((tournament_id, (0, 0))..=(tournament_id, (u32::MAX, u32::MAX)))
            .map(|(_, team)| team.clone())
            .collect())
    }

    async fn create(&self, team: &TournamentTeam) -> StoreResult<TournamentTeam> {
        let mut teams = self.teams.write().await;
        let now = Utc::now();
        let created_at = teams
            .get(&team_id(team))
            .and_then(|t| t.created_at)
            .unwrap_or(now);

        let stored = TournamentTeam {
            created_at: Some(created_at),
            updated_at: Some(now),
            ..team.clone().normalized()
        };
        teams.insert(team_id(&stored), stored.clone());
        Ok(stored)
    }

    async fn update(&self, team: &TournamentTeam) -> StoreResult<()> {
        let mut teams = self.teams.write().await;
        let stored = teams.get_mut(&team_id(team)).ok_or(StoreError::NotFound)?;

        *stored = TournamentTeam {
            created_at: stored.created_at,
            updated_at: Some(Utc::now()),
            ..team.clone().normalized()
        };
        Ok(())
    }

    async fn delete(&self, team: &TournamentTeam) -> StoreResult<()> {
        self.teams.write().await.remove(&team_id(team));
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPlayerRepository {
    players: Arc<RwLock<BTreeMap<u32, Player>>>,
}

impl MemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Player> {
        self.players.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PlayerRepository for MemoryPlayerRepository {
    async fn get(&self, id: u32) -> StoreResult<Player> {
        self.players
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, player: &Player) -> StoreResult<Player> {
        self.players.write().await.insert(player.id, player.clone());
        Ok(player.clone())
    }

    async fn update(&self, player: &Player) -> StoreResult<()> {
        let mut players = self.players.write().await;
        let stored = players.get_mut(&player.id).ok_or(StoreError::NotFound)?;
        *stored = player.clone();
        Ok(())
    }
}

/// Keeps every published event for later inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryPublisher {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, event: &SyncEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
