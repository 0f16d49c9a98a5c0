use async_trait::async_trait;

use crate::model::{Gender, Player, TournamentDetail, TournamentListing, TournamentTeam};
use crate::sync::report::SyncEvent;

/// Errors returned by the stores a sync run reads from and writes to.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The record does not exist. For lookups during a run this simply means "new".
    #[error("record not found")]
    NotFound,

    #[error("store backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where tournaments, their details and the ladder come from.
///
/// [`crate::VolleynetClient`] is the production implementation.
#[async_trait]
pub trait TournamentSource: Send + Sync {
    async fn list_tournaments(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> crate::Result<Vec<TournamentListing>>;

    async fn fetch_detail(&self, listing: &TournamentListing) -> crate::Result<TournamentDetail>;

    async fn fetch_ladder(&self, gender: Gender) -> crate::Result<Vec<Player>>;
}

/// Persisted tournaments. Stored records carry no teams; those live in the
/// [`TeamRepository`].
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Fails with [`StoreError::NotFound`] for unknown ids.
    async fn get(&self, id: u32) -> StoreResult<TournamentDetail>;

    /// All persisted upcoming tournaments of one league season.
    async fn upcoming(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> StoreResult<Vec<TournamentDetail>>;

    /// Returns the stored record, timestamps set.
    async fn create(&self, tournament: &TournamentDetail) -> StoreResult<TournamentDetail>;

    async fn update(&self, tournament: &TournamentDetail) -> StoreResult<()>;

    async fn delete(&self, id: u32) -> StoreResult<()>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn by_tournament(&self, tournament_id: u32) -> StoreResult<Vec<TournamentTeam>>;

    async fn create(&self, team: &TournamentTeam) -> StoreResult<TournamentTeam>;

    async fn update(&self, team: &TournamentTeam) -> StoreResult<()>;

    async fn delete(&self, team: &TournamentTeam) -> StoreResult<()>;
}

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Fails with [`StoreError::NotFound`] for unknown ids.
    async fn get(&self, id: u32) -> StoreResult<Player>;

    async fn create(&self, player: &Player) -> StoreResult<Player>;

    async fn update(&self, player: &Player) -> StoreResult<()>;
}

/// Receives run events. Publishing never fails a run, so implementations
/// swallow their own errors.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &SyncEvent);
}
