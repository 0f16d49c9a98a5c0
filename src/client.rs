use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::error::{Result, VolleynetError};
use crate::model::*;
use crate::session::Session;
use crate::sync::TournamentSource;
use crate::volleynet;

/// The main entry point for talking to volleynet.
///
/// `VolleynetClient` wraps a [`reqwest::Client`] and exposes methods to read
/// tournament lists, tournament details, the ranking ladder and the player
/// registry, plus the session based entry and withdrawal actions.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> volleynet_sync::Result<()> {
/// use volleynet_sync::{Gender, VolleynetClient};
///
/// let client = VolleynetClient::new();
/// let tournaments = client
///     .list_tournaments(Gender::Female, "AMATEUR TOUR", 2024)
///     .await?;
/// println!("Found {} tournaments", tournaments.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VolleynetClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl VolleynetClient {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            config: ClientConfig::default(),
        }
    }

    /// Create a client whose HTTP client applies the configured timeout and user agent.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(VolleynetError::ClientBuild)?;
        Ok(Self { http, config })
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http: client,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch all tournaments of a league season.
    #[instrument(skip(self))]
    pub async fn list_tournaments(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> Result<Vec<TournamentListing>> {
        volleynet::list::get_tournament_list(&self.http, &self.config, gender, league, season).await
    }

    /// Fetch the detail page of a listed tournament, teams included.
    #[instrument(skip(self, listing), fields(id = listing.id))]
    pub async fn fetch_detail(&self, listing: &TournamentListing) -> Result<TournamentDetail> {
        volleynet::tournament::get_tournament(&self.http, &self.config, listing).await
    }

    /// Fetch the ranking ladder; every player carries its rank.
    #[instrument(skip(self))]
    pub async fn fetch_ladder(&self, gender: Gender) -> Result<Vec<Player>> {
        volleynet::ladder::get_ladder(&self.http, &self.config, gender).await
    }

    /// Search registered players. `birthday` is written `dd.mm.yyyy`.
    #[instrument(skip(self))]
    pub async fn search_players(
        &self,
        first_name: &str,
        last_name: &str,
        birthday: &str,
    ) -> Result<Vec<PlayerInfo>> {
        volleynet::players::search_players(&self.http, &self.config, first_name, last_name, birthday)
            .await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        volleynet::auth::login(&self.http, &self.config, username, password).await
    }

    /// Enter a player into a tournament on behalf of the logged in account.
    #[instrument(skip(self, session))]
    pub async fn enter_tournament(
        &self,
        session: &Session,
        player_name: &str,
        player_id: u32,
        tournament_id: u32,
    ) -> Result<()> {
        volleynet::auth::enter_tournament(
            &self.http,
            &self.config,
            session,
            player_name,
            player_id,
            tournament_id,
        )
        .await
    }

    #[instrument(skip(self, session))]
    pub async fn withdraw_from_tournament(&self, session: &Session, tournament_id: u32) -> Result<()> {
        volleynet::auth::withdraw_from_tournament(&self.http, &self.config, session, tournament_id)
            .await
    }
}

impl Default for VolleynetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TournamentSource for VolleynetClient {
    async fn list_tournaments(
        &self,
        gender: Gender,
        league: &str,
        season: u16,
    ) -> Result<Vec<TournamentListing>> {
        VolleynetClient::list_tournaments(self, gender, league, season).await
    }

    async fn fetch_detail(&self, listing: &TournamentListing) -> Result<TournamentDetail> {
        VolleynetClient::fetch_detail(self, listing).await
    }

    async fn fetch_ladder(&self, gender: Gender) -> Result<Vec<Player>> {
        VolleynetClient::fetch_ladder(self, gender).await
    }
}
