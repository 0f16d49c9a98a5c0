use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use super::player::{Gender, Player};

/// Lifecycle state of a tournament as published by volleynet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Done,
    Canceled,
}

/// A tournament as it appears on the season overview page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentListing {
    pub id: u32,
    pub name: String,
    pub gender: Gender,
    pub league: String,
    pub season: u16,
    pub status: TournamentStatus,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Full tournament record, built from a listing plus its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentDetail {
    pub info: TournamentListing,
    pub link: String,
    pub entry_link: String,
    pub sub_league: String,
    pub sub_league_key: String,
    pub mode: String,
    pub max_teams: Option<u32>,
    pub min_teams: Option<u32>,
    pub location: String,
    pub max_points: Option<u32>,
    pub organiser: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub current_points: String,
    pub end_registration: Option<NaiveDate>,
    pub html_notes: String,
    pub signedup_teams: u32,
    pub teams: Vec<TournamentTeam>,
    /// Set by the store on first write.
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl TournamentDetail {
    /// An empty detail record for `info`; the parser fills in the rest.
    pub fn new(info: TournamentListing) -> Self {
        Self {
            info,
            link: String::new(),
            entry_link: String::new(),
            sub_league: String::new(),
            sub_league_key: String::new(),
            mode: String::new(),
            max_teams: None,
            min_teams: None,
            location: String::new(),
            max_points: None,
            organiser: String::new(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            current_points: String::new(),
            end_registration: None,
            html_notes: String::new(),
            signedup_teams: 0,
            teams: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.info.id
    }

    pub fn status(&self) -> TournamentStatus {
        self.info.status
    }
}

/// Identity of a team within a tournament: both player ids, lower id first.
pub type TeamKey = (u32, u32);

/// A team of two players registered for a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentTeam {
    pub tournament_id: u32,
    pub player1: Player,
    pub player2: Player,
    pub seed: Option<u32>,
    pub result: Option<u32>,
    pub won_points: Option<u32>,
    pub total_points: Option<u32>,
    pub prize_money: Option<f64>,
    pub deregistered: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TournamentTeam {
    /// Order-independent key, so a team matches itself whichever player was parsed first.
    pub fn key(&self) -> TeamKey {
        let (a, b) = (self.player1.id, self.player2.id);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// The same team with the lower player id as player 1.
    pub fn normalized(mut self) -> Self {
        if self.player1.id > self.player2.id {
            std::mem::swap(&mut self.player1, &mut self.player2);
        }
        self
    }
}
