use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// Competition gender, as used in volleynet URLs.
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
pub enum Gender {
    #[strum(serialize = "M")]
    #[serde(rename = "M")]
    Male,
    #[strum(serialize = "W")]
    #[serde(rename = "W")]
    Female,
}

impl Gender {
    /// Phase name of the ranking ladder for this gender.
    pub fn ladder_phase(self) -> &'static str {
        match self {
            Gender::Male => "Herren",
            Gender::Female => "Damen",
        }
    }
}

/// A registered volleynet player. The id is taken from the profile link and
/// is stable across tournaments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub license: Option<String>,
    pub country_union: Option<String>,
    pub club: Option<String>,
    pub total_points: Option<u32>,
    /// Ladder position, only known after a ladder download.
    pub rank: Option<u32>,
}

impl Player {
    pub fn new(id: u32, gender: Gender) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            gender,
            license: None,
            country_union: None,
            club: None,
            total_points: None,
            rank: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A hit from the player search form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub login: String,
    pub birthday: String,
}
