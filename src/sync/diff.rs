use std::collections::BTreeMap;

use itertools::{EitherOrBoth, Itertools};
use serde::Serialize;

use crate::model::{Player, TournamentDetail, TournamentTeam};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TournamentChanges {
    pub new: Vec<TournamentDetail>,
    pub updated: Vec<TournamentDetail>,
    pub deleted: Vec<TournamentDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamChanges {
    pub new: Vec<TournamentTeam>,
    pub updated: Vec<TournamentTeam>,
    pub deleted: Vec<TournamentTeam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerChanges {
    pub new: Vec<Player>,
    pub updated: Vec<Player>,
}

/// Everything a run writes, each list ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub tournaments: TournamentChanges,
    pub teams: TeamChanges,
    pub players: PlayerChanges,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.tournaments.new.is_empty()
            && self.tournaments.updated.is_empty()
            && self.tournaments.deleted.is_empty()
            && self.teams.new.is_empty()
            && self.teams.updated.is_empty()
            && self.teams.deleted.is_empty()
            && self.players.new.is_empty()
            && self.players.updated.is_empty()
    }
}

/// Compare the persisted snapshot with freshly downloaded tournaments.
///
/// Tournaments only in `old` are deleted along with their teams, tournaments
/// only in `new` are created along with theirs. Tournaments in both are merged
/// and reported as updated when anything but `updated_at` differs; their teams
/// are compared the same way, keyed by player pair.
pub fn diff(
    old: &BTreeMap<u32, TournamentDetail>,
    new: &BTreeMap<u32, TournamentDetail>,
) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for entry in old.iter().merge_join_by(new.iter(), |(a, _), (b, _)| a.cmp(b)) {
        match entry {
            EitherOrBoth::Left((_, old)) => {
                changes.teams.deleted.extend(sorted_teams(&old.teams));
                changes.tournaments.deleted.push(old.clone());
            }
            EitherOrBoth::Right((_, new)) => {
                changes.teams.new.extend(sorted_teams(&new.teams));
                changes.tournaments.new.push(new.clone());
            }
            EitherOrBoth::Both((_, old), (_, new)) => {
                diff_teams(&old.teams, &new.teams, &mut changes.teams);

                let merged = merge_tournament(old, new);
                if comparable_tournament(old) != comparable_tournament(&merged) {
                    changes.tournaments.updated.push(merged);
                }
            }
        }
    }

    changes
}

fn diff_teams(old: &[TournamentTeam], new: &[TournamentTeam], changes: &mut TeamChanges) {
    let old = sorted_teams(old);
    let new = sorted_teams(new);

    for entry in old.iter().merge_join_by(new.iter(), |a, b| a.key().cmp(&b.key())) {
        match entry {
            EitherOrBoth::Left(old) => changes.deleted.push(old.clone()),
            EitherOrBoth::Right(new) => changes.new.push(new.clone()),
            EitherOrBoth::Both(old, new) => {
                let merged = merge_team(old, new);
                if comparable_team(old) != comparable_team(&merged) {
                    changes.updated.push(merged);
                }
            }
        }
    }
}

/// Normalized player order, sorted by key, duplicates dropped.
fn sorted_teams(teams: &[TournamentTeam]) -> Vec<TournamentTeam> {
    teams
        .iter()
        .cloned()
        .map(TournamentTeam::normalized)
        .sorted_by_key(TournamentTeam::key)
        .dedup_by(|a, b| a.key() == b.key())
        .collect()
}

/// New content with the persisted record's store timestamps.
pub fn merge_tournament(old: &TournamentDetail, new: &TournamentDetail) -> TournamentDetail {
    TournamentDetail {
        created_at: old.created_at,
        updated_at: old.updated_at,
        ..new.clone()
    }
}

pub fn merge_team(old: &TournamentTeam, new: &TournamentTeam) -> TournamentTeam {
    TournamentTeam {
        created_at: old.created_at,
        updated_at: old.updated_at,
        ..new.clone()
    }
}

/// Ladder and team pages each show only part of a player; fields a page
/// leaves out keep the persisted value.
pub fn merge_player(old: &Player, new: &Player) -> Player {
    let or_old = |fresh: &String, kept: &String| {
        if fresh.is_empty() {
            kept.clone()
        } else {
            fresh.clone()
        }
    };

    Player {
        id: new.id,
        first_name: or_old(&new.first_name, &old.first_name),
        last_name: or_old(&new.last_name, &old.last_name),
        gender: new.gender,
        license: new.license.clone().or_else(|| old.license.clone()),
        country_union: new.country_union.clone().or_else(|| old.country_union.clone()),
        club: new.club.clone().or_else(|| old.club.clone()),
        total_points: new.total_points.or(old.total_points),
        rank: new.rank.or(old.rank),
    }
}

fn comparable_tournament(tournament: &TournamentDetail) -> TournamentDetail {
    TournamentDetail {
        updated_at: None,
        teams: sorted_teams(&tournament.teams)
            .iter()
            .map(comparable_team)
            .collect(),
        ..tournament.clone()
    }
}

/// Persisted teams carry store timestamps, downloaded ones never do.
fn comparable_team(team: &TournamentTeam) -> TournamentTeam {
    TournamentTeam {
        created_at: None,
        updated_at: None,
        ..team.clone().normalized()
    }
}
