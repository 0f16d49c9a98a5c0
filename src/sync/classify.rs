use serde::Serialize;

use crate::model::{TournamentDetail, TournamentListing, TournamentStatus};

/// What a run has to do about one listed tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum SyncClassification {
    /// Not persisted yet.
    New,
    /// Persisted and no longer upcoming; nothing can change anymore.
    NoUpdate,
    UpcomingToCanceled,
    Upcoming,
    UpcomingToDone,
}

impl SyncClassification {
    /// Every classification except [`SyncClassification::NoUpdate`] needs the detail page.
    pub fn needs_download(self) -> bool {
        self != Self::NoUpdate
    }
}

pub fn classify(
    persisted: Option<&TournamentDetail>,
    listed: &TournamentListing,
) -> SyncClassification {
    let Some(persisted) = persisted else {
        return SyncClassification::New;
    };

    if persisted.status() != TournamentStatus::Upcoming {
        return SyncClassification::NoUpdate;
    }

    match listed.status {
        TournamentStatus::Canceled => SyncClassification::UpcomingToCanceled,
        TournamentStatus::Upcoming => SyncClassification::Upcoming,
        TournamentStatus::Done => SyncClassification::UpcomingToDone,
    }
}
