use crate::config::ClientConfig;
use crate::model::{Gender, TournamentListing};

const FORM_PATH: &str = "/Admin/formular";

fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn cup_path(listing: &TournamentListing) -> String {
    let league = escape(&listing.league);
    format!(
        "/beach/bewerbe/{league}/phase/{league}/sex/{}/saison/{}/cup/{}",
        listing.gender, listing.season, listing.id
    )
}

/// Season overview of one league.
pub(crate) fn tournament_list(config: &ClientConfig, gender: Gender, league: &str, season: u16) -> String {
    let league = escape(league);
    format!(
        "{}/api/beach/bewerbe/{league}/phase/{league}/sex/{gender}/saison/{season}/information/all",
        config.get_url
    )
}

/// Machine-facing detail page that gets downloaded and parsed.
pub(crate) fn tournament_api(config: &ClientConfig, listing: &TournamentListing) -> String {
    format!("{}/api{}", config.get_url, cup_path(listing))
}

/// Public page of a tournament, stored as the tournament's link.
pub(crate) fn tournament_link(config: &ClientConfig, listing: &TournamentListing) -> String {
    format!("{}{}", config.get_url, cup_path(listing))
}

/// Entry screen of a tournament; also the page holding the entry form's write code.
pub(crate) fn entry_screen(config: &ClientConfig, tournament_id: u32) -> String {
    format!(
        "{}/Admin/index.php?screen=Beach/Profile/TurnierAnmeldung&parent=0&prev=0&next=0&cur={tournament_id}",
        config.post_url
    )
}

pub(crate) fn ladder(config: &ClientConfig, gender: Gender) -> String {
    format!(
        "{}/api/beach/bewerbe/Rangliste/phase/{}",
        config.get_url,
        gender.ladder_phase()
    )
}

pub(crate) fn form(config: &ClientConfig) -> String {
    format!("{}{FORM_PATH}", config.post_url)
}

pub(crate) fn withdrawal(config: &ClientConfig, tournament_id: u32) -> String {
    format!("{}/Abmelden/0-{tournament_id}-00-0", config.post_url)
}
