use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Result, VolleynetError};
use crate::model::{Gender, TournamentListing, TournamentStatus};
use crate::volleynet::{self, cell_text, last_int, parse_date_range, row_cells, urls};

#[instrument(skip(client, config))]
pub(crate) async fn get_tournament_list(
    client: &reqwest::Client,
    config: &ClientConfig,
    gender: Gender,
    league: &str,
    season: u16,
) -> Result<Vec<TournamentListing>> {
    let url = urls::tournament_list(config, gender, league, season);
    let document = volleynet::get_document(client, &url).await?;
    let tournaments = parse_tournament_list(&document, gender, league, season)?;
    debug!(count = tournaments.len(), "parsed tournament list");
    Ok(tournaments)
}

/// Every table row linking to a tournament page is one tournament. Rows that
/// cannot be read are skipped.
pub(crate) fn parse_tournament_list(
    document: &volleynet::Html,
    gender: Gender,
    league: &str,
    season: u16,
) -> Result<Vec<TournamentListing>> {
    let row_selector = Selector::parse("tbody tr")?;
    let link_selector = Selector::parse("a[href*='/cup/']")?;

    let mut tournaments = vec![];
    for row in document.select(&row_selector) {
        let Some(link) = row.select(&link_selector).next() else {
            continue;
        };
        match parse_listing_row(&row, &link, gender, league, season) {
            Ok(listing) => tournaments.push(listing),
            Err(e) => warn!(error = %e, "skipping unparsable tournament row"),
        }
    }
    Ok(tournaments)
}

fn parse_listing_row(
    row: &ElementRef,
    link: &ElementRef,
    gender: Gender,
    league: &str,
    season: u16,
) -> Result<TournamentListing> {
    let id = link
        .value()
        .attr("href")
        .and_then(last_int)
        .ok_or(VolleynetError::ElementNotFound {
            context: "tournament id in link",
        })?;

    let dates = row_cells(row)
        .first()
        .map(cell_text)
        .and_then(|text| parse_date_range(&text).ok());

    Ok(TournamentListing {
        id,
        name: cell_text(link),
        gender,
        league: league.to_string(),
        season,
        status: row_status(row, link),
        start: dates.map(|(start, _)| start),
        end: dates.map(|(_, end)| end),
    })
}

/// Canceled tournaments are marked "abgesagt", finished ones link their results.
/// Only the cells after the date that do not hold the tournament link are read,
/// so a tournament name never decides the status.
fn row_status(row: &ElementRef, link: &ElementRef) -> TournamentStatus {
    let text = row_cells(row)
        .iter()
        .skip(1)
        .filter(|cell| !link.ancestors().any(|node| node.id() == cell.id()))
        .map(|cell| cell_text(cell).to_lowercase())
        .join(" ");

    if text.contains("abgesagt") {
        TournamentStatus::Canceled
    } else if text.contains("ergebnis") {
        TournamentStatus::Done
    } else {
        TournamentStatus::Upcoming
    }
}
