use ::scraper::{ElementRef, Selector};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::{Gender, Player};
use crate::volleynet::{
    self, cell_text, find_int, non_empty, player_id, player_name, row_cells, urls,
};

#[instrument(skip(client, config))]
pub(crate) async fn get_ladder(
    client: &reqwest::Client,
    config: &ClientConfig,
    gender: Gender,
) -> Result<Vec<Player>> {
    let url = urls::ladder(config, gender);
    let document = volleynet::get_document(client, &url).await?;
    let players = parse_ladder(&document, gender)?;
    debug!(count = players.len(), "parsed ladder");
    Ok(players)
}

/// Ladder rows read: rank, player, club, country union, points.
pub(crate) fn parse_ladder(document: &volleynet::Html, gender: Gender) -> Result<Vec<Player>> {
    let row_selector = Selector::parse("tbody tr")?;
    let link_selector = Selector::parse("a[href]")?;

    let mut players = vec![];
    for row in document.select(&row_selector) {
        if row.select(&link_selector).next().is_none() {
            continue;
        }
        match parse_ladder_row(&row, gender) {
            Ok(Some(player)) => players.push(player),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "skipping unparsable ladder row"),
        }
    }
    Ok(players)
}

fn parse_ladder_row(row: &ElementRef, gender: Gender) -> Result<Option<Player>> {
    let [rank, name, club, country, points, ..] = row_cells(row)[..] else {
        return Ok(None);
    };

    let mut player = Player::new(player_id(&name)?, gender);
    (player.first_name, player.last_name) = player_name(&name);
    player.rank = find_int(&cell_text(&rank));
    player.club = non_empty(cell_text(&club));
    player.country_union = non_empty(cell_text(&country));
    player.total_points = find_int(&cell_text(&points));

    Ok(Some(player))
}
