use ::scraper::{ElementRef, Selector};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::PlayerInfo;
use crate::volleynet::{self, cell_text, player_id, player_name, row_cells, urls};

const SEARCH_WRITE_CODE: (&str, &str) = ("XX_unique_write_XXAdmin/Search", "0.50981600 1525795371");

/// Search the federation's player registry. `birthday` is written `dd.mm.yyyy`.
#[instrument(skip(client, config))]
pub(crate) async fn search_players(
    client: &reqwest::Client,
    config: &ClientConfig,
    first_name: &str,
    last_name: &str,
    birthday: &str,
) -> Result<Vec<PlayerInfo>> {
    let url = urls::form(config);
    let form = [
        SEARCH_WRITE_CODE,
        ("popup", "1"),
        ("add", ""),
        ("target", "bte_per_id_b"),
        ("txm_language", "de"),
        ("sai_id", ""),
        ("action", "Admin/Search"),
        ("submit", "Suchen"),
        ("search", "Person"),
        ("per_name", last_name),
        ("per_vorname", first_name),
        ("per_geburtsdatum", birthday),
        ("doit", "1"),
        ("text", "0"),
    ];

    let response = volleynet::send(client.post(&url).form(&form), &url).await?;
    let response = volleynet::ensure_success(response, &url)?;
    let document = volleynet::read_document(response, &url).await?;

    let players = parse_players(&document)?;
    debug!(count = players.len(), "parsed player search");
    Ok(players)
}

/// Search result rows read: player, login, birthday.
pub(crate) fn parse_players(document: &volleynet::Html) -> Result<Vec<PlayerInfo>> {
    let row_selector = Selector::parse("tr")?;

    let mut players = vec![];
    for row in document.select(&row_selector) {
        match parse_player_row(&row) {
            Ok(Some(player)) => players.push(player),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "skipping unparsable search result"),
        }
    }
    Ok(players)
}

fn parse_player_row(row: &ElementRef) -> Result<Option<PlayerInfo>> {
    let [name, login, birthday, ..] = row_cells(row)[..] else {
        return Ok(None);
    };
    if name.value().name() == "th" {
        return Ok(None);
    }

    let (first_name, last_name) = player_name(&name);
    Ok(Some(PlayerInfo {
        id: player_id(&name)?,
        first_name,
        last_name,
        login: cell_text(&login),
        birthday: cell_text(&birthday),
    }))
}
