use ::scraper::Selector;
use reqwest::header::{COOKIE, SET_COOKIE};
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Result, VolleynetError};
use crate::session::{LoginData, Session};
use crate::volleynet::{self, cell_text, last_int, urls};

const WRITE_CODE_FIELD: &str = "XX_unique_write_XXBeach/Profile/TurnierAnmeldung";
const ENTRY_SUCCESS_FIELD: &str = "XX_unique_write_XXBeach/Profile/TurnierAnmeldungErfolgreich";

/// Log in with volleynet credentials and keep the session cookie.
#[instrument(skip(client, config, password))]
pub(crate) async fn login(
    client: &reqwest::Client,
    config: &ClientConfig,
    username: &str,
    password: &str,
) -> Result<Session> {
    let url = urls::form(config);
    let form = [
        ("login_name", username),
        ("login_pass", password),
        ("action", "Beach/Profile/ProfileLogin"),
        ("submit", "OK"),
        ("mode", "X"),
    ];

    let response = volleynet::send(client.post(&url).form(&form), &url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(VolleynetError::Auth(format!("login status: {status}")));
    }

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| VolleynetError::Auth("login response without session cookie".to_string()))?;

    let document = volleynet::read_document(response, &url).await?;
    let login = parse_login(&document)?;

    info!(id = login.id, "logged in");
    Ok(Session::new(&cookie, login))
}

/// The page after a successful login links the player's own profile.
pub(crate) fn parse_login(document: &volleynet::Html) -> Result<LoginData> {
    let link_selector = Selector::parse("a[href]")?;

    document
        .select(&link_selector)
        .find_map(|link| {
            let href = link.value().attr("href")?;
            if !href.to_lowercase().contains("steckbrief") {
                return None;
            }
            Some(LoginData {
                id: last_int(href)?,
                name: cell_text(&link),
            })
        })
        .ok_or_else(|| VolleynetError::Auth("could not read login response".to_string()))
}

/// Enter the player into a tournament. Needs a session; the entry form is
/// guarded by a one-time write code read from the tournament's entry screen.
#[instrument(skip(client, config, session))]
pub(crate) async fn enter_tournament(
    client: &reqwest::Client,
    config: &ClientConfig,
    session: &Session,
    player_name: &str,
    player_id: u32,
    tournament_id: u32,
) -> Result<()> {
    let cookie = session.require_cookie()?;

    let code = {
        let url = urls::entry_screen(config, tournament_id);
        let response = volleynet::send(client.get(&url).header(COOKIE, cookie), &url).await?;
        let response = volleynet::ensure_success(response, &url)?;
        let document = volleynet::read_document(response, &url).await?;
        parse_write_code(&document)?
    };
    debug!(tournament_id, "loaded entry write code");

    let url = urls::form(config);
    let tournament = tournament_id.to_string();
    let player = player_id.to_string();
    let form = [
        ("action", "Beach/Profile/TurnierAnmeldung"),
        (WRITE_CODE_FIELD, code.as_str()),
        ("parent", "0"),
        ("prev", "0"),
        ("next", "0"),
        ("cur", tournament.as_str()),
        ("name_b", player_name),
        ("bte_per_id_b", player.as_str()),
        ("submit", "Anmelden"),
    ];

    let response =
        volleynet::send(client.post(&url).header(COOKIE, cookie).form(&form), &url).await?;
    let response = volleynet::ensure_success(response, &url)?;
    let accepted = {
        let document = volleynet::read_document(response, &url).await?;
        entry_accepted(&document)?
    };

    if !accepted {
        return Err(VolleynetError::EntryRejected { tournament_id });
    }
    info!(tournament_id, player_id, "entered tournament");
    Ok(())
}

/// Withdraw the session's player from a tournament. Only the status code
/// tells whether it worked.
#[instrument(skip(client, config, session))]
pub(crate) async fn withdraw_from_tournament(
    client: &reqwest::Client,
    config: &ClientConfig,
    session: &Session,
    tournament_id: u32,
) -> Result<()> {
    let cookie = session.require_cookie()?;
    let url = urls::withdrawal(config, tournament_id);

    let response = volleynet::send(client.get(&url).header(COOKIE, cookie), &url).await?;
    volleynet::ensure_success(response, &url)?;

    info!(tournament_id, "withdrew from tournament");
    Ok(())
}

pub(crate) fn parse_write_code(document: &volleynet::Html) -> Result<String> {
    let selector = Selector::parse(&format!("input[name='{WRITE_CODE_FIELD}']"))?;
    document
        .select(&selector)
        .find_map(|input| input.value().attr("value"))
        .map(str::to_owned)
        .ok_or(VolleynetError::ElementNotFound {
            context: "entry form write code",
        })
}

pub(crate) fn entry_accepted(document: &volleynet::Html) -> Result<bool> {
    let selector = Selector::parse(&format!("[name='{ENTRY_SUCCESS_FIELD}']"))?;
    Ok(document.select(&selector).next().is_some())
}
