pub(crate) mod auth;
pub(crate) mod ladder;
pub(crate) mod list;
pub(crate) mod players;
pub(crate) mod row;
pub(crate) mod tournament;
pub(crate) mod urls;

pub(crate) use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, VolleynetError};

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Fetch a URL and parse the response body as an HTML document.
pub(crate) async fn get_document(client: &reqwest::Client, url: &str) -> Result<Html> {
    debug!(url, "fetching page");
    let response = send(client.get(url), url).await?;
    let response = ensure_success(response, url)?;
    read_document(response, url).await
}

/// Send a prepared request, mapping transport failures to [`VolleynetError::Http`].
pub(crate) async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
    request.send().await.map_err(|e| VolleynetError::Http {
        url: url.to_owned(),
        source: e,
    })
}

pub(crate) fn ensure_success(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(VolleynetError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }
    Ok(response)
}

pub(crate) async fn read_document(response: reqwest::Response, url: &str) -> Result<Html> {
    let body = response.text().await.map_err(|e| VolleynetError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })?;

    Ok(Html::parse_document(&body))
}

/// All text below `element` with runs of whitespace collapsed to one space.
pub(crate) fn cell_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `td`/`th` children of a table row, in document order.
pub(crate) fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect()
}

/// The `tr` children of a `tbody`, skipping rows of nested tables.
pub(crate) fn table_rows<'a>(tbody: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    tbody
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr")
        .collect()
}

/// Text of the first cell of `row`, if the row has cells.
pub(crate) fn first_cell_text(row: &ElementRef) -> Option<String> {
    row_cells(row).first().map(cell_text)
}

/// The first run of digits in `text`, e.g. `"max. 24 Teams"` -> `24`.
pub(crate) fn find_int(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// The last run of digits in `text`; profile and tournament links end with the id.
pub(crate) fn last_int(text: &str) -> Option<u32> {
    text.rsplit(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Parse a money amount. A comma marks the German form (`1.500,50`); without
/// one, dots followed by groups of exactly three digits separate thousands
/// (`1.500`, `1.500.000`) and any other dot is the decimal point (`150.25`).
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_thousands_groups(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };
    normalized.parse().ok()
}

fn has_thousands_groups(number: &str) -> bool {
    let mut groups = number.split('.');
    let lead = groups.next().unwrap_or_default();
    number.contains('.') && (1..=3).contains(&lead.len()) && groups.all(|g| g.len() == 3)
}

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)?)
}

/// Parse `"01.06.2024 - 02.06.2024"` or a single-day `"01.06.2024"`.
pub(crate) fn parse_date_range(text: &str) -> Result<(NaiveDate, NaiveDate)> {
    match text.split_once('-') {
        Some((start, end)) => Ok((parse_date(start)?, parse_date(end)?)),
        None => {
            let day = parse_date(text)?;
            Ok((day, day))
        }
    }
}

/// Read the player id from the profile link inside `cell`.
pub(crate) fn player_id(cell: &ElementRef) -> Result<u32> {
    let link_selector = Selector::parse("a[href]")?;
    cell.select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .find_map(last_int)
        .ok_or(VolleynetError::MissingPlayerId)
}

/// Split a displayed player name. Volleynet renders `"Lastname Firstname"`.
pub(crate) fn player_name(cell: &ElementRef) -> (String, String) {
    let text = cell_text(cell);
    match text.split_once(' ') {
        Some((last, first)) => (first.to_string(), last.to_string()),
        None => (String::new(), text),
    }
}

/// `None` for cells that only contain whitespace.
pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Lowercase, dash separated key for a display name, e.g. `"Amateur Tour 1"` -> `"amateur-tour-1"`.
pub(crate) fn sluggify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
