use ::scraper::{ElementRef, Selector};
use chrono::{Days, Local, NaiveDate};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::{TournamentDetail, TournamentListing, TournamentStatus, TournamentTeam};
use crate::volleynet::row::{extract_row, RowFragment};
use crate::volleynet::{
    self, cell_text, find_int, first_cell_text, parse_date, parse_date_range, row_cells,
    sluggify, table_rows, urls,
};

/// Shown instead of notes that embed frames; their content is not ours to render.
pub(crate) const NOTES_PLACEHOLDER: &str = "Cannot display these notes yet.";

/// Days after the end of a tournament without results before it counts as done.
const DONE_GRACE_DAYS: u64 = 7;

/// Header of the first column of every team table.
const TEAM_TABLE_HEADER: &str = "Nr.";

#[instrument(skip(client, config), fields(id = listing.id))]
pub(crate) async fn get_tournament(
    client: &reqwest::Client,
    config: &ClientConfig,
    listing: &TournamentListing,
) -> Result<TournamentDetail> {
    let url = urls::tournament_api(config, listing);
    let document = volleynet::get_document(client, &url).await?;
    let mut tournament = parse_tournament(&document, listing, Local::now().date_naive())?;

    tournament.link = urls::tournament_link(config, listing);
    tournament.entry_link = urls::entry_screen(config, listing.id);

    debug!(
        id = listing.id,
        teams = tournament.teams.len(),
        status = %tournament.status(),
        "parsed tournament"
    );
    Ok(tournament)
}

/// Complete `listing` with everything its detail page offers.
///
/// `today` is the date the page was fetched; it decides whether an upcoming
/// tournament without results has silently ended.
pub(crate) fn parse_tournament(
    document: &volleynet::Html,
    listing: &TournamentListing,
    today: NaiveDate,
) -> Result<TournamentDetail> {
    let mut tournament = TournamentDetail::new(listing.clone());

    parse_notes(document, &mut tournament)?;
    parse_details(document, &mut tournament)?;
    parse_teams(document, &mut tournament)?;

    if is_done(&tournament, today) {
        tournament.info.status = TournamentStatus::Done;
    }

    Ok(tournament)
}

/// Whether an upcoming tournament is over: either results are in, or the
/// end date plus the grace period lies strictly before `today`.
pub(crate) fn is_done(tournament: &TournamentDetail, today: NaiveDate) -> bool {
    if tournament.status() != TournamentStatus::Upcoming {
        return false;
    }

    if tournament
        .teams
        .first()
        .and_then(|t| t.result)
        .is_some_and(|r| r > 0)
    {
        return true;
    }

    tournament
        .info
        .end
        .and_then(|end| end.checked_add_days(Days::new(DONE_GRACE_DAYS)))
        .is_some_and(|deadline| today > deadline)
}

fn parse_notes(document: &volleynet::Html, tournament: &mut TournamentDetail) -> Result<()> {
    let notes_selector = Selector::parse(".extrainfo")?;
    let frame_selector = Selector::parse("iframe")?;

    let Some(notes) = document.select(&notes_selector).next() else {
        return Ok(());
    };

    tournament.html_notes = if notes.select(&frame_selector).next().is_some() {
        NOTES_PLACEHOLDER.to_string()
    } else {
        notes.inner_html()
    };
    Ok(())
}

type DetailParser = fn(ElementRef<'_>, &mut TournamentDetail);

/// Which field a label of the details table fills in. Labels not listed here
/// are informational and ignored.
fn detail_parser(label: &str) -> Option<DetailParser> {
    let parser: DetailParser = match label.trim().trim_end_matches(':') {
        "Kategorie" => |value, t| {
            t.sub_league = cell_text(&value);
            t.sub_league_key = sluggify(&t.sub_league);
        },
        "Modus" => |value, t| {
            t.mode = cell_text(&value);
            t.max_teams = find_int(&t.mode);
        },
        "Teiln. Qual." => |value, t| {
            t.min_teams = find_int(&cell_text(&value));
        },
        "Datum" => |value, t| match parse_date_range(&cell_text(&value)) {
            Ok((start, end)) => {
                t.info.start = Some(start);
                t.info.end = Some(end);
            }
            Err(e) => warn!(id = t.info.id, error = %e, "could not parse tournament dates"),
        },
        "Ort" => |value, t| {
            t.location = value.inner_html().trim().to_string();
        },
        "Max. Punkte" => |value, t| {
            t.max_points = find_int(&cell_text(&value));
        },
        "Veranstalter" => |value, t| {
            t.organiser = cell_text(&value);
        },
        "Telefon" => |value, t| {
            t.phone = cell_text(&value);
        },
        "EMail" => |value, t| {
            t.email = cell_text(&value);
        },
        "Web" => |value, t| {
            t.website = cell_text(&value);
        },
        "Vorläufige Punkte" => |value, t| {
            t.current_points = cell_text(&value);
        },
        "Nennschluss" => |value, t| {
            t.end_registration = parse_date(&cell_text(&value)).ok();
        },
        _ => return None,
    };
    Some(parser)
}

fn parse_details(document: &volleynet::Html, tournament: &mut TournamentDetail) -> Result<()> {
    let table_selector = Selector::parse("tbody")?;

    for table in document.select(&table_selector) {
        let rows = table_rows(&table);

        let is_details_table = rows
            .first()
            .and_then(first_cell_text)
            .is_some_and(|label| detail_parser(&label).is_some());
        if !is_details_table {
            continue;
        }

        for row in &rows {
            if let [label, value, ..] = row_cells(row)[..] {
                if let Some(parser) = detail_parser(&cell_text(&label)) {
                    parser(value, tournament);
                }
            }
        }
    }

    Ok(())
}

fn parse_teams(document: &volleynet::Html, tournament: &mut TournamentDetail) -> Result<()> {
    let table_selector = Selector::parse("tbody")?;
    let id = tournament.id();
    let gender = tournament.info.gender;

    for table in document.select(&table_selector) {
        let rows = table_rows(&table);
        let Some((header, body)) = rows.split_first() else {
            continue;
        };
        if first_cell_text(header).as_deref() != Some(TEAM_TABLE_HEADER) {
            continue;
        }

        // Every team spans two consecutive rows, player 1 then player 2. A row
        // that fails to extract, unknown layout included, drops only its pair.
        // Pairing is positional: a lone row in the middle of the table (a
        // walkover or a single separator row) shifts every later pair by one.
        // Only a lone trailing row is recognised as such.
        for pair in body.chunks(2) {
            let [first, second] = pair else {
                warn!(id, "skipping team with a single row");
                continue;
            };

            let team = match (extract_row(first, gender), extract_row(second, gender)) {
                (Ok(a), Ok(b)) => build_team(id, a, b),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(id, error = %e, "skipping unparsable team");
                    continue;
                }
            };

            if !team.deregistered {
                tournament.signedup_teams += 1;
            }
            tournament.teams.push(team);
        }
    }

    Ok(())
}

/// Team values come from player 1's row; player 2's row only fills gaps.
fn build_team(tournament_id: u32, first: RowFragment, second: RowFragment) -> TournamentTeam {
    TournamentTeam {
        tournament_id,
        seed: first.seed.or(second.seed),
        result: first.result.or(second.result),
        won_points: first.won_points.or(second.won_points),
        total_points: first.total_points.or(second.total_points),
        prize_money: first.prize_money.or(second.prize_money),
        deregistered: first.deregistered.or(second.deregistered).unwrap_or(false),
        player1: first.player,
        player2: second.player,
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;

    fn listing() -> TournamentListing {
        TournamentListing {
            id: 100,
            name: "Amateur Tour Baden".to_string(),
            gender: Gender::Male,
            league: "AMATEUR TOUR".to_string(),
            season: 2024,
            status: TournamentStatus::Upcoming,
            start: NaiveDate::from_ymd_opt(2024, 6, 1),
            end: NaiveDate::from_ymd_opt(2024, 6, 2),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn player_row(id: u32, name: &str) -> String {
        format!(
            r#"<tr><td>{id}</td><td><a href="/beach/spieler/steckbrief/{id}">{name}</a></td><td>A-{id}</td><td>WBV</td><td>50</td><td>100</td><td><a href="/Abmelden">abmelden</a></td></tr>"#
        )
    }

    fn page(teams: &str) -> String {
        format!(
            r#"<html><body>
<table><tbody>
<tr><td>Kategorie</td><td>Amateur Tour 1</td></tr>
<tr><td>Modus</td><td>Double Elimination, max. 16 Teams</td></tr>
<tr><td>Teiln. Qual.</td><td>8</td></tr>
<tr><td>Datum</td><td>01.06.2024 - 02.06.2024</td></tr>
<tr><td>Ort</td><td>Strandbad <b>Baden</b></td></tr>
<tr><td>Max. Punkte</td><td>40</td></tr>
<tr><td>Veranstalter</td><td>BVC Baden</td></tr>
<tr><td>Telefon</td><td>+43 1 234</td></tr>
<tr><td>EMail</td><td>office@bvc.at</td></tr>
<tr><td>Web</td><td>www.bvc.at</td></tr>
<tr><td>Vorläufige Punkte</td><td>ja</td></tr>
<tr><td>Nennschluss</td><td>25.05.2024</td></tr>
<tr><td>Auslosung</td><td>Freitag</td></tr>
</tbody></table>
<div class="extrainfo"><p>Bitte pünktlich sein.</p></div>
<table><tbody>
<tr><th>Nr.</th><th>Name</th><th>Lizenz</th><th>LV</th><th>Punkte</th><th>Team</th><th></th></tr>
{teams}
</tbody></table>
</body></html>"#
        )
    }

    fn parse(html: &str) -> Result<TournamentDetail> {
        let document = volleynet::Html::parse_document(html);
        parse_tournament(&document, &listing(), date(2024, 5, 1))
    }

    #[test]
    fn test_parse_details() {
        let teams = [player_row(1, "Berger Max"), player_row(2, "Huber Paul")].concat();
        let tournament = parse(&page(&teams)).unwrap();

        assert_eq!(tournament.sub_league, "Amateur Tour 1");
        assert_eq!(tournament.sub_league_key, "amateur-tour-1");
        assert_eq!(tournament.mode, "Double Elimination, max. 16 Teams");
        assert_eq!(tournament.max_teams, Some(16));
        assert_eq!(tournament.min_teams, Some(8));
        assert_eq!(tournament.info.start, Some(date(2024, 6, 1)));
        assert_eq!(tournament.info.end, Some(date(2024, 6, 2)));
        assert_eq!(tournament.location, "Strandbad <b>Baden</b>");
        assert_eq!(tournament.max_points, Some(40));
        assert_eq!(tournament.organiser, "BVC Baden");
        assert_eq!(tournament.phone, "+43 1 234");
        assert_eq!(tournament.email, "office@bvc.at");
        assert_eq!(tournament.website, "www.bvc.at");
        assert_eq!(tournament.current_points, "ja");
        assert_eq!(tournament.end_registration, Some(date(2024, 5, 25)));
        assert_eq!(tournament.html_notes, "<p>Bitte pünktlich sein.</p>");
        assert_eq!(tournament.status(), TournamentStatus::Upcoming);
    }

    #[test]
    fn test_parse_teams() {
        let teams = [
            player_row(1, "Berger Max"),
            player_row(2, "Huber Paul"),
            player_row(3, "Gruber Lisa"),
            player_row(4, "Wagner Eva"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        assert_eq!(tournament.teams.len(), 2);
        assert_eq!(tournament.signedup_teams, 2);

        let first = &tournament.teams[0];
        assert_eq!(first.tournament_id, 100);
        assert_eq!(first.player1.id, 1);
        assert_eq!(first.player2.id, 2);
        assert_eq!(first.player1.gender, Gender::Male);
        assert_eq!(first.seed, Some(1));
        assert_eq!(first.total_points, Some(100));
        assert!(!first.deregistered);
        assert_eq!(tournament.teams[1].key(), (3, 4));
    }

    #[test]
    fn test_team_without_player_link_is_skipped() {
        let broken = r#"<tr><td>3</td><td>Namenlos</td><td>A</td><td>WBV</td><td>1</td><td>2</td><td></td></tr>"#;
        let teams = [
            player_row(1, "Berger Max"),
            player_row(2, "Huber Paul"),
            player_row(3, "Gruber Lisa"),
            broken.to_string(),
            player_row(5, "Bauer Tom"),
            player_row(6, "Koch Jan"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        let keys: Vec<_> = tournament.teams.iter().map(TournamentTeam::key).collect();
        assert_eq!(keys, vec![(1, 2), (5, 6)]);
    }

    #[test]
    fn test_single_trailing_row_is_skipped() {
        let teams = [
            player_row(1, "Berger Max"),
            player_row(2, "Huber Paul"),
            player_row(3, "Gruber Lisa"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();
        assert_eq!(tournament.teams.len(), 1);
    }

    #[test]
    fn test_unknown_row_shape_skips_only_its_team() {
        let teams = [
            player_row(1, "Berger Max"),
            player_row(2, "Huber Paul"),
            r#"<tr><td colspan="7">Warteliste</td></tr>"#.to_string(),
            r#"<tr><td>-</td></tr>"#.to_string(),
            player_row(3, "Gruber Lisa"),
            player_row(4, "Wagner Eva"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        let keys: Vec<_> = tournament.teams.iter().map(TournamentTeam::key).collect();
        assert_eq!(keys, vec![(1, 2), (3, 4)]);
        assert_eq!(tournament.signedup_teams, 2);
    }

    #[test]
    fn test_unknown_row_shape_next_to_player_row() {
        let teams = [
            player_row(1, "Berger Max"),
            r#"<tr><td>x</td><td>y</td><td>z</td></tr>"#.to_string(),
            player_row(3, "Gruber Lisa"),
            player_row(4, "Wagner Eva"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        let keys: Vec<_> = tournament.teams.iter().map(TournamentTeam::key).collect();
        assert_eq!(keys, vec![(3, 4)]);
    }

    #[test]
    fn test_lone_row_mid_table_shifts_later_pairs() {
        let teams = [
            player_row(1, "Berger Max"),
            player_row(2, "Huber Paul"),
            player_row(9, "Walkover Tim"),
            player_row(3, "Gruber Lisa"),
            player_row(4, "Wagner Eva"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        // positional pairing: the lone row takes player 3 as partner and
        // player 4 ends up as the skipped trailing row
        let keys: Vec<_> = tournament.teams.iter().map(TournamentTeam::key).collect();
        assert_eq!(keys, vec![(1, 2), (3, 9)]);
    }

    #[test]
    fn test_notes_with_frames_are_replaced() {
        let html = page("").replace(
            "<p>Bitte pünktlich sein.</p>",
            r#"<iframe src="https://maps.example.com"></iframe>"#,
        );
        let tournament = parse(&html).unwrap();
        assert_eq!(tournament.html_notes, NOTES_PLACEHOLDER);
    }

    #[test]
    fn test_deregistered_team_is_not_counted() {
        let deregistered = |id: u32, name: &str| {
            player_row(id, name).replace(r#"<a href="/Abmelden">abmelden</a>"#, "")
        };
        let teams = [
            deregistered(1, "Berger Max"),
            deregistered(2, "Huber Paul"),
            player_row(3, "Gruber Lisa"),
            player_row(4, "Wagner Eva"),
        ]
        .concat();
        let tournament = parse(&page(&teams)).unwrap();

        assert_eq!(tournament.teams.len(), 2);
        assert!(tournament.teams[0].deregistered);
        assert_eq!(tournament.signedup_teams, 1);
    }

    #[test]
    fn test_is_done_grace_period() {
        let tournament = TournamentDetail::new(listing());
        let end = date(2024, 6, 2);

        assert!(!is_done(&tournament, end));
        assert!(!is_done(&tournament, end + Days::new(7)));
        assert!(is_done(&tournament, end + Days::new(8)));
    }

    #[test]
    fn test_is_done_with_results() {
        let results = r#"<table><tbody>
<tr><th>Nr.</th><th>Name</th><th>LV</th><th>Punkte</th><th>Preisgeld</th></tr>
<tr><td>1.</td><td><a href="/spieler/1">Berger Max</a></td><td>WBV</td><td>80</td><td>200</td></tr>
<tr><td></td><td><a href="/spieler/2">Huber Paul</a></td><td>WBV</td><td></td><td></td></tr>
</tbody></table>"#;
        let document = volleynet::Html::parse_document(results);
        let tournament = parse_tournament(&document, &listing(), date(2024, 6, 2)).unwrap();

        assert_eq!(tournament.teams[0].result, Some(1));
        assert_eq!(tournament.teams[0].won_points, Some(80));
        assert_eq!(tournament.status(), TournamentStatus::Done);
    }

    #[test]
    fn test_is_done_only_for_upcoming() {
        let mut canceled = listing();
        canceled.status = TournamentStatus::Canceled;
        let tournament = TournamentDetail::new(canceled);
        assert!(!is_done(&tournament, date(2030, 1, 1)));
    }
}
