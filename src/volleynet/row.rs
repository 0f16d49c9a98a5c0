use ::scraper::ElementRef;

use crate::error::{Result, VolleynetError};
use crate::model::{Gender, Player};
use crate::volleynet::{cell_text, find_int, non_empty, parse_float, player_id, player_name, row_cells};

/// What a single team table row contributes: one player plus whichever team
/// level values the row's layout carries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RowFragment {
    pub player: Player,
    pub seed: Option<u32>,
    pub result: Option<u32>,
    pub won_points: Option<u32>,
    pub total_points: Option<u32>,
    pub prize_money: Option<f64>,
    pub deregistered: Option<bool>,
}

impl RowFragment {
    fn new(player: Player) -> Self {
        Self {
            player,
            seed: None,
            result: None,
            won_points: None,
            total_points: None,
            prize_money: None,
            deregistered: None,
        }
    }
}

/// The team table layouts volleynet has shipped over the years. The column
/// count is the only thing that tells them apart.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RowShape<'a> {
    /// Bare registration: player, country union.
    Entry {
        player: ElementRef<'a>,
        country: ElementRef<'a>,
    },
    /// Registration with license and player points.
    Ranked {
        player: ElementRef<'a>,
        license: ElementRef<'a>,
        country: ElementRef<'a>,
        points: ElementRef<'a>,
    },
    /// Final standings with won points and prize money.
    Standings {
        result: ElementRef<'a>,
        player: ElementRef<'a>,
        country: ElementRef<'a>,
        won_points: ElementRef<'a>,
        prize_money: ElementRef<'a>,
    },
    /// Seeded registration with team points and a sign-out link.
    Seeded {
        seed: ElementRef<'a>,
        player: ElementRef<'a>,
        license: ElementRef<'a>,
        country: ElementRef<'a>,
        points: ElementRef<'a>,
        team_points: ElementRef<'a>,
        signout: ElementRef<'a>,
    },
}

impl<'a> RowShape<'a> {
    pub(crate) fn from_cells(cells: &[ElementRef<'a>]) -> Result<Self> {
        match *cells {
            [player, country] => Ok(Self::Entry { player, country }),
            [player, license, country, points] => Ok(Self::Ranked {
                player,
                license,
                country,
                points,
            }),
            [result, player, country, won_points, prize_money] => Ok(Self::Standings {
                result,
                player,
                country,
                won_points,
                prize_money,
            }),
            [seed, player, license, country, points, team_points, signout] => Ok(Self::Seeded {
                seed,
                player,
                license,
                country,
                points,
                team_points,
                signout,
            }),
            _ => Err(VolleynetError::UnknownRowShape {
                columns: cells.len(),
            }),
        }
    }

    fn player_cell(&self) -> &ElementRef<'a> {
        match self {
            Self::Entry { player, .. }
            | Self::Ranked { player, .. }
            | Self::Standings { player, .. }
            | Self::Seeded { player, .. } => player,
        }
    }

    /// Turn the shape into a fragment. Fails with [`VolleynetError::MissingPlayerId`]
    /// when the player cell has no usable profile link.
    pub(crate) fn extract(&self, gender: Gender) -> Result<RowFragment> {
        let player_cell = self.player_cell();
        let mut player = Player::new(player_id(player_cell)?, gender);
        (player.first_name, player.last_name) = player_name(player_cell);

        let fragment = match *self {
            Self::Entry { country, .. } => {
                player.country_union = text_of(&country);
                RowFragment::new(player)
            }
            Self::Ranked {
                license,
                country,
                points,
                ..
            } => {
                player.license = text_of(&license);
                player.country_union = text_of(&country);
                player.total_points = find_int(&cell_text(&points));
                RowFragment::new(player)
            }
            Self::Standings {
                result,
                country,
                won_points,
                prize_money,
                ..
            } => {
                player.country_union = text_of(&country);
                RowFragment {
                    result: find_int(&cell_text(&result)),
                    won_points: find_int(&cell_text(&won_points)),
                    prize_money: parse_float(&cell_text(&prize_money)),
                    ..RowFragment::new(player)
                }
            }
            Self::Seeded {
                seed,
                license,
                country,
                points,
                team_points,
                signout,
                ..
            } => {
                player.license = text_of(&license);
                player.country_union = text_of(&country);
                player.total_points = find_int(&cell_text(&points));
                RowFragment {
                    seed: find_int(&cell_text(&seed)),
                    total_points: find_int(&cell_text(&team_points)),
                    // the sign-out link is only rendered for teams that are still registered
                    deregistered: Some(cell_text(&signout).is_empty()),
                    ..RowFragment::new(player)
                }
            }
        };

        Ok(fragment)
    }
}

fn text_of(cell: &ElementRef) -> Option<String> {
    non_empty(cell_text(cell))
}

/// Parse one team table row for a tournament of the given gender.
pub(crate) fn extract_row(row: &ElementRef, gender: Gender) -> Result<RowFragment> {
    let cells = row_cells(row);
    RowShape::from_cells(&cells)?.extract(gender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::scraper::{Html, Selector};

    fn with_row<T>(cells: &str, f: impl FnOnce(&ElementRef) -> T) -> T {
        let document = Html::parse_fragment(&format!("<table><tr>{cells}</tr></table>"));
        let selector = Selector::parse("tr").unwrap();
        let row = document.select(&selector).next().unwrap();
        f(&row)
    }

    const PLAYER: &str = r#"<td><a href="/beach/spieler/steckbrief/1001">Berger Max</a></td>"#;

    #[test]
    fn test_entry_shape() {
        let fragment = with_row(&format!("{PLAYER}<td>WBV</td>"), |row| {
            extract_row(row, Gender::Male).unwrap()
        });

        assert_eq!(fragment.player.id, 1001);
        assert_eq!(fragment.player.first_name, "Max");
        assert_eq!(fragment.player.last_name, "Berger");
        assert_eq!(fragment.player.gender, Gender::Male);
        assert_eq!(fragment.player.country_union.as_deref(), Some("WBV"));
        assert_eq!(fragment.seed, None);
        assert_eq!(fragment.deregistered, None);
    }

    #[test]
    fn test_ranked_shape() {
        let fragment = with_row(
            &format!("{PLAYER}<td>A-123</td><td>NÖVV</td><td>245</td>"),
            |row| extract_row(row, Gender::Female).unwrap(),
        );

        assert_eq!(fragment.player.license.as_deref(), Some("A-123"));
        assert_eq!(fragment.player.country_union.as_deref(), Some("NÖVV"));
        assert_eq!(fragment.player.total_points, Some(245));
        assert_eq!(fragment.result, None);
    }

    #[test]
    fn test_standings_shape() {
        let fragment = with_row(
            &format!("<td>3.</td>{PLAYER}<td>OÖVV</td><td>80</td><td>€ 150,00</td>"),
            |row| extract_row(row, Gender::Male).unwrap(),
        );

        assert_eq!(fragment.result, Some(3));
        assert_eq!(fragment.won_points, Some(80));
        assert_eq!(fragment.prize_money, Some(150.0));
        assert_eq!(fragment.player.country_union.as_deref(), Some("OÖVV"));

        let winner = with_row(
            &format!("<td>1.</td>{PLAYER}<td>WBV</td><td>100</td><td>€ 1.500</td>"),
            |row| extract_row(row, Gender::Male).unwrap(),
        );
        assert_eq!(winner.prize_money, Some(1500.0));
    }

    #[test]
    fn test_seeded_shape() {
        let registered = with_row(
            &format!(
                r#"<td>1</td>{PLAYER}<td>A-9</td><td>WBV</td><td>120</td><td>250</td><td><a href="/Abmelden/0-1-00-0">abmelden</a></td>"#
            ),
            |row| extract_row(row, Gender::Male).unwrap(),
        );
        assert_eq!(registered.seed, Some(1));
        assert_eq!(registered.total_points, Some(250));
        assert_eq!(registered.player.total_points, Some(120));
        assert_eq!(registered.deregistered, Some(false));

        let deregistered = with_row(
            &format!("<td>2</td>{PLAYER}<td>A-9</td><td>WBV</td><td>120</td><td>250</td><td></td>"),
            |row| extract_row(row, Gender::Male).unwrap(),
        );
        assert_eq!(deregistered.deregistered, Some(true));
    }

    #[test]
    fn test_missing_player_link_in_every_known_shape() {
        let shapes = [
            "<td>Berger Max</td><td>WBV</td>".to_string(),
            "<td>Berger Max</td><td>A-1</td><td>WBV</td><td>3</td>".to_string(),
            "<td>1</td><td>Berger Max</td><td>WBV</td><td>3</td><td>0</td>".to_string(),
            "<td>1</td><td>Berger Max</td><td>A</td><td>WBV</td><td>3</td><td>4</td><td></td>"
                .to_string(),
        ];

        for cells in shapes {
            let result = with_row(&cells, |row| extract_row(row, Gender::Male));
            assert!(
                matches!(result, Err(VolleynetError::MissingPlayerId)),
                "expected missing player id for {cells}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_unknown_shape() {
        let result = with_row(&format!("{PLAYER}<td>WBV</td><td>x</td>"), |row| {
            extract_row(row, Gender::Male)
        });
        assert!(matches!(
            result,
            Err(VolleynetError::UnknownRowShape { columns: 3 })
        ));
    }
}
