use crate::types::{MISSING, PlayerRecord, SeasonStats, SectionRow, SectionTable, TeamPage};

use scraper::{ElementRef, Html, Node, Selector};

/// Column key inserted into the derived header keys for the player name.
pub const PLAYER_KEY: &str = "player";

/// Where `player` lands in the season header keys unless told otherwise.
pub const DEFAULT_PLAYER_INDEX: usize = 1;

const NBSP: &str = "\u{a0}";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Malformed header fragment, expected 'ABBR=Name': {0}")]
    MalformedHeader(String),
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn stripped_strings<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.text().map(str::trim).filter(|s| !s.is_empty())
}

/// The text of an element whose only content is one string, looking through
/// single-child wrappers such as `<td><a>Name</a></td>`.
fn single_string(element: ElementRef) -> Option<String> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(String::from(&**text)),
        Node::Element(_) => ElementRef::wrap(only).and_then(single_string),
        _ => None,
    }
}

fn header_key(fragment: &str) -> Result<String, ParseError> {
    let name = fragment
        .split('=')
        .nth(1)
        .ok_or_else(|| ParseError::MalformedHeader(fragment.to_string()))?;
    Ok(name.to_lowercase().replace(' ', "_"))
}

fn normalize_season_value(value: Option<String>) -> String {
    match value {
        Some(v) if v != NBSP => v,
        _ => MISSING.to_string(),
    }
}

fn normalize_game_value(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() || value == "-" {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

/// Derives the season table's column keys from the stat legend, the second
/// `<span>` on the page, whose fragments read `ABBR=Full Name`.
pub fn parse_header_keys(document: &Html, player_index: usize) -> Result<Vec<String>, ParseError> {
    let span_selector = Selector::parse("span").unwrap();

    let legend = document
        .select(&span_selector)
        .nth(1)
        .ok_or_else(|| ParseError::MissingField("header legend span".to_string()))?;

    let mut keys = stripped_strings(legend)
        .map(header_key)
        .collect::<Result<Vec<_>, _>>()?;

    keys.insert(player_index.min(keys.len()), PLAYER_KEY.to_string());
    Ok(keys)
}

/// Walks every `<tr>` and zips its cells against `keys`. Rows without a
/// player name are ignored; a repeated name replaces the earlier row.
pub fn parse_season_rows(document: &Html, keys: &[String], year: u16) -> SeasonStats {
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut columns: Vec<String> = Vec::new();
    for key in keys {
        if key != PLAYER_KEY && !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    let mut stats = SeasonStats::new(year, columns);

    for row in document.select(&row_selector) {
        let mut player = None;
        let mut record = PlayerRecord::new();

        for (key, cell) in keys.iter().zip(row.select(&cell_selector)) {
            let value = single_string(cell);
            if key == PLAYER_KEY {
                player = value;
            } else {
                record.insert(key.clone(), normalize_season_value(value));
            }
        }

        if let Some(name) = player {
            stats.insert(name, record);
        }
    }

    stats
}

pub fn parse_season_stats(
    html: &str,
    year: u16,
    player_index: usize,
) -> Result<SeasonStats, ParseError> {
    let document = Html::parse_document(html);
    let keys = parse_header_keys(&document, player_index)?;
    Ok(parse_season_rows(&document, &keys, year))
}

/// Opponent codes per round, taken from the `Opponent` footer row with its
/// label and totals cells removed.
fn parse_opponents(document: &Html) -> Result<Vec<String>, ParseError> {
    let tfoot_selector = Selector::parse("tfoot").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td, th").unwrap();

    let tfoot = document
        .select(&tfoot_selector)
        .next()
        .ok_or_else(|| ParseError::MissingField("opponents footer".to_string()))?;

    let rows: Vec<Vec<String>> = tfoot
        .select(&row_selector)
        .map(|tr| tr.select(&cell_selector).map(elem_text).collect())
        .collect();

    let row = rows
        .iter()
        .find(|cells| {
            cells
                .first()
                .is_some_and(|c| c.trim().to_lowercase().starts_with("opponent"))
        })
        .or_else(|| rows.last())
        .ok_or_else(|| ParseError::MissingField("opponents footer row".to_string()))?;

    Ok(match row.len() {
        0 | 1 => Vec::new(),
        n => row[1..n - 1].iter().map(|c| normalize_game_value(c)).collect(),
    })
}

fn parse_section_row(row: ElementRef, cell_selector: &Selector) -> Option<SectionRow> {
    let cells: Vec<String> = row.select(cell_selector).map(elem_text).collect();
    let (first, rest) = cells.split_first()?;

    let player = normalize_whitespace(first);
    if player.is_empty() {
        return None;
    }

    // last cell is the season total
    let values = rest
        .split_last()
        .map(|(_, rounds)| rounds.iter().map(|v| normalize_game_value(v)).collect())
        .unwrap_or_default();

    Some(SectionRow { player, values })
}

pub fn parse_game_by_game_page(html: &str) -> Result<TeamPage, ParseError> {
    let document = Html::parse_document(html);
    let opponents = parse_opponents(&document)?;

    let table_selector = Selector::parse("table").unwrap();
    let thead_selector = Selector::parse("thead").unwrap();
    let tbody_selector = Selector::parse("tbody").unwrap();
    let th_selector = Selector::parse("th").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut sections = Vec::new();

    for table in document.select(&table_selector) {
        let (Some(thead), Some(tbody)) = (
            table.select(&thead_selector).next(),
            table.select(&tbody_selector).next(),
        ) else {
            continue;
        };

        let Some(name) = thead
            .select(&th_selector)
            .next()
            .map(|th| normalize_whitespace(&elem_text(th)))
            .filter(|name| !name.is_empty())
        else {
            log::debug!("Skipping table without a section heading");
            continue;
        };

        let rows = tbody
            .select(&row_selector)
            .filter_map(|tr| parse_section_row(tr, &cell_selector))
            .collect();

        sections.push(SectionTable { name, rows });
    }

    Ok(TeamPage {
        opponents,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON_PAGE: &str = r#"
        <html><body>
            <span>2021 Player Stats</span>
            <span>#=Jumper<br>KI=Kicks<br>MK=Marks<br>HB=Hand Balls</span>
            <table>
                <tr><th>#</th><th>Player</th><th>KI</th><th>MK</th><th>HB</th></tr>
                <tr><td>7</td><td><a href="players/S/Smith.html">Smith, John</a></td><td>10</td><td>5</td><td>&nbsp;</td></tr>
                <tr><td>12</td><td><a href="players/J/Jones.html">Jones, Bob</a></td><td>3</td><td>&nbsp;</td><td>8</td></tr>
            </table>
        </body></html>
    "#;

    fn team_page(section: &str, rows: &str, opponents: &str) -> String {
        format!(
            r#"
            <table class="sortable">
                <thead>
                    <tr><th colspan="5">{section}</th></tr>
                    <tr><th>Player</th><th>R1</th><th>R2</th><th>R3</th><th>Tot</th></tr>
                </thead>
                <tbody>{rows}</tbody>
                <tfoot>
                    <tr><td>Opponent</td>{opponents}<td>&nbsp;</td></tr>
                </tfoot>
            </table>
            "#
        )
    }

    #[test]
    fn test_parse_header_keys_inserts_player() {
        let html = r#"<span>x</span><span>stat=Kicks<br>stat=Marks</span>"#;
        let document = Html::parse_document(html);

        let keys = parse_header_keys(&document, DEFAULT_PLAYER_INDEX).expect("Failed to parse");

        assert_eq!(keys, vec!["kicks", "player", "marks"]);
    }

    #[test]
    fn test_parse_header_keys_lowercases_and_underscores() {
        let document = Html::parse_document(SEASON_PAGE);

        let keys = parse_header_keys(&document, 1).expect("Failed to parse");

        assert_eq!(keys, vec!["jumper", "player", "kicks", "marks", "hand_balls"]);
    }

    #[test]
    fn test_parse_header_keys_index_past_end_appends() {
        let html = r#"<span>x</span><span>KI=Kicks</span>"#;
        let document = Html::parse_document(html);

        let keys = parse_header_keys(&document, 10).expect("Failed to parse");

        assert_eq!(keys, vec!["kicks", "player"]);
    }

    #[test]
    fn test_parse_header_keys_needs_two_spans() {
        let document = Html::parse_document("<span>KI=Kicks</span>");

        let err = parse_header_keys(&document, 1).unwrap_err();

        assert!(matches!(err, ParseError::MissingField(_)));
    }

    #[test]
    fn test_parse_header_keys_rejects_fragment_without_equals() {
        let document = Html::parse_document("<span>x</span><span>Kicks</span>");

        let err = parse_header_keys(&document, 1).unwrap_err();

        assert!(matches!(err, ParseError::MalformedHeader(f) if f == "Kicks"));
    }

    #[test]
    fn test_parse_season_rows_excludes_player_key() {
        let html = r#"
            <table>
                <tr><td>10</td><td><a href="s.html">Smith</a></td><td>5</td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);
        let keys: Vec<String> = ["kicks", "player", "marks"].map(String::from).to_vec();

        let stats = parse_season_rows(&document, &keys, 2021);

        let smith = stats.get("Smith").expect("Smith should be stored");
        let expected: PlayerRecord = [("kicks", "10"), ("marks", "5")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(smith, &expected);
        assert!(!smith.contains_key("player"));
        assert_eq!(stats.columns, vec!["kicks", "marks"]);
    }

    #[test]
    fn test_parse_season_stats_normalizes_nbsp() {
        let stats = parse_season_stats(SEASON_PAGE, 2021, 1).expect("Failed to parse");

        assert_eq!(stats.len(), 2);
        assert_eq!(stats.player_names(), vec!["Smith, John", "Jones, Bob"]);

        let smith = stats.get("Smith, John").unwrap();
        assert_eq!(smith["kicks"], "10");
        assert_eq!(smith["hand_balls"], "NA");

        let jones = stats.get("Jones, Bob").unwrap();
        assert_eq!(jones["marks"], "NA");
        assert_eq!(jones["jumper"], "12");
    }

    #[test]
    fn test_parse_season_rows_last_duplicate_wins() {
        let html = r#"
            <table>
                <tr><td>1</td><td>Smith</td></tr>
                <tr><td>2</td><td>Brown</td></tr>
                <tr><td>3</td><td>Smith</td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);
        let keys: Vec<String> = ["kicks", "player"].map(String::from).to_vec();

        let stats = parse_season_rows(&document, &keys, 2021);

        assert_eq!(stats.player_names(), vec!["Smith", "Brown"]);
        assert_eq!(stats.get("Smith").unwrap()["kicks"], "3");
    }

    #[test]
    fn test_parse_season_rows_skips_rows_without_player() {
        let html = r#"
            <table>
                <tr><th>KI</th><th>Player</th></tr>
                <tr><td>4</td></tr>
                <tr><td>4</td><td><b>Smith</b> <i>(c)</i></td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);
        let keys: Vec<String> = ["kicks", "player"].map(String::from).to_vec();

        let stats = parse_season_rows(&document, &keys, 2021);

        assert!(stats.is_empty(), "Mixed content has no single string");
    }

    #[test]
    fn test_parse_game_by_game_page() {
        let html = team_page(
            "Disposals",
            r#"
                <tr><td><a href="p.html">Jones, Bob</a></td><td>20</td><td>-</td><td>&nbsp;</td><td>20</td></tr>
                <tr><td>Smith, John</td><td>11</td><td>14</td><td>9</td><td>34</td></tr>
            "#,
            "<td>CA</td><td>GE</td><td>RI</td>",
        );

        let page = parse_game_by_game_page(&html).expect("Failed to parse team page");

        assert_eq!(page.opponents, vec!["CA", "GE", "RI"]);
        assert_eq!(page.sections.len(), 1);

        let section = &page.sections[0];
        assert_eq!(section.name, "Disposals");
        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[0].player, "Jones, Bob");
        assert_eq!(section.rows[0].values, vec!["20", "NA", "NA"]);
        assert_eq!(section.rows[1].values, vec!["11", "14", "9"]);
    }

    #[test]
    fn test_parse_game_by_game_page_multiple_sections() {
        let disposals = team_page(
            "Disposals",
            "<tr><td>Jones</td><td>1</td><td>2</td><td>3</td><td>6</td></tr>",
            "<td>CA</td><td>GE</td><td>RI</td>",
        );
        let goals = team_page(
            "Goals",
            "<tr><td>Jones</td><td>0</td><td>1</td><td>-</td><td>1</td></tr>",
            "<td>CA</td><td>GE</td><td>RI</td>",
        );
        let html = format!("<html><body>{disposals}{goals}</body></html>");

        let page = parse_game_by_game_page(&html).expect("Failed to parse team page");

        let names: Vec<&str> = page.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Disposals", "Goals"]);
        assert_eq!(page.sections[1].rows[0].values, vec!["0", "1", "NA"]);
    }

    #[test]
    fn test_parse_opponents_picks_opponent_row_after_totals() {
        let html = r#"
            <table>
                <thead><tr><th>Kicks</th></tr></thead>
                <tbody><tr><td>Jones</td><td>&nbsp;</td><td>4</td><td>4</td></tr></tbody>
                <tfoot>
                    <tr><td>Totals</td><td>180</td><td>201</td><td>381</td></tr>
                    <tr><td>Opponent</td><td>CA</td><td>GE</td><td>&nbsp;</td></tr>
                </tfoot>
            </table>
        "#;

        let page = parse_game_by_game_page(html).expect("Failed to parse team page");

        assert_eq!(page.opponents, vec!["CA", "GE"]);
        assert_eq!(page.sections[0].rows[0].values, vec!["NA", "4"]);
    }

    #[test]
    fn test_parse_opponents_falls_back_to_last_footer_row() {
        let html = r#"
            <table>
                <thead><tr><th>Kicks</th></tr></thead>
                <tbody><tr><td>Jones</td><td>1</td><td>2</td><td>3</td></tr></tbody>
                <tfoot>
                    <tr><td>Totals</td><td>180</td><td>201</td><td>381</td></tr>
                    <tr><td>Opp</td><td>RI</td><td>ES</td><td>&nbsp;</td></tr>
                </tfoot>
            </table>
        "#;

        let page = parse_game_by_game_page(html).expect("Failed to parse team page");

        assert_eq!(page.opponents, vec!["RI", "ES"]);
    }

    #[test]
    fn test_parse_game_by_game_page_skips_table_without_heading() {
        let untitled = r#"
            <table>
                <thead><tr><th>&nbsp;</th></tr></thead>
                <tbody><tr><td>Jones</td><td>9</td><td>9</td><td>9</td><td>27</td></tr></tbody>
            </table>
        "#;
        let kicks = team_page(
            "Kicks",
            "<tr><td>Jones</td><td>1</td><td>2</td><td>3</td><td>6</td></tr>",
            "<td>CA</td><td>GE</td><td>RI</td>",
        );
        let html = format!("<html><body>{untitled}{kicks}</body></html>");

        let page = parse_game_by_game_page(&html).expect("Failed to parse team page");

        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].name, "Kicks");
    }

    #[test]
    fn test_parse_game_by_game_page_skips_rows_without_player() {
        let html = team_page(
            "Kicks",
            r#"
                <tr><td>&nbsp;</td><td>1</td><td>2</td><td>3</td><td>6</td></tr>
                <tr><td></td><td>4</td><td>5</td><td>6</td><td>15</td></tr>
                <tr><td>Jones</td><td>7</td><td>8</td><td>9</td><td>24</td></tr>
            "#,
            "<td>CA</td><td>GE</td><td>RI</td>",
        );

        let page = parse_game_by_game_page(&html).expect("Failed to parse team page");

        let rows = &page.sections[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player, "Jones");
        assert_eq!(rows[0].values, vec!["7", "8", "9"]);
    }

    #[test]
    fn test_parse_game_by_game_page_requires_footer() {
        let html = r#"
            <table>
                <thead><tr><th>Kicks</th></tr></thead>
                <tbody><tr><td>Jones</td><td>1</td><td>1</td></tr></tbody>
            </table>
        "#;

        let err = parse_game_by_game_page(html).unwrap_err();

        assert!(matches!(err, ParseError::MissingField(_)));
    }
}
