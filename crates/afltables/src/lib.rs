pub mod export;
mod parser;
pub mod reconcile;
pub mod scraper;
pub mod types;
pub mod utils;

pub use parser::{
    DEFAULT_PLAYER_INDEX, PLAYER_KEY, ParseError, parse_game_by_game_page, parse_season_stats,
};
pub use scraper::{ScraperError, TEAMS, WebScraper};

pub(crate) const BASE_URL: &str = "https://afltables.com";
