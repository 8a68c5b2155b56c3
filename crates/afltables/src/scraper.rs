use crate::parser::{ParseError, parse_game_by_game_page, parse_season_stats};
use crate::reconcile::Reconciler;
use crate::types::{GameByGameStats, SeasonStats, SkippedTeam};
use crate::utils::{GAME_BY_GAME_YEARS, SEASON_STATS_YEARS, YearOutOfRange};

use reqwest::Client;
use std::time::Duration;

/// Team identifiers as they appear in afltables team URLs.
pub const TEAMS: [&str; 20] = [
    "adelaide",
    "brisbaneb",
    "brisbanel",
    "bullldogs",
    "carlton",
    "collingwood",
    "essendon",
    "fitzroy",
    "fremantle",
    "geelong",
    "goldcoast",
    "gws",
    "hawthorn",
    "kangaroos",
    "melbourne",
    "padelaide",
    "richmond",
    "stkilda",
    "swans",
    "westcoast",
];

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    InvalidYear(#[from] YearOutOfRange),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Outcome of a request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Page(String),
    Status(u16),
}

/// Where pages come from. [`WebScraper`] is the network implementation.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    fn base_url(&self) -> &str;

    async fn fetch_page(&self, url: &str) -> Result<Fetched, ScraperError>;
}

pub fn season_url(base_url: &str, year: u16) -> String {
    format!("{}/afl/stats/{}.html", base_url, year)
}

pub fn game_by_game_url(base_url: &str, team: &str, year: u16) -> String {
    format!("{}/afl/stats/teams/{}/{}_gbg.html", base_url, team, year)
}

/// Season stats for `year`, indexed by player name. The year is checked
/// before anything is requested.
pub async fn season_stats<S: PageSource>(
    source: &S,
    year: u16,
    player_index: usize,
) -> Result<SeasonStats, ScraperError> {
    let year = SEASON_STATS_YEARS.validate(year)?;
    let url = season_url(source.base_url(), year);

    log::info!("Fetching season stats for {} from {}...", year, url);

    let html = match source.fetch_page(&url).await? {
        Fetched::Page(html) => html,
        Fetched::Status(status) => return Err(ScraperError::Status { url, status }),
    };

    let stats = parse_season_stats(&html, year, player_index)?;

    log::info!("Extracted {} players for {}", stats.len(), year);
    log::debug!("Player keys: {:?}", stats.player_names());

    Ok(stats)
}

/// Game-by-game stats for `year` across `teams`, in long format. Teams that
/// cannot be fetched or parsed are skipped and listed in the result.
pub async fn game_by_game<S: PageSource>(
    source: &S,
    year: u16,
    teams: &[impl AsRef<str>],
) -> Result<GameByGameStats, ScraperError> {
    let year = GAME_BY_GAME_YEARS.validate(year)?;
    let mut reconciler = Reconciler::new();
    let mut skipped_teams = Vec::new();

    for team in teams.iter().map(|t| t.as_ref()) {
        let url = game_by_game_url(source.base_url(), team, year);
        log::info!("Fetching {} game-by-game stats for {}...", team, year);

        let page = match source.fetch_page(&url).await {
            Ok(Fetched::Page(html)) => parse_game_by_game_page(&html).map_err(ScraperError::from),
            Ok(Fetched::Status(status)) => Err(ScraperError::Status { url, status }),
            Err(e) => Err(e),
        };

        match page {
            Ok(page) => {
                log::info!(
                    "{}: {} section(s) over {} round(s)",
                    team,
                    page.sections.len(),
                    page.opponents.len()
                );
                reconciler.merge_page(team, page);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", team, e);
                skipped_teams.push(SkippedTeam {
                    team: team.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!("Reshaping {} player record(s)...", reconciler.len());
    let reshaped = reconciler.reshape();

    Ok(GameByGameStats {
        year,
        rows: reshaped.rows,
        skipped_teams,
        dropped_players: reshaped.dropped,
    })
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_base_url(crate::BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_season_stats(
        &self,
        year: u16,
        player_index: usize,
    ) -> Result<SeasonStats, ScraperError> {
        season_stats(self, year, player_index).await
    }

    pub async fn fetch_game_by_game(
        &self,
        year: u16,
        teams: &[impl AsRef<str>],
    ) -> Result<GameByGameStats, ScraperError> {
        game_by_game(self, year, teams).await
    }
}

impl PageSource for WebScraper {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_page(&self, url: &str) -> Result<Fetched, ScraperError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Fetched::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(Fetched::Page(html))
    }
}
