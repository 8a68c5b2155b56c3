use crate::types::{GameByGameStats, SeasonStats};

use std::collections::HashSet;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Year {year} is out of range, expected {min}..={max}")]
pub struct YearOutOfRange {
    pub year: u16,
    pub min: u16,
    pub max: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: u16,
    pub max: u16,
}

/// Years with a `/afl/stats/{year}.html` page in the supported layout.
pub const SEASON_STATS_YEARS: YearRange = YearRange::new(1987, 2021);

/// Years with team game-by-game pages.
pub const GAME_BY_GAME_YEARS: YearRange = YearRange::new(1965, 2021);

impl YearRange {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: u16) -> bool {
        self.as_range().contains(&year)
    }

    pub fn as_range(&self) -> RangeInclusive<u16> {
        self.min..=self.max
    }

    pub fn validate(&self, year: u16) -> Result<u16, YearOutOfRange> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(YearOutOfRange {
                year,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[derive(Debug)]
pub struct SeasonSummary {
    pub year: u16,
    pub players: usize,
    pub columns: usize,
}

impl SeasonSummary {
    pub fn from_season_stats(stats: &SeasonStats) -> SeasonSummary {
        SeasonSummary {
            year: stats.year,
            players: stats.len(),
            columns: stats.columns.len(),
        }
    }
}

impl std::fmt::Display for SeasonSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nSeason {}:", self.year)?;
        writeln!(f, "  Players:    {}", self.players)?;
        writeln!(f, "  Stat keys:  {}", self.columns)
    }
}

#[derive(Debug)]
pub struct GameByGameSummary {
    pub year: u16,
    pub players: usize,
    pub stats: usize,
    pub rows: usize,
    pub skipped_teams: Vec<String>,
    pub dropped_players: usize,
}

impl GameByGameSummary {
    pub fn from_game_by_game(stats: &GameByGameStats) -> GameByGameSummary {
        let players: HashSet<(&str, &str)> = stats
            .rows
            .iter()
            .map(|r| (r.player.as_str(), r.team.as_str()))
            .collect();
        let stat_names: HashSet<&str> = stats.rows.iter().map(|r| r.stat.as_str()).collect();

        GameByGameSummary {
            year: stats.year,
            players: players.len(),
            stats: stat_names.len(),
            rows: stats.rows.len(),
            skipped_teams: stats.skipped_teams.iter().map(|s| s.team.clone()).collect(),
            dropped_players: stats.dropped_players.len(),
        }
    }
}

impl std::fmt::Display for GameByGameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nGame-by-game {}:", self.year)?;
        writeln!(f, "  Player/team records: {}", self.players)?;
        writeln!(f, "  Stats:               {}", self.stats)?;
        writeln!(f, "  Rows:                {}", self.rows)?;
        writeln!(f, "  Dropped players:     {}", self.dropped_players)?;
        if self.skipped_teams.is_empty() {
            writeln!(f, "  Skipped teams:       none")
        } else {
            writeln!(f, "  Skipped teams:       {}", self.skipped_teams.join(", "))
        }
    }
}
