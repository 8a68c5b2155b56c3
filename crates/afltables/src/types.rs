use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Placeholder stored for cells afltables leaves blank.
pub const MISSING: &str = "NA";

/// Stat key to value for one player, without the `player` key itself.
pub type PlayerRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonPlayer {
    pub name: String,
    pub stats: PlayerRecord,
}

impl Display for SeasonPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.stats {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// One season's player table, indexed by player name in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub year: u16,
    pub columns: Vec<String>,
    pub players: Vec<SeasonPlayer>,
}

impl SeasonStats {
    pub fn new(year: u16, columns: Vec<String>) -> Self {
        Self {
            year,
            columns,
            players: Vec::new(),
        }
    }

    /// Stores `stats` under `name`. A repeated name replaces the earlier
    /// record but keeps its position.
    pub fn insert(&mut self, name: String, stats: PlayerRecord) {
        match self.players.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.stats = stats,
            None => self.players.push(SeasonPlayer { name, stats }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.players
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.stats)
    }

    pub fn player_names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub player: String,
    pub values: Vec<String>,
}

/// One stat category table (Kicks, Disposals, ...) from a team page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTable {
    pub name: String,
    pub rows: Vec<SectionRow>,
}

/// Everything parsed from one `{team}/{year}_gbg.html` page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPage {
    pub opponents: Vec<String>,
    pub sections: Vec<SectionTable>,
}

/// A single long-format observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRow {
    pub player: String,
    pub team: String,
    pub round: u32,
    pub opponent: String,
    pub stat: String,
    pub value: String,
}

impl Display for StatRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) R{} vs {}: {} = {}",
            self.player, self.team, self.round, self.opponent, self.stat, self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTeam {
    pub team: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedPlayer {
    pub player: String,
    pub team: String,
    pub reason: String,
}

/// Result of a game-by-game run. `skipped_teams` and `dropped_players` tell
/// a complete year apart from a degraded one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameByGameStats {
    pub year: u16,
    pub rows: Vec<StatRow>,
    pub skipped_teams: Vec<SkippedTeam>,
    pub dropped_players: Vec<DroppedPlayer>,
}

impl GameByGameStats {
    pub fn is_complete(&self) -> bool {
        self.skipped_teams.is_empty() && self.dropped_players.is_empty()
    }
}
