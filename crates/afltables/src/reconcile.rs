//! Merges the per-team section tables of a game-by-game year into one record
//! per player and team, then reshapes those records into long rows.

use std::collections::HashMap;

use crate::types::{DroppedPlayer, StatRow, TeamPage};

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("{player} ({team}) has no stat sections")]
    NoSections { player: String, team: String },
    #[error(
        "{player} ({team}): section '{section}' has {found} values but there are {expected} rounds"
    )]
    LengthMismatch {
        player: String,
        team: String,
        section: String,
        expected: usize,
        found: usize,
    },
}

/// Every section seen for one player on one team page. Each section holds
/// one value per round, aligned with `opponents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameByGameRecord {
    pub player: String,
    pub team: String,
    pub opponents: Vec<String>,
    pub sections: Vec<(String, Vec<String>)>,
}

impl GameByGameRecord {
    pub fn new(player: &str, team: &str, opponents: Vec<String>) -> Self {
        Self {
            player: player.to_string(),
            team: team.to_string(),
            opponents,
            sections: Vec::new(),
        }
    }

    /// Adds a section, or replaces the values of one already present.
    pub fn set_section(&mut self, name: &str, values: Vec<String>) {
        match self.sections.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.sections.push((name.to_string(), values)),
        }
    }

    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn rounds(&self) -> usize {
        self.opponents.len()
    }

    /// The team label repeated once per round.
    pub fn team_labels(&self) -> Vec<&str> {
        vec![self.team.as_str(); self.rounds()]
    }

    pub fn to_wide(&self) -> Result<WideTable, ShapeError> {
        if self.sections.is_empty() {
            return Err(ShapeError::NoSections {
                player: self.player.clone(),
                team: self.team.clone(),
            });
        }

        let expected = self.rounds();
        if let Some((section, values)) = self.sections.iter().find(|(_, v)| v.len() != expected) {
            return Err(ShapeError::LengthMismatch {
                player: self.player.clone(),
                team: self.team.clone(),
                section: section.clone(),
                expected,
                found: values.len(),
            });
        }

        Ok(WideTable {
            player: self.player.clone(),
            team: vec![self.team.clone(); expected],
            round: (1..=expected as u32).collect(),
            opponents: self.opponents.clone(),
            columns: self.sections.clone(),
        })
    }
}

/// One row per round for a single player; one column per stat section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    pub player: String,
    pub team: Vec<String>,
    pub round: Vec<u32>,
    pub opponents: Vec<String>,
    pub columns: Vec<(String, Vec<String>)>,
}

impl WideTable {
    pub fn len(&self) -> usize {
        self.round.len()
    }

    pub fn is_empty(&self) -> bool {
        self.round.is_empty()
    }

    /// Folds the stat columns into `(stat, value)` pairs, keeping player,
    /// team, round and opponent as identifiers. Rows stop at the shortest
    /// identifier column.
    pub fn melt(self) -> Vec<StatRow> {
        let mut rows = Vec::with_capacity(self.columns.len() * self.len());

        for (stat, values) in &self.columns {
            let ids = self.team.iter().zip(&self.round).zip(&self.opponents);
            for (((team, round), opponent), value) in ids.zip(values) {
                rows.push(StatRow {
                    player: self.player.clone(),
                    team: team.clone(),
                    round: *round,
                    opponent: opponent.clone(),
                    stat: stat.clone(),
                    value: value.clone(),
                });
            }
        }

        rows
    }
}

#[derive(Debug, Default)]
pub struct Reshaped {
    pub rows: Vec<StatRow>,
    pub dropped: Vec<DroppedPlayer>,
}

/// Accumulates records keyed by (player, team), in first-seen order.
#[derive(Debug, Default)]
pub struct Reconciler {
    records: Vec<GameByGameRecord>,
    index: HashMap<(String, String), usize>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_section(
        &mut self,
        team: &str,
        opponents: &[String],
        section: &str,
        player: &str,
        values: Vec<String>,
    ) {
        let key = (player.to_string(), team.to_string());
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.records
                    .push(GameByGameRecord::new(player, team, opponents.to_vec()));
                self.index.insert(key, self.records.len() - 1);
                self.records.len() - 1
            }
        };

        self.records[idx].set_section(section, values);
    }

    pub fn merge_page(&mut self, team: &str, page: TeamPage) {
        for section in page.sections {
            for row in section.rows {
                self.merge_section(team, &page.opponents, &section.name, &row.player, row.values);
            }
        }
    }

    pub fn get(&self, player: &str, team: &str) -> Option<&GameByGameRecord> {
        self.index
            .get(&(player.to_string(), team.to_string()))
            .map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[GameByGameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn reshape(self) -> Reshaped {
        reshape(self.records)
    }
}

/// Melts every record into long rows. A record whose sections do not line
/// up with its rounds is logged and left out.
pub fn reshape(records: Vec<GameByGameRecord>) -> Reshaped {
    let mut reshaped = Reshaped::default();

    for record in records {
        match record.to_wide() {
            Ok(wide) => reshaped.rows.extend(wide.melt()),
            Err(e) => {
                log::warn!("Dropping {}: {} ({:?})", record.player, e, record);
                reshaped.dropped.push(DroppedPlayer {
                    player: record.player,
                    team: record.team,
                    reason: e.to_string(),
                });
            }
        }
    }

    reshaped
}
