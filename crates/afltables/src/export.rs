use crate::types::{MISSING, SeasonStats, StatRow};

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
}

pub fn game_by_game_path(dir: &Path, year: u16) -> PathBuf {
    dir.join(format!("AFL-Tables_game-by-game-stats_{}.parquet", year))
}

pub fn season_stats_path(dir: &Path, year: u16) -> PathBuf {
    dir.join(format!("AFL-Tables_season-stats_{}.parquet", year))
}

fn string_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

pub fn game_by_game_batch(rows: &[StatRow]) -> Result<RecordBatch, ExportError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("player", DataType::Utf8, false),
        Field::new("team", DataType::Utf8, false),
        Field::new("round", DataType::UInt32, false),
        Field::new("opponent", DataType::Utf8, false),
        Field::new("stat", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        string_column(rows.iter().map(|r| r.player.as_str())),
        string_column(rows.iter().map(|r| r.team.as_str())),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.round))),
        string_column(rows.iter().map(|r| r.opponent.as_str())),
        string_column(rows.iter().map(|r| r.stat.as_str())),
        string_column(rows.iter().map(|r| r.value.as_str())),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// `player` followed by one column per stat key, in page order.
pub fn season_stats_batch(stats: &SeasonStats) -> Result<RecordBatch, ExportError> {
    let mut fields = vec![Field::new("player", DataType::Utf8, false)];
    fields.extend(
        stats
            .columns
            .iter()
            .map(|c| Field::new(c.as_str(), DataType::Utf8, false)),
    );

    let mut columns = vec![string_column(stats.players.iter().map(|p| p.name.as_str()))];
    for column in &stats.columns {
        columns.push(string_column(stats.players.iter().map(|p| {
            p.stats
                .get(column)
                .map(String::as_str)
                .unwrap_or(MISSING)
        })));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn write_batch(batch: &RecordBatch, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

pub fn write_game_by_game(rows: &[StatRow], path: &Path) -> Result<(), ExportError> {
    log::info!("Writing {} rows to {}", rows.len(), path.display());
    write_batch(&game_by_game_batch(rows)?, path)
}

pub fn write_season_stats(stats: &SeasonStats, path: &Path) -> Result<(), ExportError> {
    log::info!("Writing {} players to {}", stats.len(), path.display());
    write_batch(&season_stats_batch(stats)?, path)
}
