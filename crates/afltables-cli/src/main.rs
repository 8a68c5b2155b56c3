use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process;

use afltables::export::{
    game_by_game_path, season_stats_path, write_game_by_game, write_season_stats,
};
use afltables::utils::{GameByGameSummary, SeasonSummary};
use afltables::{DEFAULT_PLAYER_INDEX, TEAMS, WebScraper};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "afltables")]
#[command(about = "An afltables.com player statistics scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log file, truncated on every run [default: <out-dir>/AFL-Tables_<command>_<year>.log]"
    )]
    log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "data",
        help = "Directory for parquet output and the default log file"
    )]
    out_dir: PathBuf,

    #[arg(
        long,
        global = true,
        default_value = "https://afltables.com",
        help = "Site to scrape"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Parquet,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-player season totals for one year (1987-2021)
    Season {
        #[arg(help = "Season to fetch")]
        year: u16,

        #[arg(
            long,
            default_value_t = DEFAULT_PLAYER_INDEX,
            help = "Position of the player column among the stat columns"
        )]
        player_index: usize,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Round-by-round stats for each team in one year (1965-2021), written to parquet
    GameByGame {
        #[arg(help = "Season to fetch")]
        year: u16,

        #[arg(
            long = "team",
            value_name = "TEAM",
            value_parser = PossibleValuesParser::new(TEAMS),
            help = "Only fetch these teams (repeatable, defaults to all)"
        )]
        teams: Vec<String>,
    },
}

impl Commands {
    fn log_file_name(&self) -> String {
        match self {
            Commands::Season { year, .. } => format!("AFL-Tables_season-stats_{}.log", year),
            Commands::GameByGame { year, .. } => {
                format!("AFL-Tables_game-by-game-stats_{}.log", year)
            }
        }
    }
}

fn init_logging(level: LevelFilter, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;

    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .write_style(env_logger::WriteStyle::Never)
        .init();

    Ok(())
}

fn fail(message: String) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    process::exit(1);
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("Error serializing to JSON: {}", e)),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| cli.out_dir.join(cli.command.log_file_name()));

    if let Err(e) = init_logging(cli.log_level.clone().into(), &log_file) {
        eprintln!("Error opening log file {}: {}", log_file.display(), e);
        process::exit(1);
    }

    let scraper = WebScraper::with_base_url(&cli.base_url)
        .unwrap_or_else(|e| fail(format!("Error creating scraper: {}", e)));

    match cli.command {
        Commands::Season {
            year,
            player_index,
            format,
        } => {
            let stats = scraper
                .fetch_season_stats(year, player_index)
                .await
                .unwrap_or_else(|e| fail(format!("Error fetching season stats: {}", e)));

            match format {
                OutputFormat::Json => serialize_json(&stats),
                OutputFormat::Text => {
                    if stats.is_empty() {
                        println!("No players to display.");
                    } else {
                        for (i, player) in stats.players.iter().enumerate() {
                            println!("{:>4}. {}", i + 1, player);
                        }
                        print!("{}", SeasonSummary::from_season_stats(&stats));
                    }
                }
                OutputFormat::Parquet => {
                    let path = season_stats_path(&cli.out_dir, year);
                    write_season_stats(&stats, &path).unwrap_or_else(|e| {
                        fail(format!("Error writing {}: {}", path.display(), e))
                    });
                    println!("Wrote {}", path.display());
                    print!("{}", SeasonSummary::from_season_stats(&stats));
                }
            }
        }

        Commands::GameByGame { year, teams } => {
            let teams: Vec<String> = if teams.is_empty() {
                TEAMS.iter().map(|t| t.to_string()).collect()
            } else {
                teams
            };

            let stats = scraper
                .fetch_game_by_game(year, teams.as_slice())
                .await
                .unwrap_or_else(|e| fail(format!("Error fetching game-by-game stats: {}", e)));

            let path = game_by_game_path(&cli.out_dir, year);
            write_game_by_game(&stats.rows, &path)
                .unwrap_or_else(|e| fail(format!("Error writing {}: {}", path.display(), e)));

            println!("Wrote {}", path.display());
            print!("{}", GameByGameSummary::from_game_by_game(&stats));
        }
    }
}
