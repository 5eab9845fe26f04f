use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use wordup::app::App;
use wordup::config::{Config, MAX_QUICK_TEST_SIZE};
use wordup::engine::notebook::WordFilter;
use wordup::session::selection::ReviewMode;

#[derive(Parser)]
#[command(name = "wordup", version, about = "Wrong-word notebook and review quiz")]
struct Cli {
    #[arg(long, global = true, help = "Directory holding the wrong-word book")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Reference pool for distractors (cet4, cet6)")]
    pool: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Review non-mastered wrong words
    Review {
        #[arg(long, help = "Only the most-missed words", conflicts_with = "word")]
        quick: bool,
        #[arg(
            long,
            value_parser = clap::value_parser!(u64).range(1..=MAX_QUICK_TEST_SIZE as u64),
            help = "Number of words in a quick test (1-100)"
        )]
        size: Option<u64>,
        #[arg(long, help = "Drill a single word")]
        word: Option<String>,
    },
    /// List wrong words
    List {
        #[arg(short, long, value_enum, default_value_t = WordFilter::All)]
        filter: WordFilter,
    },
    /// Show review statistics
    Stats,
    /// Record a reciting miss from a JSON word record
    Miss { file: PathBuf },
    /// Remove a word from the book
    Remove { word: String },
    /// Remove every word from the book
    Clear {
        #[arg(long, help = "Confirm clearing")]
        yes: bool,
    },
    /// Export all data to a JSON file
    Export { path: PathBuf },
    /// Replace all data with an export file
    Import { path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("could not load config, using defaults: {e:#}");
        Config::default()
    });
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(pool) = cli.pool {
        config.reference_pool = pool;
    }

    let mut app = App::new(config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Review { quick, size, word } => {
            let mode = match (word, quick) {
                (Some(word), _) => ReviewMode::Single(word),
                (None, true) => ReviewMode::QuickTest {
                    size: size.map_or(app.config.quick_test_size, |n| n as usize),
                },
                (None, false) => ReviewMode::Full,
            };
            let mut input = io::stdin().lock();
            app.review(&mode, &mut input, &mut out)?;
        }
        Command::List { filter } => app.list(filter, &mut out)?,
        Command::Stats => app.stats(&mut out)?,
        Command::Miss { file } => {
            let word = app.record_miss_file(&file)?;
            writeln!(out, "Recorded miss for {word}.")?;
        }
        Command::Remove { word } => {
            if app.remove(&word)? {
                writeln!(out, "Removed {word}.")?;
            } else {
                writeln!(out, "{word} is not in the book.")?;
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("clearing cannot be undone; pass --yes to confirm");
            }
            match app.clear()? {
                0 => writeln!(out, "The book is already empty.")?,
                n => writeln!(out, "Removed {n} word(s).")?,
            }
        }
        Command::Export { path } => {
            app.export(&path)?;
            writeln!(out, "Exported to {}.", path.display())?;
        }
        Command::Import { path } => {
            app.import(&path)?;
            writeln!(out, "Imported {}.", path.display())?;
        }
    }
    Ok(())
}
