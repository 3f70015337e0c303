use std::path::PathBuf;

use ai_15puzzle::board::Board;
use ai_15puzzle::config::CacheConfig;
use ai_15puzzle::reference::{CanonicalKey, ReferenceAccumulator};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "refcache",
    version,
    about = "Inspect and maintain the 15-puzzle reference-board archive"
)]
struct Cli {
    /// JSON config file (path, cutoff_buffer, default_cutoff)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Archive path, overriding the config
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,
    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print archive size, cutoff, and record counts
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Print every record
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change the cutoff setting (1-10 seconds)
    Cutoff {
        #[arg(value_name = "SECONDS", allow_negative_numbers = true)]
        seconds: i32,
    },
    /// Rewrite the archive compactly
    Refresh,
    /// Restore the default boards and cutoff
    Reset,
    /// Remove a board's record (default boards are kept)
    Remove {
        /// 16 tile values, row-major, 0 for the blank
        #[arg(num_args = 16, value_name = "TILE")]
        tiles: Vec<u8>,
    },
    /// Show what the archive knows about a board
    Contains {
        /// 16 tile values, row-major, 0 for the blank
        #[arg(num_args = 16, value_name = "TILE")]
        tiles: Vec<u8>,
    },
}

fn parse_board(tiles: &[u8]) -> anyhow::Result<Board> {
    let arr: [u8; 16] = tiles
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected 16 tiles, got {}", tiles.len()))?;
    let board = Board::from_tiles(arr)?;
    if !board.is_solvable() {
        anyhow::bail!("board is not solvable:\n{board}");
    }
    Ok(board)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &cli.log_level),
    )
    .format_timestamp(None)
    .init();

    let mut config = match &cli.config {
        Some(path) => CacheConfig::from_json_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => CacheConfig::default(),
    };
    if let Some(db) = cli.db {
        config.path = db;
    }

    let mut acc = ReferenceAccumulator::open(&config);
    match cli.cmd {
        Command::Status { json } => {
            let status = acc.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                let size = status.file_size.unwrap_or(0);
                println!("Data file: {} ({size} bytes)", status.path.display());
                println!("Boards taking over {}s are stored.", status.cutoff_setting);
                println!("{} boards stored, {} fully verified.", status.records, status.completed);
                println!("Cutoff limit with buffer: {:.2}s", status.cutoff_limit);
            }
        }
        Command::List { json } => {
            let mut entries: Vec<_> = acc.active_map().iter().collect();
            entries.sort_by_key(|(k, _)| (k.group(), k.transform_key()));
            if json {
                let rows: Vec<_> = entries
                    .iter()
                    .map(|(k, r)| {
                        serde_json::json!({
                            "transform_key": format!("{:016x}", k.transform_key()),
                            "group": k.group(),
                            "tiles": k.tiles(),
                            "estimates": r.estimates(),
                            "partial_paths": r.partial_paths(),
                            "status": r.status(),
                            "default": acc.is_default(k),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (i, (k, r)) in entries.iter().enumerate() {
                    let tag = if acc.is_default(k) { " (default)" } else { "" };
                    println!("{} : {:?}{tag}", i + 1, k);
                    print!("{}", k.board());
                    for slot in 0..4u8 {
                        println!(
                            "  slot {slot}: {:>2} {} {:?}",
                            r.estimate(slot),
                            if r.is_verified(slot) { "verified" } else { "estimate" },
                            r.initial_moves(slot, false),
                        );
                    }
                }
            }
        }
        Command::Cutoff { seconds } => {
            if !acc.set_cutoff_archive(seconds) {
                anyhow::bail!("cutoff unchanged at {}s", acc.cutoff_setting());
            }
            println!("Cutoff archive limit: {}s", acc.cutoff_setting());
        }
        Command::Refresh => {
            acc.refresh_file();
            println!("Rewrote {} boards to {}", acc.active_map().len(), acc.path().display());
        }
        Command::Reset => {
            acc.reset();
            println!("Restored {} default boards", acc.active_map().len());
        }
        Command::Remove { tiles } => {
            let board = parse_board(&tiles)?;
            if acc.remove_board(&board) {
                println!("Removed {:?}", CanonicalKey::from_board(&board));
            } else {
                println!("Nothing removed (absent or a default board)");
            }
        }
        Command::Contains { tiles } => {
            let board = parse_board(&tiles)?;
            match acc.lookup(&board, true) {
                Some(hit) => {
                    println!(
                        "Estimate {} ({})",
                        hit.estimate,
                        if hit.verified { "verified" } else { "lower bound" }
                    );
                    if let Some(moves) = hit.initial_moves {
                        println!("Initial moves: {moves:?}");
                    }
                }
                None => println!("Not a reference board"),
            }
        }
    }
    Ok(())
}
