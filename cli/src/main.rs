//! pollbox — command-line administration of a single voting station.

use std::path::PathBuf;

use clap::Parser;

use pollbox_station::{init_logging, Station, StationConfig};
use pollbox_types::{CandidateId, ElectionId, Timestamp};

#[derive(Parser)]
#[command(name = "pollbox", about = "Single-station election administration")]
struct Cli {
    /// Data directory for the LMDB store.
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "POLLBOX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POLLBOX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "POLLBOX_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Manage elections.
    Election {
        #[command(subcommand)]
        action: ElectionAction,
    },
    /// Manage an election's candidate roster.
    Candidate {
        #[command(subcommand)]
        action: CandidateAction,
    },
    /// Check whether an election is ready for voting.
    Roster {
        #[arg(long)]
        election: u64,
    },
    /// Show the current tally of an election.
    Tally {
        #[arg(long)]
        election: u64,
    },
    /// Delete every vote of an election (candidates are kept).
    Clear {
        #[arg(long)]
        election: u64,
        #[arg(long, env = "POLLBOX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(clap::Subcommand)]
enum ElectionAction {
    /// Create an election protected by an administrator password.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, env = "POLLBOX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List all elections, newest first.
    List,
    /// Delete an election and all its candidates and votes.
    Delete {
        #[arg(long)]
        election: u64,
        #[arg(long, env = "POLLBOX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(clap::Subcommand)]
enum CandidateAction {
    /// Register a candidate with a ballot symbol image.
    Add {
        #[arg(long)]
        election: u64,
        #[arg(long)]
        name: String,
        /// Path to the symbol image file.
        #[arg(long)]
        symbol: PathBuf,
    },
    /// List an election's candidates.
    List {
        #[arg(long)]
        election: u64,
    },
    /// Replace a candidate's name and symbol.
    Edit {
        #[arg(long)]
        candidate: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: PathBuf,
    },
    /// Remove a candidate and its votes.
    Remove {
        #[arg(long)]
        candidate: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => StationConfig::from_toml_file(
            path.to_str()
                .ok_or_else(|| anyhow::anyhow!("config path is not valid UTF-8"))?,
        )?,
        None => StationConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }

    init_logging(config.log_format.parse()?, &config.log_level);
    tracing::debug!(data_dir = %config.data_dir.display(), "starting pollbox");

    let station = Station::open(&config)?;
    match cli.command {
        Command::Election { action } => match action {
            ElectionAction::Create { name, password } => {
                let id = station.create_election(&name, &password, Timestamp::now())?;
                println!("created election {id} ('{name}')");
            }
            ElectionAction::List => {
                let elections = station.list_elections()?;
                if elections.is_empty() {
                    println!("no elections");
                }
                for election in elections {
                    println!(
                        "{:>6}  {}  (created {})",
                        election.id, election.name, election.created_at
                    );
                }
            }
            ElectionAction::Delete { election, password } => {
                station.delete_election(ElectionId::new(election), &password)?;
                println!("deleted election {election}");
            }
        },
        Command::Candidate { action } => match action {
            CandidateAction::Add {
                election,
                name,
                symbol,
            } => {
                let id = station.add_candidate(
                    ElectionId::new(election),
                    &name,
                    &symbol.to_string_lossy(),
                )?;
                println!("added candidate {id} ('{name}')");
            }
            CandidateAction::List { election } => {
                let candidates = station.list_candidates(ElectionId::new(election))?;
                if candidates.is_empty() {
                    println!("no candidates");
                }
                for candidate in candidates {
                    println!(
                        "{:>6}  {}  {}",
                        candidate.id,
                        candidate.name,
                        candidate.symbol.as_deref().unwrap_or("-")
                    );
                }
            }
            CandidateAction::Edit {
                candidate,
                name,
                symbol,
            } => {
                station.edit_candidate(
                    CandidateId::new(candidate),
                    &name,
                    &symbol.to_string_lossy(),
                )?;
                println!("updated candidate {candidate}");
            }
            CandidateAction::Remove { candidate } => {
                station.remove_candidate(CandidateId::new(candidate))?;
                println!("removed candidate {candidate}");
            }
        },
        Command::Roster { election } => {
            let verdict = station.roster_check(ElectionId::new(election))?;
            println!("{verdict}");
        }
        Command::Tally { election } => {
            let rows = station.tally(ElectionId::new(election))?;
            let total: u64 = rows.iter().map(|r| r.votes).sum();
            for row in &rows {
                println!(
                    "{:>6}  {:<24} {:>6}  {:>6.2}%",
                    row.candidate, row.name, row.votes, row.percentage
                );
            }
            println!("total: {total}");
        }
        Command::Clear { election, password } => {
            let removed = station.clear_votes(ElectionId::new(election), &password)?;
            println!("cleared {removed} votes from election {election}");
        }
    }
    Ok(())
}
