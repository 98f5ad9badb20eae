//! # MemeTrend CLI (`memetrend`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `memetrend init` | Write a starter config and create the data directory |
//! | `memetrend add --text .. --desc ..` | Store a meme |
//! | `memetrend list` | Print stored memes |
//! | `memetrend trends` | Virality scores, category means, and the chart |
//! | `memetrend index build` | Build and persist the search index |
//! | `memetrend index status` | Whether the persisted index is missing, stale, or current |
//! | `memetrend ask "<query>"` | Ask the oracle about trends |
//! | `memetrend serve` | Start the HTTP API |
//!
//! Logs go to stderr (`RUST_LOG` or `-v`); results go to stdout.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use memetrend::config::{self, Config};
use memetrend::embedding::create_embedder;
use memetrend::llm::DisabledChat;
use memetrend::server;
use memetrend::session::{check_query, IndexOrigin, IndexStatus, NewMeme, Session};
use memetrend_core::MemeError;

const DEFAULT_QUERY: &str = "Predict next big data tool from memes?";

/// MemeTrend: a meme-powered data analytics oracle.
#[derive(Parser)]
#[command(
    name = "memetrend",
    about = "Meme-powered data analytics oracle: store memes, score virality, and ask about trends",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/memetrend.toml")]
    config: PathBuf,

    /// Debug logging on stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file and create the data directory.
    Init,

    /// Add a meme to the store.
    Add {
        /// Meme text, e.g. "Pandas is slow #DataScience".
        #[arg(long)]
        text: String,
        /// Short description of the image.
        #[arg(long)]
        desc: String,
        #[arg(long, default_value_t = 50)]
        likes: u64,
        #[arg(long, default_value_t = 10)]
        retweets: u64,
    },

    /// Print stored memes.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Score memes, summarize by category, and redraw the chart.
    Trends {
        #[arg(long)]
        json: bool,
    },

    /// Manage the search index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Ask a question about meme trends.
    Ask {
        #[arg(default_value = DEFAULT_QUERY)]
        query: String,
        /// Rebuild the index even if the persisted one is current.
        #[arg(long)]
        rebuild: bool,
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum IndexAction {
    /// Build and persist the index over all stored memes.
    Build,
    /// Report whether the persisted index is missing, stale, or current.
    Status,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("memetrend=debug,memetrend_core=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{}", describe_error(&err));
        std::process::exit(1);
    }
}

/// One line per failure kind so the user knows what to do next.
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<MemeError>() {
        Some(MemeError::EmptyCorpus) => {
            "No memes yet. Add one with `memetrend add --text .. --desc ..` first.".to_string()
        }
        Some(MemeError::IndexNotReady) => {
            "Index not built. Run `memetrend index build` first.".to_string()
        }
        Some(MemeError::IndexUnavailable(reason)) => format!(
            "Index not built or unreadable ({}). Run `memetrend index build` or ask with --rebuild.",
            reason
        ),
        Some(e @ (MemeError::GenerationFailed(_) | MemeError::Timeout { .. })) => {
            format!("Error generating insights: {}", e)
        }
        _ => format!("Error: {:#}", err),
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        return run_init(&cli.config);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => unreachable!("handled before config loading"),
        Commands::Add {
            text,
            desc,
            likes,
            retweets,
        } => {
            let meme = NewMeme {
                text,
                image_desc: desc,
                likes,
                retweets,
            };
            meme.validate().map_err(anyhow::Error::msg)?;
            let record = Session::offline(&cfg)?.add_meme(meme)?;
            println!("Added meme: {}", record.text);
        }
        Commands::List { json } => {
            let memes = Session::offline(&cfg)?.memes()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&memes)?);
            } else if memes.is_empty() {
                println!("No memes yet.");
            } else {
                for (i, m) in memes.iter().enumerate() {
                    println!(
                        "{:>3}. {} | {} (likes {}, retweets {}, {})",
                        i + 1,
                        m.text,
                        m.image_desc,
                        m.metadata.likes,
                        m.metadata.retweets,
                        m.metadata.date
                    );
                }
            }
        }
        Commands::Trends { json } => run_trends(&cfg, json)?,
        Commands::Index { action } => {
            let mut session =
                Session::with_providers(&cfg, create_embedder(&cfg.embedding)?, Arc::new(DisabledChat))?;
            match action {
                IndexAction::Build => {
                    let info = session.build_index().await?;
                    println!(
                        "Index built: {} units, model {} ({} dims) at {}",
                        info.units,
                        info.model,
                        info.dims,
                        session.index_dir().display()
                    );
                }
                IndexAction::Status => match session.index_status()? {
                    IndexStatus::Missing => {
                        println!("Index not built. Run `memetrend index build`.");
                    }
                    IndexStatus::Stale(info) => {
                        println!(
                            "Index is stale: {} units, model {}. It will be rebuilt on the next `ask`.",
                            info.units, info.model
                        );
                    }
                    IndexStatus::Current(info) => {
                        println!(
                            "Index is current: {} units, model {} ({} dims).",
                            info.units, info.model, info.dims
                        );
                    }
                },
            }
        }
        Commands::Ask {
            query,
            rebuild,
            json,
        } => {
            check_query(&query)?;
            let mut session = Session::from_config(&cfg)?;
            if session.ensure_index(rebuild).await? == IndexOrigin::Built {
                eprintln!("Index rebuilt.");
            }
            let report = session.ask(&query, false).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.text);
                println!();
                println!("Sources:");
                for s in &report.sources {
                    println!("  [{}] {:.3}  {}", s.unit.id, s.score, s.unit.text);
                }
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn run_init(config_path: &std::path::Path) -> Result<()> {
    config::scaffold_config(config_path)?;
    let cfg = config::load_config(config_path)?;
    if let Some(dir) = cfg.store.path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    println!("Created config at {}", config_path.display());
    Ok(())
}

fn run_trends(cfg: &Config, json: bool) -> Result<()> {
    let report = Session::offline(cfg)?.trends(Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.memes.is_empty() {
        println!("No memes yet. Add one with `memetrend add --text .. --desc ..` first.");
        return Ok(());
    }

    println!("Meme virality:");
    for scored in &report.memes {
        println!(
            "  {:>10.2}  {:<10}  {}",
            scored.score,
            scored.category.label(),
            scored.record.text
        );
    }
    println!();
    println!("Category means:");
    for summary in &report.categories {
        println!(
            "  {:<10}  {:>10.2}  ({} memes)",
            summary.category.label(),
            summary.mean_score,
            summary.count
        );
    }
    match &report.chart {
        Some(path) => println!("\nChart written to {}", path.display()),
        None => println!("\nChart not written (see warnings above)."),
    }
    Ok(())
}
