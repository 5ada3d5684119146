pub mod api;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod logging;
pub mod model;
pub mod poller;
pub mod session;
pub mod ui;
pub mod viewport;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use config::Config;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "detection-watch",
    version,
    about = "TUI client for a live detection-event catalog server"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch interactive TUI
    Tui {
        /// Catalog server base URL (default http://127.0.0.1:8000)
        #[arg(long)]
        server: Option<String>,

        /// Render once and exit (headless-friendly)
        #[arg(long, default_value_t = false)]
        once: bool,
    },
    /// Fetch one snapshot, reconcile, and print the catalog
    Snapshot {
        /// Catalog server base URL
        #[arg(long)]
        server: Option<String>,

        /// Emit the reconciled catalog as JSON instead of a summary table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Clear all server-side detection state
    Reset {
        /// Catalog server base URL
        #[arg(long)]
        server: Option<String>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tui { server, once } => {
            let config = Config::from_env().with_server(server);
            ui::tui::run_tui(config, once)
        }
        Commands::Snapshot { server, json } => {
            logging::init_cli();
            run_snapshot(Config::from_env().with_server(server), json)
        }
        Commands::Reset { server } => {
            logging::init_cli();
            run_reset(Config::from_env().with_server(server))
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dwatch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

/// One-shot catalog fetch + reconcile, printed to stdout.
fn run_snapshot(config: Config, json: bool) -> Result<()> {
    use anyhow::Context;

    let client = api::ApiClient::new(&config);
    let snapshot = client
        .fetch_snapshot()
        .with_context(|| format!("fetching snapshot from {}", config.server))?;
    let out = catalog::reconcile(snapshot, &session::Selection::default());

    if json {
        println!("{}", serde_json::to_string_pretty(&out.catalog)?);
        return Ok(());
    }

    println!(
        "{} entities, {} detections",
        out.catalog.entities.len(),
        out.catalog.total_frames
    );
    for entity in &out.catalog.entities {
        let latest = entity.latest();
        println!(
            "  {:<20} {:>4} frames   last seen {} {}",
            entity.name,
            entity.history.len(),
            latest.date,
            latest.time
        );
    }
    Ok(())
}

fn run_reset(config: Config) -> Result<()> {
    use anyhow::Context;

    let client = api::ApiClient::new(&config);
    client
        .reset()
        .with_context(|| format!("resetting server at {}", config.server))?;
    println!("Server state cleared.");
    Ok(())
}

/// Platform data dir for logs and scratch state.
pub fn default_data_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("com", "detection-watch", "detection-watch")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from(".dwatch"))
}
