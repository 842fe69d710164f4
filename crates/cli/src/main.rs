mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use logstore::{EventRecord, LogStore};
use rpc::Server;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "eventlog.toml";

#[derive(Parser)]
#[command(name = "eventlog")]
#[command(about = "Append-only session event log", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./eventlog.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the log files (overrides [store].dir)
    #[arg(short, long, global = true, env = "EVENTLOG_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an event to a session
    Event {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Event name
        #[arg(short, long)]
        event: String,
        /// JSON payload
        #[arg(long)]
        data: Option<String>,
    },
    /// Append a line to the summary log
    Summary {
        /// Line of text (no line breaks)
        text: String,
    },
    /// List all sessions
    Sessions {
        /// Show only the first N sessions
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show events for a session
    Logs {
        /// Session ID (prefix match supported)
        #[arg(short, long)]
        session: String,
    },
    /// Print the summary log
    Summaries {
        /// Show only the last N lines
        #[arg(short, long)]
        tail: Option<usize>,
    },
    /// Serve JSON-RPC requests on stdin/stdout
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.store.dir = dir;
    }
    init_logging(&config.logging.level);

    let store = LogStore::open(&config.store);
    tracing::debug!(
        events = %store.events_path().display(),
        summary = %store.summary_path().display(),
        "opened log store"
    );

    match cli.command {
        Commands::Event {
            session,
            event,
            data,
        } => cmd_event(&store, &session, &event, data.as_deref()),
        Commands::Summary { text } => cmd_summary(&store, &text),
        Commands::Sessions { limit } => cmd_sessions(&store, limit),
        Commands::Logs { session } => cmd_logs(&store, &session),
        Commands::Summaries { tail } => cmd_summaries(&store, tail),
        Commands::Serve => cmd_serve(store, &config).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if std::path::Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

/// Diagnostics go to stderr; stdout carries command output and RPC traffic.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_event(store: &LogStore, session: &str, event: &str, data: Option<&str>) -> Result<()> {
    let data = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(Error::InvalidData)?;
    store.append_event(session, event, data)?;
    Ok(())
}

fn cmd_summary(store: &LogStore, text: &str) -> Result<()> {
    store.append_summary_line(text)?;
    Ok(())
}

fn cmd_sessions(store: &LogStore, limit: usize) -> Result<()> {
    let sessions = store.list_sessions()?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<16}  EVENTS",
        "SESSION ID", "STARTED", "LAST ACTIVITY"
    );
    println!("{}", "-".repeat(80));

    for session in sessions.iter().take(limit) {
        let started = session.started_at().map(format_datetime).unwrap_or_default();
        let last = session
            .last_activity()
            .map(format_datetime)
            .unwrap_or_default();
        println!(
            "{:<36}  {:<16}  {:<16}  {}",
            session.session_id,
            started,
            last,
            session.len()
        );
    }

    if sessions.len() > limit {
        println!("... {} more", sessions.len() - limit);
    }

    Ok(())
}

fn cmd_logs(store: &LogStore, session_prefix: &str) -> Result<()> {
    let sessions = store.list_sessions()?;

    // Exact match wins over prefix matches.
    let session = match sessions.iter().find(|s| s.session_id == session_prefix) {
        Some(session) => session,
        None => {
            let matching: Vec<_> = sessions
                .iter()
                .filter(|s| s.session_id.starts_with(session_prefix))
                .collect();
            match matching.as_slice() {
                [] => {
                    return Err(Error::SessionNotFound {
                        prefix: session_prefix.to_string(),
                    });
                }
                [session] => *session,
                _ => {
                    return Err(Error::AmbiguousSession {
                        prefix: session_prefix.to_string(),
                        matches: matching.iter().map(|s| s.session_id.clone()).collect(),
                    });
                }
            }
        }
    };

    println!("Session: {}\n", session.session_id);
    for event in &session.events {
        print_event(event);
    }

    Ok(())
}

fn cmd_summaries(store: &LogStore, tail: Option<usize>) -> Result<()> {
    let lines = store.read_summary_lines()?;
    let skip = tail.map_or(0, |n| lines.len().saturating_sub(n));
    for line in &lines[skip..] {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_serve(store: LogStore, config: &Config) -> Result<()> {
    let server = Arc::new(Server::new(store, config.server.to_server_config()?));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await?;
    Ok(())
}

fn print_event(event: &EventRecord) {
    let time = event.timestamp.with_timezone(&Local).format("%H:%M:%S");

    match &event.data {
        Some(data) => {
            // Truncate long payloads for display
            let mut payload = data.to_string();
            if payload.len() > 200 {
                let cut = (0..=200).rev().find(|&i| payload.is_char_boundary(i)).unwrap_or(0);
                payload.truncate(cut);
                payload.push_str("...");
            }
            println!("[{time}] {} {payload}", event.event);
        }
        None => println!("[{time}] {}", event.event),
    }
}

fn format_datetime(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
