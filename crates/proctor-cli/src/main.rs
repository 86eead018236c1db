//! Proctor - interview integrity monitoring CLI
//!
//! The `proctor` command talks to the reporting backend and replays
//! recorded signal traces offline.
//!
//! ## Commands
//!
//! - `session`: create, show, list or end interview sessions
//! - `events`: list the violation events stored for a session
//! - `report`: print the backend's integrity report for a session
//! - `replay`: run a JSON-lines signal trace through the debounce engine

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use proctor_core::{load_trace, replay_signals, ProctorConfig, ReplayOutcome};
use proctor_store::{
    BackendConfig, EventStore, EventType, NewSession, RestBackend, SessionId, SessionRecord,
    SessionStore,
};

#[derive(Parser)]
#[command(name = "proctor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interview integrity monitoring", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Reporting backend base URL
    #[arg(long, global = true, env = "PROCTOR_BACKEND_URL")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage interview sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// List violation events recorded for a session
    Events {
        /// Session ID
        session: String,

        /// Print raw JSON instead of a table
        #[arg(long)]
        raw: bool,
    },

    /// Show the integrity report for a session
    Report {
        /// Session ID
        session: String,

        /// Print raw JSON instead of a summary
        #[arg(long)]
        raw: bool,
    },

    /// Replay a recorded signal trace (one FrameSignal JSON object per line)
    Replay {
        /// Path to the JSON-lines trace
        #[arg(short, long)]
        trace: PathBuf,

        /// Session ID to attribute replayed events to
        #[arg(short, long, default_value = "replay")]
        session: String,

        /// Print the full outcome as JSON
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Create a new session
    Create {
        /// Candidate name
        #[arg(short, long)]
        candidate: String,

        /// Interviewer name
        #[arg(short, long)]
        interviewer: String,
    },

    /// Show one session
    Show {
        /// Session ID
        session: String,
    },

    /// List all sessions
    List,

    /// Mark a session as ended
    End {
        /// Session ID
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    proctor_core::telemetry::init_tracing(cli.json, level);

    let backend_url = cli.backend.as_deref();
    match cli.command {
        Commands::Session { action } => {
            let backend = connect(backend_url)?;
            match action {
                SessionAction::Create {
                    candidate,
                    interviewer,
                } => cmd_session_create(&backend, &candidate, &interviewer)
                    .await
                    .map(|_| ()),
                SessionAction::Show { session } => cmd_session_show(&backend, &session).await,
                SessionAction::List => cmd_session_list(&backend).await,
                SessionAction::End { session } => cmd_session_end(&backend, &session).await,
            }
        }
        Commands::Events { session, raw } => {
            cmd_events(&connect(backend_url)?, &session, raw).await
        }
        Commands::Report { session, raw } => {
            cmd_report(&connect(backend_url)?, &session, raw).await
        }
        Commands::Replay {
            trace,
            session,
            raw,
        } => cmd_replay(&trace, &session, raw),
    }
}

fn connect(base_url: Option<&str>) -> Result<RestBackend> {
    let mut config = BackendConfig::from_env();
    if let Some(url) = base_url {
        config = BackendConfig::new(url).with_timeout(config.timeout);
    }
    info!(backend = %config.base_url, "using reporting backend");
    RestBackend::new(config).context("Failed to build backend client")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn print_session(record: &SessionRecord) {
    println!("session     {}", record.id);
    println!("candidate   {}", record.candidate_name);
    println!("interviewer {}", record.interviewer_name);
    println!("status      {}", record.status);
    println!(
        "started     {}",
        record.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(end) = record.end_time {
        println!("ended       {}", end.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("events      {}", record.total_events);
    println!("integrity   {:.1}", record.integrity_score);
}

/// Create a session
async fn cmd_session_create(
    store: &dyn SessionStore,
    candidate: &str,
    interviewer: &str,
) -> Result<SessionRecord> {
    let record = store
        .create_session(NewSession::new(candidate, interviewer))
        .await
        .context("Failed to create session")?;
    println!("Created session {}", record.id);
    Ok(record)
}

/// Show one session
async fn cmd_session_show(store: &dyn SessionStore, session: &str) -> Result<()> {
    let record = store
        .get_session(&SessionId::from(session))
        .await
        .context(format!("Failed to load session {}", session))?;
    print_session(&record);
    Ok(())
}

/// List sessions, oldest first
async fn cmd_session_list(store: &dyn SessionStore) -> Result<()> {
    let sessions = store
        .list_sessions()
        .await
        .context("Failed to list sessions")?;
    if sessions.is_empty() {
        println!("No sessions found");
        return Ok(());
    }
    for record in sessions {
        println!(
            "{}  {:<10} {:>4} events  {:<24} {}",
            record.id,
            record.status.to_string(),
            record.total_events,
            record.candidate_name,
            record.start_time.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// End a session
async fn cmd_session_end(store: &dyn SessionStore, session: &str) -> Result<()> {
    let receipt = store
        .end_session(&SessionId::from(session))
        .await
        .context(format!("Failed to end session {}", session))?;
    println!("{}", receipt.message);
    println!("Integrity score: {:.1}", receipt.integrity_score);
    Ok(())
}

/// List violation events for a session
async fn cmd_events(store: &dyn EventStore, session: &str, raw: bool) -> Result<()> {
    let events = store
        .list_events(&SessionId::from(session))
        .await
        .context(format!("Failed to load events for session {}", session))?;
    if raw {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No events recorded for {}", session);
        return Ok(());
    }
    for event in events {
        println!(
            "{}  {:<16} {:>5.2}  {}",
            event.timestamp.format("%H:%M:%S"),
            event.event_type.as_str(),
            event.confidence,
            event.details
        );
    }
    Ok(())
}

/// Show the backend's integrity report
async fn cmd_report(backend: &RestBackend, session: &str, raw: bool) -> Result<()> {
    let report = backend
        .get_report(&SessionId::from(session))
        .await
        .context(format!("Failed to load report for session {}", session))?;
    if raw {
        return print_json(&report);
    }
    print_session(&report.session);
    println!();
    for event_type in EventType::ALL {
        println!(
            "{:<16} {}",
            event_type.as_str(),
            report.summary.count_for(event_type)
        );
    }
    if !report.summary.detected_objects.is_empty() {
        println!(
            "objects          {}",
            report.summary.detected_objects.join(", ")
        );
    }
    Ok(())
}

/// Replay a signal trace offline using `PROCTOR_*` tunables
fn cmd_replay(trace: &Path, session: &str, raw: bool) -> Result<()> {
    let config = ProctorConfig::from_env();
    let outcome = replay_trace(trace, session, &config)?;
    if raw {
        return print_json(&outcome);
    }

    println!(
        "Replayed {} ticks ({} skipped), {}s of session time",
        outcome.ticks, outcome.ticks_skipped, outcome.elapsed_seconds
    );
    for v in &outcome.violations {
        println!(
            "{:>7.1}s  {:<16} {}",
            Duration::from_millis(v.at_ms).as_secs_f64(),
            v.event_type.as_str(),
            v.details
        );
    }
    println!();
    for event_type in EventType::ALL {
        println!(
            "{:<16} {}",
            event_type.as_str(),
            outcome.counters.get(event_type)
        );
    }
    println!("Total violations: {}", outcome.counters.total());
    Ok(())
}

fn replay_trace(trace: &Path, session: &str, config: &ProctorConfig) -> Result<ReplayOutcome> {
    let signals =
        load_trace(trace).context(format!("Failed to read trace {}", trace.display()))?;
    Ok(replay_signals(SessionId::from(session), config, &signals))
}
