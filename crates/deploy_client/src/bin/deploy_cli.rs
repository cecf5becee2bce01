//! deploy-cli: run one deploy or redeploy session against the deploy service
//! and print its transcript as it streams in.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use deploy_client::config::{self, CONFIG_ENV_VAR};
use deploy_client::logs::{self, LogLevel, LogOptions};
use deploy_client::{
    ClientError, Config, ConsoleNotifier, DeployPayload, DeployRequest, EntryKind, Session,
    SessionReport, Severity, Transcript, TranscriptEntry,
};
use tokio::sync::{broadcast, oneshot};

#[derive(Parser, Debug)]
#[command(name = "deploy-cli")]
#[command(about = "Deploy a repository to a remote host and stream the transcript")]
struct Cli {
    /// Config file (defaults to $DEPLOY_CLIENT_CONFIG, then ~/.deploy-client/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Deploy service base URL, overriding the config (e.g. ws://localhost:8000)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fresh deployment
    Deploy(TargetArgs),
    /// Redeploy an existing checkout
    Redeploy {
        #[command(flatten)]
        target: TargetArgs,

        /// Checkout directory on the remote host
        #[arg(long, default_value = ".")]
        base_path: String,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Git repository URL
    #[arg(long)]
    repo: String,

    /// Remote host address
    #[arg(long)]
    host: String,

    /// Remote user with sudo rights
    #[arg(long)]
    username: String,

    /// Private key file for the remote user
    #[arg(long)]
    key_file: PathBuf,

    /// Environment file to install on the remote host
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl TargetArgs {
    fn payload(&self) -> Result<DeployPayload, ClientError> {
        let private_key = std::fs::read_to_string(&self.key_file)?;
        let env_file_contents = match &self.env_file {
            Some(path) => std::fs::read_to_string(path)?,
            None => String::new(),
        };
        Ok(DeployPayload {
            repository_url: self.repo.clone(),
            host_address: self.host.clone(),
            username: self.username.clone(),
            private_key,
            env_file_contents,
        })
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config, ClientError> {
    if let Some(path) = explicit {
        return Ok(config::load(path)?);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(config::load(&PathBuf::from(path))?);
    }
    match config::default_config_path() {
        Some(path) => Ok(config::load_or_default(&path)?),
        None => Ok(Config::default()),
    }
}

fn build_request(command: &Command) -> Result<DeployRequest, ClientError> {
    match command {
        Command::Deploy(target) => DeployRequest::deploy(target.payload()?),
        Command::Redeploy { target, base_path } => {
            DeployRequest::redeploy(target.payload()?, Some(base_path.clone()))
        }
    }
}

fn print_entry(out: &mut impl Write, entry: &TranscriptEntry, color: bool) {
    let _ = match (entry.kind, color) {
        (EntryKind::Command, true) => {
            writeln!(out, "{} {}", "$".blue(), entry.text.as_str().blue())
        }
        (EntryKind::Command, false) => writeln!(out, "$ {}", entry.text),
        (EntryKind::Output, _) => writeln!(out, "{}", entry.text),
    };
    let _ = out.flush();
}

/// Print every entry from `printed` on and return the new count.
fn print_since(
    out: &mut impl Write,
    transcript: &Transcript,
    printed: usize,
    color: bool,
) -> usize {
    let entries = transcript.entries_since(printed);
    for entry in &entries {
        print_entry(out, entry, color);
    }
    printed + entries.len()
}

async fn run_session(session: Session<ConsoleNotifier>, base_url: &str) -> SessionReport {
    let transcript = session.transcript();
    // Appends only wake the printer; entries are read back from the
    // transcript by index, so a lagging receiver loses nothing.
    let mut live = transcript.subscribe();
    let color = io::stdout().is_terminal();
    let mut out = io::stdout();
    let mut printed = print_since(&mut out, &transcript, 0, color);

    let (close_tx, close_rx) = oneshot::channel();
    let mut close_tx = Some(close_tx);
    let run = session.run(base_url, close_rx);
    tokio::pin!(run);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let report = loop {
        tokio::select! {
            report = &mut run => break report,
            woke = live.recv() => match woke {
                Ok(_) => printed = print_since(&mut out, &transcript, printed, color),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("live feed lagged by {n} entries, catching up");
                    printed = print_since(&mut out, &transcript, printed, color);
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
            _ = &mut ctrl_c, if close_tx.is_some() => {
                tracing::info!("interrupted, closing session");
                if let Some(tx) = close_tx.take() {
                    let _ = tx.send(());
                }
            }
        }
    };

    print_since(&mut out, &transcript, printed, color);
    report
}

fn exit_code(report: &SessionReport) -> i32 {
    if !report.connected || report.last_notification == Some(Severity::Error) {
        1
    } else {
        0
    }
}

fn main() {
    let cli = Cli::parse();

    let cfg = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config: {}", e);
            process::exit(1);
        }
    };

    let level = match cli.log_level.as_deref().or(cfg.log.level.as_deref()) {
        Some(s) => match s.parse::<LogLevel>() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => LogLevel::default(),
    };
    let log_options = LogOptions {
        level,
        json: cli.log_json || cfg.log.json.unwrap_or(false),
    };
    if let Err(e) = logs::init_logging(&log_options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let request = match build_request(&cli.command) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let base_url = cli.url.clone().unwrap_or_else(|| cfg.base_url().to_string());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    let report = rt.block_on(async {
        let session = Session::new(request, ConsoleNotifier::new());
        run_session(session, &base_url).await
    });

    if !report.connected {
        eprintln!("Error: connection to {} failed", base_url);
    }
    process::exit(exit_code(&report));
}
