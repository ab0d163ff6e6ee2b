use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gsm_buttons::EntryPoint;
use serde_json::Value;
use tracing::debug;

mod commands;
mod config;

use commands::{Entry, Report};
use config::PreviewConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    gsm_telemetry::install("greentic-buttons")?;
    let cli = Cli::parse();
    let report = match cli.command {
        CliCommand::Validate { entry, input } => {
            let payload = read_json(&input)?;
            commands::validate(entry.into(), &payload)
        }
        CliCommand::Preview {
            entry,
            to,
            sender,
            echo,
            options,
            input,
        } => {
            let payload = read_json(&input)?;
            let options = options.as_deref().map(read_json).transpose()?;
            let config = PreviewConfig::from_env().with_overrides(sender, echo);
            debug!(sender = %config.sender_jid, echo = config.emit_own_events, "preview configuration");
            commands::preview(entry, &to, &payload, options, &config).await?
        }
        CliCommand::Nodes { group, input } => {
            let body = read_json(&input)?;
            commands::nodes(&body, group)
        }
    };
    print_report(&report)
}

#[derive(Parser, Debug)]
#[command(
    name = "greentic-buttons",
    version,
    about = "Validate and preview interactive button payloads"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run the strict and authoring validators over a payload
    Validate {
        #[arg(long, value_enum, default_value = "interactive")]
        entry: ValidateEntry,
        /// Payload file, or `-` for stdin.
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },
    /// Dispatch a payload against the dry-run transport and print what would be sent
    Preview {
        #[arg(long, value_enum, default_value = "interactive")]
        entry: Entry,
        /// Destination JID; a `@g.us` suffix marks a group.
        #[arg(long)]
        to: String,
        /// Sender JID (overrides GSM_SENDER_JID).
        #[arg(long)]
        sender: Option<String>,
        /// Echo sent messages locally (same as GSM_EMIT_OWN_EVENTS=true).
        #[arg(long)]
        echo: bool,
        /// JSON file with send options.
        #[arg(long, value_name = "PATH")]
        options: Option<PathBuf>,
        /// Payload file, or `-` for stdin.
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },
    /// Classify a canonical body and print the node tree it would carry
    Nodes {
        /// Treat the destination as a group (no bot node).
        #[arg(long)]
        group: bool,
        /// Body file, or `-` for stdin.
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ValidateEntry {
    Basic,
    Interactive,
}

impl From<ValidateEntry> for EntryPoint {
    fn from(entry: ValidateEntry) -> Self {
        match entry {
            ValidateEntry::Basic => EntryPoint::BasicButtons,
            ValidateEntry::Interactive => EntryPoint::Interactive,
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read stdin")?;
        raw
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("failed to parse json {}", path.display()))
}

fn print_report(report: &Report) -> Result<ExitCode> {
    let rendered = serde_json::to_string_pretty(&report.output)?;
    println!("{rendered}");
    Ok(if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
