//! Flowtrace - call sequence reconstruction for captured interaction events
//!
//! Reads an unordered capture of request/response observations, pairs the
//! legs of each call, and reconstructs the causally ordered sequence.

use clap::{Parser, Subcommand};
use flowtrace_core::EventRecord;
use flowtrace_correlate::{correlate, sequence};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod demo;
mod jsonl;

use config::{ConfigLoader, OutputFormat};

#[derive(Parser)]
#[command(name = "flowtrace")]
#[command(version)]
#[command(about = "Reconstructs causally ordered call sequences from captured events", long_about = None)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FLOWTRACE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct the ordered call sequence from a capture
    Sequence {
        /// Input file (JSONL, one event record per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, jsonl)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Dump the correlation mapping: every request paired with its response
    Pairs {
        /// Input file (JSONL, one event record per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a sample capture exercising the reconstruction
    Demo {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of top-level calls to generate
        #[arg(long, default_value = "3")]
        calls: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .with_cli_path(cli.config.clone())
        .load()?;

    // CLI verbose flag takes precedence, then config, then default
    let log_level = if cli.verbose > 0 {
        match cli.verbose {
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    } else {
        match config.general.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Sequence {
            input,
            output,
            format,
        } => {
            let format = match format.as_deref() {
                Some(f) => f.parse()?,
                None => config.output.format,
            };
            sequence_command(&input, output.as_deref(), format)
        }
        Commands::Pairs { input, output } => pairs_command(&input, output.as_deref()),
        Commands::Demo { output, calls } => demo_command(output.as_deref(), calls),
    }
}

fn sequence_command(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let events = jsonl::read_events(input)?;
    info!("Read {} events from {}", events.len(), input.display());

    let mapping = correlate(events);
    let ordered = sequence(&mapping);
    info!("Reconstructed sequence of {} events", ordered.len());

    match format {
        OutputFormat::Jsonl => jsonl::write_events(output, &ordered)?,
        OutputFormat::Text => write_text(output, &ordered)?,
    }
    Ok(())
}

fn pairs_command(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let events = jsonl::read_events(input)?;
    info!("Read {} events from {}", events.len(), input.display());

    let mapping = correlate(events);
    let records: Vec<EventRecord> = mapping.into_values().collect();
    jsonl::write_events(output, &records)?;
    Ok(())
}

fn demo_command(output: Option<&Path>, calls: usize) -> anyhow::Result<()> {
    let events = demo::generate(calls);
    info!("Generated {} sample events", events.len());
    jsonl::write_events(output, &events)?;
    Ok(())
}

/// Render one human-readable line per event
fn write_text(output: Option<&Path>, ordered: &[EventRecord]) -> anyhow::Result<()> {
    let mut writer = jsonl::open_output(output)?;
    for event in ordered {
        writeln!(writer, "{}", format_record(event))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_record(event: &EventRecord) -> String {
    let from = endpoint_label(event.from.as_ref());
    let to = endpoint_label(event.to.as_ref());
    let marker = if event.meta.is_fake {
        "  (synthesized)"
    } else {
        ""
    };
    format!(
        "{:<17} {} -> {}  {}{}",
        event.direction.as_str(),
        from,
        to,
        event.action,
        marker
    )
}

fn endpoint_label(endpoint: Option<&flowtrace_core::Endpoint>) -> &str {
    endpoint.and_then(|e| e.name.as_deref()).unwrap_or("?")
}
