//! trkx-data CLI - read events described by a YAML configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trkx_data::{DataReader, Value};

#[derive(Parser)]
#[command(name = "trkx-data")]
#[command(version, about = "Read per-event files into named frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every event and print its summary
    Read {
        /// Reader configuration
        config: PathBuf,

        /// Directory file templates are resolved against
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Skip events with missing files without a warning
        #[arg(short, long)]
        silent: bool,

        /// Pin a variable, as name=value
        #[arg(long = "set", value_parser = parse_binding)]
        set: Vec<(String, Value)>,
    },

    /// Validate a configuration and show its variables
    Validate {
        /// Reader configuration
        config: PathBuf,

        /// Directory file templates are resolved against
        #[arg(short, long)]
        base_dir: Option<PathBuf>,
    },
}

fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    let value = value.trim().parse().unwrap_or_else(|never| match never {});
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            config,
            base_dir,
            silent,
            set,
        } => {
            let mut reader = DataReader::new(&config, base_dir)
                .with_context(|| format!("failed to load {}", config.display()))?;
            for (name, value) in set {
                reader.pin_variable(name, value);
            }

            let mut events = reader.read(silent);
            let mut read = 0usize;
            for data in events.by_ref() {
                println!("{}", data?);
                read += 1;
            }
            info!(read, skipped = events.skipped(), "done");
        }

        Commands::Validate { config, base_dir } => {
            let reader = DataReader::new(&config, base_dir)
                .with_context(|| format!("failed to load {}", config.display()))?;
            let event = reader.event_definition();

            println!("Configuration: {}", config.display());
            println!("\nVariables:");
            print!("{}", reader.variables());
            println!("\nFiles:");
            for (id, file) in &event.files {
                println!("- {id}: {} ({})", file.template, file.parser);
            }
            println!("\nFrames:");
            for (name, frame) in &event.frames {
                let sources: Vec<&str> = frame.sources.keys().map(String::as_str).collect();
                println!("- {name}: {}", sources.join(", "));
            }
            println!("\nEvents: {}", reader.event_count());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("evtid=1000").unwrap(),
            ("evtid".to_string(), Value::Int(1000))
        );
        assert_eq!(
            parse_binding("split = train").unwrap(),
            ("split".to_string(), Value::from("train"))
        );
        assert!(parse_binding("evtid").is_err());
        assert!(parse_binding("=3").is_err());
    }
}
