use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use multinet_core::Mode;
use tracing_subscriber::EnvFilter;

mod clean;
mod convert;
mod export;
mod optimize;

#[derive(Parser)]
#[command(name = "multinet")]
#[command(about = "Convert OSM and GeoJSON data into a mode-aware network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full conversion described by a configuration file
    Convert {
        /// TOML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Optimize links shorter than this many meters (requires --max-length)
        #[arg(long, requires = "max_length")]
        min_length: Option<f64>,

        /// Optimize links longer than this many meters (requires --min-length)
        #[arg(long, requires = "min_length")]
        max_length: Option<f64>,
    },
    /// Split and merge links of a network document to fit length bounds
    Optimize {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        min_length: f64,

        #[arg(long)]
        max_length: f64,
    },
    /// Reduce a network document to strongly connected mode subnetworks
    Clean {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Single mode to clean
        #[arg(
            long,
            value_parser = parse_mode,
            conflicts_with = "modes",
            required_unless_present = "modes"
        )]
        mode: Option<Mode>,

        /// Modes whose links are never removed, comma separated
        #[arg(long, default_value = "car")]
        retain: String,

        /// Ordered, comma separated modes cleaned one after another
        #[arg(long)]
        modes: Option<String>,
    },
    /// Export a network document as GeoJSON
    ToGeojson {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the default configuration
    InitConfig {
        #[arg(short, long, default_value = "multinet.toml")]
        output: PathBuf,
    },
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse().map_err(|e: multinet_core::Error| e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert {
            config,
            min_length,
            max_length,
        } => convert::run(&config, min_length.zip(max_length)),
        Commands::Optimize {
            input,
            output,
            min_length,
            max_length,
        } => optimize::run(&input, &output, min_length, max_length),
        Commands::Clean {
            input,
            output,
            mode,
            retain,
            modes,
        } => clean::run(&input, &output, mode, &retain, modes.as_deref()),
        Commands::ToGeojson { input, output } => export::to_geojson(&input, &output),
        Commands::InitConfig { output } => export::init_config(&output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_clean_needs_a_mode() {
        assert!(Cli::try_parse_from(["multinet", "clean", "-i", "a.json", "-o", "b.json"]).is_err());
        let cli = Cli::try_parse_from([
            "multinet", "clean", "-i", "a.json", "-o", "b.json", "--mode", "bike",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Clean { mode: Some(Mode::Bike), .. }));
    }
}
