use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "elprep",
    author,
    version,
    about = "Prepare energy network models for optimization",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply scenario options and write the network handed to the optimizer
    Prepare {
        /// Input network (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Output network (JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Technology cost assumptions (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        costs: PathBuf,
        /// Run configuration (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Time-indexed CO2 price series (CSV), for `Ept`
        #[arg(long, value_hint = ValueHint::FilePath)]
        co2_price: Option<PathBuf>,
        /// Dash-separated scenario options, e.g. `Co2L0.05-3h`
        #[arg(long, default_value = "")]
        opts: String,
        /// Transmission expansion limit, e.g. `v1.25` or `copt`
        #[arg(long, default_value = "v1.0")]
        ll: String,
    },
    /// Print statistics, topology and diagnostics of a network
    Inspect {
        /// Network file (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show how scenario options resolve against a configuration
    Options {
        #[arg(long, default_value = "")]
        opts: String,
        #[arg(long, default_value = "v1.0")]
        ll: String,
        /// Run configuration (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prepare_defaults() {
        let cli = Cli::parse_from([
            "elprep", "prepare", "--network", "in.json", "--out", "out.json", "--costs",
            "costs.csv",
        ]);
        match cli.command {
            Commands::Prepare { opts, ll, config, .. } => {
                assert_eq!(opts, "");
                assert_eq!(ll, "v1.0");
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
