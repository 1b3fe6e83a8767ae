use clap::Parser;
use elprep_cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    let result = match &cli.command {
        Commands::Prepare {
            network,
            out,
            costs,
            config,
            co2_price,
            opts,
            ll,
        } => commands::prepare::handle(&commands::prepare::PrepareArgs {
            network,
            out,
            costs,
            config: config.as_deref(),
            co2_price: co2_price.as_deref(),
            opts,
            ll,
        }),
        Commands::Inspect { network, format } => commands::inspect::handle(network, *format),
        Commands::Options { opts, ll, config } => {
            commands::options::handle(opts, ll, config.as_deref())
        }
    };

    if let Err(err) = result {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
