mod commands;

use clap::Parser;
use lexsearch::cli::{Cli, Commands};
use lexsearch::error::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::health::cmd_health;
use commands::index::cmd_index;
use commands::init::cmd_init;
use commands::search::cmd_search;
use commands::serve::cmd_serve;

fn init_logging(verbose: bool) {
    let default = if verbose { "lexsearch=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            json,
            format,
        } => cmd_search(&query, Commands::search_format(json, format), cli.backend),
        Commands::Serve { addr } => cmd_serve(addr, cli.backend),
        Commands::Index {
            path,
            dry_run,
            batch_size,
        } => cmd_index(&path, dry_run, batch_size, cli.backend),
        Commands::Init => cmd_init(cli.backend),
        Commands::Health { endpoint } => cmd_health(&endpoint),
    }
}
