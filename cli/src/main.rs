use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
pub mod ux_error;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let context = cli.context();

    let result = match cli.command {
        Commands::Encode(args) => context.and_then(|ctx| commands::encode::run(&ctx, args)),
        Commands::Decode(args) => context.and_then(|ctx| commands::decode::run(&ctx, args)),
        Commands::Inspect(args) => commands::inspect::run(args),
    };

    if let Err(e) = &result {
        if let Some(ux) = e.downcast_ref::<ux_error::UxError>() {
            ux.display();
            std::process::exit(1);
        }
    }
    result
}
