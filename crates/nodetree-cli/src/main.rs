mod cli;
mod commands;

use std::io;
use std::process;

use clap::Parser;
use cli::{Cli, Commands};

fn init_tracing(cli: &Cli) {
    // --verbose → "debug"; otherwise RUST_LOG, falling back to "warn"
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Dump { file, prefix } => {
            let tree = commands::load(&file, &cli.loadpaths)?;
            commands::dump(&tree, &prefix, &mut out)
        }
        Commands::Get {
            file,
            path,
            default,
        } => {
            let tree = commands::load(&file, &cli.loadpaths)?;
            commands::get(&tree, &path, default.as_deref(), &mut out)
        }
        Commands::Set { file, path, value } => commands::set(&file, &path, &value),
        Commands::Fmt { file } => {
            let tree = commands::load(&file, &cli.loadpaths)?;
            commands::fmt(&tree, &mut out)
        }
        Commands::Json { file } => {
            let tree = commands::load(&file, &cli.loadpaths)?;
            commands::json(&tree, &mut out)
        }
    }
}
