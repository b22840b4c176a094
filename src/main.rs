mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod settings;
mod worker;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use settings::{load_settings, resolve_db_path};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > warnings only
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            log_fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let db_path = resolve_db_path(&load_settings(), cli.db.as_deref());

    let result = match cli.command {
        Commands::Init => cli::init::run(cli.db.as_deref()),
        Commands::Import {
            files,
            category_sheet,
            swap_category_columns,
            quiet,
        } => cli::import::run(&db_path, &files, category_sheet, swap_category_columns, quiet),
        Commands::Stats => cli::stats::run(&db_path),
        Commands::Transactions { limit } => cli::transactions::run(&db_path, limit),
        Commands::Show { id } => cli::transactions::show(&db_path, id),
        Commands::Categories => cli::categories::run(&db_path),
        Commands::Status => cli::status::run(&db_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
