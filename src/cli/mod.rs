pub mod categories;
pub mod import;
pub mod init;
pub mod stats;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sheetbook",
    about = "Import month-sheet transaction workbooks into SQLite and report totals."
)]
pub struct Cli {
    /// Database file (default: the path in settings.json)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Show debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings.json and create the database.
    Init,
    /// Import one or more workbooks (sheets 01-12 plus an optional category sheet).
    Import {
        /// Workbook files (.xlsx, .xlsm, .xls, .ods)
        #[arg(required = true)]
        files: Vec<String>,
        /// Name of the sheet holding category code/label pairs
        #[arg(long = "category-sheet")]
        category_sheet: Option<String>,
        /// The category sheet lists the label in the first column and the code in the second
        #[arg(long = "swap-category-columns")]
        swap_category_columns: bool,
        /// Only print the final counts
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show transaction count, income, expense and balance.
    Stats,
    /// List transactions, newest first.
    Transactions {
        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a single transaction by id.
    Show {
        id: i64,
    },
    /// List categories, alphabetical by label.
    Categories,
    /// Show settings and database location.
    Status,
}
