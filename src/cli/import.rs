use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::stats::print_statistics;
use crate::db::Store;
use crate::error::Result;
use crate::settings::{load_settings, shellexpand_path};
use crate::worker::spawn_import;

pub fn run(
    db_path: &Path,
    files: &[String],
    category_sheet: Option<String>,
    swap_category_columns: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = load_settings().import;
    if let Some(sheet) = category_sheet {
        config.category_sheet = sheet;
    }
    if swap_category_columns {
        config.swap_category_columns();
    }
    let files: Vec<PathBuf> = files
        .iter()
        .map(|f| PathBuf::from(shellexpand_path(f)))
        .collect();

    let summary = spawn_import(db_path.to_path_buf(), config, files).wait(|line| {
        if !quiet {
            println!("{}", line.dimmed());
        }
    })?;

    let errors = format!("{} errors", summary.errors);
    println!(
        "{} imported, {} skipped, {}",
        summary.imported,
        summary.skipped,
        if summary.errors > 0 { errors.red().to_string() } else { errors }
    );

    let store = Store::open(db_path)?;
    println!();
    print_statistics(&store.get_statistics()?);
    store.close()
}
