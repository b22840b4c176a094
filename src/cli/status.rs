use std::path::Path;

use crate::db::Store;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, settings_path};

pub fn run(db_path: &Path) -> Result<()> {
    let settings = load_settings();
    let config_file = settings_path();

    println!(
        "Settings:       {}{}",
        config_file.display(),
        if config_file.exists() { "" } else { " (not written; defaults in use)" }
    );
    println!("Database:       {}", db_path.display());
    println!("Category sheet: {}", settings.import.category_sheet);

    if db_path.exists() {
        let size = std::fs::metadata(db_path)?.len();
        println!("DB size:        {}", format_bytes(size));

        let store = Store::open(db_path)?;
        let transactions = store.get_transaction_count()?;
        let categories = store.get_all_categories()?.len();
        store.close()?;

        println!();
        println!("Transactions:   {transactions}");
        println!("Categories:     {categories}");
    } else {
        println!();
        println!("Database not found. Run `sheetbook init` or `sheetbook import`.");
    }
    Ok(())
}
