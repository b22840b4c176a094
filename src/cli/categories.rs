use std::path::Path;

use comfy_table::{Cell, Table};

use crate::db::Store;
use crate::error::Result;

pub fn run(db_path: &Path) -> Result<()> {
    let store = Store::open(db_path)?;
    let categories = store.get_all_categories()?;

    let mut table = Table::new();
    table.set_header(vec!["Code", "Label"]);
    for cat in categories {
        table.add_row(vec![Cell::new(cat.id), Cell::new(cat.label)]);
    }
    println!("Categories\n{table}");
    store.close()
}
