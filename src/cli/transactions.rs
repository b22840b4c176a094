use std::path::Path;

use comfy_table::{Cell, CellAlignment, Table};

use crate::db::Store;
use crate::error::{Result, SheetbookError};
use crate::fmt::money;

pub fn run(db_path: &Path, limit: Option<usize>) -> Result<()> {
    let store = Store::open(db_path)?;
    let transactions = store.get_all_transactions()?;
    let total = transactions.len();
    let shown = limit.unwrap_or(total).min(total);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Income", "Expense"]);
    for txn in transactions.into_iter().take(shown) {
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(txn.date.unwrap_or_default()),
            Cell::new(txn.description),
            Cell::new(txn.category),
            Cell::new(money(txn.income)).set_alignment(CellAlignment::Right),
            Cell::new(money(txn.expense)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Transactions ({shown} of {total})\n{table}");
    store.close()
}

pub fn show(db_path: &Path, id: i64) -> Result<()> {
    let store = Store::open(db_path)?;
    let txn = store
        .get_transaction(id)?
        .ok_or_else(|| SheetbookError::Other(format!("Transaction not found: id {id}")))?;
    store.close()?;

    println!("ID:           {}", txn.id);
    println!("Date:         {}", txn.date.as_deref().unwrap_or("-"));
    println!("Description:  {}", txn.description);
    println!("Category:     {}", txn.category);
    println!("Income:       {}", money(txn.income));
    println!("Expense:      {}", money(txn.expense));
    Ok(())
}
