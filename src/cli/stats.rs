use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::Store;
use crate::error::Result;
use crate::fmt::money;
use crate::models::Statistics;

pub fn run(db_path: &Path) -> Result<()> {
    let store = Store::open(db_path)?;
    print_statistics(&store.get_statistics()?);
    store.close()
}

pub fn print_statistics(stats: &Statistics) {
    let balance = if stats.balance >= 0.0 {
        money(stats.balance).green().to_string()
    } else {
        money(stats.balance).red().to_string()
    };

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Transactions"), Cell::new(stats.total_transactions)]);
    table.add_row(vec![Cell::new("Income"), Cell::new(money(stats.total_income))]);
    table.add_row(vec![Cell::new("Expense"), Cell::new(money(stats.total_expense))]);
    table.add_row(vec![Cell::new("Balance".bold()), Cell::new(balance)]);
    println!("Statistics\n{table}");
}
