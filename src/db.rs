use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Category, Statistics, Transaction};

// Foreign keys stay unenforced: a transaction's category may be a code that
// no mapping sheet ever defined.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    categoryid TEXT PRIMARY KEY,
    label TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date DATE,
    description TEXT,
    category TEXT,
    income REAL,
    expense REAL,
    FOREIGN KEY (category) REFERENCES categories(categoryid)
);
";

/// A single owned SQLite connection holding the transaction and category
/// tables. Each unit of work opens its own; it is never shared across threads.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %db_path.display(), "opened store");
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    pub fn transaction_exists(&self, id: i64) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM transactions WHERE id = ?1")?;
        Ok(stmt.exists([id])?)
    }

    /// Inserts `txn` unless its id is already stored. Returns `false` for a
    /// duplicate and for any storage failure; failures are logged, not raised.
    pub fn insert_transaction(&self, txn: &Transaction) -> bool {
        match self.try_insert_transaction(txn) {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!(id = txn.id, error = %e, "failed to insert transaction");
                false
            }
        }
    }

    fn try_insert_transaction(&self, txn: &Transaction) -> Result<bool> {
        if self.transaction_exists(txn.id)? {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO transactions (id, date, description, category, income, expense) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                txn.id,
                txn.date,
                txn.description,
                txn.category,
                txn.income,
                txn.expense
            ],
        )?;
        Ok(true)
    }

    /// First write wins: an existing code keeps its label.
    pub fn insert_category(&self, id: &str, label: &str) {
        if let Err(e) = self.conn.execute(
            "INSERT OR IGNORE INTO categories (categoryid, label) VALUES (?1, ?2)",
            rusqlite::params![id, label],
        ) {
            warn!(category = id, error = %e, "failed to insert category");
        }
    }

    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let txn = self
            .conn
            .query_row(
                "SELECT id, date, description, category, income, expense \
                 FROM transactions WHERE id = ?1",
                [id],
                row_to_transaction,
            )
            .optional()?;
        Ok(txn)
    }

    pub fn get_all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, description, category, income, expense \
             FROM transactions ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT categoryid, label FROM categories ORDER BY label, categoryid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    label: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?)
    }

    pub fn get_statistics(&self) -> Result<Statistics> {
        let (total_transactions, total_income, total_expense): (i64, f64, f64) =
            self.conn.query_row(
                "SELECT count(*), COALESCE(SUM(income), 0.0), COALESCE(SUM(expense), 0.0) \
                 FROM transactions",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;
        Ok(Statistics {
            total_transactions,
            total_income,
            total_expense,
            balance: total_income - total_expense,
        })
    }
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        income: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        expense: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
    })
}
