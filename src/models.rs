use std::ops::AddAssign;

/// One row of the `transactions` table. The id comes from the source sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub date: Option<String>,
    pub description: String,
    pub category: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub total_transactions: i64,
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

/// Counters for one `import_file` call, or the sum over a batch of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub files: usize,
}

impl ImportSummary {
    pub fn file_error() -> Self {
        Self {
            errors: 1,
            files: 1,
            ..Self::default()
        }
    }
}

impl AddAssign for ImportSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.imported += rhs.imported;
        self.skipped += rhs.skipped;
        self.errors += rhs.errors;
        self.files += rhs.files;
    }
}
