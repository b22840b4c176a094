use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, ExcelDateTime, Range, Reader};
use chrono::{Datelike, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::error::{Result, SheetbookError};
use crate::models::{ImportSummary, Transaction};

// ---------------------------------------------------------------------------
// Layout configuration
// ---------------------------------------------------------------------------

/// Where data lives inside a workbook. Rows are 1-based as shown in a
/// spreadsheet application; columns are 0-based (A = 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub category_sheet: String,
    pub month_data_start_row: u32,
    pub category_data_start_row: u32,
    pub category_code_column: u32,
    pub category_label_column: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            category_sheet: "Kategorien".to_string(),
            month_data_start_row: 7,
            category_data_start_row: 2,
            category_code_column: 0,
            category_label_column: 1,
        }
    }
}

impl ImportConfig {
    /// For mapping sheets that list the label before the code.
    pub fn swap_category_columns(&mut self) {
        std::mem::swap(&mut self.category_code_column, &mut self.category_label_column);
    }
}

pub fn month_sheet_names() -> impl Iterator<Item = String> {
    (1..=12).map(|m| format!("{m:02}"))
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

const TRANSACTION_COLUMNS: usize = 6;

static EMPTY_CELL: Data = Data::Empty;

pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

// 9999-12-31 is the last day Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_466.0;

/// Renders a date-formatted cell as ISO text, keeping the time only when it
/// is not midnight. Serials outside Excel's calendar are an error.
pub fn excel_datetime_text(dt: &ExcelDateTime) -> Result<String> {
    let serial = dt.as_f64();
    let datetime = if serial.is_finite() && (0.0..MAX_EXCEL_SERIAL).contains(&serial) {
        dt.as_datetime().filter(|d| d.year() <= 9999)
    } else {
        None
    };
    let datetime = datetime.ok_or_else(|| SheetbookError::InvalidDate(serial.to_string()))?;
    if datetime.time() == NaiveTime::MIN {
        Ok(datetime.format("%Y-%m-%d").to_string())
    } else {
        Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn cell(range: &Range<Data>, row: u32, col: u32) -> &Data {
    range.get_value((row, col)).unwrap_or(&EMPTY_CELL)
}

pub fn is_blank(value: &Data) -> bool {
    match value {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_numeric(value: &Data) -> bool {
    matches!(value, Data::Int(_) | Data::Float(_))
}

pub fn cell_text(value: &Data) -> Result<String> {
    match value {
        Data::Empty => Ok(String::new()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Ok(s.clone()),
        Data::DateTime(dt) => excel_datetime_text(dt),
        other => Ok(other.to_string()),
    }
}

/// Dates are stored as the cell shows them; calendar cells become ISO text.
pub fn cell_date(value: &Data) -> Result<Option<String>> {
    if is_blank(value) {
        Ok(None)
    } else {
        cell_text(value).map(Some)
    }
}

/// Blank or unreadable amounts count as 0.0; stored amounts are never negative.
pub fn cell_amount(value: &Data) -> f64 {
    let amount = match value {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => parse_amount(s),
        _ => 0.0,
    };
    if amount.is_finite() {
        amount.abs()
    } else {
        0.0
    }
}

pub fn cell_identifier(value: &Data) -> Result<i64> {
    match value {
        Data::Int(i) => Ok(*i),
        Data::Float(f) if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        other => Err(SheetbookError::InvalidIdentifier(other.to_string())),
    }
}

/// Builds a transaction from columns A–F, resolving the category code
/// through `categories` when it has an entry.
pub fn coerce_row(
    cells: &[&Data; TRANSACTION_COLUMNS],
    categories: &HashMap<String, String>,
) -> Result<Transaction> {
    let id = cell_identifier(cells[0])?;
    let code = cell_text(cells[3])?;
    let category = categories.get(&code).cloned().unwrap_or(code);
    Ok(Transaction {
        id,
        date: cell_date(cells[1])?,
        description: cell_text(cells[2])?,
        category,
        income: cell_amount(cells[4]),
        expense: cell_amount(cells[5]),
    })
}

// ---------------------------------------------------------------------------
// Workbook access
// ---------------------------------------------------------------------------

/// The two things the importer needs from a workbook.
pub trait WorkbookSource {
    fn sheet_names(&self) -> Vec<String>;
    fn sheet(&mut self, name: &str) -> Result<Range<Data>>;
}

impl<RS: Read + Seek> WorkbookSource for calamine::Sheets<RS> {
    fn sheet_names(&self) -> Vec<String> {
        Reader::sheet_names(self)
    }

    fn sheet(&mut self, name: &str) -> Result<Range<Data>> {
        Ok(self.worksheet_range(name)?)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Receives human-readable progress lines. Purely informational.
pub trait ProgressSink {
    fn report(&mut self, message: &str);
}

impl<F: FnMut(&str)> ProgressSink for F {
    fn report(&mut self, message: &str) {
        self(message)
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Imported,
    Duplicate,
    Rejected,
}

pub struct Importer<'a> {
    store: &'a Store,
    config: ImportConfig,
    progress: Option<Box<dyn ProgressSink + 'a>>,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a Store, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'a) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    fn emit(&mut self, message: &str) {
        if let Some(sink) = self.progress.as_mut() {
            sink.report(message);
        }
    }

    /// Imports one workbook. A file that cannot be opened counts as a single
    /// error and nothing else is attempted.
    pub fn import_file(&mut self, path: &Path) -> ImportSummary {
        let mut workbook = match calamine::open_workbook_auto(path) {
            Ok(wb) => wb,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open workbook");
                self.emit(&format!("Error: could not open {}: {e}", path.display()));
                return ImportSummary::file_error();
            }
        };
        info!(path = %path.display(), "importing workbook");
        self.emit(&format!("Opened {}", path.display()));
        let summary = self.import_workbook(&mut workbook);
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            errors = summary.errors,
            "finished workbook"
        );
        self.emit(&format!(
            "Finished {}: {} imported, {} skipped, {} errors",
            path.display(),
            summary.imported,
            summary.skipped,
            summary.errors
        ));
        summary
    }

    pub fn import_workbook(&mut self, workbook: &mut impl WorkbookSource) -> ImportSummary {
        let mut summary = ImportSummary {
            files: 1,
            ..ImportSummary::default()
        };
        let names = workbook.sheet_names();

        let mut categories = HashMap::new();
        let category_sheet = self.config.category_sheet.clone();
        if names.contains(&category_sheet) {
            match workbook.sheet(&category_sheet) {
                Ok(range) => categories = self.import_categories(&range),
                Err(e) => {
                    warn!(sheet = %category_sheet, error = %e, "could not read category sheet");
                    self.emit(&format!("Error reading sheet {category_sheet}: {e}"));
                    summary.errors += 1;
                }
            }
        }

        for name in month_sheet_names().filter(|n| names.contains(n)) {
            match workbook.sheet(&name) {
                Ok(range) => self.import_month_sheet(&name, &range, &categories, &mut summary),
                Err(e) => {
                    warn!(sheet = %name, error = %e, "could not read month sheet");
                    self.emit(&format!("Error reading sheet {name}: {e}"));
                    summary.errors += 1;
                }
            }
        }
        summary
    }

    fn import_categories(&mut self, range: &Range<Data>) -> HashMap<String, String> {
        let mut mapping = HashMap::new();
        let Some((last_row, _)) = range.end() else {
            return mapping;
        };
        let first_row = self.config.category_data_start_row.saturating_sub(1);
        for row in first_row..=last_row {
            let code = cell(range, row, self.config.category_code_column);
            let label = cell(range, row, self.config.category_label_column);
            if is_blank(code) || is_blank(label) {
                continue;
            }
            let (code, label) = match (cell_text(code), cell_text(label)) {
                (Ok(code), Ok(label)) => (code, label),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(row = row + 1, error = %e, "skipping category row");
                    continue;
                }
            };
            self.store.insert_category(&code, &label);
            mapping.entry(code).or_insert(label);
        }
        debug!(count = mapping.len(), "loaded category mapping");
        self.emit(&format!("Loaded {} category mappings", mapping.len()));
        mapping
    }

    fn import_month_sheet(
        &mut self,
        name: &str,
        range: &Range<Data>,
        categories: &HashMap<String, String>,
        summary: &mut ImportSummary,
    ) {
        self.emit(&format!("Importing sheet {name}"));
        let Some((last_row, _)) = range.end() else {
            return;
        };
        let first_row = self.config.month_data_start_row.saturating_sub(1);
        for row in first_row..=last_row {
            let cells: [&Data; TRANSACTION_COLUMNS] =
                std::array::from_fn(|col| cell(range, row, col as u32));
            if cells.iter().all(|c| is_blank(c)) || !is_numeric(cells[0]) {
                continue;
            }
            // 1-based, as a spreadsheet shows it
            let line = row + 1;
            match self.import_row(&cells, categories) {
                Ok((id, RowOutcome::Imported)) => {
                    summary.imported += 1;
                    debug!(sheet = name, row = line, id, "imported");
                    self.emit(&format!("Sheet {name} row {line}: imported {id}"));
                }
                Ok((id, outcome)) => {
                    summary.skipped += 1;
                    let reason = if outcome == RowOutcome::Duplicate {
                        "already present"
                    } else {
                        "rejected by store"
                    };
                    debug!(sheet = name, row = line, id, reason, "skipped");
                    self.emit(&format!("Sheet {name} row {line}: skipped {id} ({reason})"));
                }
                Err(e) => {
                    summary.errors += 1;
                    warn!(sheet = name, row = line, error = %e, "row failed");
                    self.emit(&format!("Sheet {name} row {line}: error: {e}"));
                }
            }
        }
    }

    fn import_row(
        &self,
        cells: &[&Data; TRANSACTION_COLUMNS],
        categories: &HashMap<String, String>,
    ) -> Result<(i64, RowOutcome)> {
        let txn = coerce_row(cells, categories)?;
        if self.store.transaction_exists(txn.id)? {
            return Ok((txn.id, RowOutcome::Duplicate));
        }
        let outcome = if self.store.insert_transaction(&txn) {
            RowOutcome::Imported
        } else {
            RowOutcome::Rejected
        };
        Ok((txn.id, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    /// In-memory workbook built from rows of cells, placed at absolute positions.
    struct Grid(BTreeMap<String, Range<Data>>);

    impl Grid {
        fn new() -> Self {
            Grid(BTreeMap::new())
        }

        /// `rows` start at the given 1-based spreadsheet row.
        fn sheet(mut self, name: &str, first_row: u32, rows: Vec<Vec<Data>>) -> Self {
            let width = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1) as u32;
            let start = first_row - 1;
            let end = start + rows.len().max(1) as u32 - 1;
            let mut range = Range::new((0, 0), (end, width - 1));
            for (i, row) in rows.into_iter().enumerate() {
                for (j, value) in row.into_iter().enumerate() {
                    range.set_value((start + i as u32, j as u32), value);
                }
            }
            self.0.insert(name.to_string(), range);
            self
        }
    }

    impl WorkbookSource for Grid {
        fn sheet_names(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }

        fn sheet(&mut self, name: &str) -> Result<Range<Data>> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| SheetbookError::Other(format!("no sheet {name}")))
        }
    }

    fn date_cell(serial: f64, is_1904: bool) -> ExcelDateTime {
        ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, is_1904)
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn txn_row(id: f64, date: &str, desc: &str, cat: &str, income: Data, expense: Data) -> Vec<Data> {
        vec![Data::Float(id), s(date), s(desc), s(cat), income, expense]
    }

    fn run(store: &Store, grid: &mut Grid) -> ImportSummary {
        Importer::new(store, ImportConfig::default()).import_workbook(grid)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("$950.00"), 950.0);
        assert_eq!(parse_amount("(50.00)"), -50.0);
        assert_eq!(parse_amount("n/a"), 0.0);
    }

    #[test]
    fn test_excel_datetime_text() {
        assert_eq!(excel_datetime_text(&date_cell(45296.0, false)).unwrap(), "2024-01-05");
        assert_eq!(
            excel_datetime_text(&date_cell(45296.5, false)).unwrap(),
            "2024-01-05 12:00:00"
        );
        assert!(excel_datetime_text(&date_cell(1.0e8, false)).is_err());
        assert!(excel_datetime_text(&date_cell(-1.0, false)).is_err());
        assert!(excel_datetime_text(&date_cell(f64::NAN, false)).is_err());
        // in range as a 1900 serial, past 9999-12-31 once shifted to 1904
        assert!(excel_datetime_text(&date_cell(2_958_000.0, true)).is_err());
    }

    #[test]
    fn test_1904_date_system() {
        let cell = Data::DateTime(date_cell(43834.0, true));
        assert_eq!(cell_date(&cell).unwrap(), Some("2024-01-05".to_string()));
    }

    #[test]
    fn test_cell_amount_coercion() {
        assert_eq!(cell_amount(&Data::Empty), 0.0);
        assert_eq!(cell_amount(&s("   ")), 0.0);
        assert_eq!(cell_amount(&s("abc")), 0.0);
        assert_eq!(cell_amount(&Data::Bool(true)), 0.0);
        assert_eq!(cell_amount(&Data::Float(f64::NAN)), 0.0);
        assert_eq!(cell_amount(&Data::Int(12)), 12.0);
        assert_eq!(cell_amount(&s("1,200.50")), 1200.5);
        assert_eq!(cell_amount(&Data::Float(-30.0)), 30.0);
    }

    #[test]
    fn test_cell_identifier() {
        assert_eq!(cell_identifier(&Data::Int(5)).unwrap(), 5);
        assert_eq!(cell_identifier(&Data::Float(100.9)).unwrap(), 100);
        assert!(cell_identifier(&Data::Float(f64::INFINITY)).is_err());
        assert!(cell_identifier(&Data::Float(1e300)).is_err());
        assert!(cell_identifier(&s("100")).is_err());
    }

    #[test]
    fn test_cell_date_is_verbatim() {
        assert_eq!(cell_date(&Data::Empty).unwrap(), None);
        assert_eq!(cell_date(&s("05.01.2024")).unwrap(), Some("05.01.2024".to_string()));
        assert_eq!(cell_date(&s("not a date")).unwrap(), Some("not a date".to_string()));
    }

    #[test]
    fn test_coerce_row_resolves_known_codes_only() {
        let mapping = HashMap::from([("A1".to_string(), "Groceries".to_string())]);
        let row = txn_row(1.0, "2024-01-01", "Shop", "A1", Data::Empty, Data::Float(20.0));
        let cells: [&Data; 6] = std::array::from_fn(|i| &row[i]);
        let txn = coerce_row(&cells, &mapping).unwrap();
        assert_eq!(txn.category, "Groceries");
        assert_eq!(txn.income, 0.0);
        assert_eq!(txn.expense, 20.0);

        let row = txn_row(2.0, "2024-01-01", "Shop", "Z9", Data::Empty, Data::Empty);
        let cells: [&Data; 6] = std::array::from_fn(|i| &row[i]);
        assert_eq!(coerce_row(&cells, &mapping).unwrap().category, "Z9");
    }

    #[test]
    fn test_month_rows_start_at_row_seven() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "01",
            1,
            vec![
                vec![s("Kassabuch Januar")],
                vec![],
                vec![Data::Float(1.0), s("metadata"), s("ignored")],
                vec![],
                vec![],
                vec![s("Nr"), s("Datum"), s("Text"), s("Kat"), s("Ein"), s("Aus")],
                txn_row(10.0, "2024-01-02", "Salary", "INC", Data::Float(2500.0), Data::Empty),
                txn_row(11.0, "2024-01-03", "Coffee", "FOO", Data::Empty, s("3.5")),
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors, 0);
        assert!(!store.transaction_exists(1).unwrap());
    }

    #[test]
    fn test_rows_without_numeric_id_touch_no_counter() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "02",
            7,
            vec![
                vec![s("Subtotal"), Data::Empty, Data::Empty, Data::Empty, Data::Float(1.0)],
                vec![Data::Empty, s("2024-02-01"), s("no id")],
                vec![],
                vec![s("   "), s(" ")],
                vec![Data::Bool(true), s("2024-02-01"), s("flagged")],
                txn_row(20.0, "2024-02-02", "Rent", "HOU", Data::Empty, Data::Float(950.0)),
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!(
            summary,
            ImportSummary { imported: 1, skipped: 0, errors: 0, files: 1 }
        );
        assert!(!store.transaction_exists(1).unwrap());
    }

    #[test]
    fn test_bad_row_is_isolated() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "03",
            7,
            vec![
                txn_row(30.0, "2024-03-01", "ok", "X", Data::Empty, Data::Float(1.0)),
                vec![Data::Float(f64::INFINITY), s("2024-03-02"), s("broken")],
                txn_row(31.0, "2024-03-03", "also ok", "X", Data::Float(2.0), Data::Empty),
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(store.get_transaction_count().unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_date_is_a_row_error() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "01",
            7,
            vec![
                vec![
                    Data::Float(40.0),
                    Data::DateTime(date_cell(1.0e8, false)),
                    s("far future"),
                    s("X"),
                    Data::Empty,
                    Data::Float(1.0),
                ],
                vec![
                    Data::Float(41.0),
                    s("2024-01-02"),
                    Data::DateTime(date_cell(2.0e9, false)),
                    s("X"),
                    Data::Empty,
                    Data::Float(1.0),
                ],
                txn_row(42.0, "2024-01-03", "fine", "X", Data::Empty, Data::Float(2.0)),
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!((summary.imported, summary.skipped, summary.errors), (1, 0, 2));
        assert!(!store.transaction_exists(40).unwrap());
        assert!(store.transaction_exists(42).unwrap());
    }

    #[test]
    fn test_date_cells_import_in_both_date_systems() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "01",
            7,
            vec![
                vec![
                    Data::Float(50.0),
                    Data::DateTime(date_cell(45296.0, false)),
                    s("1900 system"),
                ],
                vec![
                    Data::Float(51.0),
                    Data::DateTime(date_cell(43834.0, true)),
                    s("1904 system"),
                ],
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!(summary.imported, 2);
        for id in [50, 51] {
            let stored = store.get_transaction(id).unwrap().unwrap();
            assert_eq!(stored.date.as_deref(), Some("2024-01-05"));
        }
    }

    #[test]
    fn test_unreadable_category_cell_skips_row() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new().sheet(
            "Kategorien",
            2,
            vec![
                vec![s("BAD"), Data::DateTime(date_cell(1.0e8, false))],
                vec![s("HOU"), s("Housing")],
            ],
        );
        let summary = run(&store, &mut grid);
        assert_eq!(summary.errors, 0);
        let cats = store.get_all_categories().unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, "HOU");
    }

    #[test]
    fn test_categories_resolve_before_transactions() {
        let store = Store::open_in_memory().unwrap();
        // BTreeMap orders "01" before "Kategorien"; the category sheet must still load first.
        let mut grid = Grid::new()
            .sheet(
                "01",
                7,
                vec![
                    txn_row(1.0, "2024-01-05", "Rent", "HOU", Data::Empty, Data::Float(950.0)),
                    txn_row(2.0, "2024-01-06", "Misc", "ZZZ", Data::Empty, Data::Float(5.0)),
                ],
            )
            .sheet(
                "Kategorien",
                1,
                vec![
                    vec![s("Code"), s("Label")],
                    vec![s("HOU"), s("Housing")],
                    vec![s("EMPTY"), Data::Empty],
                    vec![Data::Empty, s("Orphan")],
                ],
            );
        let summary = run(&store, &mut grid);
        assert_eq!(summary.imported, 2);
        assert_eq!(store.get_transaction(1).unwrap().unwrap().category, "Housing");
        assert_eq!(store.get_transaction(2).unwrap().unwrap().category, "ZZZ");
        let cats = store.get_all_categories().unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, "HOU");
    }

    #[test]
    fn test_swapped_category_columns() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new()
            .sheet("Kategorien", 2, vec![vec![s("Housing"), s("HOU")]])
            .sheet(
                "01",
                7,
                vec![txn_row(1.0, "2024-01-05", "Rent", "HOU", Data::Empty, Data::Float(950.0))],
            );
        let mut config = ImportConfig::default();
        config.swap_category_columns();
        Importer::new(&store, config).import_workbook(&mut grid);
        assert_eq!(store.get_transaction(1).unwrap().unwrap().category, "Housing");
        assert_eq!(store.get_all_categories().unwrap()[0].id, "HOU");
    }

    #[test]
    fn test_reimport_skips_and_counters_reset() {
        let store = Store::open_in_memory().unwrap();
        let rows = vec![
            txn_row(1.0, "2024-04-01", "a", "X", Data::Float(1.0), Data::Empty),
            txn_row(2.0, "2024-04-02", "b", "X", Data::Empty, Data::Float(2.0)),
        ];
        let mut grid = Grid::new().sheet("04", 7, rows);
        let mut importer = Importer::new(&store, ImportConfig::default());
        let first = importer.import_workbook(&mut grid);
        assert_eq!((first.imported, first.skipped, first.errors), (2, 0, 0));
        let second = importer.import_workbook(&mut grid);
        assert_eq!((second.imported, second.skipped, second.errors), (0, 2, 0));
    }

    #[test]
    fn test_unreadable_sheet_counts_one_error() {
        struct Broken;
        impl WorkbookSource for Broken {
            fn sheet_names(&self) -> Vec<String> {
                vec!["05".to_string()]
            }
            fn sheet(&mut self, _name: &str) -> Result<Range<Data>> {
                Err(SheetbookError::Other("corrupt".into()))
            }
        }
        let store = Store::open_in_memory().unwrap();
        let summary = Importer::new(&store, ImportConfig::default()).import_workbook(&mut Broken);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.imported, 0);
    }

    #[test]
    fn test_progress_messages_reach_sink() {
        let store = Store::open_in_memory().unwrap();
        let mut grid = Grid::new()
            .sheet("Kategorien", 2, vec![vec![s("HOU"), s("Housing")]])
            .sheet(
                "01",
                7,
                vec![txn_row(1.0, "2024-01-05", "Rent", "HOU", Data::Empty, Data::Float(950.0))],
            );
        let messages = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&messages);
        Importer::new(&store, ImportConfig::default())
            .with_progress(move |m: &str| sink.borrow_mut().push(m.to_string()))
            .import_workbook(&mut grid);
        let messages = messages.borrow();
        assert!(messages.iter().any(|m| m.contains("1 category mappings")));
        assert!(messages.iter().any(|m| m == "Importing sheet 01"));
        assert!(messages.iter().any(|m| m.contains("imported 1")));
    }

    // -----------------------------------------------------------------------
    // Real workbooks on disk
    // -----------------------------------------------------------------------

    fn write_rent_workbook(path: &Path) {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = ExcelDateTime::from_ymd(2024, 1, 5).unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name("01").unwrap();
        sheet.write_string(0, 0, "Januar").unwrap();
        sheet.write_string(5, 0, "Nr").unwrap();
        sheet.write_number(6, 0, 100).unwrap();
        sheet.write_datetime_with_format(6, 1, &date, &date_format).unwrap();
        sheet.write_string(6, 2, "Rent").unwrap();
        sheet.write_string(6, 3, "HOU").unwrap();
        sheet.write_number(6, 4, 0).unwrap();
        sheet.write_number(6, 5, 950.0).unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Kategorien").unwrap();
        sheet.write_string(0, 0, "Kürzel").unwrap();
        sheet.write_string(0, 1, "Bezeichnung").unwrap();
        sheet.write_string(1, 0, "HOU").unwrap();
        sheet.write_string(1, 1, "Housing").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_import_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024.xlsx");
        write_rent_workbook(&path);
        let store = Store::open(&dir.path().join("test.db")).unwrap();

        let mut importer = Importer::new(&store, ImportConfig::default());
        let first = importer.import_file(&path);
        assert_eq!((first.imported, first.skipped, first.errors), (1, 0, 0));

        let stored = store.get_transaction(100).unwrap().unwrap();
        assert_eq!(stored.category, "Housing");
        assert_eq!(stored.expense, 950.0);
        assert_eq!(stored.income, 0.0);
        assert_eq!(stored.description, "Rent");
        assert_eq!(stored.date.as_deref(), Some("2024-01-05"));

        let second = importer.import_file(&path);
        assert_eq!((second.imported, second.skipped, second.errors), (0, 1, 0));
        assert_eq!(store.get_transaction(100).unwrap().unwrap(), stored);
    }

    #[test]
    fn test_import_missing_file_is_one_error() {
        let store = Store::open_in_memory().unwrap();
        let summary = Importer::new(&store, ImportConfig::default())
            .import_file(Path::new("/definitely/not/here.xlsx"));
        assert_eq!(summary, ImportSummary::file_error());
    }

    #[test]
    fn test_import_corrupt_file_is_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        let store = Store::open_in_memory().unwrap();
        let summary = Importer::new(&store, ImportConfig::default()).import_file(&path);
        assert_eq!((summary.imported, summary.skipped, summary.errors), (0, 0, 1));
        assert_eq!(store.get_transaction_count().unwrap(), 0);
    }
}
