use anyhow::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// One logged expense. Immutable once created: there is no update or
/// delete path anywhere in the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Expense {
    /// Assigned by SQLite at insert (AUTOINCREMENT: monotonic, never reused).
    pub id: i64,
    pub amount: f64,
    pub category: String,
    /// ISO-8601 date string (YYYY-MM-DD), set to the creation date.
    pub date: String,
}

/// Aggregate total for a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Create the expenses table and its date index. Idempotent: safe to call
/// on every startup whether or not the table already exists.
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    Ok(())
}

/// Insert one expense and return its fresh id.
///
/// Inputs are trusted as already validated by the caller; the statement
/// autocommits, so the record is durable before this returns.
pub fn insert_expense(conn: &Connection, amount: f64, category: &str, date: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (amount, category, date) VALUES (?1, ?2, ?3)",
        params![amount, category, date],
    )?;

    Ok(conn.last_insert_rowid())
}

/// All expenses, most recent first. Same-date records tie-break by id
/// descending so the ordering is stable between calls.
pub fn get_all_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, category, date
         FROM expenses
         ORDER BY date DESC, id DESC",
    )?;

    let expenses = stmt
        .query_map([], |row| {
            Ok(Expense {
                id: row.get(0)?,
                amount: row.get(1)?,
                category: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

/// Sum of all expense amounts, 0.0 when the table is empty.
pub fn sum_all(conn: &Connection) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses",
        [],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Per-category totals, largest first. Categories with no records are
/// absent from the result, never present with zero.
pub fn sum_by_category(conn: &Connection) -> Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount) as total
         FROM expenses
         GROUP BY category
         ORDER BY total DESC, category",
    )?;

    let totals = stmt
        .query_map([], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(totals)
}

pub fn count_expenses(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}
