// Expense Tracker - Core Library
// Exposes the storage manager and presentation layer for the binary and tests

pub mod category;
pub mod db;

// UI modules only compile when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod theme;
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use category::Category;
pub use db::{
    count_expenses, get_all_expenses, insert_expense, setup_database, sum_all, sum_by_category,
    CategoryTotal, Expense,
};
#[cfg(feature = "tui")]
pub use theme::Theme;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
