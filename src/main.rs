use anyhow::Result;

fn main() -> Result<()> {
    run_ui_mode()
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use expense_tracker::ui::{run_ui, App};
    use expense_tracker::{setup_database, Theme};
    use rusqlite::Connection;

    // One long-lived handle; single-threaded, single-user
    let conn = Connection::open("expenses.db")?;
    setup_database(&conn)?;

    let mut app = App::new(conn, Theme::default())?;
    run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
