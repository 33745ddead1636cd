use crate::category::Category;
use crate::db::{self, CategoryTotal, Expense};
use crate::theme::Theme;
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Entry,
    Chart,
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::Entry => "Add New Expense",
            Page::Chart => "Expenses by Category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Amount,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Error,
    Info,
}

/// Blocking acknowledgement dialog. While one is shown, only Enter/Esc
/// are handled.
#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub kind: ModalKind,
    pub message: String,
}

impl Modal {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ModalKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ModalKind::Info,
            message: message.into(),
        }
    }
}

pub struct App {
    conn: Connection,
    pub theme: Theme,
    pub current_page: Page,
    pub focus: Focus,
    pub amount_input: String,
    /// Index into Category::ALL; None until the user picks one.
    pub selected_category: Option<usize>,
    pub expenses: Vec<Expense>,
    pub total: f64,
    pub chart_data: Vec<CategoryTotal>,
    pub state: TableState,
    pub modal: Option<Modal>,
}

impl App {
    pub fn new(conn: Connection, theme: Theme) -> Result<Self> {
        let mut app = Self {
            conn,
            theme,
            current_page: Page::Entry,
            focus: Focus::Amount,
            amount_input: String::new(),
            selected_category: None,
            expenses: Vec::new(),
            total: 0.0,
            chart_data: Vec::new(),
            state: TableState::default(),
            modal: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Re-read the list and total from storage. Always a full refresh,
    /// never an incremental update.
    pub fn refresh(&mut self) -> Result<()> {
        self.expenses = db::get_all_expenses(&self.conn)?;
        self.total = db::sum_all(&self.conn)?;
        if self.expenses.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
        Ok(())
    }

    /// Validate the form and insert the expense.
    ///
    /// Validation failures recover locally into a blocking modal and write
    /// nothing; storage failures propagate. No range check on the amount:
    /// anything that parses goes through, zero and negative included.
    pub fn submit(&mut self) -> Result<()> {
        let amount: f64 = match self.amount_input.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                self.modal = Some(Modal::error(format!("{}", e)));
                return Ok(());
            }
        };

        let category = match self.selected_category {
            Some(i) => Category::ALL[i].as_str(),
            None => {
                self.modal = Some(Modal::error("Please select a category"));
                return Ok(());
            }
        };

        let date = Local::now().format("%Y-%m-%d").to_string();
        db::insert_expense(&self.conn, amount, category, &date)?;

        self.amount_input.clear();
        self.selected_category = None;
        self.refresh()?;

        Ok(())
    }

    /// Fetch per-category totals and open the chart page, or show an
    /// informational modal when there is nothing to visualize.
    pub fn request_chart(&mut self) -> Result<()> {
        let totals = db::sum_by_category(&self.conn)?;

        if totals.is_empty() {
            self.modal = Some(Modal::info("No expenses to visualize"));
            return Ok(());
        }

        self.chart_data = totals;
        self.current_page = Page::Chart;
        Ok(())
    }

    pub fn close_chart(&mut self) {
        self.current_page = Page::Entry;
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Amount => Focus::Category,
            Focus::Category => Focus::Amount,
        };
    }

    pub fn next_category(&mut self) {
        let i = match self.selected_category {
            Some(i) => (i + 1) % Category::ALL.len(),
            None => 0,
        };
        self.selected_category = Some(i);
    }

    pub fn previous_category(&mut self) {
        let i = match self.selected_category {
            Some(0) | None => Category::ALL.len() - 1,
            Some(i) => i - 1,
        };
        self.selected_category = Some(i);
    }

    pub fn scroll_down(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn scroll_up(&mut self) {
        let len = self.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn format_amount(&self, value: f64) -> String {
        format!("{} {}", self.theme.currency_label, format_thousands(value))
    }

    /// Share of the grand total for one chart slice, in percent.
    pub fn slice_percent(&self, total: f64) -> f64 {
        let grand: f64 = self.chart_data.iter().map(|t| t.total).sum();
        if grand == 0.0 {
            0.0
        } else {
            total / grand * 100.0
        }
    }
}

/// Render a value with two decimals and a thousands separator,
/// e.g. 1500.5 -> "1,500.50".
pub fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some(parts) => parts,
        None => (formatted.as_str(), "00"),
    };

    let mut grouped = String::new();
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{}", grouped, frac_part)
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Storage failures are fatal for the whole process
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // A modal blocks everything except acknowledgement
            if app.modal.is_some() {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    app.dismiss_modal();
                }
                continue;
            }

            match app.current_page {
                Page::Entry => match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
                    KeyCode::Enter => app.submit()?,
                    KeyCode::PageDown => app.scroll_down(),
                    KeyCode::PageUp => app.scroll_up(),
                    KeyCode::Backspace if app.focus == Focus::Amount => {
                        app.amount_input.pop();
                    }
                    KeyCode::Char(c) if app.focus == Focus::Amount => {
                        app.amount_input.push(c);
                    }
                    KeyCode::Down | KeyCode::Char('j') => app.next_category(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous_category(),
                    KeyCode::Char('c') => app.request_chart()?,
                    KeyCode::Char('q') => return Ok(()),
                    _ => {}
                },
                Page::Chart => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('c') => {
                        app.close_chart()
                    }
                    _ => {}
                },
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    match app.current_page {
        Page::Entry => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Title
                    Constraint::Length(3), // Entry form
                    Constraint::Min(0),    // Expense list
                    Constraint::Length(3), // Status bar
                ])
                .split(f.size());

            render_header(f, chunks[0], app);
            render_form(f, chunks[1], app);
            render_table(f, chunks[2], app);
            render_status_bar(f, chunks[3], app);
        }
        Page::Chart => render_chart(f, f.size(), app),
    }

    if let Some(modal) = app.modal.clone() {
        render_modal(f, &modal, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let header_text = vec![Line::from(vec![
        Span::styled(
            "Personal Expense Tracker",
            Style::default()
                .fg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.format_amount(app.total)),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} records", app.expenses.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.primary)),
    );

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let form_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let focused = |is: bool| {
        if is {
            Style::default().fg(app.theme.highlight)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let amount = Paragraph::new(app.amount_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focused(app.focus == Focus::Amount))
            .title(format!(" Amount ({}) ", app.theme.currency_label)),
    );
    f.render_widget(amount, form_chunks[0]);

    let category_text = match app.selected_category {
        Some(i) => format!("< {} >", Category::ALL[i].as_str()),
        None => String::from("< select >"),
    };
    let category = Paragraph::new(category_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focused(app.focus == Focus::Category))
            .title(" Category "),
    );
    f.render_widget(category, form_chunks[1]);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Amount", "Category", "Date"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.expenses.iter().map(|expense| {
        let cells = vec![
            Cell::from(app.format_amount(expense.amount))
                .style(Style::default().fg(app.theme.accent)),
            Cell::from(expense.category.clone()),
            Cell::from(expense.date.clone()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![
        Span::styled("Tab", Style::default().fg(app.theme.highlight)),
        Span::raw(" Switch field | "),
        Span::styled("↑/↓", Style::default().fg(app.theme.highlight)),
        Span::raw(" Pick category | "),
        Span::styled("Enter", Style::default().fg(app.theme.highlight)),
        Span::raw(" Add Expense | "),
    ];

    if app.focus == Focus::Category {
        status_spans.push(Span::styled("c", Style::default().fg(app.theme.highlight)));
        status_spans.push(Span::raw(" Show Chart | "));
        status_spans.push(Span::styled("q", Style::default().fg(app.theme.accent)));
        status_spans.push(Span::raw(" Quit"));
    } else {
        status_spans.push(Span::styled("Esc", Style::default().fg(app.theme.accent)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.primary))
        .title(format!(" {} ", app.current_page.title()));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    // One proportional bar per category, sized against the grand total
    let mut constraints: Vec<Constraint> = app
        .chart_data
        .iter()
        .map(|_| Constraint::Length(2))
        .collect();
    constraints.push(Constraint::Min(0));

    let slices = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, slice) in app.chart_data.iter().enumerate() {
        let percent = app.slice_percent(slice.total);
        let label = format!(
            "{} - {} ({:.1}%)",
            slice.category,
            app.format_amount(slice.total),
            percent
        );

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(app.theme.slice_color(i)))
            .ratio((percent / 100.0).clamp(0.0, 1.0))
            .label(label);

        f.render_widget(gauge, slices[i]);
    }

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("Esc", Style::default().fg(app.theme.highlight)),
        Span::raw(" Back"),
    ]));
    if let Some(last) = slices.last() {
        f.render_widget(hint, *last);
    }
}

fn render_modal(f: &mut Frame, modal: &Modal, app: &App) {
    let (title, border_color) = match modal.kind {
        ModalKind::Error => (" Error ", app.theme.accent),
        ModalKind::Info => (" Info ", app.theme.primary),
    };

    let area = centered_rect(50, 20, f.size());
    f.render_widget(Clear, area);

    let content = vec![
        Line::from(""),
        Line::from(Span::raw(modal.message.clone())),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let dialog = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );

    f.render_widget(dialog, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_expenses, setup_database};

    fn test_app() -> App {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        App::new(conn, Theme::default()).unwrap()
    }

    #[test]
    fn test_submit_rejects_non_numeric_amount() {
        let mut app = test_app();
        app.amount_input = "abc".to_string();
        app.selected_category = Some(0);

        app.submit().unwrap();

        let modal = app.modal.as_ref().expect("parse failure must raise modal");
        assert_eq!(modal.kind, ModalKind::Error);
        assert!(modal.message.contains("invalid float literal"));
        assert_eq!(count_expenses(&app.conn).unwrap(), 0);
    }

    #[test]
    fn test_submit_rejects_missing_category() {
        let mut app = test_app();
        app.amount_input = "42.00".to_string();
        app.selected_category = None;

        app.submit().unwrap();

        let modal = app
            .modal
            .as_ref()
            .expect("missing category must raise modal");
        assert_eq!(modal.kind, ModalKind::Error);
        assert_eq!(modal.message, "Please select a category");
        assert_eq!(count_expenses(&app.conn).unwrap(), 0);
    }

    #[test]
    fn test_submit_inserts_clears_and_refreshes() {
        let mut app = test_app();
        app.amount_input = "1500.50".to_string();
        app.selected_category = Some(0); // Food

        app.submit().unwrap();

        assert!(app.modal.is_none());
        assert!(app.amount_input.is_empty());
        assert_eq!(app.selected_category, None);
        assert_eq!(app.expenses.len(), 1);
        assert_eq!(app.expenses[0].amount, 1500.50);
        assert_eq!(app.expenses[0].category, "Food");
        assert_eq!(
            app.expenses[0].date,
            Local::now().format("%Y-%m-%d").to_string()
        );
        assert!((app.total - 1500.50).abs() < 1e-9);
    }

    #[test]
    fn test_submit_accepts_zero_and_negative() {
        // Only "parses as a number" is enforced; no range check
        let mut app = test_app();

        app.amount_input = "0".to_string();
        app.selected_category = Some(7); // Other
        app.submit().unwrap();
        assert!(app.modal.is_none());

        app.amount_input = "-12.50".to_string();
        app.selected_category = Some(7);
        app.submit().unwrap();
        assert!(app.modal.is_none());

        assert_eq!(count_expenses(&app.conn).unwrap(), 2);
    }

    #[test]
    fn test_example_scenario() {
        let mut app = test_app();

        app.amount_input = "1500.50".to_string();
        app.selected_category = Some(0); // Food
        app.submit().unwrap();

        app.amount_input = "299.00".to_string();
        app.selected_category = Some(1); // Transport
        app.submit().unwrap();

        assert_eq!(app.expenses.len(), 2);
        // Most recent first: same date, so the later insert leads
        assert_eq!(app.expenses[0].category, "Transport");
        assert_eq!(app.expenses[1].category, "Food");
        assert!((app.total - 1799.50).abs() < 1e-9);

        app.request_chart().unwrap();
        assert_eq!(app.current_page, Page::Chart);
        assert_eq!(app.chart_data.len(), 2);
        let food = app
            .chart_data
            .iter()
            .find(|t| t.category == "Food")
            .unwrap();
        assert!((food.total - 1500.50).abs() < 1e-9);
    }

    #[test]
    fn test_chart_request_with_no_data_shows_info() {
        let mut app = test_app();

        app.request_chart().unwrap();

        let modal = app.modal.as_ref().expect("empty chart must raise modal");
        assert_eq!(modal.kind, ModalKind::Info);
        assert_eq!(modal.message, "No expenses to visualize");
        assert_eq!(app.current_page, Page::Entry);
    }

    #[test]
    fn test_slice_percent_one_decimal_labels() {
        let mut app = test_app();
        app.chart_data = vec![
            CategoryTotal {
                category: "Food".to_string(),
                total: 1500.50,
            },
            CategoryTotal {
                category: "Transport".to_string(),
                total: 299.00,
            },
        ];

        let food_pct = app.slice_percent(1500.50);
        assert_eq!(format!("{:.1}%", food_pct), "83.4%");
        let transport_pct = app.slice_percent(299.00);
        assert_eq!(format!("{:.1}%", transport_pct), "16.6%");
    }

    #[test]
    fn test_category_cycling_wraps() {
        let mut app = test_app();

        assert_eq!(app.selected_category, None);
        app.next_category();
        assert_eq!(app.selected_category, Some(0));
        app.previous_category();
        assert_eq!(app.selected_category, Some(Category::ALL.len() - 1));
        app.next_category();
        assert_eq!(app.selected_category, Some(0));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1500.5), "1,500.50");
        assert_eq!(format_thousands(299.0), "299.00");
        assert_eq!(format_thousands(1234567.891), "1,234,567.89");
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(-5.25), "-5.25");
        assert_eq!(format_thousands(-1500.5), "-1,500.50");
    }

    #[test]
    fn test_format_amount_uses_currency_label() {
        let app = test_app();
        assert_eq!(app.format_amount(1799.50), "KSh 1,799.50");
    }
}
