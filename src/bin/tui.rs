//! Attendance Dashboard TUI - monitoring and administration
//!
//! Terminal dashboard over the persisted attendance store. Requires login;
//! the views a session can open depend on its role.
//!
//! Keyboard shortcuts:
//! - 1/2/3: Dashboard, Attendance, Settings views
//! - Tab: Next accessible view
//! - /: Edit the attendance search filter
//! - s: Toggle sort field (timestamp/name)
//! - o: Toggle sort order
//! - n/p: Next/previous page
//! - c: Clear search filter
//! - r: Reload the store from disk
//! - q: Quit
//!
//! Usage:
//!   cargo run --bin attendance-tui -- --config config/dev.toml

use attendance_poc::domain::event::{AttendanceEvent, EventKind};
use attendance_poc::domain::types::{CameraSettings, Session, Subject};
use attendance_poc::infra::config::Account;
use attendance_poc::infra::{Config, Store};
use attendance_poc::io::ReportRow;
use attendance_poc::services::access::{self, has_access, Resource};
use attendance_poc::services::aggregator::{self, ListQuery, SortField, SortOrder};
use chrono::{DateTime, Local};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

const PAGE_SIZE: usize = 10;
const RELOAD_INTERVAL: Duration = Duration::from_secs(2);
const WEEK_DAYS: u32 = 7;

// ============================================================================
// CLI Args
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "attendance-tui")]
#[command(about = "Attendance dashboard TUI")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

// ============================================================================
// App state
// ============================================================================

/// Which view is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Dashboard,
    Attendance,
    Settings,
}

impl View {
    fn resource(self) -> Resource {
        match self {
            View::Dashboard => Resource::Dashboard,
            View::Attendance => Resource::Attendance,
            View::Settings => Resource::Settings,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Attendance => "Attendance",
            View::Settings => "Settings",
        }
    }
}

const ALL_VIEWS: [View; 3] = [View::Dashboard, View::Attendance, View::Settings];

/// Login form focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Username,
    Password,
}

/// Keyboard input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

/// Snapshot of store data the UI renders from
#[derive(Debug, Default)]
struct UiData {
    events: Vec<AttendanceEvent>,
    subjects: Vec<Subject>,
    camera: CameraSettings,
}

struct App {
    store_path: String,
    data: UiData,
    loaded_at: Instant,

    session: Option<Session>,
    login_field: LoginField,
    login_username: String,
    login_password: String,
    login_error: Option<String>,

    view: View,
    input_mode: InputMode,
    search: String,
    sort_field: SortField,
    sort_order: SortOrder,
    page: usize,
}

impl App {
    fn new(store_path: &str) -> Self {
        let mut app = Self {
            store_path: store_path.to_string(),
            data: UiData::default(),
            loaded_at: Instant::now(),
            session: None,
            login_field: LoginField::Username,
            login_username: String::new(),
            login_password: String::new(),
            login_error: None,
            view: View::Dashboard,
            input_mode: InputMode::Normal,
            search: String::new(),
            sort_field: SortField::Timestamp,
            sort_order: SortOrder::Desc,
            page: 1,
        };
        app.reload();
        app
    }

    /// Re-read the store file (the capture service may have appended)
    fn reload(&mut self) {
        let store = Store::load(&self.store_path);
        self.data = UiData {
            events: store.events_snapshot(),
            subjects: store.subjects_snapshot(),
            camera: store.camera_settings(),
        };
        self.loaded_at = Instant::now();
    }

    fn query(&self) -> ListQuery {
        ListQuery {
            search_term: self.search.clone(),
            sort_field: self.sort_field,
            sort_order: self.sort_order,
        }
    }

    /// Pages the current filter spans, for clamping page navigation
    fn total_pages(&self) -> usize {
        let listing = aggregator::filter_and_sort(&self.data.events, &self.query());
        let (_, total_pages) = aggregator::paginate(&listing, 1, PAGE_SIZE);
        total_pages
    }

    fn role_allows(&self, view: View) -> bool {
        match &self.session {
            Some(session) => has_access(session.role, view.resource()),
            None => false,
        }
    }

    fn next_accessible_view(&self) -> View {
        let start = ALL_VIEWS.iter().position(|v| *v == self.view).unwrap_or(0);
        for offset in 1..=ALL_VIEWS.len() {
            let candidate = ALL_VIEWS[(start + offset) % ALL_VIEWS.len()];
            if self.role_allows(candidate) {
                return candidate;
            }
        }
        self.view
    }

    fn switch_view(&mut self, view: View) {
        if self.role_allows(view) {
            self.view = view;
        }
    }

    fn submit_login(&mut self, accounts: &[Account]) {
        match access::authenticate(&self.login_username, &self.login_password, accounts) {
            Some(session) => {
                self.session = Some(session);
                self.login_error = None;
                self.login_password.clear();
            }
            None => {
                self.login_error = Some("Invalid username or password".to_string());
                self.login_password.clear();
            }
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(config.store_file());
    let result = run_ui(&mut terminal, app, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| draw_ui(f, &app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if app.session.is_none() {
                    match key.code {
                        KeyCode::Esc => return Ok(()),
                        KeyCode::Tab => {
                            app.login_field = match app.login_field {
                                LoginField::Username => LoginField::Password,
                                LoginField::Password => LoginField::Username,
                            };
                        }
                        KeyCode::Enter => app.submit_login(config.accounts()),
                        KeyCode::Backspace => {
                            match app.login_field {
                                LoginField::Username => app.login_username.pop(),
                                LoginField::Password => app.login_password.pop(),
                            };
                        }
                        KeyCode::Char(c) => match app.login_field {
                            LoginField::Username => app.login_username.push(c),
                            LoginField::Password => app.login_password.push(c),
                        },
                        _ => {}
                    }
                    continue;
                }

                match app.input_mode {
                    InputMode::Search => match key.code {
                        KeyCode::Esc | KeyCode::Enter => app.input_mode = InputMode::Normal,
                        KeyCode::Backspace => {
                            app.search.pop();
                            app.page = 1;
                        }
                        KeyCode::Char(c) => {
                            app.search.push(c);
                            app.page = 1;
                        }
                        _ => {}
                    },
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('1') => app.switch_view(View::Dashboard),
                        KeyCode::Char('2') => app.switch_view(View::Attendance),
                        KeyCode::Char('3') => app.switch_view(View::Settings),
                        KeyCode::Tab => {
                            let next = app.next_accessible_view();
                            app.view = next;
                        }
                        KeyCode::Char('/') => {
                            app.view = View::Attendance;
                            app.input_mode = InputMode::Search;
                        }
                        KeyCode::Char('c') => {
                            app.search.clear();
                            app.page = 1;
                        }
                        KeyCode::Char('s') => {
                            app.sort_field = match app.sort_field {
                                SortField::Timestamp => SortField::SubjectName,
                                SortField::SubjectName => SortField::Timestamp,
                            };
                        }
                        KeyCode::Char('o') => {
                            app.sort_order = match app.sort_order {
                                SortOrder::Asc => SortOrder::Desc,
                                SortOrder::Desc => SortOrder::Asc,
                            };
                        }
                        KeyCode::Char('n') => {
                            app.page = (app.page + 1).min(app.total_pages().max(1));
                        }
                        KeyCode::Char('p') => app.page = app.page.saturating_sub(1).max(1),
                        KeyCode::Char('r') => app.reload(),
                        _ => {}
                    },
                }
            }
        }

        if app.loaded_at.elapsed() >= RELOAD_INTERVAL {
            app.reload();
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn draw_ui(f: &mut Frame, app: &App) {
    if app.session.is_none() {
        draw_login(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    draw_header(f, chunks[0], app);

    match app.view {
        View::Dashboard => draw_dashboard(f, chunks[1], app),
        View::Attendance => draw_attendance(f, chunks[1], app),
        View::Settings => draw_settings(f, chunks[1], app),
    }
}

fn draw_login(f: &mut Frame, app: &App) {
    let area = centered_rect(44, 10, f.area());

    let username_style = if app.login_field == LoginField::Username {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let password_style = if app.login_field == LoginField::Password {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let masked: String = "*".repeat(app.login_password.len());
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Username: ", username_style),
            Span::raw(app.login_username.clone()),
        ]),
        Line::from(vec![Span::styled(" Password: ", password_style), Span::raw(masked)]),
        Line::from(""),
        Line::from(Span::styled(
            " Tab: switch field | Enter: login | Esc: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(error) = &app.login_error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let login = Paragraph::new(lines).block(
        Block::default()
            .title(" Sign in ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    f.render_widget(login, area);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let Some(session) = &app.session else {
        return;
    };

    let mut spans = vec![
        Span::styled(
            "Attendance TUI ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        Span::styled(session.name.clone(), Style::default().fg(Color::Yellow)),
        Span::raw(format!(" ({}) | ", session.role.as_str())),
    ];

    for view in ALL_VIEWS {
        if !app.role_allows(view) {
            continue;
        }
        let style = if view == app.view {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[{}] ", view.title()), style));
    }
    spans.push(Span::raw("| Press 'q' to quit"));

    let header =
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let now: DateTime<Local> = Local::now();
    let summary = aggregator::summarize(&app.data.events, &now);
    let weekly = aggregator::bucket_by_day(&app.data.events, &now, WEEK_DAYS);
    let hourly = aggregator::bucket_by_hour_of_day(&app.data.events, &now);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(WEEK_DAYS as u16 + 3), Constraint::Min(0)])
        .split(area);

    // Today's stats
    let stats = Paragraph::new(Line::from(vec![
        Span::raw("Entries today: "),
        Span::styled(summary.entry_count.to_string(), Style::default().fg(Color::Green)),
        Span::raw("  Exits today: "),
        Span::styled(summary.exit_count.to_string(), Style::default().fg(Color::Red)),
        Span::raw("  Avg confidence: "),
        Span::styled(
            format!("{}%", (summary.average_confidence * 100.0).round() as u32),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  Enrolled: "),
        Span::styled(app.data.subjects.len().to_string(), Style::default().fg(Color::Cyan)),
    ]))
    .block(Block::default().title(" Today ").borders(Borders::ALL));
    f.render_widget(stats, chunks[0]);

    // Last 7 days
    let rows: Vec<Row> = weekly
        .iter()
        .map(|bucket| {
            Row::new(vec![
                bucket.date.format("%m/%d").to_string(),
                bucket.entry_count.to_string(),
                bucket.exit_count.to_string(),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(8), Constraint::Length(9), Constraint::Length(9)],
    )
    .header(
        Row::new(vec!["Date", "Entries", "Exits"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(" Last 7 days ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(table, chunks[1]);

    // Busy hours (only hours with traffic)
    let items: Vec<ListItem> = hourly
        .iter()
        .map(|bucket| {
            let bar = "█".repeat((bucket.count as usize).min(40));
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:>2}:00 ", bucket.hour)),
                Span::styled(bar, Style::default().fg(Color::Blue)),
                Span::raw(format!(" {}", bucket.count)),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .title(" Busy hours today ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, chunks[2]);
}

fn draw_attendance(f: &mut Frame, area: Rect, app: &App) {
    let listing = aggregator::filter_and_sort(&app.data.events, &app.query());
    let (page_items, total_pages) = aggregator::paginate(&listing, app.page, PAGE_SIZE);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let search_style = if app.input_mode == InputMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let order_label = match app.sort_order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };
    let field_label = match app.sort_field {
        SortField::Timestamp => "timestamp",
        SortField::SubjectName => "name",
    };
    let search = Paragraph::new(Line::from(vec![
        Span::styled("Search: ", search_style),
        Span::raw(app.search.clone()),
        Span::styled(
            format!("   (sort: {} {})", field_label, order_label),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().title(" Filter ").borders(Borders::ALL));
    f.render_widget(search, chunks[0]);

    let now: DateTime<Local> = Local::now();
    let rows: Vec<Row> = page_items
        .iter()
        .copied()
        .map(|event| {
            let time = ReportRow::from_event(event, &now).timestamp;
            let kind_style = match event.kind {
                EventKind::Entry => Style::default().fg(Color::Green),
                EventKind::Exit => Style::default().fg(Color::Red),
            };
            Row::new(vec![
                Cell::from(event.subject_name.clone()),
                Cell::from(event.subject_id.clone()),
                Cell::from(time),
                Cell::from(event.kind.as_str()).style(kind_style),
                Cell::from(format!("{}%", (event.confidence * 100.0).round() as u32)),
            ])
        })
        .collect();

    let empty = rows.is_empty();
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(38),
            Constraint::Length(20),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["Name", "Subject", "Time", "Kind", "Conf"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(" Attendance log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(table, chunks[1]);

    let footer_text = if empty {
        "No records found".to_string()
    } else {
        format!(
            "Page {} of {} ({} records) | n/p: page  s: sort  o: order  /: search  c: clear",
            app.page.min(total_pages.max(1)),
            total_pages.max(1),
            listing.len()
        )
    };
    let footer =
        Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[2]);
}

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let camera = &app.data.camera;
    let lines = vec![
        Line::from(""),
        Line::from(format!(" Source:               {}", camera.source.as_str())),
        Line::from(format!(
            " IP address:           {}",
            camera.ip_address.as_deref().unwrap_or("-")
        )),
        Line::from(format!(" Resolution:           {}", camera.resolution.as_str())),
        Line::from(format!(" Frame rate:           {} fps", camera.frame_rate)),
        Line::from(format!(
            " Confidence threshold: {}%",
            (camera.confidence_threshold * 100.0).round() as u32
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Edit via the config file; the service picks changes up on restart",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let settings = Paragraph::new(lines).block(
        Block::default()
            .title(" Camera settings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(settings, area);
}

/// Fixed-size rect centered in `area`
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
