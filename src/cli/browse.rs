//! Interactive catalog browser
//!
//! A ratatui front end over a [`Session`]. Every keypress either changes
//! local view state (highlight, filter text) or triggers exactly one awaited
//! fetch; the screen is redrawn before each fetch so the user sees what is
//! being loaded.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::app::{CatalogPager, LoadedDataset, PayloadSource, SelectionOutcome, Session};
use crate::cli::args::BrowseArgs;
use crate::cli::commands::CommandContext;
use crate::cli::render::{render_failure, truncate_cell};
use crate::constants::preview;
use crate::errors::Result;

type BrowserTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Severity of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Message shown under the main panels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Work a keypress asks the event loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    NextPage,
    PreviousPage,
    LoadHighlighted,
}

/// Whether keys go to navigation or to the filter prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Navigate,
    Filter(String),
}

/// Everything the browser draws
pub struct BrowserState<S> {
    session: Session<S>,
    highlight: ListState,
    mode: InputMode,
    status: Status,
    preview: Option<LoadedDataset>,
    preview_rows: usize,
}

impl<S: PayloadSource> BrowserState<S> {
    pub fn new(session: Session<S>, preview_rows: usize) -> Self {
        Self {
            session,
            highlight: ListState::default(),
            mode: InputMode::Navigate,
            status: Status::info("Press Enter to preview the highlighted dataset"),
            preview: None,
            preview_rows,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight.selected()
    }

    /// Maps a key to local state changes and, possibly, an action
    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if let InputMode::Filter(text) = &mut self.mode {
            match code {
                KeyCode::Char(c) => text.push(c),
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Enter => {
                    let term = std::mem::take(text);
                    self.mode = InputMode::Navigate;
                    self.apply_filter(Some(term));
                }
                KeyCode::Esc => self.mode = InputMode::Navigate,
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('n') | KeyCode::Right => {
                if self.session.can_go_next() {
                    Action::NextPage
                } else {
                    self.status = Status::warning("No next page: this page was empty");
                    Action::None
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.session.can_go_previous() {
                    Action::PreviousPage
                } else {
                    self.status = Status::warning("Already on the first page");
                    Action::None
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_highlight(1);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_highlight(-1);
                Action::None
            }
            KeyCode::Enter => Action::LoadHighlighted,
            KeyCode::Char('/') => {
                self.mode = InputMode::Filter(self.session.filter().unwrap_or_default().to_string());
                Action::None
            }
            KeyCode::Char('c') => {
                self.apply_filter(None);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn move_highlight(&mut self, step: isize) {
        let count = self.session.visible_candidates().len();
        if count == 0 {
            self.highlight.select(None);
            return;
        }
        let current = self.highlight.selected().unwrap_or(0) as isize;
        let next = (current + step).clamp(0, count as isize - 1) as usize;
        self.highlight.select(Some(next));
    }

    fn reset_highlight(&mut self) {
        let has_rows = !self.session.visible_candidates().is_empty();
        self.highlight.select(has_rows.then_some(0));
    }

    fn apply_filter(&mut self, term: Option<String>) {
        self.session.set_filter(term);
        self.reset_highlight();
        let visible = self.session.visible_candidates().len();
        self.status = match self.session.filter() {
            Some(term) => Status::info(format!("{} datasets match \"{}\"", visible, term)),
            None => Status::info("Filter cleared"),
        };
    }

    /// Refreshes highlight and status after the page changed
    fn page_changed(&mut self) {
        self.preview = None;
        self.reset_highlight();
        let view = self.session.view();
        self.status = match &view.notice {
            Some(notice) => Status::error(notice.clone()),
            None if view.page.is_empty() => {
                Status::warning("This page is empty; you are past the end of the catalog")
            }
            None => Status::info(format!(
                "Page {}: {} datasets",
                self.session.cursor().display_number(),
                view.page.items.len()
            )),
        };
    }

    /// Stores a load outcome for display
    pub fn apply_outcome(&mut self, outcome: SelectionOutcome) {
        match outcome {
            SelectionOutcome::NoSelection => {
                self.status = Status::warning("Select a dataset first");
            }
            SelectionOutcome::MissingUrl { title } => {
                self.preview = None;
                self.status = Status::warning(format!("\"{}\" has no download URL", title));
            }
            SelectionOutcome::Loaded(Ok(dataset)) => {
                self.status = Status::info(format!(
                    "Loaded {}: {} rows x {} columns",
                    dataset.format,
                    dataset.frame.row_count(),
                    dataset.frame.column_count()
                ));
                self.preview = Some(dataset);
            }
            SelectionOutcome::Loaded(Err(failure)) => {
                self.preview = None;
                self.status = Status::error(render_failure(&failure));
            }
        }
    }

    async fn open_page(&mut self, page_index: u32) {
        self.session.open_page(page_index).await;
        self.page_changed();
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::NextPage => {
                self.session.next_page().await;
                self.page_changed();
            }
            Action::PreviousPage => {
                self.session.previous_page().await;
                self.page_changed();
            }
            Action::LoadHighlighted => {
                let selected = match self.highlight.selected() {
                    Some(index) => self.session.select(index).is_some(),
                    None => false,
                };
                let outcome = if selected {
                    self.session.load_selected().await
                } else {
                    self.session.clear_selection();
                    SelectionOutcome::NoSelection
                };
                self.apply_outcome(outcome);
            }
            Action::None | Action::Quit => {}
        }
    }

    /// Status shown while `action` is in flight
    fn busy_status(&self, action: Action) -> Option<Status> {
        match action {
            Action::NextPage => Some(Status::info(format!(
                "Fetching page {}...",
                self.session.cursor().next().display_number()
            ))),
            Action::PreviousPage => Some(Status::info(format!(
                "Fetching page {}...",
                self.session.cursor().previous().display_number()
            ))),
            Action::LoadHighlighted => {
                let visible = self.session.visible_candidates();
                let candidate = self.highlight.selected().and_then(|i| visible.get(i).copied());
                candidate.map(|c| Status::info(format!("Loading {}...", c.title)))
            }
            Action::None | Action::Quit => None,
        }
    }
}

/// Handle the browse command
pub async fn handle_browse(args: BrowseArgs, context: &CommandContext) -> Result<()> {
    let client = context.connect()?;
    let pager = CatalogPager::new(client.clone(), &context.config.catalog.index_url)?;
    let mut session = Session::new(pager, context.loader(client));
    session.set_filter(args.filter.clone());

    let mut state = BrowserState::new(session, context.config.preview.rows);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_browser(&mut terminal, &mut state, args.page_index()).await;

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let stats = state.session().cache_stats();
    info!(
        "Browser closed: {} loads served from cache, {} fetched",
        stats.hits, stats.misses
    );
    result
}

async fn run_browser<S: PayloadSource>(
    terminal: &mut BrowserTerminal,
    state: &mut BrowserState<S>,
    first_page: u32,
) -> Result<()> {
    state.status = Status::info(format!("Fetching page {}...", first_page + 1));
    terminal.draw(|f| render_browser(f, state))?;
    state.open_page(first_page).await;

    loop {
        terminal.draw(|f| render_browser(f, state))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = state.handle_key(key.code);
        debug!("Key {:?} -> {:?}", key.code, action);
        if action == Action::Quit {
            return Ok(());
        }
        if let Some(busy) = state.busy_status(action) {
            state.status = busy;
            terminal.draw(|f| render_browser(f, state))?;
        }
        state.perform(action).await;
    }
}

fn render_browser<S: PayloadSource>(f: &mut Frame, state: &BrowserState<S>) {
    let advisory = state.session.advisory();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if advisory.is_some() { 3 } else { 0 }), // TLS banner
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status
            Constraint::Length(1), // Key help
        ])
        .split(f.size());

    if let Some(advisory) = advisory {
        let banner = Paragraph::new(format!("⚠ {}", advisory))
            .style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(banner, chunks[0]);
    }

    render_header(f, state, chunks[1]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    render_datasets(f, state, content[0]);
    render_preview(f, state, content[1]);

    render_status(f, state, chunks[3]);

    let previous_hint = if state.session.can_go_previous() {
        "p/← previous"
    } else {
        "(first page)"
    };
    let help = match &state.mode {
        InputMode::Filter(_) => "Type to filter  Enter apply  Esc cancel".to_string(),
        InputMode::Navigate => format!(
            "n/→ next  {}  ↑/↓ move  Enter preview  / filter  c clear  q quit",
            previous_hint
        ),
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
}

fn render_header<S: PayloadSource>(f: &mut Frame, state: &BrowserState<S>, area: Rect) {
    let view = state.session.view();
    let mut spans = vec![
        Span::styled(
            "Datos Viewer - datos.gob.es",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "   Page {}",
            state.session.cursor().display_number()
        )),
    ];
    if let Some(total) = view.page.total_items {
        spans.push(Span::raw(format!(" ({} datasets)", total)));
    }
    match (&state.mode, state.session.filter()) {
        (InputMode::Filter(text), _) => {
            spans.push(Span::styled(
                format!("   Filter: {}_", text),
                Style::default().fg(Color::Yellow),
            ));
        }
        (InputMode::Navigate, Some(term)) => {
            spans.push(Span::raw(format!("   Filter: \"{}\"", term)));
        }
        (InputMode::Navigate, None) => {}
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_datasets<S: PayloadSource>(f: &mut Frame, state: &BrowserState<S>, area: Rect) {
    let items: Vec<ListItem> = state
        .session
        .visible_candidates()
        .into_iter()
        .map(|candidate| {
            let format = if candidate.format_hint.is_empty() {
                "?".to_string()
            } else {
                candidate.format_hint.clone()
            };
            ListItem::new(Line::from(vec![
                Span::raw(candidate.title.clone()),
                Span::styled(format!(" [{}]", format), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title("Datasets").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut highlight = state.highlight.clone();
    f.render_stateful_widget(list, area, &mut highlight);
}

fn render_preview<S: PayloadSource>(f: &mut Frame, state: &BrowserState<S>, area: Rect) {
    let Some(dataset) = &state.preview else {
        let placeholder = Paragraph::new("No dataset loaded")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Preview").borders(Borders::ALL));
        f.render_widget(placeholder, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Columns
            Constraint::Min(0),    // Table
        ])
        .split(area);

    let frame = &dataset.frame;
    let columns = Paragraph::new(frame.column_names().join(", "))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!("Columns ({})", frame.column_count()))
                .borders(Borders::ALL),
        );
    f.render_widget(columns, chunks[0]);

    let header: Vec<String> = frame
        .column_names()
        .into_iter()
        .map(|name| truncate_cell(name, preview::MAX_CELL_WIDTH))
        .collect();
    let rows: Vec<Vec<String>> = frame
        .head(state.preview_rows)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| truncate_cell(&cell.to_string(), preview::MAX_CELL_WIDTH))
                .collect()
        })
        .collect();
    let widths: Vec<Constraint> = header
        .iter()
        .enumerate()
        .map(|(column, name)| {
            let widest = rows
                .iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(1);
            Constraint::Length(widest as u16)
        })
        .collect();

    let table = Table::new(rows.into_iter().map(Row::new), widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .title(format!(
                    "{} preview ({} of {} rows)",
                    dataset.format,
                    frame.row_count().min(state.preview_rows),
                    frame.row_count()
                ))
                .borders(Borders::ALL),
        )
        .column_spacing(2);
    f.render_widget(table, chunks[1]);
}

fn render_status<S: PayloadSource>(f: &mut Frame, state: &BrowserState<S>, area: Rect) {
    let color = match state.status.level {
        StatusLevel::Info => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    };
    let status = Paragraph::new(state.status.text.as_str())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(status, area);
}
