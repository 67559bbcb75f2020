// 🖥️ Terminal UI - one frame per controller view
//
// The UI thread owns the terminal and never awaits. Intents go straight to the
// controller under its lock; edit/merge requests are spawned on the runtime
// and their outcomes come back over a channel drained once per frame.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use studio_pass::{
    guard_page, request_edit, EditOperation, EditOutcome, EditRequest, Identity, ImageData,
    ImageGenerator, Page, PasswordChange, PerformOutcome, PlanKind, RegistrationForm,
    SessionController, SessionToken, SessionView, SharedController, TaskKind, TaskStatus,
    ValidationError,
};
use tokio::runtime::Handle;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

// ============================================================================
// FORMS
// ============================================================================

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    fn new(fields: &[(&'static str, bool)]) -> Self {
        Form {
            fields: fields
                .iter()
                .map(|&(label, masked)| Field {
                    label,
                    value: String::new(),
                    masked,
                })
                .collect(),
            focus: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn previous_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    /// Forget secrets, keep everything else
    pub fn clear_masked(&mut self) {
        for field in self.fields.iter_mut().filter(|f| f.masked) {
            field.value.clear();
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
    }
}

pub struct Forms {
    pub login: Form,
    pub register: Form,
    pub editor: Form,
    pub merge: Form,
    pub settings: Form,
}

impl Forms {
    fn new() -> Self {
        Forms {
            login: Form::new(&[("Email", false), ("Password", true)]),
            register: Form::new(&[("Email", false), ("Password", true), ("Confirm password", true)]),
            editor: Form::new(&[("Image path", false), ("Prompt", false)]),
            merge: Form::new(&[("First image", false), ("Second image", false), ("Prompt", false)]),
            settings: Form::new(&[
                ("Current password", true),
                ("New password", true),
                ("Confirm new password", true),
            ]),
        }
    }

    pub fn get(&self, page: Page) -> Option<&Form> {
        match page {
            Page::Login => Some(&self.login),
            Page::Register => Some(&self.register),
            Page::Editor => Some(&self.editor),
            Page::Merge => Some(&self.merge),
            Page::Settings => Some(&self.settings),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, page: Page) -> Option<&mut Form> {
        match page {
            Page::Login => Some(&mut self.login),
            Page::Register => Some(&mut self.register),
            Page::Editor => Some(&mut self.editor),
            Page::Merge => Some(&mut self.merge),
            Page::Settings => Some(&mut self.settings),
            _ => None,
        }
    }
}

// ============================================================================
// APP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

/// Outcome of one spawned edit/merge request
type Completion = (EditOperation, Result<EditOutcome, ValidationError>);

pub struct App {
    controller: SharedController,
    generator: Arc<dyn ImageGenerator>,
    runtime: Handle,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    output_dir: PathBuf,

    pub forms: Forms,
    pub selection: TableState,
    pub status: Option<StatusLine>,

    last_token: SessionToken,
    last_identity: Option<Identity>,
    quit: bool,
}

impl App {
    pub fn new(
        controller: SharedController,
        generator: Arc<dyn ImageGenerator>,
        runtime: Handle,
        output_dir: PathBuf,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        let (last_token, last_identity) = {
            let ctl = controller.blocking_lock();
            (ctl.session_token(), ctl.identity().cloned())
        };

        App {
            controller,
            generator,
            runtime,
            completions_tx,
            completions_rx,
            output_dir,
            forms: Forms::new(),
            selection: TableState::default(),
            status: None,
            last_token,
            last_identity,
            quit: false,
        }
    }

    pub fn view(&self) -> SessionView {
        self.controller.blocking_lock().view()
    }

    fn with_controller<R>(&mut self, f: impl FnOnce(&mut SessionController) -> R) -> R {
        let result = {
            let mut ctl = self.controller.blocking_lock();
            f(&mut ctl)
        };
        self.remember_session();
        result
    }

    fn remember_session(&mut self) {
        let ctl = self.controller.blocking_lock();
        self.last_token = ctl.session_token();
        self.last_identity = ctl.identity().cloned();
    }

    fn say(&mut self, tone: Tone, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            tone,
        });
    }

    /// Pick up work done off the UI thread since the last frame
    pub fn poll_background(&mut self) {
        let (token, identity) = {
            let ctl = self.controller.blocking_lock();
            (ctl.session_token(), ctl.identity().cloned())
        };
        if token != self.last_token {
            // Only the sweep replaces the session behind our back
            if self.last_identity.is_some() && identity.is_none() {
                self.say(Tone::Error, "Your account has expired. Please sign in again.");
            }
            self.last_token = token;
            self.last_identity = identity;
        }

        while let Ok((operation, result)) = self.completions_rx.try_recv() {
            match result {
                Ok(EditOutcome::Delivered(image)) => match self.save_image(operation, &image) {
                    Ok(path) => self.say(Tone::Success, format!("Saved {} result to {}", operation, path.display())),
                    Err(e) => self.say(Tone::Error, format!("{:#}", e)),
                },
                Ok(EditOutcome::Failed { message }) => self.say(Tone::Error, message),
                Ok(EditOutcome::Discarded) => {}
                Err(e) => self.say(Tone::Error, e.to_string()),
            }
        }
    }

    fn save_image(&self, operation: EditOperation, image: &ImageData) -> Result<PathBuf> {
        let name = format!(
            "{}-{}.{}",
            operation,
            image.fingerprint(),
            extension_for_mime(&image.mime_type)
        );
        let path = self.output_dir.join(name);
        fs::write(&path, &image.bytes)
            .with_context(|| format!("Failed to write result image: {:?}", path))?;
        info!(path = %path.display(), "result saved");
        Ok(path)
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        let view = self.view();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => self.quit = true,
            KeyCode::Char('l') if ctrl => {
                self.with_controller(|ctl| ctl.logout());
                self.say(Tone::Info, "Signed out.");
            }
            KeyCode::Char('d') if ctrl && view.page == Page::Settings => {
                self.with_controller(|ctl| ctl.delete_session());
                self.say(Tone::Info, "Account deleted.");
            }
            KeyCode::F(n) => {
                if let Some(page) = (n as usize).checked_sub(1).and_then(|i| Page::ALL.get(i).copied()) {
                    let landed = self.with_controller(|ctl| ctl.navigate(page));
                    self.selection = TableState::default();
                    if landed != page {
                        self.say(Tone::Info, format!("{} is not available here.", page.title()));
                    }
                }
            }
            KeyCode::Esc if view.rating_prompt.is_some() => {
                self.with_controller(|ctl| ctl.cancel_rating());
            }
            KeyCode::Esc => self.quit = true,
            _ => self.handle_page_key(key, &view),
        }
    }

    fn handle_page_key(&mut self, key: KeyEvent, view: &SessionView) {
        match view.page {
            Page::Tasks => self.handle_tasks_key(key, view),
            Page::Generator => self.handle_generator_key(key, view),
            Page::Pricing => {}
            page => {
                let Some(form) = self.forms.get_mut(page) else {
                    return;
                };
                match key.code {
                    KeyCode::Tab | KeyCode::Down => form.next_field(),
                    KeyCode::BackTab | KeyCode::Up => form.previous_field(),
                    KeyCode::Backspace => form.pop(),
                    KeyCode::Char(c) => form.push(c),
                    KeyCode::Enter => self.submit(page),
                    _ => {}
                }
            }
        }
    }

    fn handle_tasks_key(&mut self, key: KeyEvent, view: &SessionView) {
        if view.rating_prompt.is_some() {
            if let KeyCode::Char(c @ '0'..='9') = key.code {
                let rating = c as u8 - b'0';
                match self.with_controller(|ctl| ctl.submit_rating(rating)) {
                    Ok(_) => self.say(Tone::Success, "Thanks for rating! Claim your reward."),
                    Err(e) => self.say(Tone::Error, e.to_string()),
                }
            }
            return;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => move_selection(&mut self.selection, view.tasks.len(), 1),
            KeyCode::Up | KeyCode::Char('k') => move_selection(&mut self.selection, view.tasks.len(), -1),
            KeyCode::Enter => {
                let Some(task) = self.selection.selected().and_then(|i| view.tasks.get(i)) else {
                    return;
                };
                let task_id = task.id.clone();
                match task.status {
                    TaskStatus::Available => {
                        if self.with_controller(|ctl| ctl.perform_task(&task_id)) == PerformOutcome::Completed {
                            self.say(Tone::Info, format!("\"{}\" done. Press Enter to claim.", task.title));
                        }
                    }
                    TaskStatus::Claimable => {
                        if let Some(reward) = self.with_controller(|ctl| ctl.claim_task(&task_id)) {
                            self.say(Tone::Success, format!("+{} credits", reward));
                        }
                    }
                    TaskStatus::Claimed => {}
                }
            }
            _ => {}
        }
    }

    fn handle_generator_key(&mut self, key: KeyEvent, view: &SessionView) {
        match key.code {
            KeyCode::Char(c @ '1'..='7') => {
                let kind = PlanKind::ALL[(c as u8 - b'1') as usize];
                if let Some(account) = self.with_controller(|ctl| ctl.generate_account(kind)) {
                    self.say(Tone::Success, format!("Generated {}", account.identity));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => move_selection(&mut self.selection, view.accounts.len(), 1),
            KeyCode::Up | KeyCode::Char('k') => move_selection(&mut self.selection, view.accounts.len(), -1),
            KeyCode::Char('d') | KeyCode::Delete => {
                let Some(account) = self.selection.selected().and_then(|i| view.accounts.get(i)) else {
                    return;
                };
                let identity = account.identity.clone();
                if self.with_controller(|ctl| ctl.delete_account(&identity)) {
                    self.say(Tone::Info, format!("Deleted {}", identity));
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self, page: Page) {
        match page {
            Page::Login => {
                let (identity, secret) = (self.forms.login.value(0).to_string(), self.forms.login.value(1).to_string());
                self.forms.login.clear_masked();
                match self.with_controller(|ctl| ctl.sign_in(&identity, &secret)) {
                    Ok(()) => {
                        self.forms.login.clear();
                        self.say(Tone::Success, format!("Welcome, {}", identity.trim()));
                    }
                    Err(e) => self.say(Tone::Error, e.to_string()),
                }
            }
            Page::Register => {
                let form = RegistrationForm {
                    identity: self.forms.register.value(0).to_string(),
                    secret: self.forms.register.value(1).to_string(),
                    confirm: self.forms.register.value(2).to_string(),
                };
                self.forms.register.clear_masked();
                match self.with_controller(|ctl| ctl.register(&form)) {
                    Ok(()) => {
                        self.forms.register.clear();
                        self.say(Tone::Success, "Account created.");
                    }
                    Err(e) => self.say(Tone::Error, e.to_string()),
                }
            }
            Page::Settings => {
                let change = PasswordChange {
                    current: self.forms.settings.value(0).to_string(),
                    new: self.forms.settings.value(1).to_string(),
                    confirm: self.forms.settings.value(2).to_string(),
                };
                let result = self.controller.blocking_lock().change_password(&change);
                self.forms.settings.clear();
                match result {
                    Ok(message) => self.say(Tone::Success, message),
                    Err(e) => self.say(Tone::Error, e.to_string()),
                }
            }
            Page::Editor => {
                let form = &self.forms.editor;
                let prompt = form.value(1).to_string();
                match load_optional(form.value(0)) {
                    Ok(image) => self.spawn_edit(EditRequest::Edit { image, prompt }),
                    Err(e) => self.say(Tone::Error, format!("{:#}", e)),
                }
            }
            Page::Merge => {
                let form = &self.forms.merge;
                let prompt = form.value(2).to_string();
                let images = load_optional(form.value(0)).and_then(|first| Ok((first, load_optional(form.value(1))?)));
                match images {
                    Ok((first, second)) => self.spawn_edit(EditRequest::Merge { first, second, prompt }),
                    Err(e) => self.say(Tone::Error, format!("{:#}", e)),
                }
            }
            _ => {}
        }
    }

    fn spawn_edit(&mut self, request: EditRequest) {
        let operation = request.operation();
        let controller = self.controller.clone();
        let generator = self.generator.clone();
        let tx = self.completions_tx.clone();

        self.runtime.spawn(async move {
            let result = request_edit(&controller, generator.as_ref(), request).await;
            if tx.send((operation, result)).is_err() {
                warn!(operation = %operation, "UI closed before the result arrived");
            }
        });
        self.say(Tone::Info, format!("Working on your {}...", operation));
    }
}

/// Blank path means "no image"
fn load_optional(path: &str) -> Result<Option<ImageData>> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    ImageData::load(Path::new(path)).map(Some)
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

fn move_selection(state: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    state.select(Some(next));
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    while !app.quit {
        app.poll_background();
        let view = app.view();
        terminal.draw(|f| ui(f, app, &view))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App, view: &SessionView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Page tabs + session
            Constraint::Min(0),    // Page content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], view);

    match view.page {
        Page::Tasks => render_tasks(f, chunks[1], app, view),
        Page::Generator => render_generator(f, chunks[1], app, view),
        Page::Pricing => render_pricing(f, chunks[1], view),
        page => {
            if let Some(form) = app.forms.get(page) {
                render_form(f, chunks[1], page, form, view);
            }
        }
    }

    if view.page == Page::Tasks && view.rating_prompt.is_some() {
        let screen = f.size();
        render_rating_popup(f, screen);
    }

    render_status_bar(f, chunks[2], app, view);
}

fn render_header(f: &mut Frame, area: Rect, view: &SessionView) {
    let signed_in = view.identity.is_some();
    let mut spans = vec![];

    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let reachable = guard_page(signed_in, view.can_generate_accounts, *page) == *page;
        let style = if *page == view.page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if reachable {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("F{} {}", i + 1, page.title()), style));
    }

    spans.push(Span::raw("  |  "));
    match &view.identity {
        Some(identity) => {
            spans.push(Span::styled(identity.to_string(), Style::default().fg(Color::Cyan)));
            spans.push(Span::raw("  "));
            spans.push(Span::styled(view.plan_label, Style::default().fg(Color::Magenta)));
            spans.push(Span::raw("  "));
            let credits = if view.unlimited {
                "∞ credits".to_string()
            } else {
                format!("{} credits", view.credits)
            };
            let color = if view.unlimited || view.credits > 0 { Color::Green } else { Color::Red };
            spans.push(Span::styled(credits, Style::default().fg(color)));
        }
        None => spans.push(Span::styled("signed out", Style::default().fg(Color::DarkGray))),
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, page: Page, form: &Form, view: &SessionView) {
    let mut lines = vec![Line::from("")];

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let value = if field.masked {
            "•".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let cursor = if focused { "▏" } else { "" };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<22}", field.label), label_style),
            Span::raw(value),
            Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ]));
        lines.push(Line::from(""));
    }

    let operation = match page {
        Page::Editor => Some(EditOperation::Edit),
        Page::Merge => Some(EditOperation::Merge),
        _ => None,
    };
    if let Some(operation) = operation {
        let cost = if view.unlimited { "free on your plan" } else { "costs 1 credit" };
        lines.push(Line::from(Span::styled(
            format!("  Enter to run the {} ({}). Results are saved next to the app.", operation, cost),
            Style::default().fg(Color::DarkGray),
        )));
        if view.pending.contains(&operation) {
            lines.push(Line::from(Span::styled(
                format!("  ⏳ {} in progress...", operation),
                Style::default().fg(Color::Yellow),
            )));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "  Tab to move between fields, Enter to submit",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if page == Page::Settings {
        lines.push(Line::from(Span::styled(
            "  Ctrl+D deletes this account and signs out",
            Style::default().fg(Color::Red),
        )));
    }

    let form = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", page.title())),
    );
    f.render_widget(form, area);
}

fn render_tasks(f: &mut Frame, area: Rect, app: &mut App, view: &SessionView) {
    if app.selection.selected().map_or(true, |i| i >= view.tasks.len()) && !view.tasks.is_empty() {
        app.selection.select(Some(0));
    }

    let header = Row::new(["Task", "Reward", "Status"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = view.tasks.iter().map(|task| {
        let (status, color) = match task.status {
            TaskStatus::Available if task.kind == TaskKind::Rating => ("Rate (Enter)", Color::White),
            TaskStatus::Available => ("Start (Enter)", Color::White),
            TaskStatus::Claimable => ("Claim (Enter)", Color::Green),
            TaskStatus::Claimed => ("Claimed", Color::DarkGray),
        };
        Row::new(vec![
            Cell::from(format!("{}\n{}", task.title, task.description)),
            Cell::from(format!("+{}", task.reward)),
            Cell::from(status).style(Style::default().fg(color)),
        ])
        .height(2)
    });

    let table = Table::new(
        rows,
        [Constraint::Min(30), Constraint::Length(8), Constraint::Length(16)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Earn Credits "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.selection);
}

fn render_generator(f: &mut Frame, area: Rect, app: &mut App, view: &SessionView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let legend: Vec<Span> = PlanKind::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, kind)| {
            vec![
                Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(format!(" {}   ", kind.label())),
            ]
        })
        .collect();
    let legend = Paragraph::new(vec![
        Line::from(legend),
        Line::from(Span::styled(
            "d delete selected   ↑/↓ select",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Generate Account "));
    f.render_widget(legend, chunks[0]);

    match app.selection.selected() {
        _ if view.accounts.is_empty() => app.selection.select(None),
        Some(i) if i < view.accounts.len() => {}
        _ => app.selection.select(Some(0)),
    }

    let header = Row::new(["Email", "Password", "Plan", "Time left"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = view.accounts.iter().map(|account| {
        Row::new(vec![
            Cell::from(account.identity.to_string()),
            Cell::from(account.secret.clone()),
            Cell::from(account.plan_label),
            Cell::from(account.time_remaining.clone()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(34),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Generated Accounts ({}) ", view.accounts.len())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.selection);
}

fn render_pricing(f: &mut Frame, area: Rect, view: &SessionView) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Plans",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  Basic        metered credits each session, earn more from tasks"),
    ];
    for kind in PlanKind::ALL {
        let length = match kind.duration() {
            Some(duration) => format!("{} day(s)", duration.num_days()),
            None => "forever".to_string(),
        };
        lines.push(Line::from(format!("  {:<12} unlimited edits for {}", kind.label(), length)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  Your plan: {}", view.plan_label),
        Style::default().fg(Color::Magenta),
    )));

    let pricing = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Pricing "));
    f.render_widget(pricing, area);
}

fn render_rating_popup(f: &mut Frame, screen: Rect) {
    let width = 44.min(screen.width);
    let height = 5.min(screen.height);
    let area = Rect {
        x: screen.x + (screen.width - width) / 2,
        y: screen.y + (screen.height - height) / 2,
        width,
        height,
    };

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("1-5", Style::default().fg(Color::Yellow)),
            Span::raw(" to rate, "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" to cancel"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Rate the app "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, view: &SessionView) {
    let mut spans = vec![];

    if let Some(status) = &app.status {
        let color = match status.tone {
            Tone::Info => Color::Cyan,
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
        };
        spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(color)));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled("F1-F8", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Pages | "));
    if view.identity.is_some() {
        spans.push(Span::styled("Ctrl+L", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" Sign out | "));
    }
    spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White)));

    f.render_widget(status_bar, area);
}

// ============================================================================
// TESTS
// ============================================================================
