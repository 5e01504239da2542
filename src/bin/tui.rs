use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{
    application::todo_service::{ServiceError, TodoService, TodoServiceImpl},
    config::{Config, StoreKind},
    domain::{repository::TodoRepository, todo::{CreateTodo, Todo}},
    infrastructure::{json_repo::JsonFileTodoRepository, memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    match &config.store {
        StoreKind::Memory => run(InMemoryTodoRepository::default(), &config).await,
        StoreKind::Json(path) => run(JsonFileTodoRepository::new(path), &config).await,
        StoreKind::Sqlite(url) => run(SqliteTodoRepository::connect(url).await?, &config).await,
    }
}

async fn run<R: TodoRepository>(repo: R, config: &Config) -> Result<()> {
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, store_label(&config.store)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

fn store_label(store: &StoreKind) -> String {
    match store {
        StoreKind::Memory => "memory".to_string(),
        StoreKind::Json(path) => format!("json:{}", path.display()),
        StoreKind::Sqlite(url) => url.clone(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter { All, Active, Completed }

impl Filter {
    fn next(self) -> Self {
        match self { Filter::All => Filter::Active, Filter::Active => Filter::Completed, Filter::Completed => Filter::All }
    }

    fn label(self) -> &'static str {
        match self { Filter::All => "All", Filter::Active => "Active", Filter::Completed => "Completed" }
    }

    fn includes(self, todo: &Todo) -> bool {
        match self { Filter::All => true, Filter::Active => !todo.completed, Filter::Completed => todo.completed }
    }
}

struct App<R: TodoRepository> {
    service: TodoServiceImpl<R>,
    items: Vec<Todo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    filtered_indices: Vec<usize>,
    draft_title: String,
    status: String,
}

impl<R: TodoRepository> App<R> {
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list().await?;
        self.recompute_filtered();
        Ok(())
    }

    fn recompute_filtered(&mut self) {
        let filter = self.filter;
        self.filtered_indices = self.items.iter().enumerate().filter(|(_, t)| filter.includes(t)).map(|(i, _)| i).collect();
        // Clamp selection within filtered bounds
        let len = self.filtered_indices.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn current(&self) -> Option<&Todo> {
        self.filtered_indices.get(self.selected).and_then(|&idx| self.items.get(idx))
    }

    fn report(&mut self, outcome: Result<String, ServiceError>) {
        self.status = match outcome {
            Ok(msg) => msg,
            Err(ServiceError::Validation) => "Title required".to_string(),
            Err(ServiceError::NotFound(id)) => format!("Todo {id} no longer exists"),
            Err(ServiceError::Storage(e)) => format!("Storage error: {e:#}"),
        };
    }
}

async fn run_app<R: TodoRepository>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: TodoServiceImpl<R>, store: String) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), filter: Filter::All, filtered_indices: Vec::new(), draft_title: String::new(), status: String::new() };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Todos (Enter/Space: toggle, n: new, d: delete, f: filter, q: quit)  |  New: type title, Enter to save, Esc to cancel")
                .block(Block::default().borders(Borders::ALL).title("todo-tui"));
            f.render_widget(header, chunks[0]);

            let list_items: Vec<ListItem> = app.filtered_indices.iter().filter_map(|&idx| app.items.get(idx)).map(|t| {
                let mark = if t.completed { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} #{} {}", mark, t.id, t.title))
            }).collect();
            // Keep list_state selection in sync with current index
            if app.filtered_indices.is_empty() { app.list_state.select(None); } else { app.list_state.select(Some(app.selected)); }
            let done = app.items.iter().filter(|t| t.completed).count();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}] {}/{} done", app.filter.label(), done, app.items.len())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, chunks[1], &mut app.list_state);

            let footer_text = match app.mode {
                Mode::View if app.status.is_empty() => format!("store={}  |  Filter=[{}]", store, app.filter.label()),
                Mode::View => app.status.clone(),
                Mode::Create => format!("Create: {}_  |  (Enter to save, Esc to cancel)", app.draft_title),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; } }
                        KeyCode::Down => { let len = app.filtered_indices.len(); if app.selected + 1 < len { app.selected += 1; } }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            if let Some(id) = app.current().map(|t| t.id) {
                                let outcome = app.service.toggle(id).await.map(|t| format!("#{} marked {}", t.id, if t.completed { "done" } else { "active" }));
                                app.report(outcome);
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('n') => {
                            app.mode = Mode::Create;
                            app.draft_title.clear();
                        }
                        KeyCode::Char('d') => {
                            if let Some(id) = app.current().map(|t| t.id) {
                                let outcome = app.service.delete(id).await.map(|_| format!("#{id} deleted"));
                                app.report(outcome);
                                if app.selected > 0 { app.selected -= 1; }
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('f') => {
                            app.filter = app.filter.next();
                            app.recompute_filtered();
                        }
                        _ => {}
                    },
                    Mode::Create => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.draft_title.clear(); }
                        KeyCode::Enter => {
                            let title = std::mem::take(&mut app.draft_title);
                            let outcome = app.service.create(CreateTodo { title: Some(title) }).await.map(|t| format!("#{} created", t.id));
                            app.report(outcome);
                            app.mode = Mode::View;
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft_title.pop(); }
                        KeyCode::Char(c) => app.draft_title.push(c),
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
