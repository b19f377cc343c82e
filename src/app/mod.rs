use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::list::{Chrome, ShoppingList};
use crate::storage::KeyValueStore;
use crate::ui;

pub mod actions;
pub mod state;

pub use actions::{ActionDispatcher, Command, CommandOutcome};
pub use state::{AppState, FocusPane, OverlayState};

/// Keys that are not plain text entry.
enum Action {
    Quit,
    CycleFocus,
    SelectNext,
    SelectPrevious,
    EditSelected,
    DeleteSelected,
    ClearAll,
    FocusFilter,
    FocusInput,
}

pub struct App<S> {
    list: ShoppingList<S>,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(config: &AppConfig, list: ShoppingList<S>) -> Self {
        let mut state = AppState::new(config.palette());
        if list.is_empty() {
            state.set_status_message(Some("Type an item and press Enter"));
        } else {
            state.set_status_message(Some(format!("Loaded {} item(s)", list.len())));
        }
        Self {
            list,
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn list(&self) -> &ShoppingList<S> {
        &self.list
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.list.visible_indices().is_empty() {
                        self.list_state.select(None);
                    } else {
                        self.list_state.select(Some(self.state.selected));
                    }
                    ui::draw_app(frame, &self.list, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw picks up the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.state.expire_status(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.handle_overlay_key(key) {
            return;
        }

        match self.state.focus {
            FocusPane::Input => self.handle_input_key(key),
            FocusPane::Filter => self.handle_filter_key(key),
            FocusPane::List => {
                if let Some(action) = list_action(key) {
                    self.handle_action(action);
                }
            }
        }
        self.state.sync_with(&self.list);
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let Some(ticket) = self.state.pending_ticket().cloned() else {
            return false;
        };
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return true,
        };
        self.state.close_overlay();
        self.run_command(Command::ResolveDelete { ticket, confirmed });
        self.state.sync_with(&self.list);
        true
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.run_command(Command::Submit(None));
            }
            KeyCode::Esc => {
                if self.list.is_editing() {
                    self.list.refresh_visibility();
                    self.list.input_mut().clear();
                    self.state.set_status_message(Some("Edit canceled"));
                } else {
                    self.state.focus = FocusPane::List;
                }
            }
            KeyCode::Tab => self.state.cycle_focus(self.list.chrome()),
            KeyCode::Backspace => {
                self.list.input_mut().backspace();
            }
            KeyCode::Delete => {
                self.list.input_mut().delete();
            }
            KeyCode::Left => {
                self.list.input_mut().move_left();
            }
            KeyCode::Right => {
                self.list.input_mut().move_right();
            }
            KeyCode::Home => {
                self.list.input_mut().move_home();
            }
            KeyCode::End => {
                self.list.input_mut().move_end();
            }
            KeyCode::Char(ch) if !has_command_modifier(key.modifiers) => {
                self.list.input_mut().insert_char(ch);
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let changed = match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.state.focus = FocusPane::List;
                false
            }
            KeyCode::Tab => {
                self.state.cycle_focus(self.list.chrome());
                false
            }
            KeyCode::Backspace => self.state.filter_input.backspace(),
            KeyCode::Delete => self.state.filter_input.delete(),
            KeyCode::Left => {
                self.state.filter_input.move_left();
                false
            }
            KeyCode::Right => {
                self.state.filter_input.move_right();
                false
            }
            KeyCode::Char(ch) if !has_command_modifier(key.modifiers) => {
                self.state.filter_input.insert_char(ch)
            }
            _ => false,
        };
        if changed {
            let query = self.state.filter_input.value().to_string();
            self.run_command(Command::FilterChanged(query));
            self.state.selected = 0;
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::CycleFocus => self.state.cycle_focus(self.list.chrome()),
            Action::SelectNext => {
                let visible = self.list.visible_indices().len();
                self.state.move_selection(1, visible);
            }
            Action::SelectPrevious => {
                let visible = self.list.visible_indices().len();
                self.state.move_selection(-1, visible);
            }
            Action::EditSelected => {
                let Some(index) = self.state.selected_entry(&self.list) else {
                    return;
                };
                if let Some(CommandOutcome::Editing { .. }) =
                    self.run_command(Command::SelectForEdit(index))
                {
                    self.state.focus = FocusPane::Input;
                }
            }
            Action::DeleteSelected => {
                let Some(index) = self.state.selected_entry(&self.list) else {
                    return;
                };
                if let Some(CommandOutcome::DeleteRequested(ticket)) =
                    self.run_command(Command::Delete(index))
                {
                    self.state.open_confirm_delete(ticket);
                }
            }
            Action::ClearAll => {
                if self.list.chrome().contains(Chrome::CLEAR_ALL) {
                    self.run_command(Command::ClearAll);
                }
            }
            Action::FocusFilter => {
                if self.list.chrome().contains(Chrome::FILTER) {
                    self.state.focus = FocusPane::Filter;
                }
            }
            Action::FocusInput => self.state.focus = FocusPane::Input,
        }
    }

    fn run_command(&mut self, command: Command) -> Option<CommandOutcome> {
        let mut dispatcher = ActionDispatcher::new(&mut self.list);
        match dispatcher.dispatch(command) {
            Ok(outcome) => {
                if let Some(message) = actions::describe(&outcome) {
                    self.state.set_status_message(Some(message));
                }
                Some(outcome)
            }
            Err(err) => {
                tracing::error!(?err, "command failed");
                self.state
                    .set_status_message(Some("Could not save the list; see logs"));
                None
            }
        }
    }
}

fn list_action(key: KeyEvent) -> Option<Action> {
    if has_command_modifier(key.modifiers) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::CycleFocus),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
        KeyCode::Char('e') | KeyCode::Enter => Some(Action::EditSelected),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteSelected),
        KeyCode::Char('C') => Some(Action::ClearAll),
        KeyCode::Char('/') => Some(Action::FocusFilter),
        KeyCode::Char('a') | KeyCode::Char('i') => Some(Action::FocusInput),
        _ => None,
    }
}

fn has_command_modifier(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("creating terminal backend")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
