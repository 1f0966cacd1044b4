//! Event polling, dispatching and rendering for the full-screen chat.
//!
//! The loop owns the [`ChatApp`] outright. Network calls run on spawned
//! tasks which report back over a channel as [`BackgroundEvent`]s; the loop
//! applies them between frames, so the UI never waits on the service except
//! for logout.

use std::{
    error::Error,
    io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ChatResponse, EndpointModels, UserWithHistory};
use crate::commands::{matching_commands, process_input, CommandResult};
use crate::core::app::ChatApp;
use crate::core::attachment::{Attachment, AttachmentKind};
use crate::core::error::ApiError;
use crate::core::exchange::{PendingSend, SendOutcome};
use crate::core::keyring::SessionVault;
use crate::ui::renderer::ui;
use crate::ui::state::{Focus, UiState};

type ChatTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// Results of work the loop spawned.
#[derive(Debug)]
pub enum BackgroundEvent {
    CatalogLoaded(Result<Vec<EndpointModels>, ApiError>),
    HistoryLoaded(Result<Option<UserWithHistory>, ApiError>),
    SendSettled {
        pending: PendingSend,
        result: Result<ChatResponse, ApiError>,
    },
    Deleted {
        id: String,
        result: Result<(), ApiError>,
    },
}

/// How the chat screen was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    Quit,
    LoggedOut,
}

struct InFlightSend {
    id: u64,
    cancel: CancellationToken,
}

struct ChatLoop {
    app: ChatApp,
    ui: UiState,
    vault: SessionVault,
    background_tx: mpsc::UnboundedSender<BackgroundEvent>,
    in_flight: Option<InFlightSend>,
    exit: Option<ChatExit>,
}

impl ChatLoop {
    fn spawn_catalog_load(&self) {
        let backend = self.app.backend();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_catalog().await;
            let _ = tx.send(BackgroundEvent::CatalogLoaded(result));
        });
    }

    fn spawn_history_refresh(&self) {
        let backend = self.app.backend();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = backend.current_user().await;
            let _ = tx.send(BackgroundEvent::HistoryLoaded(result));
        });
    }

    fn spawn_delete(&mut self, id: String) {
        let Some(email) = self.app.require_email() else {
            return;
        };
        debug!(conversation_id = %id, "Deleting conversation");
        let backend = self.app.backend();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = backend.delete_conversation(&email, &id).await;
            let _ = tx.send(BackgroundEvent::Deleted { id, result });
        });
    }

    fn start_send(&mut self, message: String) {
        self.app.composer.text = message;
        let pending = match self.app.begin_send() {
            Ok(pending) => pending,
            Err(_) => {
                // Refused sends leave the composer as typed.
                let text = std::mem::take(&mut self.app.composer.text);
                self.ui.set_input(text);
                return;
            }
        };

        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlightSend {
            id: pending.id,
            cancel: cancel.clone(),
        });
        self.ui.scroll_to_bottom();
        self.ui.pulse_start = Instant::now();

        let backend = self.app.backend();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = pending.dispatch(backend.as_ref()) => result,
            };
            let _ = tx.send(BackgroundEvent::SendSettled { pending, result });
        });
    }

    /// Cancels the network call of a send the app has abandoned.
    fn sync_in_flight(&mut self) {
        let abandoned = self
            .in_flight
            .as_ref()
            .is_some_and(|send| self.app.exchange.in_flight() != Some(send.id));
        if abandoned {
            if let Some(send) = self.in_flight.take() {
                debug!(send_id = send.id, "Cancelling abandoned send");
                send.cancel.cancel();
            }
        }
    }

    fn apply_background(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::CatalogLoaded(result) => self.app.apply_catalog(result),
            BackgroundEvent::HistoryLoaded(result) => {
                self.app.apply_history(result);
                self.ui
                    .clamp_selection(self.app.conversations.conversations().len());
            }
            BackgroundEvent::SendSettled { pending, result } => {
                if self.in_flight.as_ref().is_some_and(|send| send.id == pending.id) {
                    self.in_flight = None;
                }
                let outcome = self.app.complete_send(&pending, result);
                if matches!(outcome, SendOutcome::Replied { refresh_history: true }) {
                    self.spawn_history_refresh();
                }
                self.ui.scroll_to_bottom();
            }
            BackgroundEvent::Deleted { id, result } => {
                self.app.apply_delete(&id, result);
                self.sync_in_flight();
                self.ui
                    .clamp_selection(self.app.conversations.conversations().len());
            }
        }
    }

    async fn attach(&mut self, kind: AttachmentKind, path: PathBuf) {
        let path = expand_home(&path);
        match Attachment::load(kind, &path).await {
            Ok(attachment) => {
                self.app.notify_info(format!(
                    "Attached {} {}",
                    kind.label(),
                    attachment.file_name
                ));
                self.app.composer.attach(attachment);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read attachment");
                self.app
                    .notify_error(format!("Could not read {}: {err}", path.display()));
            }
        }
    }

    async fn logout(&mut self) {
        if let Some(send) = self.in_flight.take() {
            send.cancel.cancel();
        }
        if let Err(err) = self.app.logout().await {
            warn!(error = %err, "Server logout failed");
        }
        if let Err(err) = self.vault.clear() {
            warn!(error = %err, "Could not remove saved session");
        }
        self.exit = Some(ChatExit::LoggedOut);
    }

    async fn submit(&mut self) {
        let text = self.ui.take_input();
        match process_input(&mut self.app, &text) {
            CommandResult::Continue => {}
            CommandResult::ProcessAsMessage(message) => self.start_send(message),
            CommandResult::Attach(kind, path) => self.attach(kind, path).await,
            CommandResult::RefreshHistory => {
                self.app.notify_info("Refreshing conversations…");
                self.spawn_history_refresh();
            }
            CommandResult::Logout => self.logout().await,
        }
    }

    fn complete_command(&mut self) -> bool {
        let input = self.ui.input();
        if !input.starts_with('/') || input.contains(' ') {
            return false;
        }
        let matches = matching_commands(&input[1..]);
        match matches.as_slice() {
            [] => self.app.notify_error(format!("No command matches {input}")),
            [command] => self.ui.set_input(format!("/{} ", command.name)),
            many => {
                let names: Vec<String> = many.iter().map(|c| format!("/{}", c.name)).collect();
                self.app.notify_info(names.join("  "));
            }
        }
        true
    }

    fn selected_conversation_id(&self) -> Option<String> {
        self.app
            .conversations
            .conversations()
            .get(self.ui.sidebar_index)
            .map(|conversation| conversation.id.clone())
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if control => {
                self.exit = Some(ChatExit::Quit);
                return;
            }
            KeyCode::Char('n') if control => {
                self.app.new_chat();
                self.ui.focus = Focus::Composer;
                self.ui.scroll_to_bottom();
                return;
            }
            KeyCode::Char('r') if control => {
                let enabled = self.app.composer.toggle_rag();
                self.app
                    .notify_info(if enabled { "RAG mode on" } else { "RAG mode off" });
                return;
            }
            _ => {}
        }

        match self.ui.focus {
            Focus::Sidebar => self.handle_sidebar_key(key),
            Focus::Composer => self.handle_composer_key(key).await,
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let len = self.app.conversations.conversations().len();
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.ui.toggle_focus(),
            KeyCode::Up | KeyCode::Char('k') => self.ui.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.ui.move_selection_down(len),
            KeyCode::Enter => {
                if let Some(id) = self.selected_conversation_id() {
                    self.app.select_conversation(&id);
                    self.ui.focus = Focus::Composer;
                    self.ui.scroll_to_bottom();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_conversation_id() {
                    self.spawn_delete(id);
                }
            }
            _ => {}
        }
    }

    async fn handle_composer_key(&mut self, key: KeyEvent) {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => self.submit().await,
            KeyCode::Tab => {
                if !self.complete_command() {
                    self.ui.clamp_selection(self.app.conversations.conversations().len());
                    self.ui.toggle_focus();
                }
            }
            KeyCode::Esc => {
                self.ui.take_input();
                self.app.clear_notice();
            }
            KeyCode::Char(ch) if !control => self.ui.insert_char(ch),
            KeyCode::Backspace => self.ui.backspace(),
            KeyCode::Delete => self.ui.delete(),
            KeyCode::Left => self.ui.move_left(),
            KeyCode::Right => self.ui.move_right(),
            KeyCode::Home => self.ui.move_home(),
            KeyCode::End => self.ui.move_end(),
            KeyCode::Up => self.ui.scroll_up(1),
            KeyCode::Down => self.ui.scroll_down(1),
            KeyCode::PageUp => self.ui.scroll_up(10),
            KeyCode::PageDown => self.ui.scroll_down(10),
            _ => {}
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn setup_terminal() -> Result<ChatTerminal, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut ChatTerminal) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the chat screen until the user quits or logs out.
///
/// `app` must already hold a settled session; the model catalog is loaded in
/// the background.
pub async fn run_chat(app: ChatApp, vault: SessionVault) -> Result<ChatExit, Box<dyn Error>> {
    let (background_tx, mut background_rx) = mpsc::unbounded_channel::<BackgroundEvent>();
    let mut chat = ChatLoop {
        app,
        ui: UiState::new(),
        vault,
        background_tx,
        in_flight: None,
        exit: None,
    };
    chat.spawn_catalog_load();

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader = spawn_event_reader(event_tx);
    info!("Chat screen started");

    const MAX_FPS: u64 = 30;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<ChatExit, Box<dyn Error>> = 'main_loop: loop {
        if let Some(exit) = chat.exit {
            break 'main_loop Ok(exit);
        }

        // Keep the in-flight indicator animating.
        if chat.app.exchange.is_sending() {
            request_redraw = true;
        }
        if request_redraw && last_draw.elapsed() >= frame_duration {
            if let Err(err) = terminal.draw(|f| ui(f, &chat.app, &mut chat.ui)) {
                break 'main_loop Err(err.into());
            }
            last_draw = Instant::now();
            request_redraw = false;
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            events_processed = true;
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    chat.handle_key(key).await;
                    chat.sync_in_flight();
                    if chat.exit.is_some() {
                        break;
                    }
                }
                Event::Paste(text) if chat.ui.focus == Focus::Composer => {
                    for ch in text.chars().filter(|ch| !ch.is_control()) {
                        chat.ui.insert_char(ch);
                    }
                }
                _ => {}
            }
        }

        let mut received_any = false;
        while let Ok(event) = background_rx.try_recv() {
            received_any = true;
            chat.apply_background(event);
        }

        if events_processed || received_any {
            request_redraw = true;
        } else if !request_redraw {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader.abort();
    if let Some(send) = chat.in_flight.take() {
        send.cancel.cancel();
    }
    restore_terminal(&mut terminal)?;
    info!(exit = ?result.as_ref().ok(), "Chat screen closed");
    result
}
