//! Terminal front-end: key handling and the draw loop around a `Page`.

use crate::console::page::{Notice, Page};
use crate::console::ui;
use crate::store::Tab;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a notice stays in the footer.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);
const REDRAW_EVERY: Duration = Duration::from_millis(250);
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing the comment sent with approve / reject
    Comment,
    /// Typing the cancellation reason
    Reason,
}

pub struct App {
    page: Page,
    input: InputMode,
    comment: String,
    reason: String,
    notice: Option<(Notice, Instant)>,
    should_quit: bool,
}

impl App {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            input: InputMode::Normal,
            comment: String::new(),
            reason: String::new(),
            notice: None,
            should_quit: false,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn input_mode(&self) -> InputMode {
        self.input
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// The current notice, unless it has expired.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTICE_TTL)
            .map(|(n, _)| n)
    }

    fn show(&mut self, notice: Option<Notice>) {
        if let Some(notice) = notice {
            self.notice = Some((notice, Instant::now()));
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.input {
            InputMode::Normal => self.handle_normal_key(key).await,
            InputMode::Comment | InputMode::Reason => self.handle_edit_key(key),
        }
    }

    fn edited_text(&mut self) -> &mut String {
        match self.input {
            InputMode::Reason => &mut self.reason,
            _ => &mut self.comment,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.input = InputMode::Normal,
            KeyCode::Esc => {
                self.edited_text().clear();
                self.input = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.edited_text().pop();
            }
            KeyCode::Char(c) => self.edited_text().push(c),
            _ => {}
        }
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) {
        let tab = self.page.store().snapshot().await.active_tab();

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.page.switch_tab(tab.toggle()).await,
            KeyCode::Char('1') => self.page.switch_tab(Tab::Pending).await,
            KeyCode::Char('2') => self.page.switch_tab(Tab::Deferred).await,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1).await,
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1).await,
            KeyCode::Char('e') => {
                self.input = match tab {
                    Tab::Pending => InputMode::Comment,
                    Tab::Deferred => InputMode::Reason,
                };
            }
            KeyCode::Esc => {
                self.comment.clear();
                self.reason.clear();
            }
            KeyCode::Char('a') if tab == Tab::Pending => {
                let notice = self.page.approve_selected(&self.comment).await;
                self.after_action(notice);
            }
            KeyCode::Char('d') if tab == Tab::Pending => {
                let notice = self.page.reject_selected(&self.comment).await;
                self.after_action(notice);
            }
            KeyCode::Char('c') if tab == Tab::Deferred => {
                let notice = self.page.cancel_selected(&self.reason).await;
                self.after_action(notice);
            }
            KeyCode::Char('r') => {
                let notice = self.page.refresh_active().await;
                self.show(notice);
            }
            KeyCode::Char('p') => {
                let notice = self.page.toggle_polling().await;
                self.show(Some(notice));
            }
            _ => {}
        }
    }

    async fn move_selection(&mut self, delta: isize) {
        self.page.store().select_relative(delta).await;
        self.comment.clear();
        self.reason.clear();
    }

    /// Texts are kept after a failure so the operator can retry.
    fn after_action(&mut self, notice: Option<Notice>) {
        if matches!(notice, Some(ref n) if !n.is_error()) {
            self.comment.clear();
            self.reason.clear();
        }
        self.show(notice);
    }
}

/// Run the console until the operator quits. The terminal is restored on
/// every exit path.
pub async fn run(page: Page) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, App::new(page)).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// crossterm reads are blocking, so keys come from a blocking thread.
fn spawn_input_reader(
    tx: mpsc::UnboundedSender<KeyEvent>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Result<()>> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::SeqCst) {
            if !event::poll(INPUT_POLL)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
                    && tx.send(key).is_err()
                {
                    break;
                }
            }
        }
        Ok(())
    })
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    let snapshot = app.page().store().snapshot().await;
    terminal.draw(|f| ui::render(f, &app, &snapshot))?;
    app.page_mut().initialize().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_input_reader(tx, stop.clone());
    let mut redraw = tokio::time::interval(REDRAW_EVERY);

    let result = loop {
        tokio::select! {
            Some(key) = rx.recv() => app.handle_key(key).await,
            _ = redraw.tick() => {}
        }
        if app.should_quit() {
            break Ok(());
        }

        app.page().auto_select().await;
        let snapshot = app.page().store().snapshot().await;
        if let Err(e) = terminal.draw(|f| ui::render(f, &app, &snapshot)) {
            break Err(e.into());
        }
    };

    stop.store(true, Ordering::SeqCst);
    app.page_mut().shutdown();
    match reader.await {
        Ok(Err(e)) if result.is_ok() => return Err(e),
        _ => {}
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{ApiError, ApiResult};
    use crate::api::protocol::*;
    use crate::api::SafeguardApi;
    use crate::approval::types::ApprovalStatus;
    use crate::config::{Role, Session};
    use crate::console::page::PageOptions;
    use crate::store::Store;
    use async_trait::async_trait;

    /// Backend that is never reachable.
    struct Offline;

    #[async_trait]
    impl SafeguardApi for Offline {
        async fn list_requests(&self, _: ApprovalStatus) -> ApiResult<RequestListResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn request_detail(&self, _: &str) -> ApiResult<RequestDetailResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn approve(&self, _: &DecisionBody) -> ApiResult<DecisionResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn reject(&self, _: &DecisionBody) -> ApiResult<DecisionResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn history(&self, _: u32) -> ApiResult<RequestListResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn list_deferred(&self, _: u32) -> ApiResult<DeferredListResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn deferred_detail(&self, _: &str) -> ApiResult<DeferredDetailResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn cancel_deferred(&self, _: &str, _: &CancelBody) -> ApiResult<CancelResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
        async fn deferred_stats(&self) -> ApiResult<DeferredStatsResponse> {
            Err(ApiError::Transport("connection refused".into()))
        }
    }

    async fn demo_app() -> App {
        let store = Store::new(Arc::new(Offline));
        let session = Session {
            user: "admin.jean".to_string(),
            role: Role::Admin,
        };
        let mut page = Page::new(store, session, PageOptions::default()).unwrap();
        page.initialize().await;
        App::new(page)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_comment_editing() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('e'))).await;
        assert_eq!(app.input_mode(), InputMode::Comment);
        for c in "okk".chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
        app.handle_key(key(KeyCode::Backspace)).await;
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert_eq!(app.comment(), "ok");

        // 'q' typed while editing is text, not quit
        app.handle_key(key(KeyCode::Char('e'))).await;
        app.handle_key(key(KeyCode::Char('q'))).await;
        assert!(!app.should_quit());
        app.handle_key(key(KeyCode::Esc)).await;
        assert_eq!(app.comment(), "");
    }

    #[tokio::test]
    async fn test_approve_in_demo_mode_removes_request() {
        let mut app = demo_app().await;
        assert_eq!(app.page().store().snapshot().await.pending_count(), 2);

        app.handle_key(key(KeyCode::Char('a'))).await;
        let snapshot = app.page().store().snapshot().await;
        assert_eq!(snapshot.pending_count(), 1);
        assert_eq!(
            app.notice(),
            Some(&Notice::Success(
                "Request approved - action scheduled for D+1".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_cancel_only_on_scheduled_tab() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('c'))).await;
        assert!(app.notice().is_none());

        app.handle_key(key(KeyCode::Char('2'))).await;
        app.handle_key(key(KeyCode::Char('c'))).await;
        assert_eq!(
            app.notice(),
            Some(&Notice::Success("Action cancelled".to_string()))
        );
        assert_eq!(app.page().store().snapshot().await.deferred_count(), 1);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('q'))).await;
        assert!(app.should_quit());

        let mut app = demo_app().await;
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .await;
        assert!(app.should_quit());
    }
}
