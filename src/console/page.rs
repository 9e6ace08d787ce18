//! The Safeguard page: everything the console does besides drawing.
//!
//! 1. Refuses non-admin sessions before touching the network
//! 2. Loads both collections once, concurrently
//! 3. Falls back to placeholder data if that first load fails
//! 4. Runs either the polling task (live) or the countdown task (demo)
//! 5. Turns operator actions into store calls and returns a `Notice`

use crate::approval::lifecycle::check_cancellable;
use crate::api::ApiError;
use crate::config::{Config, Session};
use crate::console::demo;
use crate::console::tasks::{self, TaskGuard};
use crate::store::{Collection, Store, Tab};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Talking to the approval service
    Live,
    /// Placeholder data, no server round-trips
    Demo,
}

/// Transient message shown after an operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("the Safeguard console requires an admin session (current role: {role})")]
    NotAdmin { role: String },
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Use placeholder data when the first load fails
    pub demo_fallback: bool,
    /// Skip the backend entirely
    pub force_demo: bool,
    pub demo_tick: Duration,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            demo_fallback: true,
            force_demo: false,
            demo_tick: Duration::from_secs(demo::COUNTDOWN_STEP_SECS as u64),
        }
    }
}

impl PageOptions {
    pub fn from_config(config: &Config, force_demo: bool) -> Self {
        Self {
            demo_fallback: config.demo.fallback,
            force_demo,
            demo_tick: Duration::from_secs(config.demo.tick_secs),
        }
    }
}

pub struct Page {
    store: Store,
    session: Session,
    options: PageOptions,
    demo: Arc<AtomicBool>,
    initialized: bool,
    polling: Option<TaskGuard>,
    countdown: Option<TaskGuard>,
}

impl Page {
    pub fn new(store: Store, session: Session, options: PageOptions) -> Result<Self, PageError> {
        if !session.is_admin() {
            return Err(PageError::NotAdmin {
                role: session.role.to_string(),
            });
        }
        Ok(Self {
            store,
            session,
            options,
            demo: Arc::new(AtomicBool::new(false)),
            initialized: false,
            polling: None,
            countdown: None,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> Mode {
        if self.demo.load(Ordering::SeqCst) {
            Mode::Demo
        } else {
            Mode::Live
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the polling and countdown tasks are currently owned.
    pub fn timers(&self) -> (bool, bool) {
        (self.polling.is_some(), self.countdown.is_some())
    }

    /// First load of both collections, then start the recurring task that
    /// matches the resulting mode. Runs once; later calls return the mode.
    pub async fn initialize(&mut self) -> Mode {
        if self.initialized {
            return self.mode();
        }
        self.initialized = true;

        if self.options.force_demo {
            info!("Demo mode requested");
            self.enter_demo().await;
        } else {
            let (requests, deferred) = tokio::join!(
                self.store.fetch_requests(true),
                self.store.fetch_deferred_actions(true)
            );
            let failure = match (requests, deferred) {
                (Err(e), _) => Some((Collection::Requests, e)),
                (Ok(()), Err(e)) => Some((Collection::Deferred, e)),
                (Ok(()), Ok(())) => None,
            };
            match failure {
                None => info!("Safeguard data loaded from the API"),
                Some((_, e)) if self.should_fall_back(&e) => {
                    warn!("Safeguard API unavailable, using placeholder data: {}", e);
                    self.enter_demo().await;
                }
                Some((collection, e)) => {
                    warn!("Safeguard API refused the initial load: {}", e);
                    self.store.report_fetch_failure(collection, &e).await;
                }
            }
        }

        self.start_timers();
        self.store.auto_select().await;
        self.mode()
    }

    /// Authorization failures are reported, never masked by placeholder data.
    fn should_fall_back(&self, error: &ApiError) -> bool {
        self.options.demo_fallback && !error.is_authorization()
    }

    async fn enter_demo(&mut self) {
        self.demo.store(true, Ordering::SeqCst);
        let now = Utc::now();
        self.store.set_requests(demo::placeholder_requests(now)).await;
        self.store
            .set_deferred_actions(demo::placeholder_deferred(now))
            .await;
        self.store.set_loading(false).await;
        self.store.clear_error().await;
    }

    fn start_timers(&mut self) {
        match self.mode() {
            Mode::Live => {
                self.countdown = None;
                self.polling = Some(tasks::spawn_polling(
                    self.store.clone(),
                    self.demo.clone(),
                ));
            }
            Mode::Demo => {
                self.polling = None;
                self.countdown = Some(tasks::spawn_countdown(
                    self.store.clone(),
                    self.demo.clone(),
                    self.options.demo_tick,
                    self.options.demo_tick.as_secs() as i64,
                ));
            }
        }
    }

    /// Stop every recurring task. Also happens when the page is dropped.
    pub fn shutdown(&mut self) {
        self.polling = None;
        self.countdown = None;
    }

    pub async fn switch_tab(&self, tab: Tab) {
        self.store.set_active_tab(tab).await;
        self.store.auto_select().await;
    }

    pub async fn auto_select(&self) -> bool {
        self.store.auto_select().await
    }

    pub async fn toggle_polling(&self) -> Notice {
        let (enabled, _) = self.store.polling_settings().await;
        self.store.set_polling_enabled(!enabled).await;
        if enabled {
            Notice::Warning("Auto-refresh paused".to_string())
        } else {
            Notice::Success("Auto-refresh resumed".to_string())
        }
    }

    // ── Pending requests ──

    /// Approve the selected request. `None` when nothing is selected.
    pub async fn approve_selected(&self, comment: &str) -> Option<Notice> {
        let id = self.store.snapshot().await.selected_request_id()?.to_string();

        if self.mode() == Mode::Demo {
            self.store.remove_request(&id).await;
            return Some(Notice::Success(
                "Request approved - action scheduled for D+1".to_string(),
            ));
        }

        if self.store.approve_request(&id, Some(comment)).await {
            Some(Notice::Success(
                "Request approved - action scheduled".to_string(),
            ))
        } else {
            Some(self.error_notice("Failed to approve the request").await)
        }
    }

    /// Reject the selected request. `None` when nothing is selected.
    pub async fn reject_selected(&self, comment: &str) -> Option<Notice> {
        let id = self.store.snapshot().await.selected_request_id()?.to_string();

        if self.mode() == Mode::Demo {
            self.store.remove_request(&id).await;
            return Some(Notice::Warning("Request rejected".to_string()));
        }

        if self.store.reject_request(&id, Some(comment)).await {
            Some(Notice::Warning("Request rejected".to_string()))
        } else {
            Some(self.error_notice("Failed to reject the request").await)
        }
    }

    // ── Deferred actions ──

    /// Cancel the selected deferred action. `None` when nothing is selected.
    ///
    /// Actions that are no longer pending, or whose deadline has passed, are
    /// refused here without calling the server.
    pub async fn cancel_selected(&self, reason: &str) -> Option<Notice> {
        let snapshot = self.store.snapshot().await;
        let action = snapshot.selected_deferred()?;
        if let Err(e) = check_cancellable(action) {
            return Some(Notice::Error(e.to_string()));
        }
        let id = action.deferred_id.clone();
        let reason = Some(reason.trim()).filter(|r| !r.is_empty());

        if self.mode() == Mode::Demo {
            return Some(
                match self
                    .store
                    .apply_local_cancel(&id, self.session.actor(), reason)
                    .await
                {
                    Ok(()) => Notice::Success("Action cancelled".to_string()),
                    Err(e) => Notice::Error(e.to_string()),
                },
            );
        }

        if self
            .store
            .cancel_deferred(&id, self.session.actor(), reason)
            .await
        {
            Some(Notice::Success("Action cancelled".to_string()))
        } else {
            Some(self.error_notice("Failed to cancel the action").await)
        }
    }

    // ── Refresh ──

    /// Reload the active tab. In demo mode the placeholders are regenerated.
    pub async fn refresh_active(&self) -> Option<Notice> {
        let tab = self.store.snapshot().await.active_tab();

        if self.mode() == Mode::Demo {
            let now = Utc::now();
            match tab {
                Tab::Pending => self.store.set_requests(demo::placeholder_requests(now)).await,
                Tab::Deferred => {
                    self.store
                        .set_deferred_actions(demo::placeholder_deferred(now))
                        .await
                }
            }
            return Some(Notice::Success("Data refreshed".to_string()));
        }

        // Failures surface through the store's error banner
        let _ = match tab {
            Tab::Pending => self.store.fetch_requests(true).await,
            Tab::Deferred => self.store.fetch_deferred_actions(true).await,
        };
        None
    }

    async fn error_notice(&self, fallback: &str) -> Notice {
        let snapshot = self.store.snapshot().await;
        Notice::Error(snapshot.error().unwrap_or(fallback).to_string())
    }
}
