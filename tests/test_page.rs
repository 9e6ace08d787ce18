//! Console page: initial load, demo fallback, timers and operator actions.

mod common;

use common::{deferred, request, Failure, FakeApi};
use safeguard::api::protocol::DecisionResponse;
use safeguard::approval::types::{ApprovalStatus, DeferredStatus};
use safeguard::config::{Role, Session};
use safeguard::console::{Mode, Notice, Page, PageError, PageOptions};
use safeguard::store::{Store, Tab};
use std::sync::Arc;
use std::time::Duration;

fn admin() -> Session {
    Session {
        user: "admin.jean".to_string(),
        role: Role::Admin,
    }
}

fn page_with(api: FakeApi, options: PageOptions) -> (Arc<FakeApi>, Page) {
    let api = Arc::new(api);
    let store = Store::new(api.clone());
    let page = Page::new(store, admin(), options).unwrap();
    (api, page)
}

fn unreachable_api() -> FakeApi {
    let api = FakeApi::default();
    *api.fail_requests.lock().unwrap() = Some(Failure::Transport);
    *api.fail_deferred.lock().unwrap() = Some(Failure::Transport);
    api
}

fn live_api() -> FakeApi {
    FakeApi::with_data(
        vec![
            request("APR-1", ApprovalStatus::Pending, 1800),
            request("APR-2", ApprovalStatus::Pending, 600),
        ],
        vec![
            deferred("DEF-1", DeferredStatus::Pending, 0),
            deferred("DEF-2", DeferredStatus::Pending, 7200),
        ],
    )
}

// ── Access ──

#[test]
fn test_non_admin_is_refused_before_any_request() {
    let api = Arc::new(FakeApi::default());
    let store = Store::new(api.clone());
    let session = Session {
        user: "tech.dupont".to_string(),
        role: Role::Technician,
    };
    let result = Page::new(store, session, PageOptions::default());
    assert!(matches!(result, Err(PageError::NotAdmin { .. })));
    assert!(api.calls().is_empty());
}

// ── Initial load ──

#[tokio::test]
async fn test_initial_load_live() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    assert_eq!(page.initialize().await, Mode::Live);

    let s = page.store().snapshot().await;
    assert_eq!(s.pending_count(), 2);
    assert_eq!(s.deferred_count(), 2);
    assert_eq!(s.selected_request_id(), Some("APR-1"));
    assert_eq!(s.error(), None);
    assert_eq!(page.timers(), (true, false));
    assert_eq!(api.count_calls("list_requests"), 1);
    assert_eq!(api.count_calls("list_deferred"), 1);

    // Only once
    page.initialize().await;
    assert_eq!(api.count_calls("list_requests"), 1);
}

#[tokio::test]
async fn test_unreachable_backend_falls_back_to_demo() {
    let (_, mut page) = page_with(unreachable_api(), PageOptions::default());
    assert_eq!(page.initialize().await, Mode::Demo);

    let s = page.store().snapshot().await;
    assert!(s.pending_count() > 0);
    assert!(s.deferred_count() > 0);
    assert_eq!(s.error(), None);
    assert!(!s.is_loading());
    assert!(!s.is_deferred_loading());
    assert!(s.selected_request_id().is_some());
    assert_eq!(page.timers(), (false, true));
}

#[tokio::test]
async fn test_one_failed_collection_is_enough_to_fall_back() {
    let api = live_api();
    *api.fail_deferred.lock().unwrap() = Some(Failure::Logical);
    let (_, mut page) = page_with(api, PageOptions::default());
    assert_eq!(page.initialize().await, Mode::Demo);
}

#[tokio::test]
async fn test_authorization_failure_does_not_fall_back() {
    for code in [401, 403] {
        let api = FakeApi::default();
        *api.fail_requests.lock().unwrap() = Some(Failure::Status(code));
        let (_, mut page) = page_with(api, PageOptions::default());

        assert_eq!(page.initialize().await, Mode::Live);
        let s = page.store().snapshot().await;
        assert!(s.error().is_some());
        assert_eq!(s.pending_count(), 0);
    }
}

#[tokio::test]
async fn test_fallback_can_be_disabled() {
    let options = PageOptions {
        demo_fallback: false,
        ..PageOptions::default()
    };
    let (_, mut page) = page_with(unreachable_api(), options);
    assert_eq!(page.initialize().await, Mode::Live);
    assert!(page.store().snapshot().await.error().is_some());
    assert_eq!(page.timers(), (true, false));
}

#[tokio::test]
async fn test_forced_demo_skips_the_backend() {
    let options = PageOptions {
        force_demo: true,
        ..PageOptions::default()
    };
    let (api, mut page) = page_with(live_api(), options);
    assert_eq!(page.initialize().await, Mode::Demo);
    assert!(api.calls().is_empty());
}

// ── Timers ──

#[tokio::test(start_paused = true)]
async fn test_demo_countdown() {
    let (api, mut page) = page_with(unreachable_api(), PageOptions::default());
    page.initialize().await;
    let before = page.store().snapshot().await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    let after = page.store().snapshot().await;
    for (b, a) in before.requests().iter().zip(after.requests()) {
        assert_eq!(a.time_remaining_seconds, b.time_remaining_seconds - 30);
    }
    for (b, a) in before
        .deferred_actions()
        .iter()
        .zip(after.deferred_actions())
    {
        assert_eq!(a.time_until_execution, b.time_until_execution - 30);
    }

    // Demo mode never polls
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(api.count_calls("list_requests"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_demo_countdown_floors_at_zero() {
    let options = PageOptions {
        demo_tick: Duration::from_secs(30),
        ..PageOptions::default()
    };
    let (_, mut page) = page_with(unreachable_api(), options);
    page.initialize().await;

    // The longest placeholder countdown is under a day
    tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
    let s = page.store().snapshot().await;
    assert!(s.requests().iter().all(|r| r.time_remaining_seconds == 0));
    assert!(s
        .deferred_actions()
        .iter()
        .all(|a| a.time_until_execution == 0));
}

#[tokio::test(start_paused = true)]
async fn test_live_polling() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.store()
        .set_polling_interval(Duration::from_secs(10))
        .await;
    page.initialize().await;

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(api.count_calls("list_requests"), 2);
    assert_eq!(api.count_calls("list_deferred"), 2);

    // Refreshes observe server-side changes
    api.requests.lock().unwrap().remove(0);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(page.store().snapshot().await.pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_polling_pauses() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.store()
        .set_polling_interval(Duration::from_secs(10))
        .await;
    page.initialize().await;

    assert_eq!(
        page.toggle_polling().await,
        Notice::Warning("Auto-refresh paused".to_string())
    );
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(api.count_calls("list_requests"), 1);

    page.toggle_polling().await;
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(api.count_calls("list_requests") >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_disables_polling() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.store().set_polling_interval(Duration::ZERO).await;
    page.initialize().await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.count_calls("list_requests"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_timers() {
    let (_, mut page) = page_with(unreachable_api(), PageOptions::default());
    page.initialize().await;
    page.shutdown();
    assert_eq!(page.timers(), (false, false));

    let before = page.store().snapshot().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    let after = page.store().snapshot().await;
    assert_eq!(
        before.requests()[0].time_remaining_seconds,
        after.requests()[0].time_remaining_seconds
    );
}

// ── Actions ──

#[tokio::test]
async fn test_tab_switch_auto_selects_and_keeps_other_selection() {
    let (_, mut page) = page_with(live_api(), PageOptions::default());
    page.initialize().await;
    page.store().set_selected_request(Some("APR-2")).await;

    page.switch_tab(Tab::Deferred).await;
    let s = page.store().snapshot().await;
    assert_eq!(s.active_tab(), Tab::Deferred);
    assert_eq!(s.selected_deferred_id(), Some("DEF-1"));
    assert_eq!(s.selected_request_id(), Some("APR-2"));
}

#[tokio::test]
async fn test_live_approve() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.initialize().await;

    let notice = page.approve_selected("looks fine").await;
    assert_eq!(
        notice,
        Some(Notice::Success(
            "Request approved - action scheduled".to_string()
        ))
    );
    assert!(api.calls().contains(&"approve APR-1".to_string()));
    let s = page.store().snapshot().await;
    assert_eq!(s.pending_count(), 1);
    assert_eq!(s.selected_request_id(), None);
}

#[tokio::test]
async fn test_live_reject_failure_reports_server_message() {
    let api = live_api();
    *api.decision_reply.lock().unwrap() = Some(DecisionResponse {
        success: false,
        approval_id: None,
        status: None,
        message: Some("insufficient level".to_string()),
        error: None,
    });
    let (_, mut page) = page_with(api, PageOptions::default());
    page.initialize().await;

    let notice = page.reject_selected("").await;
    assert_eq!(notice, Some(Notice::Error("insufficient level".to_string())));
}

#[tokio::test]
async fn test_actions_without_selection_do_nothing() {
    let (api, mut page) = page_with(FakeApi::default(), PageOptions::default());
    page.initialize().await;
    assert_eq!(page.approve_selected("").await, None);
    assert_eq!(page.cancel_selected("").await, None);
    assert_eq!(api.count_calls("approve"), 0);
}

#[tokio::test]
async fn test_cancel_gate_blocks_lapsed_action() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.initialize().await;
    page.switch_tab(Tab::Deferred).await;
    assert_eq!(
        page.store().snapshot().await.selected_deferred_id(),
        Some("DEF-1")
    );

    let notice = page.cancel_selected("too late").await.unwrap();
    assert!(notice.is_error());
    assert_eq!(api.count_calls("cancel_deferred"), 0);
    let s = page.store().snapshot().await;
    assert_eq!(
        s.selected_deferred().map(|a| a.status),
        Some(DeferredStatus::Pending)
    );
}

#[tokio::test]
async fn test_live_cancel_records_session_user() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.initialize().await;
    page.switch_tab(Tab::Deferred).await;
    page.store().set_selected_deferred(Some("DEF-2")).await;

    let notice = page.cancel_selected("client called back").await;
    assert_eq!(notice, Some(Notice::Success("Action cancelled".to_string())));
    assert!(api
        .calls()
        .contains(&"cancel_deferred DEF-2 by admin.jean".to_string()));
    assert_eq!(page.store().snapshot().await.deferred_count(), 1);
}

#[tokio::test]
async fn test_demo_actions_are_local() {
    let (api, mut page) = page_with(unreachable_api(), PageOptions::default());
    page.initialize().await;
    let pending = page.store().snapshot().await.pending_count();

    let notice = page.reject_selected("").await;
    assert_eq!(notice, Some(Notice::Warning("Request rejected".to_string())));
    assert_eq!(page.store().snapshot().await.pending_count(), pending - 1);

    page.switch_tab(Tab::Deferred).await;
    let notice = page.cancel_selected("").await;
    assert_eq!(notice, Some(Notice::Success("Action cancelled".to_string())));

    let notice = page.refresh_active().await;
    assert_eq!(notice, Some(Notice::Success("Data refreshed".to_string())));
    assert_eq!(api.count_calls("reject"), 0);
    assert_eq!(api.count_calls("cancel_deferred"), 0);
}

#[tokio::test]
async fn test_live_refresh_failure_sets_banner() {
    let (api, mut page) = page_with(live_api(), PageOptions::default());
    page.initialize().await;

    *api.fail_requests.lock().unwrap() = Some(Failure::Status(500));
    assert_eq!(page.refresh_active().await, None);
    assert_eq!(
        page.store().snapshot().await.error(),
        Some("Failed to load pending requests")
    );
    assert_eq!(page.mode(), Mode::Live);
}
