// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the scheduling core.
//!
//! Each test creates an isolated TestHarness with temp storage, mock devices
//! and media providers, and a manual clock, then drives the real scheduler,
//! session manager, pipeline, and HTTP router against it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use beacon_cast::SessionManager;
use beacon_core::{BeaconError, Clock, NewNotification, NotificationStatus};
use beacon_gateway::{GatewayState, router};
use beacon_media::manifest;
use beacon_scheduler::{Scheduler, SchedulerSettings};
use beacon_test_utils::{MockNarrator, TestHarness};
use chrono::Duration as Span;
use tower::ServiceExt;

fn tick_len() -> Span {
    Span::seconds(10)
}

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_memory_store()
        .with_settle_delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap()
}

fn scheduler(h: &TestHarness) -> Scheduler {
    Scheduler::new(
        h.store.clone(),
        h.pipeline.clone(),
        h.sessions.clone(),
        h.clock.clone(),
        SchedulerSettings::from_config(&h.config.scheduler, &h.config.cast),
    )
}

fn gateway(h: &TestHarness) -> axum::Router {
    router(GatewayState {
        store: h.store.clone(),
        directory: h.directory.clone(),
        sessions: h.sessions.clone(),
        pipeline: h.pipeline.clone(),
        clock: h.clock.clone(),
        start_time: Instant::now(),
    })
}

fn assert_forward_only(h: &TestHarness) {
    for (id, from, to) in h.memory_store().unwrap().transitions() {
        assert!(from.can_advance_to(to), "{id} moved backwards: {from} -> {to}");
    }
}

// ---- Scenario A: full lifecycle on a 10s tick ----

#[tokio::test]
async fn scenario_a_pregenerate_activate_complete() {
    let h = harness().await;
    let s = scheduler(&h);
    let t = h.clock.now() + Span::minutes(10);
    let n = h.create("Standup", "Office TV", t, t + Span::seconds(60), None).await.unwrap();

    let mut dispatched_at = None;
    let mut activated_at = None;
    let mut completed_at = None;
    h.clock.set(t - Span::minutes(10));
    while h.clock.now() <= t + Span::seconds(70) {
        let now = h.clock.now();
        let report = s.tick().await;
        s.wait_for_generation().await;

        if report.dispatched > 0 && dispatched_at.is_none() {
            dispatched_at = Some(now);
        }
        if report.activated > 0 {
            assert!(h.is_ready(&n.id).await);
            activated_at = Some(now);
        }
        if report.deactivated > 0 {
            completed_at = Some(now);
        }
        if now == t {
            assert!(h.is_ready(&n.id).await, "artifact must exist by the start time");
        }
        h.clock.advance(tick_len());
    }

    assert_eq!(dispatched_at, Some(t - Span::minutes(5)));
    assert_eq!(activated_at, Some(t));
    assert_eq!(completed_at, Some(t + Span::seconds(60)));
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));

    assert_eq!(h.pipeline.runs(), 1);
    assert_eq!(h.transport.started().len(), 1);
    assert_eq!(h.transport.cancelled().len(), 1);
    assert_eq!(h.transport.live_sessions(), 0);
    assert_eq!(h.memory_store().unwrap().transitions().len(), 2);
    assert_forward_only(&h);
}

#[tokio::test]
async fn session_points_device_at_the_manifest_url() {
    let h = harness().await;
    let s = scheduler(&h);
    let n = h.schedule(Span::seconds(30), Span::minutes(2)).await.unwrap();

    s.tick().await;
    s.wait_for_generation().await;
    h.clock.advance(Span::seconds(30));
    s.tick().await;

    let started = h.transport.started();
    assert_eq!(started.len(), 1);
    assert_eq!(
        started[0].handle.media_url,
        format!("http://localhost:8080/media/{}/playlist.m3u8", n.id)
    );
    assert_eq!(started[0].handle.device.name, "Office TV");
    h.sessions.stop_all().await;
}

// ---- Scenario B: slow content holds activation back ----

#[tokio::test]
async fn scenario_b_activation_waits_for_artifact() {
    let h = TestHarness::builder()
        .with_memory_store()
        .with_narrator(MockNarrator::gated())
        .with_settle_delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap();
    let s = scheduler(&h);
    let t = h.clock.now() + Span::minutes(1);
    let n = h.create("Interview", "Office TV", t, t + Span::seconds(30), None).await.unwrap();

    // Pre-generation starts but synthesis is held.
    assert_eq!(s.tick().await.dispatched, 1);

    h.clock.set(t);
    let report = s.tick().await;
    assert_eq!((report.not_ready, report.activated), (1, 0));
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));

    h.clock.advance(tick_len());
    assert_eq!(s.tick().await.not_ready, 1);
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));
    assert!(h.transport.started().is_empty());

    h.narrator.open_gate();
    s.wait_for_generation().await;

    h.clock.advance(tick_len());
    assert_eq!(s.tick().await.activated, 1);
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Active));

    h.clock.advance(tick_len());
    assert_eq!(s.tick().await.deactivated, 1);
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
    assert_eq!(h.pipeline.runs(), 1);
    assert_forward_only(&h);
}

// ---- Scenario C: invalid windows never reach the store ----

#[tokio::test]
async fn scenario_c_start_not_before_end_is_rejected() {
    let h = harness().await;
    let now = h.clock.now();

    let err = h
        .create("Backwards", "Office TV", now + Span::hours(2), now + Span::hours(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::Validation(_)));
    let err = h
        .create("Empty", "Office TV", now + Span::hours(1), now + Span::hours(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::Validation(_)));

    let body = serde_json::json!({
        "message": "Backwards",
        "device": "Office TV",
        "start_time": (now + Span::hours(2)).to_rfc3339(),
        "end_time": (now + Span::hours(1)).to_rfc3339(),
    });
    let response = gateway(&h)
        .oneshot(
            Request::post("/api/notifications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(h.store.list().await.unwrap().is_empty());
}

#[test]
fn repeat_count_defaults_to_one() {
    let now = chrono::Utc::now();
    let request = |repeat_count| NewNotification {
        message: "hi".into(),
        device: "Office TV".into(),
        start_time: (now + Span::minutes(1)).to_rfc3339(),
        end_time: (now + Span::minutes(2)).to_rfc3339(),
        repeat_count,
    };
    assert_eq!(request(None).into_notification(now).unwrap().repeat_count, 1);
    assert_eq!(request(Some(0)).into_notification(now).unwrap().repeat_count, 1);
    assert_eq!(request(Some(-4)).into_notification(now).unwrap().repeat_count, 1);
    assert_eq!(request(Some(3)).into_notification(now).unwrap().repeat_count, 3);
}

// ---- Scenario D: repeated narration, fixed stream length ----

#[tokio::test]
async fn scenario_d_repeat_three_and_window_length_stream() {
    let h = harness().await;
    let now = h.clock.now();
    let n = h
        .create("Quarterly review", "Office TV", now + Span::minutes(2), now + Span::minutes(7), Some(3))
        .await
        .unwrap();

    let manifest_path = h.pipeline.ensure_ready(&n).await.unwrap();

    let artifacts = h.pipeline.artifacts();
    let single = std::fs::metadata(artifacts.single_audio_path(&n.id)).unwrap().len();
    let repeated = std::fs::metadata(artifacts.audio_path(&n.id)).unwrap().len();
    assert_eq!(repeated, 3 * single);

    let request = h.encoder.requests().pop().unwrap();
    assert_eq!(request.audio.as_deref(), Some(artifacts.audio_path(&n.id).as_path()));
    assert_eq!(request.duration_secs, 300);

    let stream = manifest::read_stream(&manifest_path).await.unwrap();
    assert!((stream.total_duration_secs() - 300.0).abs() < 1e-6);
    assert!(stream.complete);
}

// ---- Scenario E: delete stops a live session first ----

#[tokio::test]
async fn scenario_e_delete_active_notification() {
    let h = harness().await;
    let s = scheduler(&h);
    let n = h.schedule(Span::seconds(10), Span::minutes(10)).await.unwrap();

    s.tick().await;
    s.wait_for_generation().await;
    h.clock.advance(tick_len());
    assert_eq!(s.tick().await.activated, 1);
    assert_eq!(h.transport.live_sessions(), 1);

    let response = gateway(&h)
        .oneshot(
            Request::delete(format!("/api/notifications/{}", n.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(h.transport.cancelled().len(), 1);
    assert_eq!(h.transport.live_sessions(), 0);
    assert_eq!(h.sessions.active_count(), 0);
    assert_eq!(h.status(&n.id).await.unwrap(), None);
    // The completed transition happened before the row went away.
    assert_eq!(
        h.memory_store().unwrap().transitions().last().map(|(_, _, to)| *to),
        Some(NotificationStatus::Completed)
    );

    // Later ticks have nothing left to do for it.
    h.clock.advance(Span::minutes(15));
    let report = s.tick().await;
    assert_eq!((report.deactivated, report.failures), (0, 0));
}

// ---- Session Manager properties ----

#[tokio::test]
async fn concurrent_starts_record_one_session() {
    let h = harness().await;
    let n = h.schedule(Span::zero(), Span::minutes(5)).await.unwrap();

    let (a, b) = tokio::join!(h.sessions.start(&n), h.sessions.start(&n));
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(BeaconError::SessionExists(_))))
    );
    assert_eq!(h.transport.started().len(), 1);
    assert_eq!(h.sessions.active_count(), 1);
    h.sessions.stop_all().await;
}

#[tokio::test]
async fn concurrent_and_repeated_stops_tear_down_once() {
    let h = harness().await;
    let n = h.schedule(Span::zero(), Span::minutes(5)).await.unwrap();
    h.sessions.start(&n).await.unwrap();

    let (a, b) = tokio::join!(h.sessions.stop(&n.id), h.sessions.stop(&n.id));
    assert_eq!([a.unwrap(), b.unwrap()].iter().filter(|s| **s).count(), 1);
    assert!(!h.sessions.stop(&n.id).await.unwrap());

    assert_eq!(h.transport.cancelled().len(), 1);
    assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
    assert_forward_only(&h);
}

// ---- Generation Deduplicator properties ----

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ensure_ready_runs_pipeline_once() {
    let h = TestHarness::builder()
        .with_memory_store()
        .with_narrator(MockNarrator::gated())
        .build()
        .await
        .unwrap();
    let h = Arc::new(h);
    let n = h.schedule(Span::minutes(1), Span::minutes(1)).await.unwrap();

    let callers: Vec<_> = (0..6)
        .map(|_| {
            let h = Arc::clone(&h);
            let n = n.clone();
            tokio::spawn(async move { h.pipeline.ensure_ready(&n).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.narrator.open_gate();

    let expected = h.pipeline.artifacts().manifest_path(&n.id);
    for caller in callers {
        assert_eq!(caller.await.unwrap().unwrap(), expected);
    }
    assert_eq!(h.pipeline.runs(), 1);
    assert_eq!(h.narrator.calls(), 1);
    assert!(h.pipeline.dedup().is_empty());
}

#[tokio::test]
async fn ensure_ready_again_does_no_work() {
    let h = harness().await;
    let n = h.schedule(Span::minutes(1), Span::minutes(1)).await.unwrap();

    let first = h.pipeline.ensure_ready(&n).await.unwrap();
    let second = h.pipeline.ensure_ready(&n).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.pipeline.runs(), 1);
    assert_eq!(h.encoder.encodes(), 1);
}

// ---- Restart recovery ----

#[tokio::test]
async fn restart_reevaluates_rows_from_persisted_times() {
    let h = TestHarness::builder()
        .with_settle_delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap();
    let first = scheduler(&h);
    let live = h.schedule(Span::seconds(10), Span::minutes(1)).await.unwrap();
    let upcoming = h.schedule(Span::minutes(3), Span::minutes(1)).await.unwrap();

    first.tick().await;
    first.wait_for_generation().await;
    h.clock.advance(tick_len());
    assert_eq!(first.tick().await.activated, 1);
    drop(first);

    // A new process: fresh session table, same database and artifacts.
    let sessions = Arc::new(SessionManager::new(
        h.directory.clone(),
        h.transport.clone(),
        h.store.clone(),
        h.config.media_base_url(),
        Duration::from_millis(10),
    ));
    let second = Scheduler::new(
        h.store.clone(),
        h.pipeline.clone(),
        sessions.clone(),
        h.clock.clone(),
        SchedulerSettings::from_config(&h.config.scheduler, &h.config.cast),
    );

    h.clock.advance(Span::minutes(3));
    let report = second.tick().await;
    second.wait_for_generation().await;

    assert_eq!(h.status(&live.id).await.unwrap(), Some(NotificationStatus::Completed));
    assert_eq!(report.deactivated, 1);
    assert_eq!(report.activated, 1);
    assert_eq!(h.status(&upcoming.id).await.unwrap(), Some(NotificationStatus::Active));
    assert!(sessions.is_active(&upcoming.id));
    sessions.stop_all().await;
}
