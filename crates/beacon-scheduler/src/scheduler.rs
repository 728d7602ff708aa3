// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduler loop and its per-tick scans.

use std::sync::Arc;
use std::time::Duration;

use beacon_cast::SessionManager;
use beacon_config::model::{CastConfig, SchedulerConfig};
use beacon_core::{
    BeaconError, Clock, Notification, NotificationFilter, NotificationStore,
};
use beacon_media::ContentPipeline;
use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Extra time a session call may take beyond its configured parts.
const SESSION_CALL_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub tick_interval: Duration,
    pub horizon: Duration,
    pub complete_missed: bool,
    /// Upper bound on a single session start or stop.
    pub session_timeout: Duration,
}

impl SchedulerSettings {
    pub fn from_config(scheduler: &SchedulerConfig, cast: &CastConfig) -> Self {
        let session_timeout = Duration::from_secs(cast.discovery_timeout_secs)
            + Duration::from_secs(cast.start_timeout_secs)
            + Duration::from_millis(cast.settle_delay_ms)
            + SESSION_CALL_SLACK;
        Self {
            tick_interval: Duration::from_secs(scheduler.tick_interval_secs),
            horizon: Duration::from_secs(scheduler.pregeneration_horizon_secs),
            complete_missed: scheduler.complete_missed,
            session_timeout,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default(), &CastConfig::default())
    }
}

/// What one tick did. Counts are per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Background generation jobs started.
    pub dispatched: usize,
    pub activated: usize,
    /// Open windows skipped because content was not ready.
    pub not_ready: usize,
    pub deactivated: usize,
    /// Pending rows completed because their window passed unseen.
    pub missed: usize,
    /// Scan queries and session calls that failed.
    pub failures: usize,
}

pub struct Scheduler {
    store: Arc<dyn NotificationStore>,
    pipeline: Arc<ContentPipeline>,
    sessions: Arc<SessionManager>,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
    jobs: TaskTracker,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        pipeline: Arc<ContentPipeline>,
        sessions: Arc<SessionManager>,
        clock: Arc<dyn Clock>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            pipeline,
            sessions,
            clock,
            settings,
            jobs: TaskTracker::new(),
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Runs ticks until `shutdown` fires, then stops every live session.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_secs = self.settings.tick_interval.as_secs(),
            horizon_secs = self.settings.horizon.as_secs(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }

        info!(
            generation_jobs = self.jobs.len(),
            "scheduler stopping, draining sessions"
        );
        self.sessions.stop_all().await;
    }

    /// One iteration against the injected clock.
    pub async fn tick(&self) -> TickReport {
        self.tick_at(self.clock.now()).await
    }

    /// One iteration against `now`.
    ///
    /// The scans are independent: a failure in one is logged and counted and
    /// the rest still run.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        self.pregenerate(now, &mut report).await;
        self.activate(now, &mut report).await;
        self.deactivate(now, &mut report).await;
        if self.settings.complete_missed {
            self.complete_missed(now, &mut report).await;
        }

        if report != TickReport::default() {
            debug!(?report, "tick finished");
        }
        report
    }

    /// Waits for every generation job dispatched so far.
    pub async fn wait_for_generation(&self) {
        self.jobs.close();
        self.jobs.wait().await;
        self.jobs.reopen();
    }

    async fn scan(
        &self,
        scan: &'static str,
        filter: NotificationFilter,
        report: &mut TickReport,
    ) -> Vec<Notification> {
        match self.store.list_by_status(&filter).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(scan, error = %e, "scan query failed");
                report.failures += 1;
                Vec::new()
            }
        }
    }

    async fn pregenerate(&self, now: DateTime<Utc>, report: &mut TickReport) {
        let horizon = chrono::Duration::from_std(self.settings.horizon)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let rows = self
            .scan("pregeneration", NotificationFilter::starting_within(now, horizon), report)
            .await;

        for n in rows {
            if self.pipeline.is_ready(&n.id).await {
                continue;
            }
            if self.dispatch(n) {
                report.dispatched += 1;
            }
        }
    }

    async fn activate(&self, now: DateTime<Utc>, report: &mut TickReport) {
        let rows = self
            .scan("activation", NotificationFilter::window_open(now), report)
            .await;

        for n in rows {
            if !self.pipeline.is_ready(&n.id).await {
                info!(notification_id = %n.id, "content not ready, will retry next tick");
                report.not_ready += 1;
                // Rows created inside their own window never passed the
                // pre-generation scan.
                if self.dispatch(n) {
                    report.dispatched += 1;
                }
                continue;
            }

            match tokio::time::timeout(self.settings.session_timeout, self.sessions.start(&n)).await
            {
                Ok(Ok(_)) => report.activated += 1,
                Ok(Err(BeaconError::SessionExists(_))) => {
                    debug!(notification_id = %n.id, "session already recorded");
                }
                Ok(Err(e)) => {
                    warn!(notification_id = %n.id, device = %n.device, error = %e, "session start failed");
                    report.failures += 1;
                }
                Err(_) => {
                    warn!(
                        notification_id = %n.id,
                        device = %n.device,
                        timeout_secs = self.settings.session_timeout.as_secs(),
                        "session start timed out"
                    );
                    report.failures += 1;
                }
            }
        }
    }

    async fn deactivate(&self, now: DateTime<Utc>, report: &mut TickReport) {
        let rows = self
            .scan("deactivation", NotificationFilter::window_closed(now), report)
            .await;

        for n in rows {
            let stopped =
                tokio::time::timeout(self.settings.session_timeout, self.sessions.stop(&n.id)).await;
            match stopped {
                Ok(Ok(true)) => report.deactivated += 1,
                // No session here: left active by an earlier process.
                Ok(Ok(false)) => match self.sessions.complete_without_session(&n.id).await {
                    Ok(true) => {
                        info!(notification_id = %n.id, "completed notification with no live session");
                        report.deactivated += 1;
                    }
                    Ok(false) => {
                        debug!(notification_id = %n.id, "already completed by another stop");
                    }
                    Err(BeaconError::SessionExists(_)) => {
                        debug!(notification_id = %n.id, "stop already in progress");
                    }
                    Err(e) => {
                        warn!(notification_id = %n.id, error = %e, "session stop failed");
                        report.failures += 1;
                    }
                },
                Ok(Err(e)) => {
                    warn!(notification_id = %n.id, error = %e, "session stop failed");
                    report.failures += 1;
                }
                Err(_) => {
                    warn!(notification_id = %n.id, "session stop timed out");
                    report.failures += 1;
                }
            }
        }
    }

    async fn complete_missed(&self, now: DateTime<Utc>, report: &mut TickReport) {
        let rows = self
            .scan("missed", NotificationFilter::missed(now), report)
            .await;

        for n in rows {
            match self.sessions.complete_without_session(&n.id).await {
                Ok(false) => {}
                Ok(true) => {
                    warn!(
                        notification_id = %n.id,
                        end_time = %n.end_time,
                        "window passed before activation, marked completed"
                    );
                    report.missed += 1;
                }
                Err(BeaconError::SessionExists(_)) => {}
                Err(e) => {
                    warn!(notification_id = %n.id, error = %e, "could not complete missed notification");
                    report.failures += 1;
                }
            }
        }
    }

    /// Starts background generation unless a job for `n` is already running.
    ///
    /// The job runs in its own task; a panic inside it is reported here and
    /// never reaches the loop. The dedup mark is released by the guard on
    /// every exit path, unwinding included.
    fn dispatch(&self, n: Notification) -> bool {
        let Some(guard) = self.pipeline.dedup().acquire(&n.id) else {
            return false;
        };

        let id = n.id.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let job = tokio::spawn(async move { pipeline.generate(&n, guard).await });

        info!(notification_id = %id, "pre-generation dispatched");
        self.jobs.spawn(async move {
            match job.await {
                Ok(Ok(_)) => debug!(notification_id = %id, "pre-generation finished"),
                Ok(Err(e)) => {
                    warn!(notification_id = %id, error = %e, "pre-generation failed, will retry");
                }
                Err(e) if e.is_panic() => {
                    error!(notification_id = %id, "pre-generation task panicked");
                }
                Err(e) => warn!(notification_id = %id, error = %e, "pre-generation task cancelled"),
            }
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use async_trait::async_trait;
    use beacon_core::{NarrationSynthesizer, NotificationStatus};
    use beacon_media::{ArtifactStore, GenerationDeduplicator, PipelineSettings};
    use beacon_test_utils::{MockEncoder, MockNarrator, MockRenderer, TestHarness};
    use chrono::Duration as Span;
    use tracing_test::traced_test;

    fn scheduler(h: &TestHarness) -> Scheduler {
        Scheduler::new(
            h.store.clone(),
            h.pipeline.clone(),
            h.sessions.clone(),
            h.clock.clone(),
            SchedulerSettings::from_config(&h.config.scheduler, &h.config.cast),
        )
    }

    async fn harness() -> TestHarness {
        TestHarness::builder()
            .with_settle_delay(Duration::from_millis(10))
            .build()
            .await
            .unwrap()
    }

    #[test]
    fn settings_follow_config() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.tick_interval, Duration::from_secs(10));
        assert_eq!(settings.horizon, Duration::from_secs(300));
        assert!(settings.complete_missed);
        assert!(settings.session_timeout > Duration::from_secs(8));
    }

    #[tokio::test]
    async fn pregenerates_only_inside_horizon() {
        let h = harness().await;
        let s = scheduler(&h);
        let soon = h.schedule(Span::minutes(4), Span::minutes(1)).await.unwrap();
        let later = h.schedule(Span::minutes(6), Span::minutes(1)).await.unwrap();

        let report = s.tick().await;
        assert_eq!(report.dispatched, 1);
        s.wait_for_generation().await;

        assert!(h.is_ready(&soon.id).await);
        assert!(!h.is_ready(&later.id).await);
        assert_eq!(h.status(&soon.id).await.unwrap(), Some(NotificationStatus::Pending));
    }

    #[tokio::test]
    async fn ready_content_is_not_generated_again() {
        let h = harness().await;
        let s = scheduler(&h);
        h.schedule(Span::minutes(2), Span::minutes(1)).await.unwrap();

        s.tick().await;
        s.wait_for_generation().await;
        let second = s.tick().await;

        assert_eq!(second.dispatched, 0);
        assert_eq!(h.pipeline.runs(), 1);
    }

    #[tokio::test]
    async fn full_window_walks_pending_active_completed() {
        let h = TestHarness::builder()
            .with_memory_store()
            .with_settle_delay(Duration::from_millis(10))
            .build()
            .await
            .unwrap();
        let s = scheduler(&h);
        let n = h.schedule(Span::minutes(10), Span::seconds(60)).await.unwrap();

        // Outside the horizon nothing happens.
        assert_eq!(s.tick().await, TickReport::default());

        h.clock.advance(Span::minutes(5));
        assert_eq!(s.tick().await.dispatched, 1);
        s.wait_for_generation().await;

        h.clock.advance(Span::minutes(5));
        let report = s.tick().await;
        assert_eq!(report.activated, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Active));
        assert_eq!(h.transport.live_sessions(), 1);

        h.clock.advance(Span::seconds(30));
        assert_eq!(s.tick().await.deactivated, 0);

        h.clock.advance(Span::seconds(30));
        assert_eq!(s.tick().await.deactivated, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
        assert_eq!(h.transport.live_sessions(), 0);

        let transitions = h.memory_store().unwrap().transitions();
        assert_eq!(transitions.len(), 2);
        assert!(transitions.iter().all(|(_, from, to)| from.can_advance_to(*to)));
    }

    #[tokio::test]
    #[traced_test]
    async fn activation_waits_for_slow_content() {
        let h = TestHarness::builder()
            .with_narrator(MockNarrator::gated())
            .with_settle_delay(Duration::from_millis(10))
            .build()
            .await
            .unwrap();
        let s = scheduler(&h);
        let n = h.schedule(Span::seconds(20), Span::seconds(30)).await.unwrap();

        assert_eq!(s.tick().await.dispatched, 1);

        h.clock.advance(Span::seconds(20));
        let report = s.tick().await;
        assert_eq!(report.not_ready, 1);
        assert_eq!(report.activated, 0);
        assert_eq!(report.dispatched, 0, "generation is already in flight");
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));
        assert!(logs_contain("content not ready"));

        h.narrator.open_gate();
        s.wait_for_generation().await;

        h.clock.advance(Span::seconds(10));
        assert_eq!(s.tick().await.activated, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Active));
    }

    #[tokio::test]
    async fn late_created_rows_get_generated_from_activation() {
        let h = harness().await;
        let s = scheduler(&h);
        let now = h.clock.now();
        let n = h
            .create("Already started", "Office TV", now - Span::seconds(5), now + Span::minutes(1), None)
            .await
            .unwrap();

        let first = s.tick().await;
        assert_eq!((first.not_ready, first.dispatched), (1, 1));
        s.wait_for_generation().await;

        assert_eq!(s.tick().await.activated, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Active));
    }

    #[tokio::test]
    async fn failed_start_stays_pending_and_retries() {
        let h = harness().await;
        let s = scheduler(&h);
        let n = h.schedule(Span::seconds(30), Span::minutes(5)).await.unwrap();
        s.tick().await;
        s.wait_for_generation().await;

        h.transport.fail_starts(true);
        h.clock.advance(Span::seconds(30));
        let report = s.tick().await;
        assert_eq!(report.failures, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));

        h.transport.fail_starts(false);
        h.clock.advance(Span::seconds(10));
        assert_eq!(s.tick().await.activated, 1);
    }

    #[tokio::test]
    async fn unknown_device_is_a_start_failure() {
        let h = harness().await;
        let s = scheduler(&h);
        let now = h.clock.now();
        let n = h
            .create("hi", "Basement", now + Span::seconds(10), now + Span::minutes(1), None)
            .await
            .unwrap();
        s.tick().await;
        s.wait_for_generation().await;

        h.clock.advance(Span::seconds(10));
        assert_eq!(s.tick().await.failures, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));
        assert_eq!(h.sessions.active_count(), 0);
    }

    #[tokio::test]
    async fn scan_failures_do_not_stop_the_loop() {
        let h = TestHarness::builder().with_memory_store().build().await.unwrap();
        let s = scheduler(&h);
        h.schedule(Span::minutes(1), Span::minutes(1)).await.unwrap();
        let store = h.memory_store().unwrap();

        store.fail_scans(true);
        let report = s.tick().await;
        assert_eq!(report.failures, 4);
        assert_eq!(report.dispatched, 0);

        store.fail_scans(false);
        assert_eq!(s.tick().await.dispatched, 1);
        s.wait_for_generation().await;
    }

    #[tokio::test]
    async fn missed_windows_are_completed() {
        let h = harness().await;
        let s = scheduler(&h);
        let now = h.clock.now();
        let n = h
            .create("too late", "Office TV", now - Span::hours(2), now - Span::hours(1), None)
            .await
            .unwrap();

        assert_eq!(s.tick().await.missed, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
        assert!(h.transport.started().is_empty());
    }

    #[tokio::test]
    async fn missed_windows_can_be_left_alone() {
        let h = harness().await;
        let mut settings = SchedulerSettings::from_config(&h.config.scheduler, &h.config.cast);
        settings.complete_missed = false;
        let s = Scheduler::new(
            h.store.clone(),
            h.pipeline.clone(),
            h.sessions.clone(),
            h.clock.clone(),
            settings,
        );
        let now = h.clock.now();
        let n = h
            .create("too late", "Office TV", now - Span::hours(2), now - Span::hours(1), None)
            .await
            .unwrap();

        assert_eq!(s.tick().await.missed, 0);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Pending));
    }

    #[tokio::test]
    async fn active_rows_without_session_are_completed_after_restart() {
        let h = harness().await;
        let s = scheduler(&h);
        let now = h.clock.now();
        let n = h
            .create("left over", "Office TV", now - Span::minutes(10), now - Span::minutes(1), None)
            .await
            .unwrap();
        h.store.update_status(&n.id, NotificationStatus::Active).await.unwrap();

        assert_eq!(s.tick().await.deactivated, 1);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
    }

    struct PanickingNarrator;

    #[async_trait]
    impl NarrationSynthesizer for PanickingNarrator {
        async fn synthesize(&self, _text: &str, _output: &Path) -> Result<(), BeaconError> {
            panic!("narrator blew up");
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn panicking_job_is_contained() {
        let h = harness().await;
        let dir = Path::new(&h.config.media.data_dir).join("panic");
        let pipeline = Arc::new(ContentPipeline::new(
            ArtifactStore::new(dir),
            Arc::new(GenerationDeduplicator::new()),
            Arc::new(MockRenderer::new()),
            Arc::new(PanickingNarrator),
            Arc::new(MockEncoder::new()),
            PipelineSettings::default(),
        ));
        let s = Scheduler::new(
            h.store.clone(),
            pipeline.clone(),
            h.sessions.clone(),
            h.clock.clone(),
            SchedulerSettings::default(),
        );
        let n = h.schedule(Span::minutes(1), Span::minutes(1)).await.unwrap();

        assert_eq!(s.tick().await.dispatched, 1);
        s.wait_for_generation().await;
        assert!(logs_contain("pre-generation task panicked"));
        assert!(!pipeline.dedup().is_in_progress(&n.id));

        // The next tick retries from scratch.
        assert_eq!(s.tick().await.dispatched, 1);
        s.wait_for_generation().await;
    }

    #[tokio::test]
    async fn shutdown_drains_live_sessions() {
        let h = harness().await;
        let s = Arc::new(scheduler(&h));
        let now = h.clock.now();
        let n = h
            .create("live", "Office TV", now - Span::seconds(1), now + Span::hours(1), None)
            .await
            .unwrap();
        h.pipeline.ensure_ready(&n).await.unwrap();

        let shutdown = CancellationToken::new();
        let runner = {
            let s = Arc::clone(&s);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { s.run(shutdown).await })
        };

        while !h.sessions.is_active(&n.id) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown.cancel();
        runner.await.unwrap();

        assert_eq!(h.sessions.active_count(), 0);
        assert_eq!(h.status(&n.id).await.unwrap(), Some(NotificationStatus::Completed));
    }
}
