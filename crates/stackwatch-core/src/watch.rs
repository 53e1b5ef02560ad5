//! Lifecycle poller
//!
//! Drives one stack from "operation submitted" to a terminal status:
//! fetch the stack status, fold the latest events into the row map, render,
//! sleep, repeat. A single task owns the row map; requests never overlap.

use crate::error::{CoreError, Result};
use crate::paginate::collect_pages;
use crate::provider::{ChangeSetState, StackApi};
use crate::record::{ChangeSetStatus, StackEvent, StackInfo};
use crate::row::DisplayRow;
use crate::rowmap::{self, RowMap};
use crate::status::StackStatus;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Backoff for waiting on change-set creation
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of status checks
    pub max_attempts: u32,

    /// Initial delay between checks
    pub initial_delay: Duration,

    /// Maximum delay between checks
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Polling limits for a watch
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Delay between polls
    pub poll_interval: Duration,

    /// Give up after this many status polls
    pub max_polls: Option<u32>,

    /// Give up after this much wall-clock time
    pub timeout: Option<Duration>,

    /// Backoff while a change set is being computed
    pub change_set_retry: RetryConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_polls: None,
            timeout: None,
            change_set_retry: RetryConfig::default(),
        }
    }
}

/// Snapshot handed to the renderer on every iteration
#[derive(Debug, Clone, Copy)]
pub struct WatchView<'a> {
    pub stack: &'a StackInfo,
    pub status: &'a StackStatus,
    pub rows: &'a RowMap,
    /// The stack is automatically rolling back
    pub rolling_back: bool,
    /// Number of status polls so far, including this one
    pub poll: u32,
}

/// How a watch ended
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    Succeeded {
        status: StackStatus,
    },
    Failed {
        status: StackStatus,
        /// Status reason of the first failed resource, if any
        reason: Option<String>,
    },
    Cancelled {
        /// Last status seen before cancellation
        status: Option<StackStatus>,
    },
}

impl WatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WatchOutcome::Succeeded { .. })
    }
}

/// Result of a finished watch
#[derive(Debug, Clone)]
pub struct WatchReport {
    pub outcome: WatchOutcome,
    /// Final row map
    pub rows: RowMap,
    /// Number of status polls performed
    pub polls: u32,
}

/// Presentation of watch progress
pub trait Renderer {
    /// Called after each poll while the stack is still pending
    fn update(&mut self, view: &WatchView<'_>);

    /// Called once with the final state
    fn finish(&mut self, view: &WatchView<'_>, outcome: &WatchOutcome);
}

/// Watches a single stack through a [`StackApi`]
pub struct Watcher<'a, A: StackApi + ?Sized> {
    api: &'a A,
    config: WatchConfig,
    cancel: Option<watch::Receiver<bool>>,
    since: Option<DateTime<Utc>>,
}

impl<'a, A: StackApi + ?Sized> Watcher<'a, A> {
    pub fn new(api: &'a A, config: WatchConfig) -> Self {
        Self {
            api,
            config,
            cancel: None,
            since: None,
        }
    }

    /// Stop between polls once `cancel` turns true
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Ignore events older than `since`, e.g. from earlier deployments
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Rows for the change set named in `stack`, all active
    pub async fn seed_from_changes(&self, stack: &StackInfo) -> Result<RowMap> {
        let changes = self.api.changes(stack).await?;
        tracing::debug!("Change set has {} entries", changes.len());
        rowmap::change_map(&changes, true)
    }

    /// Rows for every resource of the stack, all active and scheduled for removal
    pub async fn seed_from_resources(&self, stack: &StackInfo) -> Result<RowMap> {
        let resources = collect_pages(self.api.resource_pages(stack)).await?;
        tracing::debug!("Stack has {} resources", resources.len());
        let rows = rowmap::resource_map(&resources)?;
        Ok(rowmap::activate(&rows))
    }

    /// Wait until the change set named in `stack` has been computed.
    pub async fn wait_for_change_set(&self, stack: &StackInfo) -> Result<ChangeSetState> {
        let retry = &self.config.change_set_retry;
        let name = stack.change_set_name.as_deref().unwrap_or_default();

        for attempt in 0..retry.max_attempts {
            let state = self.api.change_set_status(stack).await?;

            if !state.status.is_pending() {
                if state.is_empty_change() {
                    return Err(CoreError::NoChanges(
                        state.status_reason.unwrap_or_default(),
                    ));
                }
                if state.status == ChangeSetStatus::Failed {
                    return Err(CoreError::ChangeSetFailed(
                        state
                            .status_reason
                            .unwrap_or_else(|| format!("change set {} failed", name)),
                    ));
                }
                tracing::debug!("Change set {} is {}", name, state.status);
                return Ok(state);
            }

            if attempt + 1 < retry.max_attempts {
                self.pause(retry.delay_for_attempt(attempt)).await;
            }
            if self.is_cancelled() {
                return Err(CoreError::Cancelled(format!(
                    "change set {} is still being created",
                    name
                )));
            }
        }

        Err(CoreError::Timeout(format!(
            "change set {} was still being created after {} checks",
            name, retry.max_attempts
        )))
    }

    /// Poll the stack until it reaches a terminal status.
    ///
    /// `seed` is the initial row map, typically from [`Self::seed_from_changes`]
    /// or [`Self::seed_from_resources`]. Any fetch error ends the watch.
    pub async fn run<R: Renderer + ?Sized>(
        &self,
        stack: &StackInfo,
        seed: RowMap,
        renderer: &mut R,
    ) -> Result<WatchReport> {
        let started = Instant::now();
        let mut rows = seed;
        let mut polls = 0u32;
        let mut last_status: Option<StackStatus> = None;
        let mut rollback_reported = false;
        let mut failure: Option<DisplayRow> = None;

        loop {
            if self.is_cancelled() {
                tracing::info!("Watch of {} cancelled", stack.stack_name);
                return Ok(WatchReport {
                    outcome: WatchOutcome::Cancelled {
                        status: last_status,
                    },
                    rows,
                    polls,
                });
            }

            let status = self.api.stack_status(stack).await?;
            polls += 1;

            if !status.is_known() {
                tracing::warn!("Unrecognized stack status {}, still waiting", status);
            }

            let rolling_back = status.is_rollback();
            if rolling_back && !rollback_reported {
                tracing::warn!("Stack {} is rolling back", stack.stack_name);
                rollback_reported = true;
            }

            let events = self.fetch_events(stack).await?;
            rows = rowmap::merge_events(&rows, rowmap::event_map(&events)?);

            // Rollback events overwrite failed rows, so failures are kept as they appear
            if failure.as_ref().is_none_or(DisplayRow::is_stack) {
                if let Some(found) = rowmap::first_negative_event(&events)? {
                    failure = Some(found);
                }
            }

            let view = WatchView {
                stack,
                status: &status,
                rows: &rows,
                rolling_back,
                poll: polls,
            };

            if !status.is_pending() {
                let outcome = if status.is_positive() {
                    WatchOutcome::Succeeded {
                        status: status.clone(),
                    }
                } else {
                    WatchOutcome::Failed {
                        status: status.clone(),
                        reason: failure
                            .as_ref()
                            .and_then(|row| row.status_reason.clone())
                            .or_else(|| {
                                rowmap::first_negative(&rows)
                                    .and_then(|row| row.status_reason.clone())
                            }),
                    }
                };
                renderer.finish(&view, &outcome);
                tracing::info!(
                    "Stack {} finished with {} after {} polls",
                    stack.stack_name,
                    status,
                    polls
                );
                return Ok(WatchReport {
                    outcome,
                    rows,
                    polls,
                });
            }

            renderer.update(&view);
            tracing::debug!("Poll {}: {} is {}", polls, stack.stack_name, status);
            last_status = Some(status);

            if let Some(max) = self.config.max_polls {
                if polls >= max {
                    return Err(CoreError::Timeout(format!(
                        "stack {} still pending after {} polls",
                        stack.stack_name, polls
                    )));
                }
            }
            if let Some(timeout) = self.config.timeout {
                if started.elapsed() >= timeout {
                    return Err(CoreError::Timeout(format!(
                        "stack {} still pending after {:?}",
                        stack.stack_name, timeout
                    )));
                }
            }

            self.pause(self.config.poll_interval).await;
        }
    }

    async fn fetch_events(&self, stack: &StackInfo) -> Result<Vec<StackEvent>> {
        let mut events = self.api.stack_events(stack).await?;
        if let Some(since) = self.since {
            events.retain(|event| event.timestamp.is_none_or(|ts| ts >= since));
        }
        Ok(events)
    }

    /// Whether the cancel signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow())
    }

    /// Sleep for `delay`, waking early on cancellation
    async fn pause(&self, delay: Duration) {
        match &self.cancel {
            Some(cancel) => {
                let mut cancel = cancel.clone();
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    Ok(_) = cancel.wait_for(|cancelled| *cancelled) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::Pages;
    use crate::provider::{AuthStatus, ChangeSetRequest};
    use crate::record::{Change, ChangeAction, Replacement, ResourceChange, StackResourceSummary};
    use crate::status::ResourceStatus;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use futures_util::StreamExt;
    use futures_util::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FakeApi {
        statuses: Mutex<VecDeque<std::result::Result<StackStatus, String>>>,
        events: Mutex<VecDeque<Vec<StackEvent>>>,
        change_sets: Mutex<VecDeque<ChangeSetState>>,
        changes: Vec<Change>,
        pages: Vec<Vec<StackResourceSummary>>,
        status_calls: AtomicU32,
        event_calls: AtomicU32,
    }

    impl FakeApi {
        fn with_statuses(statuses: &[&str]) -> Self {
            Self {
                statuses: Mutex::new(
                    statuses
                        .iter()
                        .map(|s| Ok(StackStatus::from(*s)))
                        .collect(),
                ),
                ..Default::default()
            }
        }

        fn push_events(&self, events: Vec<StackEvent>) {
            self.events.lock().unwrap().push_back(events);
        }
    }

    #[async_trait]
    impl StackApi for FakeApi {
        fn name(&self) -> &str {
            "fake"
        }

        async fn check_auth(&self) -> Result<AuthStatus> {
            Ok(AuthStatus::ok("test"))
        }

        async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<StackInfo> {
            Ok(StackInfo::new("id", &request.stack_name).with_change_set(&request.change_set_name))
        }

        async fn change_set_status(&self, _stack: &StackInfo) -> Result<ChangeSetState> {
            self.change_sets
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CoreError::Api("no change set scripted".to_string()))
        }

        async fn execute_change_set(&self, _stack: &StackInfo) -> Result<()> {
            Ok(())
        }

        async fn delete_stack(&self, stack_name: &str) -> Result<StackInfo> {
            Ok(StackInfo::new("id", stack_name))
        }

        async fn stack_status(&self, _stack: &StackInfo) -> Result<StackStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            match self.statuses.lock().unwrap().pop_front() {
                Some(Ok(status)) => Ok(status),
                Some(Err(msg)) => Err(CoreError::Api(msg)),
                None => Err(CoreError::Api("status script exhausted".to_string())),
            }
        }

        async fn stack_events(&self, _stack: &StackInfo) -> Result<Vec<StackEvent>> {
            self.event_calls.fetch_add(1, Ordering::SeqCst);
            let mut events = self.events.lock().unwrap();
            // Keep returning the last scripted batch once the script runs out
            if events.len() > 1 {
                Ok(events.pop_front().unwrap_or_default())
            } else {
                Ok(events.front().cloned().unwrap_or_default())
            }
        }

        async fn changes(&self, _stack: &StackInfo) -> Result<Vec<Change>> {
            Ok(self.changes.clone())
        }

        fn resource_pages<'a>(&'a self, _stack: &'a StackInfo) -> Pages<'a, StackResourceSummary> {
            stream::iter(self.pages.clone().into_iter().map(Ok)).boxed()
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        updates: Vec<(String, usize)>,
        finished: Option<WatchOutcome>,
        saw_rollback: bool,
    }

    impl Renderer for RecordingRenderer {
        fn update(&mut self, view: &WatchView<'_>) {
            self.updates.push((view.status.to_string(), view.rows.len()));
            self.saw_rollback |= view.rolling_back;
        }

        fn finish(&mut self, _view: &WatchView<'_>, outcome: &WatchOutcome) {
            self.finished = Some(outcome.clone());
        }
    }

    fn fast() -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::ZERO,
            change_set_retry: RetryConfig {
                max_attempts: 5,
                initial_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                backoff_multiplier: 1.0,
            },
            ..Default::default()
        }
    }

    fn stack() -> StackInfo {
        StackInfo::new("arn:stack/demo/1", "demo").with_change_set("demo-1")
    }

    fn event(id: &str, status: ResourceStatus, secs: u32, reason: Option<&str>) -> StackEvent {
        StackEvent {
            logical_resource_id: Some(id.to_string()),
            resource_type: Some("AWS::SQS::Queue".to_string()),
            resource_status: Some(status),
            resource_status_reason: reason.map(str::to_string),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pending_pending_complete() {
        let api = FakeApi::with_statuses(&[
            "UPDATE_IN_PROGRESS",
            "UPDATE_IN_PROGRESS",
            "UPDATE_COMPLETE",
        ]);
        api.push_events(vec![event("Queue", ResourceStatus::UpdateInProgress, 1, None)]);
        api.push_events(vec![event("Queue", ResourceStatus::UpdateComplete, 2, None)]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(renderer.updates.len(), 2);
        assert_eq!(
            renderer.finished,
            Some(WatchOutcome::Succeeded {
                status: StackStatus::UpdateComplete
            })
        );
        assert!(report.outcome.is_success());
        assert_eq!(report.polls, 3);
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
        assert_eq!(api.event_calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            report.rows["Queue"].status,
            Some(ResourceStatus::UpdateComplete)
        );
    }

    #[tokio::test]
    async fn test_negative_status_reports_first_failure() {
        let api = FakeApi::with_statuses(&["CREATE_IN_PROGRESS", "ROLLBACK_FAILED"]);
        api.push_events(vec![
            event("Bucket", ResourceStatus::CreateComplete, 1, None),
            event("Queue", ResourceStatus::CreateFailed, 2, Some("quota exceeded")),
            event("Topic", ResourceStatus::CreateFailed, 3, Some("cancelled")),
        ]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            WatchOutcome::Failed {
                status: StackStatus::RollbackFailed,
                reason: Some("quota exceeded".to_string()),
            }
        );
        assert_eq!(renderer.updates.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_reason_survives_rollback() {
        let stack_event = |status: &str, secs| StackEvent {
            logical_resource_id: Some("demo".to_string()),
            resource_type: Some(crate::record::STACK_RESOURCE_TYPE.to_string()),
            ..event("demo", ResourceStatus::from(status), secs, None)
        };
        let api = FakeApi::with_statuses(&["UPDATE_IN_PROGRESS", "UPDATE_ROLLBACK_COMPLETE"]);
        api.push_events(vec![
            event("Queue", ResourceStatus::UpdateInProgress, 1, None),
            event("Queue", ResourceStatus::UpdateFailed, 2, Some("quota exceeded")),
            stack_event("UPDATE_ROLLBACK_IN_PROGRESS", 3),
            event("Queue", ResourceStatus::UpdateInProgress, 4, None),
            event("Queue", ResourceStatus::UpdateComplete, 5, None),
            stack_event("UPDATE_ROLLBACK_COMPLETE", 6),
        ]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            report.rows["Queue"].status,
            Some(ResourceStatus::UpdateComplete)
        );
        assert_eq!(
            report.outcome,
            WatchOutcome::Failed {
                status: StackStatus::UpdateRollbackComplete,
                reason: Some("quota exceeded".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_rollback_keeps_polling() {
        let api = FakeApi::with_statuses(&["ROLLBACK_IN_PROGRESS", "ROLLBACK_COMPLETE"]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert!(renderer.saw_rollback);
        assert_eq!(renderer.updates.len(), 1);
        assert!(report.outcome.is_success());
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let api = FakeApi::with_statuses(&["SOMETHING_NEW", "DELETE_COMPLETE"]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(renderer.updates, vec![("SOMETHING_NEW".to_string(), 0)]);
        assert_eq!(report.polls, 2);
    }

    #[tokio::test]
    async fn test_status_error_stops_watch() {
        let api = FakeApi {
            statuses: Mutex::new(VecDeque::from([
                Ok(StackStatus::CreateInProgress),
                Err("throttled".to_string()),
                Ok(StackStatus::CreateComplete),
            ])),
            ..Default::default()
        };

        let mut renderer = RecordingRenderer::default();
        let err = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api(msg) if msg == "throttled"));
        assert_eq!(renderer.updates.len(), 1);
        assert!(renderer.finished.is_none());
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_event_stops_watch() {
        let api = FakeApi::with_statuses(&["CREATE_IN_PROGRESS"]);
        let mut bad = event("Queue", ResourceStatus::CreateInProgress, 1, None);
        bad.timestamp = None;
        api.push_events(vec![bad]);

        let mut renderer = RecordingRenderer::default();
        let err = Watcher::new(&api, fast())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::MalformedRecord { record: "event", .. }));
    }

    #[tokio::test]
    async fn test_max_polls() {
        let api = FakeApi::with_statuses(&["CREATE_IN_PROGRESS"; 5]);
        let config = WatchConfig {
            max_polls: Some(3),
            ..fast()
        };

        let mut renderer = RecordingRenderer::default();
        let err = Watcher::new(&api, config)
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Timeout(_)));
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let api = FakeApi::with_statuses(&["CREATE_IN_PROGRESS"]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .with_cancel(rx)
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(report.outcome, WatchOutcome::Cancelled { status: None });
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let api = FakeApi::with_statuses(&["CREATE_IN_PROGRESS", "CREATE_IN_PROGRESS"]);
        let (tx, rx) = watch::channel(false);
        let config = WatchConfig {
            poll_interval: Duration::from_secs(3600),
            ..fast()
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, config)
            .with_cancel(rx)
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            WatchOutcome::Cancelled {
                status: Some(StackStatus::CreateInProgress)
            }
        );
        assert_eq!(report.polls, 1);
    }

    #[tokio::test]
    async fn test_change_seed_stays_active_through_events() {
        let api = FakeApi {
            changes: vec![Change {
                resource_change: Some(ResourceChange {
                    action: Some(ChangeAction::Add),
                    logical_resource_id: Some("Queue".to_string()),
                    physical_resource_id: None,
                    resource_type: Some("AWS::SQS::Queue".to_string()),
                    replacement: Some(Replacement::False),
                }),
            }],
            ..FakeApi::with_statuses(&["CREATE_COMPLETE"])
        };
        api.push_events(vec![
            event("Queue", ResourceStatus::CreateComplete, 1, None),
            event("Unplanned", ResourceStatus::CreateComplete, 2, None),
        ]);

        let watcher = Watcher::new(&api, fast());
        let seed = watcher.seed_from_changes(&stack()).await.unwrap();
        let mut renderer = RecordingRenderer::default();
        let report = watcher.run(&stack(), seed, &mut renderer).await.unwrap();

        assert!(report.rows["Queue"].active);
        assert_eq!(
            report.rows["Queue"].status,
            Some(ResourceStatus::CreateComplete)
        );
        assert!(!report.rows["Unplanned"].active);
    }

    #[tokio::test]
    async fn test_seed_from_resources() {
        let summary = |id: &str| StackResourceSummary {
            logical_resource_id: Some(id.to_string()),
            resource_type: Some("AWS::S3::Bucket".to_string()),
            ..Default::default()
        };
        let api = FakeApi {
            pages: vec![vec![summary("A"), summary("B")], vec![], vec![summary("C")]],
            ..Default::default()
        };

        let rows = Watcher::new(&api, fast())
            .seed_from_resources(&StackInfo::new("", "demo"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.values().all(|r| r.active));
        assert!(rows.values().all(|r| r.action == Some(ChangeAction::Remove)));
    }

    #[tokio::test]
    async fn test_since_filters_old_events() {
        let api = FakeApi::with_statuses(&["UPDATE_COMPLETE"]);
        api.push_events(vec![
            event("Old", ResourceStatus::UpdateFailed, 1, Some("last week")),
            event("New", ResourceStatus::UpdateComplete, 30, None),
        ]);

        let mut renderer = RecordingRenderer::default();
        let report = Watcher::new(&api, fast())
            .since(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 10).unwrap())
            .run(&stack(), RowMap::new(), &mut renderer)
            .await
            .unwrap();

        assert!(!report.rows.contains_key("Old"));
        assert!(report.rows.contains_key("New"));
    }

    #[tokio::test]
    async fn test_wait_for_change_set() {
        let api = FakeApi {
            change_sets: Mutex::new(VecDeque::from([
                ChangeSetState {
                    status: ChangeSetStatus::CreatePending,
                    status_reason: None,
                },
                ChangeSetState {
                    status: ChangeSetStatus::CreateInProgress,
                    status_reason: None,
                },
                ChangeSetState {
                    status: ChangeSetStatus::CreateComplete,
                    status_reason: None,
                },
            ])),
            ..Default::default()
        };

        let state = Watcher::new(&api, fast())
            .wait_for_change_set(&stack())
            .await
            .unwrap();
        assert_eq!(state.status, ChangeSetStatus::CreateComplete);
    }

    #[tokio::test]
    async fn test_wait_for_change_set_without_changes() {
        let api = FakeApi {
            change_sets: Mutex::new(VecDeque::from([ChangeSetState {
                status: ChangeSetStatus::Failed,
                status_reason: Some(
                    "The submitted information didn't contain changes.".to_string(),
                ),
            }])),
            ..Default::default()
        };

        let err = Watcher::new(&api, fast())
            .wait_for_change_set(&stack())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoChanges(_)));
    }

    #[tokio::test]
    async fn test_wait_for_change_set_cancelled() {
        let api = FakeApi {
            change_sets: Mutex::new(VecDeque::from([
                ChangeSetState {
                    status: ChangeSetStatus::CreatePending,
                    status_reason: None,
                },
                ChangeSetState {
                    status: ChangeSetStatus::CreateComplete,
                    status_reason: None,
                },
            ])),
            ..Default::default()
        };
        let (_tx, rx) = watch::channel(true);

        let watcher = Watcher::new(&api, fast()).with_cancel(rx);
        assert!(watcher.is_cancelled());
        let err = watcher.wait_for_change_set(&stack()).await.unwrap_err();

        assert!(matches!(err, CoreError::Cancelled(_)));
        // The second state was never requested
        assert_eq!(api.change_sets.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10000),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(10000));
        assert_eq!(config.delay_for_attempt(70), Duration::from_millis(10000));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_millis(10000));
    }
}
