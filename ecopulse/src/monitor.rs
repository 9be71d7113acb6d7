//! Polling & liveness monitor: fans out the three reads on a fixed cadence,
//! classifies the data pipeline and keeps the latest chart-ready view.
//!
//! Polls may overlap when one takes longer than the period. Completions are
//! applied in the order they finish (last writer wins); there is no
//! generation stamping between polls of the same session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::DashboardApi;
use crate::error::ApiError;
use crate::history::{latest_sample, MetricSeries};
use crate::liveness::{LivenessState, StuckCounter};
use crate::types::{Prediction, Sample, SystemInfo};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub history_limit: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Results of one fully successful fan-out.
#[derive(Debug, Clone)]
pub struct PollData {
    pub history: Vec<Sample>,
    pub prediction: Prediction,
    pub system: SystemInfo,
}

/// Everything the rendering layer reads, cloned out in one go.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub liveness: LivenessState,
    pub series: MetricSeries,
    pub prediction: Option<Prediction>,
    pub system: Option<SystemInfo>,
    pub last_error: Option<String>,
    pub polls_completed: u64,
    pub stuck_polls: u32,
}

#[derive(Debug, Default)]
struct MonitorState {
    liveness: LivenessState,
    stuck: StuckCounter,
    series: MetricSeries,
    prediction: Option<Prediction>,
    system: Option<SystemInfo>,
    last_error: Option<String>,
    polls_completed: u64,
}

impl MonitorState {
    fn apply(&mut self, outcome: Result<PollData, ApiError>) -> LivenessState {
        self.polls_completed += 1;
        let prev = self.liveness;
        match outcome {
            Ok(data) => {
                let latest = latest_sample(&data.history).map(|s| &s.timestamp);
                self.liveness = self.stuck.observe(latest);
                self.series = MetricSeries::from_samples(&data.history);
                self.prediction = Some(data.prediction);
                self.system = Some(data.system);
                self.last_error = None;
            }
            Err(e) => {
                // counter and last timestamp are kept so a recovery resumes them
                warn!(error = %e, "poll failed");
                self.liveness = LivenessState::Offline;
                self.last_error = Some(e.to_string());
            }
        }
        if prev != self.liveness {
            match self.liveness {
                LivenessState::Online => info!(from = %prev, "data pipeline online"),
                LivenessState::Warning => warn!(
                    stuck_polls = self.stuck.count(),
                    "data pipeline stalled: latest sample unchanged"
                ),
                LivenessState::Offline => warn!(from = %prev, "metrics API unreachable"),
            }
        }
        self.liveness
    }

    fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            liveness: self.liveness,
            series: self.series.clone(),
            prediction: self.prediction.clone(),
            system: self.system.clone(),
            last_error: self.last_error.clone(),
            polls_completed: self.polls_completed,
            stuck_polls: self.stuck.count(),
        }
    }
}

struct Shared {
    state: RwLock<MonitorState>,
    // Bumped by stop(); completions tagged with an older epoch are dropped
    epoch: AtomicU64,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One per dashboard session. State is only mutated by the monitor's own
/// poll completions; everything else gets read accessors.
pub struct Monitor<A> {
    api: Arc<A>,
    shared: Arc<Shared>,
    settings: PollSettings,
    scheduler: Option<JoinHandle<()>>,
}

impl<A: DashboardApi> Monitor<A> {
    pub fn new(api: Arc<A>, settings: PollSettings) -> Self {
        Self {
            api,
            shared: Arc::new(Shared {
                state: RwLock::new(MonitorState::default()),
                epoch: AtomicU64::new(0),
            }),
            settings,
            scheduler: None,
        }
    }

    /// Run a single poll and apply it. Failures are absorbed into the
    /// liveness state and the stored error message.
    pub async fn poll_once(&self) -> LivenessState {
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        run_poll(&*self.api, &self.shared, epoch, self.settings.history_limit).await
    }

    /// Poll immediately, then every `interval`. No-op while already running.
    pub fn start(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.shared);
        let PollSettings {
            interval,
            history_limit,
        } = self.settings;
        let epoch = shared.epoch.load(Ordering::SeqCst);
        info!(?interval, history_limit, "monitor started");

        self.scheduler = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // first tick completes immediately
                ticker.tick().await;
                let api = Arc::clone(&api);
                let shared = Arc::clone(&shared);
                // not awaited: a slow poll must not delay the next tick
                tokio::spawn(async move {
                    run_poll(&*api, &shared, epoch, history_limit).await;
                });
            }
        }));
    }

    /// Cancel the timer. In-flight polls run to completion but their results
    /// are discarded. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(handle) = self.scheduler.take() else {
            return;
        };
        handle.abort();
        let _guard = self.shared.write();
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        info!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.shared.read().snapshot()
    }

    pub fn liveness(&self) -> LivenessState {
        self.shared.read().liveness
    }

    pub fn series(&self) -> MetricSeries {
        self.shared.read().series.clone()
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.shared.read().prediction.clone()
    }

    pub fn system_info(&self) -> Option<SystemInfo> {
        self.shared.read().system.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.read().last_error.clone()
    }

    pub fn stuck_polls(&self) -> u32 {
        self.shared.read().stuck.count()
    }
}

impl<A> Drop for Monitor<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.abort();
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn run_poll<A: DashboardApi>(
    api: &A,
    shared: &Shared,
    epoch: u64,
    history_limit: usize,
) -> LivenessState {
    // all three in flight together; wait for every one to settle
    let (history, prediction, system) = futures::future::join3(
        api.history(history_limit),
        api.prediction(),
        api.system_info(),
    )
    .await;
    let outcome = history.and_then(|history| {
        Ok(PollData {
            history,
            prediction: prediction?,
            system: system?,
        })
    });

    let mut state = shared.write();
    if shared.epoch.load(Ordering::SeqCst) != epoch {
        debug!("discarding poll completed after monitor stop");
        return state.liveness;
    }
    state.apply(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted API: each poll pops one history result; prediction and
    /// system info always succeed unless `fail_predict` is set.
    #[derive(Default)]
    struct FakeApi {
        script: Mutex<VecDeque<Result<Vec<Sample>, String>>>,
        fail_predict: std::sync::atomic::AtomicBool,
        delay: Option<Duration>,
        // extra latency on the first history call only
        slow_first: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn scripted(items: Vec<Result<Vec<Sample>, String>>) -> Self {
            Self {
                script: Mutex::new(items.into()),
                ..Self::default()
            }
        }

        async fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn status_err(endpoint: &'static str) -> ApiError {
        ApiError::Status {
            endpoint,
            status: 503,
        }
    }

    impl DashboardApi for FakeApi {
        async fn history(&self, _limit: usize) -> Result<Vec<Sample>, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            if let (0, Some(d)) = (n, self.slow_first) {
                tokio::time::sleep(d).await;
            }
            self.enter().await;
            match next {
                Some(Ok(samples)) => Ok(samples),
                Some(Err(_)) => Err(status_err("/metrics")),
                None => Ok(vec![sample("steady")]),
            }
        }

        async fn prediction(&self) -> Result<Prediction, ApiError> {
            self.enter().await;
            if self.fail_predict.load(Ordering::SeqCst) {
                return Err(status_err("/predict"));
            }
            Ok(Prediction {
                status: Some("ok".into()),
                ..Prediction::default()
            })
        }

        async fn system_info(&self) -> Result<SystemInfo, ApiError> {
            self.enter().await;
            Ok(SystemInfo {
                hostname: "box".into(),
                cpu_arch: "x86_64".into(),
                os: "Linux".into(),
                cpu_cores: 4,
                ram_total: 8.0,
                disk_used: 10.0,
                disk_total: 100.0,
            })
        }

        async fn ask(&self, _question: &str) -> Result<String, ApiError> {
            Ok(String::new())
        }
    }

    fn sample(ts: &str) -> Sample {
        Sample {
            timestamp: Timestamp::new(ts),
            cpu: 10.0,
            memory: 20.0,
            disk: 30.0,
        }
    }

    fn monitor(api: FakeApi) -> Monitor<FakeApi> {
        Monitor::new(Arc::new(api), PollSettings::default())
    }

    #[tokio::test]
    async fn starts_offline_with_no_data() {
        let m = monitor(FakeApi::default());
        let snap = m.snapshot();
        assert_eq!(snap.liveness, LivenessState::Offline);
        assert_eq!(snap.polls_completed, 0);
        assert!(snap.prediction.is_none());
        assert!(snap.series.is_empty());
    }

    #[tokio::test]
    async fn fresh_timestamps_keep_online() {
        let script = (0..10).map(|i| Ok(vec![sample(&format!("t{i}"))])).collect();
        let m = monitor(FakeApi::scripted(script));
        for _ in 0..10 {
            assert_eq!(m.poll_once().await, LivenessState::Online);
        }
        assert_eq!(m.stuck_polls(), 0);
        assert!(m.last_error().is_none());
        assert!(m.system_info().is_some());
    }

    #[tokio::test]
    async fn repeated_timestamp_degrades_to_warning_then_recovers() {
        let mut script: Vec<_> = (0..7).map(|_| Ok(vec![sample("T1")])).collect();
        script.push(Ok(vec![sample("T2")]));
        let m = monitor(FakeApi::scripted(script));
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(m.poll_once().await);
        }
        use LivenessState::*;
        assert_eq!(
            seen,
            vec![Online, Online, Online, Online, Online, Online, Warning, Online]
        );
    }

    #[tokio::test]
    async fn failure_forces_offline_and_keeps_counter_and_data() {
        let script = vec![
            Ok(vec![sample("T1"), sample("T0")]),
            Ok(vec![sample("T1")]),
            Ok(vec![sample("T1")]),
            Err("boom".to_string()),
            Ok(vec![sample("T1")]),
        ];
        let m = monitor(FakeApi::scripted(script));
        m.poll_once().await;
        m.poll_once().await;
        m.poll_once().await;
        assert_eq!(m.stuck_polls(), 2);
        let before = m.series();

        assert_eq!(m.poll_once().await, LivenessState::Offline);
        let snap = m.snapshot();
        assert_eq!(snap.stuck_polls, 2);
        assert_eq!(snap.series, before);
        assert!(snap.prediction.is_some());
        let err = snap.last_error.expect("error stored");
        assert!(err.contains("503"), "{err}");

        // continuity: the same timestamp after recovery keeps counting
        assert_eq!(m.poll_once().await, LivenessState::Online);
        assert_eq!(m.stuck_polls(), 3);
        assert!(m.last_error().is_none());
    }

    #[tokio::test]
    async fn any_failed_leg_fails_the_poll() {
        let api = FakeApi::default();
        api.fail_predict.store(true, Ordering::SeqCst);
        let m = monitor(api);
        assert_eq!(m.poll_once().await, LivenessState::Offline);
        assert!(m.series().is_empty());
        assert!(m.last_error().unwrap().contains("/predict"));
    }

    #[tokio::test]
    async fn warning_is_not_reset_by_failure_history() {
        let mut script: Vec<_> = (0..7).map(|_| Ok(vec![sample("T")])).collect();
        script.push(Err("down".into()));
        script.push(Ok(vec![sample("T")]));
        let m = monitor(FakeApi::scripted(script));
        for _ in 0..7 {
            m.poll_once().await;
        }
        assert_eq!(m.liveness(), LivenessState::Warning);
        assert_eq!(m.poll_once().await, LivenessState::Offline);
        assert_eq!(m.poll_once().await, LivenessState::Warning);
    }

    #[tokio::test]
    async fn series_is_rebuilt_oldest_first() {
        let script = vec![Ok(vec![
            Sample {
                cpu: 3.0,
                ..sample("2025-01-01T00:00:03")
            },
            Sample {
                cpu: 1.0,
                ..sample("2025-01-01T00:00:01")
            },
            Sample {
                cpu: 2.0,
                ..sample("2025-01-01T00:00:02")
            },
        ])];
        let m = monitor(FakeApi::scripted(script));
        m.poll_once().await;
        let cpus: Vec<f64> = m.series().points().iter().map(|p| p.cpu).collect();
        assert_eq!(cpus, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn three_reads_are_issued_concurrently() {
        let api = FakeApi {
            delay: Some(Duration::from_millis(30)),
            ..FakeApi::default()
        };
        let m = monitor(api);
        m.poll_once().await;
        assert_eq!(m.api.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn scheduler_polls_immediately_and_repeatedly_until_stopped() {
        let api = Arc::new(FakeApi::default());
        let mut m = Monitor::new(
            Arc::clone(&api),
            PollSettings {
                interval: Duration::from_millis(20),
                history_limit: 5,
            },
        );
        m.start();
        m.start();
        assert!(m.is_running());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(api.calls.load(Ordering::SeqCst) >= 1, "first poll is immediate");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(api.calls.load(Ordering::SeqCst) >= 3);
        assert_ne!(m.liveness(), LivenessState::Offline);

        m.stop();
        m.stop();
        assert!(!m.is_running());
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_stop = api.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn completions_after_stop_are_ignored() {
        let api = Arc::new(FakeApi {
            delay: Some(Duration::from_millis(50)),
            ..FakeApi::default()
        });
        let mut m = Monitor::new(
            Arc::clone(&api),
            PollSettings {
                interval: Duration::from_secs(60),
                history_limit: 5,
            },
        );
        m.start();
        // the immediate poll is now in flight
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        m.stop();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snap = m.snapshot();
        assert_eq!(snap.polls_completed, 0);
        assert_eq!(snap.liveness, LivenessState::Offline);
    }

    #[tokio::test]
    async fn restart_after_stop_resumes_polling() {
        let api = Arc::new(FakeApi::default());
        let mut m = Monitor::new(
            Arc::clone(&api),
            PollSettings {
                interval: Duration::from_millis(20),
                history_limit: 5,
            },
        );
        m.start();
        m.stop();
        m.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(m.snapshot().polls_completed >= 1);
        m.stop();
    }

    #[tokio::test]
    async fn empty_history_never_stalls() {
        let m = monitor(FakeApi::scripted(vec![Ok(vec![]); 8]));
        for _ in 0..8 {
            assert_eq!(m.poll_once().await, LivenessState::Online);
        }
        assert_eq!(m.stuck_polls(), 0);
        assert!(m.series().is_empty());
        assert!(m.system_info().is_some());
    }

    #[tokio::test]
    async fn overlapping_polls_last_completion_wins() {
        // first poll is slow and sees A; second is fast and sees B
        let api = FakeApi {
            slow_first: Some(Duration::from_millis(60)),
            ..FakeApi::scripted(vec![Ok(vec![sample("A")]), Ok(vec![sample("B")])])
        };
        let m = monitor(api);
        let (slow, fast) = tokio::join!(m.poll_once(), m.poll_once());
        assert_eq!(slow, LivenessState::Online);
        assert_eq!(fast, LivenessState::Online);

        let snap = m.snapshot();
        assert_eq!(snap.polls_completed, 2);
        assert_eq!(snap.liveness, LivenessState::Online);
        assert_eq!(snap.stuck_polls, 0);
        let stamps: Vec<&str> = snap
            .series
            .points()
            .iter()
            .map(|p| p.timestamp.as_str())
            .collect();
        assert_eq!(stamps, vec!["A"]);
    }
}
