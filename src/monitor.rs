//! The polling loop behind the indicator.
//!
//! A [`StatusMonitor`] owns at most one schedule: a Tokio task that runs a
//! tick on the blocking pool, waits for it to finish, then sleeps for the
//! period (fixed delay, so slow repositories stretch the cadence rather
//! than stacking ticks). Every tick holds the monitor's [`MonitorState`]
//! lock from first query to publish, so at most one tick is in flight per
//! monitor, even when a stopped schedule is still finishing while a new one
//! starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commit::CommitAction;
use crate::metrics::TickStats;
use crate::presenter::Presenter;
use crate::query;
use crate::status::StatusTuple;
use crate::vcs::VcsQuery;
use crate::workspace::Workspace;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

// Log tick latency every this many ticks.
const REPORT_EVERY: u64 = 60;

/// What the monitor last told the presenter. Written only by ticks.
#[derive(Debug, Default)]
pub struct MonitorState {
    last_published: StatusTuple,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_published(&self) -> StatusTuple {
        self.last_published
    }
}

struct Shared {
    workspace: Arc<dyn Workspace>,
    vcs: Arc<dyn VcsQuery>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<MonitorState>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Schedule {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Schedule {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

pub struct StatusMonitor {
    shared: Arc<Shared>,
    period: Duration,
    commit: Option<Arc<dyn CommitAction>>,
    schedule: Mutex<Option<Schedule>>,
}

impl StatusMonitor {
    pub fn new(
        workspace: Arc<dyn Workspace>,
        vcs: Arc<dyn VcsQuery>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                workspace,
                vcs,
                presenter,
                state: Mutex::new(MonitorState::new()),
            }),
            period: DEFAULT_PERIOD,
            commit: None,
            schedule: Mutex::new(None),
        }
    }

    /// A running schedule keeps the period it was started with.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_commit_action(mut self, action: Arc<dyn CommitAction>) -> Self {
        self.commit = Some(action);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn lock_schedule(&self) -> MutexGuard<'_, Option<Schedule>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts polling, with the first tick firing right away. Returns false,
    /// and changes nothing, if a schedule is already running or the
    /// workspace has been disposed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut slot = self.lock_schedule();
        if slot.as_ref().map_or(false, |s| !s.task.is_finished()) {
            return false;
        }
        if self.shared.workspace.is_disposed() {
            return false;
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run_schedule(
            self.shared.clone(),
            self.period,
            cancelled.clone(),
            wake.clone(),
        ));
        *slot = Some(Schedule {
            cancelled,
            wake,
            task,
        });
        info!(period = ?self.period, "status monitor started");
        true
    }

    /// Cancels the schedule. A tick already running finishes its queries
    /// but does not publish, and the next schedule's first tick waits for it.
    pub fn stop(&self) {
        if let Some(schedule) = self.lock_schedule().take() {
            schedule.cancel();
            info!("status monitor stopped");
        }
    }

    /// Asks the running schedule for an immediate tick. Does nothing when
    /// stopped.
    pub fn refresh(&self) {
        if let Some(schedule) = self.lock_schedule().as_ref() {
            schedule.wake.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_schedule()
            .as_ref()
            .map_or(false, |s| !s.task.is_finished())
    }

    /// Disposes the workspace, stops polling for good and waits until no
    /// tick is in flight, including one left over from an earlier `stop()`.
    pub async fn dispose(&self) {
        self.shared.workspace.dispose();
        let schedule = self.lock_schedule().take();
        if let Some(schedule) = schedule {
            schedule.cancel();
            if let Err(e) = schedule.task.await {
                warn!(error = %e, "status schedule ended abnormally");
            }
        }

        let shared = self.shared.clone();
        let drained = tokio::task::spawn_blocking(move || {
            drop(shared.lock_state());
        })
        .await;
        if let Err(e) = drained {
            warn!(error = %e, "waiting for the last tick failed");
        }
        info!("status monitor disposed");
    }

    /// The indicator's click handler: hands the current repositories to the
    /// commit action.
    pub fn click(&self) -> anyhow::Result<()> {
        if self.shared.workspace.is_disposed() {
            return Ok(());
        }
        let Some(action) = &self.commit else {
            debug!("no commit action configured");
            return Ok(());
        };
        let repos = self.shared.workspace.repositories();
        action.invoke(&repos)
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        let slot = self
            .schedule
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(schedule) = slot.take() {
            schedule.cancel();
        }
    }
}

async fn run_schedule(
    shared: Arc<Shared>,
    period: Duration,
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    let mut stats = TickStats::new();

    loop {
        if cancelled.load(Ordering::SeqCst) || shared.workspace.is_disposed() {
            break;
        }

        let started = Instant::now();
        let job = {
            let shared = shared.clone();
            let cancelled = cancelled.clone();
            tokio::task::spawn_blocking(move || {
                let mut state = shared.lock_state();
                tick(&mut state, &shared, &cancelled);
            })
        };
        if let Err(e) = job.await {
            warn!(error = %e, "status tick panicked");
        }

        stats.record(started.elapsed());
        if stats.report_due(REPORT_EVERY) {
            debug!(stats = %stats.summary(), "tick latency");
        }

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = wake.notified() => {}
        }
    }

    debug!("status schedule finished");
}

/// Queries every repository once and publishes the aggregate if it differs
/// from what was last published. Returns the published status.
fn tick(state: &mut MonitorState, shared: &Shared, cancelled: &AtomicBool) -> Option<StatusTuple> {
    let halted = || cancelled.load(Ordering::SeqCst) || shared.workspace.is_disposed();
    if halted() {
        return None;
    }

    let repos = shared.workspace.repositories();
    let status = query::aggregate_status(shared.vcs.as_ref(), &repos);
    debug!(repos = repos.len(), ?status, "tick");

    if halted() {
        debug!("monitor halted mid-tick, discarding result");
        return None;
    }
    if status == state.last_published {
        return None;
    }

    state.last_published = status;
    info!(
        staged = status.has_staged_changes,
        unstaged = status.has_unstaged_changes,
        unpushed = status.has_unpushed_commits,
        "status changed"
    );
    shared.presenter.on_status_changed(status);
    Some(status)
}
