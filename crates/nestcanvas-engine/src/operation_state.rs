//! Timed operation state machine
//!
//! Wraps the pure transition table from `nestcanvas_core::operation` with the
//! settle timer that returns `LayoutLocked` to `Idle`. State and timer are
//! owned together; transitions, timer scheduling and timer cancellation all
//! happen under the same lock so a stale timer can never clobber a newer
//! operation's lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use nestcanvas_core::operation::{LockReason, OperationEvent, OperationState};
use nestcanvas_core::schema::EVENT_TRANSITION;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;

#[derive(Default)]
struct SettleTimer {
    /// Bumped on every applied transition; a timer only fires for its own
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    state: watch::Sender<OperationState>,
    timer: Mutex<SettleTimer>,
    import_settle: Duration,
    restore_settle: Duration,
}

/// Shared handle to the session's operation state
///
/// Cloning is cheap; every clone drives the same machine.
#[derive(Clone)]
pub struct OperationStateMachine {
    inner: Arc<Inner>,
}

impl OperationStateMachine {
    pub fn new(import_settle: Duration, restore_settle: Duration) -> Self {
        let (state, _) = watch::channel(OperationState::Idle);
        Self {
            inner: Arc::new(Inner {
                state,
                timer: Mutex::new(SettleTimer::default()),
                import_settle,
                restore_settle,
            }),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.import_settle(), config.restore_settle())
    }

    pub fn state(&self) -> OperationState {
        *self.inner.state.borrow()
    }

    /// An import or restore is in flight
    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Automatic reflow may run right now
    pub fn can_reflow_now(&self) -> bool {
        self.state().permits_reflow()
    }

    /// Watch state changes, including the timer-driven return to idle
    pub fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.inner.state.subscribe()
    }

    /// Resolve once the machine is idle
    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // the sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(OperationState::is_idle).await;
    }

    pub fn settle_pending(&self) -> bool {
        self.lock_timer().handle.is_some()
    }

    fn lock_timer(&self) -> MutexGuard<'_, SettleTimer> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a transition
    ///
    /// Returns whether the event was applied. An event the table does not
    /// list for the current state is ignored and leaves any running settle
    /// timer alone; an applied one cancels it first. Only an applied event
    /// counts as a new transition, so a refused request never shortens or
    /// extends the settle window.
    pub fn dispatch(&self, event: OperationEvent) -> bool {
        let mut timer = self.lock_timer();
        let from = self.state();

        let Some(to) = from.on(event) else {
            tracing::debug!(
                component = "operation_state",
                transition = event.as_str(),
                from = %from,
                "transition ignored"
            );
            return false;
        };

        Self::cancel_locked(&mut timer);
        self.inner.state.send_replace(to);
        tracing::info!(
            component = "operation_state",
            event = EVENT_TRANSITION,
            transition = event.as_str(),
            from = %from,
            to = %to,
        );

        if let OperationState::LayoutLocked(reason) = to {
            self.schedule_settle(&mut timer, reason);
        }
        true
    }

    /// Stop a pending settle timer without changing state
    ///
    /// The machine then stays `LayoutLocked` until a `Complete` or `Error`
    /// arrives. Returns whether a timer was pending.
    pub fn cancel_settle_timer(&self) -> bool {
        let mut timer = self.lock_timer();
        let pending = timer.handle.is_some();
        Self::cancel_locked(&mut timer);
        pending
    }

    fn cancel_locked(timer: &mut SettleTimer) {
        timer.generation += 1;
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
    }

    fn schedule_settle(&self, timer: &mut SettleTimer, reason: LockReason) {
        let delay = match reason {
            LockReason::Import => self.inner.import_settle,
            LockReason::Restore => self.inner.restore_settle,
        };
        let generation = timer.generation;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            // nothing can wake a timer without a runtime
            self.settle_locked(timer);
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        timer.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                OperationStateMachine { inner }.settle(generation);
            }
        }));
    }

    fn settle(&self, generation: u64) {
        let mut timer = self.lock_timer();
        if timer.generation != generation {
            return;
        }
        timer.handle = None;
        self.settle_locked(&mut timer);
    }

    fn settle_locked(&self, timer: &mut SettleTimer) {
        let from = self.state();
        if !matches!(from, OperationState::LayoutLocked(_)) {
            return;
        }
        timer.generation += 1;
        self.inner.state.send_replace(OperationState::Idle);
        tracing::info!(
            component = "operation_state",
            event = EVENT_TRANSITION,
            transition = "settled",
            from = %from,
            to = %OperationState::Idle,
        );
    }
}

impl std::fmt::Debug for OperationStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationStateMachine")
            .field("state", &self.state())
            .finish()
    }
}
