use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::session::SessionContext;

/// Receives the coalesced "data changed, reload" signal.
pub trait Refresher: Send {
    fn refresh(&mut self);
}

impl<F> Refresher for F
where
    F: FnMut() + Send,
{
    fn refresh(&mut self) {
        self()
    }
}

/// Predicate deciding whether the current view wants refreshes at all.
#[derive(Clone)]
pub struct RouteGuard(Arc<dyn Fn() -> bool + Send + Sync>);

impl RouteGuard {
    pub fn new(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn always() -> Self {
        Self::new(|| true)
    }

    /// Allows refreshes while the current view path contains `marker`.
    pub fn path_contains(view: watch::Receiver<String>, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self::new(move || view.borrow().contains(&marker))
    }

    pub fn allows(&self) -> bool {
        (self.0)()
    }
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RouteGuard")
    }
}

/// Collapses bursts of relevant events into a single refresh fired once the
/// stream has been quiet for `quiet_window`.
pub struct RefreshDebouncer<R> {
    quiet_window: Duration,
    deadline: Option<Instant>,
    guard: RouteGuard,
    clock: Arc<dyn Clock>,
    refresher: R,
    fired: u64,
}

impl<R: Refresher> RefreshDebouncer<R> {
    pub fn new(
        session: &SessionContext,
        quiet_window: Duration,
        guard: RouteGuard,
        refresher: R,
    ) -> Self {
        Self {
            quiet_window,
            deadline: None,
            guard,
            clock: session.clock.clone(),
            refresher,
            fired: 0,
        }
    }

    /// (Re)arms the timer. Returns `false` when the guard rejected the call.
    pub fn on_relevant_event(&mut self) -> bool {
        if !self.guard.allows() {
            debug!("Current view does not refresh, skipping");
            return false;
        }

        let deadline = self.clock.now() + self.quiet_window;
        if self.deadline.replace(deadline).is_some() {
            debug!("Refresh postponed by another change");
        } else {
            info!("Data changed, refreshing in {} ms", self.quiet_window.as_millis());
        }
        true
    }

    /// Fires the refresh if the quiet window has elapsed.
    pub fn tick(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= self.clock.now() => {
                self.deadline = None;
                self.fired += 1;
                self.refresher.refresh();
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn refresh_count(&self) -> u64 {
        self.fired
    }
}
