//! Network quiescence tracking
//!
//! A page counts as settled once no more than `max_inflight` requests are
//! outstanding and nothing has started or finished for a full idle window.
//! Backends feed request start/end events into [`NetworkIdle`] and block on
//! [`wait_for_idle`].

use crate::{Error, Result, WaitOptions};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Interval between idle checks while waiting
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// In-flight request bookkeeping for one page
#[derive(Debug)]
pub struct NetworkIdle {
    inflight: HashSet<String>,
    seen: usize,
    last_activity: Instant,
}

impl NetworkIdle {
    pub fn new(now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            seen: 0,
            last_activity: now,
        }
    }

    /// Record a request start. A redirect re-announces the same id and does
    /// not add a second entry.
    pub fn request_started(&mut self, request_id: &str, now: Instant) {
        if self.inflight.insert(request_id.to_string()) {
            self.seen += 1;
        }
        self.last_activity = now;
    }

    /// Record a request that finished or failed. Unknown ids are ignored.
    pub fn request_finished(&mut self, request_id: &str, now: Instant) {
        if self.inflight.remove(request_id) {
            self.last_activity = now;
        }
    }

    /// Treat `now` as activity, e.g. when a new document was just injected.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Distinct requests started since the tracker was created.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn is_idle(&self, now: Instant, window: Duration, max_inflight: usize) -> bool {
        self.inflight.len() <= max_inflight
            && now.saturating_duration_since(self.last_activity) >= window
    }
}

/// Block until `tracker` reports idle or `wait.timeout` elapses.
///
/// Returns [`Error::ContentLoadTimeout`] on the deadline; there is no
/// partial success.
pub fn wait_for_idle(tracker: &Mutex<NetworkIdle>, wait: &WaitOptions) -> Result<()> {
    let started = Instant::now();
    let deadline = started + wait.timeout;

    loop {
        let now = Instant::now();
        {
            let state = tracker
                .lock()
                .map_err(|_| Error::ContentLoad("network tracker poisoned".into()))?;
            if state.is_idle(now, wait.idle_window, wait.max_inflight) {
                log::debug!(
                    "network idle after {}ms ({} request(s) seen)",
                    now.duration_since(started).as_millis(),
                    state.seen()
                );
                return Ok(());
            }
            if now >= deadline {
                log::debug!("network still busy with {} request(s) at deadline", state.inflight());
                return Err(Error::ContentLoadTimeout(wait.timeout.as_millis() as u64));
            }
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(now)));
    }
}
