//! Debounced scroll signal shared by pager instances.
//!
//! Raw scroll events arrive far more often than a pager needs to re-evaluate
//! its position. `ScrollSignal` collapses each burst into one trailing-edge
//! notification, emitted once the quiet period has passed without a new
//! event. A single pending timer is shared by every listener bound to the hub.
//!
//! # Example
//!
//! ```rust,ignore
//! let signal = ScrollSignal::new(Duration::from_millis(100));
//! signal.bind("smartscroll.infscr.0", Arc::new(|| println!("check")));
//!
//! // In the host's scroll handler:
//! signal.raw();
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Callback notified on every logical check.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

struct SignalInner {
    quiet_period: Duration,
    listeners: HashMap<String, Listener>,
    /// Timer for the trailing-edge emission, if one is scheduled
    pending: Option<JoinHandle<()>>,
}

/// Rate limiter over a keyed set of listeners.
#[derive(Clone)]
pub struct ScrollSignal {
    inner: Arc<Mutex<SignalInner>>,
}

impl Default for ScrollSignal {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl std::fmt::Debug for ScrollSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ScrollSignal")
            .field("quiet_period", &inner.quiet_period)
            .field("listeners", &inner.listeners.keys().collect::<Vec<_>>())
            .field("pending", &inner.pending.is_some())
            .finish()
    }
}

impl ScrollSignal {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalInner {
                quiet_period,
                listeners: HashMap::new(),
                pending: None,
            })),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.lock().quiet_period
    }

    /// Change the quiet period for every clone of this signal. A pending
    /// emission keeps the period it was scheduled with.
    pub fn set_quiet_period(&self, quiet_period: Duration) {
        self.lock().quiet_period = quiet_period;
    }

    fn lock(&self) -> MutexGuard<'_, SignalInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a listener under `key`, replacing any previous one.
    pub fn bind(&self, key: impl Into<String>, listener: Listener) {
        self.lock().listeners.insert(key.into(), listener);
    }

    /// Remove the listener under `key`. Returns false if nothing was bound.
    pub fn unbind(&self, key: &str) -> bool {
        self.lock().listeners.remove(key).is_some()
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.lock().listeners.contains_key(key)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Feed one raw scroll event.
    ///
    /// Restarts the quiet period; listeners hear about it once the period
    /// elapses with no further events. Must be called inside a tokio runtime.
    pub fn raw(&self) {
        let signal = self.clone();

        let mut inner = self.lock();
        let quiet_period = inner.quiet_period;
        if let Some(pending) = inner.pending.take() {
            pending.abort();
        }
        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            signal.emit();
        }));
    }

    /// Emit immediately, dropping any pending trailing emission.
    pub fn trigger_now(&self) {
        self.cancel();
        self.emit();
    }

    /// Drop the pending emission, if any. Returns true if one was scheduled.
    pub fn cancel(&self) -> bool {
        match self.lock().pending.take() {
            Some(pending) => {
                let scheduled = !pending.is_finished();
                pending.abort();
                scheduled
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock()
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    fn emit(&self) {
        // Snapshot so listeners may bind/unbind without deadlocking
        let listeners: Vec<Listener> = self.lock().listeners.values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn counter(signal: &ScrollSignal, key: &str) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        signal.bind(key, Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_once_on_trailing_edge() {
        let signal = ScrollSignal::new(Duration::from_millis(100));
        let count = counter(&signal, "a");

        signal.raw();
        sleep(Duration::from_millis(30)).await;
        signal.raw();
        sleep(Duration::from_millis(30)).await;
        signal.raw();

        sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(signal.is_pending());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let signal = ScrollSignal::new(Duration::from_millis(100));
        let count = counter(&signal, "a");

        signal.raw();
        sleep(Duration::from_millis(150)).await;
        signal.raw();
        sleep(Duration::from_millis(150)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_now_is_synchronous_and_drops_pending() {
        let signal = ScrollSignal::new(Duration::from_millis(100));
        let count = counter(&signal, "a");

        signal.raw();
        signal.trigger_now();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!signal.is_pending());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retuned_period_applies_to_clones() {
        let signal = ScrollSignal::new(Duration::from_millis(100));
        let count = counter(&signal, "a");

        signal.clone().set_quiet_period(Duration::from_millis(1000));
        assert_eq!(signal.quiet_period(), Duration::from_millis(1000));

        signal.raw();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(501)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unbind_is_idempotent_and_scoped() {
        let signal = ScrollSignal::default();
        let a = counter(&signal, "smartscroll.infscr.0");
        let b = counter(&signal, "smartscroll.infscr.1");

        assert!(signal.unbind("smartscroll.infscr.0"));
        assert!(!signal.unbind("smartscroll.infscr.0"));
        assert_eq!(signal.listener_count(), 1);

        signal.trigger_now();
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }
}
