//! # Reachability
//!
//! Tracks whether the catalog host can be reached and tells subscribers when
//! that changes. A [`ReachabilityProbe`] feeds the monitor from a background
//! task; tests and `--offline` drive it directly with
//! [`ReachabilityMonitor::set_status`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Network reachability of the catalog host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityState {
    Satisfied,
    Unsatisfied,
}

impl ReachabilityState {
    pub fn is_satisfied(self) -> bool {
        self == ReachabilityState::Satisfied
    }
}

impl fmt::Display for ReachabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReachabilityState::Satisfied => write!(f, "online"),
            ReachabilityState::Unsatisfied => write!(f, "offline"),
        }
    }
}

/// Type alias for reachability observers
pub type ReachabilityObserver = Arc<dyn Fn(ReachabilityState) + Send + Sync>;

struct MonitorState {
    status: ReachabilityState,
    next_id: u64,
    observers: BTreeMap<u64, ReachabilityObserver>,
}

/// Shared reachability status with change notification
pub struct ReachabilityMonitor {
    state: Arc<Mutex<MonitorState>>,
}

impl ReachabilityMonitor {
    pub fn new(initial: ReachabilityState) -> Self {
        Self {
            state: Arc::new(Mutex::new(MonitorState {
                status: initial,
                next_id: 0,
                observers: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current_status(&self) -> ReachabilityState {
        self.lock().status
    }

    /// Record a new status, notifying observers only if it changed.
    ///
    /// Returns whether a transition happened.
    pub fn set_status(&self, status: ReachabilityState) -> bool {
        let ids: Vec<u64> = {
            let mut state = self.lock();
            if state.status == status {
                return false;
            }
            state.status = status;
            state.observers.keys().copied().collect()
        };

        tracing::info!("Catalog host is now {status}");
        // observers run outside the lock so they may query or unsubscribe;
        // each one is looked up again so an observer removed mid-dispatch is skipped
        for id in ids {
            let observer = match self.lock().observers.get(&id) {
                Some(observer) => observer.clone(),
                None => continue,
            };
            observer(status);
        }
        true
    }

    /// Register `observer` for transitions.
    ///
    /// The observer stays registered until the returned handle is dropped or
    /// passed to [`ReachabilityMonitor::unsubscribe`].
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(ReachabilityState) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.observers.insert(id, Arc::new(observer));
        tracing::debug!("Reachability observer {id} subscribed");

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }
}

impl fmt::Debug for ReachabilityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ReachabilityMonitor")
            .field("status", &state.status)
            .field("observers", &state.observers.len())
            .finish()
    }
}

/// Handle for a registered observer; unsubscribes on drop.
///
/// Holds only a weak link to the monitor, so an outstanding subscription
/// never keeps a torn-down monitor alive.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<MonitorState>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            if state.observers.remove(&self.id).is_some() {
                tracing::debug!("Reachability observer {} unsubscribed", self.id);
            }
        }
    }
}

/// Default interval between background reachability checks
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default time allowed for one connection attempt
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Decides reachability by opening a TCP connection to the catalog host
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    addr: String,
    interval: Duration,
    timeout: Duration,
}

impl ReachabilityProbe {
    /// `addr` is a `host:port` pair
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            interval: DEFAULT_PROBE_INTERVAL,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One connection attempt
    pub async fn check(&self) -> ReachabilityState {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => ReachabilityState::Satisfied,
            Ok(Err(e)) => {
                tracing::debug!("Reachability probe to {} failed: {e}", self.addr);
                ReachabilityState::Unsatisfied
            }
            Err(_) => {
                tracing::debug!("Reachability probe to {} timed out", self.addr);
                ReachabilityState::Unsatisfied
            }
        }
    }

    /// Check on every interval tick and feed the result to `monitor`.
    ///
    /// The task runs until aborted.
    pub fn spawn(self, monitor: Arc<ReachabilityMonitor>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = self.check().await;
                monitor.set_status(status);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording(monitor: &ReachabilityMonitor) -> (Subscription, Arc<Mutex<Vec<ReachabilityState>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let subscription = monitor.subscribe(move |status| {
            received_clone.lock().unwrap().push(status);
        });
        (subscription, received)
    }

    #[test]
    fn monitor_should_report_initial_status() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Unsatisfied);
        assert_eq!(monitor.current_status(), ReachabilityState::Unsatisfied);
    }

    #[test]
    fn monitor_should_notify_once_per_transition() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let (_subscription, received) = recording(&monitor);

        assert!(!monitor.set_status(ReachabilityState::Satisfied));
        assert!(monitor.set_status(ReachabilityState::Unsatisfied));
        assert!(!monitor.set_status(ReachabilityState::Unsatisfied));
        assert!(!monitor.set_status(ReachabilityState::Unsatisfied));
        assert!(monitor.set_status(ReachabilityState::Satisfied));

        assert_eq!(
            *received.lock().unwrap(),
            vec![ReachabilityState::Unsatisfied, ReachabilityState::Satisfied]
        );
        assert_eq!(monitor.current_status(), ReachabilityState::Satisfied);
    }

    #[test]
    fn monitor_should_notify_every_subscriber() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let (_first, received_1) = recording(&monitor);
        let (_second, received_2) = recording(&monitor);

        monitor.set_status(ReachabilityState::Unsatisfied);

        assert_eq!(received_1.lock().unwrap().len(), 1);
        assert_eq!(received_2.lock().unwrap().len(), 1);
    }

    #[test]
    fn dropped_subscription_should_not_be_notified() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let (subscription, received) = recording(&monitor);
        assert_eq!(monitor.observer_count(), 1);

        drop(subscription);
        monitor.set_status(ReachabilityState::Unsatisfied);

        assert!(received.lock().unwrap().is_empty());
        assert_eq!(monitor.observer_count(), 0);
    }

    #[test]
    fn observer_dropped_during_dispatch_should_not_be_notified() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let later: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let later_clone = later.clone();
        let _first = monitor.subscribe(move |_| {
            later_clone.lock().unwrap().take();
        });
        let (second, received) = recording(&monitor);
        *later.lock().unwrap() = Some(second);

        assert!(monitor.set_status(ReachabilityState::Unsatisfied));

        assert!(received.lock().unwrap().is_empty());
        assert_eq!(monitor.observer_count(), 1);
    }

    #[test]
    fn unsubscribe_should_remove_only_that_observer() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let (first, received_1) = recording(&monitor);
        let (_second, received_2) = recording(&monitor);

        monitor.unsubscribe(first);
        monitor.set_status(ReachabilityState::Unsatisfied);

        assert!(received_1.lock().unwrap().is_empty());
        assert_eq!(received_2.lock().unwrap().len(), 1);
    }

    #[test]
    fn subscription_should_outlive_monitor_without_panicking() {
        let monitor = ReachabilityMonitor::new(ReachabilityState::Satisfied);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscription = monitor.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        drop(monitor);
        drop(subscription);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn observer_may_query_monitor_during_notification() {
        let monitor = Arc::new(ReachabilityMonitor::new(ReachabilityState::Satisfied));
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let monitor_clone = Arc::downgrade(&monitor);
        let _subscription = monitor.subscribe(move |_| {
            if let Some(monitor) = monitor_clone.upgrade() {
                *seen_clone.lock().unwrap() = Some(monitor.current_status());
            }
        });

        monitor.set_status(ReachabilityState::Unsatisfied);

        assert_eq!(*seen.lock().unwrap(), Some(ReachabilityState::Unsatisfied));
    }

    #[tokio::test]
    async fn probe_should_report_satisfied_for_listening_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = ReachabilityProbe::new(addr.to_string());

        assert_eq!(probe.check().await, ReachabilityState::Satisfied);
    }

    #[tokio::test]
    async fn probe_should_report_unsatisfied_for_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = ReachabilityProbe::new(addr.to_string()).with_timeout(Duration::from_secs(1));

        assert_eq!(probe.check().await, ReachabilityState::Unsatisfied);
    }

    #[tokio::test]
    async fn spawned_probe_should_feed_monitor() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let monitor = Arc::new(ReachabilityMonitor::new(ReachabilityState::Unsatisfied));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = monitor.subscribe(move |status| {
            let _ = tx.send(status);
        });

        let handle = ReachabilityProbe::new(addr.to_string())
            .with_interval(Duration::from_millis(10))
            .spawn(monitor.clone());

        let status = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        handle.abort();

        assert_eq!(status, Some(ReachabilityState::Satisfied));
        assert_eq!(monitor.current_status(), ReachabilityState::Satisfied);
    }
}
