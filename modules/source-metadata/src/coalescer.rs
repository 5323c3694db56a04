// Batches store mutations into fewer subscriber wake-ups.
//
// Consumers must not assume a write is visible to them right after it lands:
// the signal for it may only arrive with a later mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;

/// Default number of mutations per delivered signal.
pub const DEFAULT_NOTIFY_EVERY: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescePolicy {
    /// Signal on every n-th mutation. `EveryN(0)` behaves like `EveryN(1)`.
    EveryN(u64),
    /// Signal on a mutation when at least this long has passed since the last signal.
    Interval(Duration),
}

impl Default for CoalescePolicy {
    fn default() -> Self {
        CoalescePolicy::EveryN(DEFAULT_NOTIFY_EVERY)
    }
}

#[derive(Debug)]
pub struct UpdateCoalescer {
    policy: CoalescePolicy,
    mutations: AtomicU64,
    last_signal: Mutex<Option<Instant>>,
    generation: watch::Sender<u64>,
}

impl UpdateCoalescer {
    pub fn new(policy: CoalescePolicy) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            policy,
            mutations: AtomicU64::new(0),
            last_signal: Mutex::new(None),
            generation,
        }
    }

    pub fn policy(&self) -> CoalescePolicy {
        self.policy
    }

    /// Record one store mutation. Returns true if subscribers were signalled.
    pub fn notify(&self) -> bool {
        let count = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;

        let fire = match self.policy {
            CoalescePolicy::EveryN(n) => count % n.max(1) == 0,
            CoalescePolicy::Interval(min_gap) => {
                let mut last = self.last_signal.lock().unwrap_or_else(|e| e.into_inner());
                let now = Instant::now();
                let due = last.map_or(true, |at| now.duration_since(at) >= min_gap);
                if due {
                    *last = Some(now);
                }
                due
            }
        };

        if fire {
            self.generation.send_modify(|g| *g += 1);
        }
        fire
    }

    /// Receiver whose value is the number of signals delivered so far.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    pub fn mutations(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn signals(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl Default for UpdateCoalescer {
    fn default() -> Self {
        Self::new(CoalescePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_n_signals_on_multiples() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::EveryN(5));
        let fired: Vec<bool> = (0..10).map(|_| coalescer.notify()).collect();

        assert_eq!(
            fired,
            vec![false, false, false, false, true, false, false, false, false, true]
        );
        assert_eq!(coalescer.mutations(), 10);
        assert_eq!(coalescer.signals(), 2);
    }

    #[test]
    fn threshold_of_one_signals_every_mutation() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::EveryN(1));
        for _ in 0..3 {
            assert!(coalescer.notify());
        }
        assert_eq!(coalescer.signals(), 3);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::EveryN(0));
        assert!(coalescer.notify());
        assert_eq!(coalescer.signals(), 1);
    }

    #[test]
    fn interval_policy_fires_first_then_waits() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::Interval(Duration::from_secs(3600)));
        assert!(coalescer.notify());
        assert!(!coalescer.notify());
        assert!(!coalescer.notify());
        assert_eq!(coalescer.signals(), 1);
        assert_eq!(coalescer.mutations(), 3);
    }

    #[test]
    fn zero_interval_fires_every_time() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::Interval(Duration::ZERO));
        assert!(coalescer.notify());
        assert!(coalescer.notify());
        assert_eq!(coalescer.signals(), 2);
    }

    #[tokio::test]
    async fn subscribers_observe_generation_changes() {
        let coalescer = UpdateCoalescer::new(CoalescePolicy::EveryN(2));
        let mut rx = coalescer.subscribe();

        coalescer.notify();
        assert!(!rx.has_changed().unwrap());

        coalescer.notify();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[test]
    fn default_policy_is_every_five() {
        assert_eq!(
            UpdateCoalescer::default().policy(),
            CoalescePolicy::EveryN(DEFAULT_NOTIFY_EVERY)
        );
    }
}
