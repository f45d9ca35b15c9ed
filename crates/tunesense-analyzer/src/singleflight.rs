//! Collapsing of duplicate concurrent computations

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

/// Table of in-flight computations keyed by `K`.
///
/// Concurrent `run` calls with equal keys share one execution and all receive
/// a clone of its value. The entry leaves the table as soon as a caller
/// observes the value, so a later call starts fresh.
pub struct SingleFlight<K, V> {
    calls: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` unless an equal key is already in flight, in which case
    /// wait for that execution instead.
    ///
    /// If the executing caller is dropped before finishing, one of the
    /// waiters takes over with its own `work`.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let value = cell.get_or_init(work).await.clone();

        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        if calls.get(&key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(&key);
        }

        value
    }

    /// Number of keys currently being computed
    pub fn in_flight(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let flight = SingleFlight::<String, usize>::new();
        let executions = AtomicUsize::new(0);
        let counter = &executions;

        let work = move || async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            counter.fetch_add(1, Ordering::SeqCst) + 100
        };

        let results = futures::future::join_all(
            (0..8).map(|_| flight.run("same".to_string(), work)),
        )
        .await;

        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|v| *v == 100));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flight = SingleFlight::<u32, u32>::new();
        let executions = AtomicUsize::new(0);
        let counter = &executions;

        let (a, b) = tokio::join!(
            flight.run(1, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                10
            }),
            flight.run(2, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                20
            }),
        );

        assert_eq!((a, b), (10, 20));
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_calls_recompute() {
        let flight = SingleFlight::<&'static str, usize>::new();
        let executions = AtomicUsize::new(0);
        let counter = &executions;

        for expected in 0..3 {
            let value = flight
                .run("key", move || async move { counter.fetch_add(1, Ordering::SeqCst) })
                .await;
            assert_eq!(value, expected);
        }
    }

    #[tokio::test]
    async fn test_errors_are_shared_too() {
        let flight = SingleFlight::<u8, Result<u8, String>>::new();

        let (a, b) = tokio::join!(
            flight.run(1, || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err("boom".to_string())
            }),
            flight.run(1, || async { Ok(1) }),
        );

        assert_eq!(a, Err("boom".to_string()));
        assert_eq!(b, Err("boom".to_string()));
    }
}
