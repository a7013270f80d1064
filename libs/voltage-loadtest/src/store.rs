//! Append-only result collection shared by all workers

use parking_lot::Mutex;

use crate::result::InvocationResult;

/// Ordered, mutex-guarded sequence of invocation results
///
/// Results are kept in append (completion) order. There is no way to remove
/// or replace an entry.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Mutex<Vec<InvocationResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Add one result; safe to call from any number of workers
    pub fn append(&self, result: InvocationResult) {
        self.results.lock().push(result);
    }

    /// Copy of the current contents in append order
    pub fn snapshot(&self) -> Vec<InvocationResult> {
        self.results.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::Local;
    use std::sync::Arc;

    fn result(id: &str) -> InvocationResult {
        InvocationResult::completed(id, Local::now(), 0.01, 0, "", "")
    }

    #[test]
    fn test_append_preserves_order() {
        let store = ResultStore::new();
        assert!(store.is_empty());

        store.append(result("first"));
        store.append(result("second"));

        let ids: Vec<String> = store.snapshot().into_iter().map(|r| r.test_id).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = ResultStore::new();
        store.append(result("a"));
        let snapshot = store.snapshot();
        store.append(result("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(ResultStore::with_capacity(800));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.append(result(&format!("thread_{}_test_{}", t, i)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<String> = store.snapshot().into_iter().map(|r| r.test_id).collect();
        assert_eq!(ids.len(), 800);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 800);
    }
}
