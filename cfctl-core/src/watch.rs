use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::Result;

/// The changes observed between two consecutive watch-loop fetches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchDiff {
    pub added: Vec<Value>,
    pub removed: Vec<String>,
}

/// Tracks which record identities have been seen across watch iterations, so
/// each tick reports only the arrivals and departures since the last one.
/// A record's identity is the lexicographically-sorted `k=v` join of its
/// top-level fields (spec §3/§4.8), not a single named field, so a record
/// whose every field changed except one stable key is still reported as a
/// departure-then-arrival rather than silently missed.
#[derive(Default)]
pub struct WatchState {
    seen: HashSet<String>,
}

/// The sorted `k=v` join identity for one record.
fn identity(record: &Value) -> String {
    let Some(obj) = record.as_object() else {
        return record.to_string();
    };

    let mut pairs: Vec<String> = obj
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{k}={value}")
        })
        .collect();
    pairs.sort();
    pairs.join(",")
}

impl WatchState {
    pub fn new() -> Self {
        WatchState::default()
    }

    /// Diff a freshly fetched record set against what's been seen so far,
    /// then adopt it as the new baseline.
    pub fn diff(&mut self, records: &[Value]) -> WatchDiff {
        let mut current = HashSet::with_capacity(records.len());
        let mut added = Vec::new();

        for record in records {
            let id = identity(record);
            current.insert(id.clone());
            if !self.seen.contains(&id) {
                added.push(record.clone());
            }
        }

        let removed: Vec<String> = self.seen.difference(&current).cloned().collect();
        self.seen = current;

        WatchDiff { added, removed }
    }
}

/// Drive a watch loop: call `fetch` on a fixed interval, reporting the diff
/// against the previous tick to `on_diff`, until `fetch` returns an error.
pub async fn run<F, Fut, D>(interval: Duration, mut fetch: F, mut on_diff: D) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
    D: FnMut(&WatchDiff),
{
    let mut state = WatchState::new();
    loop {
        let records = fetch().await?;
        let diff = state.diff(&records);
        on_diff(&diff);
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_diff_reports_everything_as_added() {
        let mut state = WatchState::new();
        let records = vec![serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})];
        let diff = state.diff(&records);
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn second_diff_reports_only_changes() {
        let mut state = WatchState::new();
        state.diff(&[serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})]);

        let diff = state.diff(&[serde_json::json!({"id": "b"}), serde_json::json!({"id": "c"})]);
        assert_eq!(diff.added, vec![serde_json::json!({"id": "c"})]);
        assert_eq!(diff.removed, vec!["id=a".to_string()]);
    }

    #[test]
    fn stable_set_reports_no_changes() {
        let mut state = WatchState::new();
        let records = vec![serde_json::json!({"id": "a"})];
        state.diff(&records);
        let diff = state.diff(&records);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn record_whose_non_key_field_changes_is_reported_as_changed() {
        let mut state = WatchState::new();
        state.diff(&[serde_json::json!({"id": "a", "status": "PENDING"})]);

        let diff = state.diff(&[serde_json::json!({"id": "a", "status": "SUCCESS"})]);
        assert_eq!(diff.added, vec![serde_json::json!({"id": "a", "status": "SUCCESS"})]);
        assert_eq!(diff.removed, vec!["id=a,status=PENDING".to_string()]);
    }

    #[test]
    fn identity_join_is_sorted_regardless_of_field_order() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(identity(&a), identity(&b));
        assert_eq!(identity(&a), "a=2,b=1");
    }
}
