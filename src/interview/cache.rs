//! Memoized question sets keyed by (task, normalized profile).

use std::collections::HashMap;

use super::model::{Profile, QuestionSet, Task};

/// Build the cache key: task name, `_`, canonical profile JSON.
pub fn cache_key(task: Task, profile: &Profile) -> String {
    format!("{}_{}", task.name(), profile.canonical_json())
}

/// Session-lifetime question cache. No eviction; dropped with the session state on a profile change or reset.
#[derive(Debug, Clone, Default)]
pub struct QuestionCache {
    entries: HashMap<String, QuestionSet>,
}

impl QuestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the set stored for this key. Returns a shared handle.
    pub fn get(&self, task: Task, profile: &Profile) -> Option<QuestionSet> {
        self.entries.get(&cache_key(task, profile)).cloned()
    }

    /// Store a set unless the key is already present.
    ///
    /// Existing entries are never replaced; the stored set is returned either way.
    pub fn put(&mut self, task: Task, profile: &Profile, set: QuestionSet) -> QuestionSet {
        self.entries
            .entry(cache_key(task, profile))
            .or_insert(set)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::model::Question;

    fn acme() -> Profile {
        Profile::new("Acme", "Retail", "50", "")
    }

    fn one_question(text: &str) -> QuestionSet {
        QuestionSet::new(vec![Question::input(text)])
    }

    #[test]
    fn key_differs_for_each_field() {
        let base = acme();
        let base_key = cache_key(Task::StrategicPlanning, &base);
        let variants = [
            Profile { name: "Acme Co".into(), ..base.clone() },
            Profile { industry: "Retail ".into(), ..base.clone() },
            Profile { size: "51".into(), ..base.clone() },
            Profile { description: "Shops".into(), ..base.clone() },
        ];
        for variant in &variants {
            assert_ne!(cache_key(Task::StrategicPlanning, variant), base_key);
        }
        assert_ne!(cache_key(Task::OrganizationalAssessment, &base), base_key);
    }

    #[test]
    fn key_ignores_source_field_order() {
        let a: Profile =
            serde_json::from_str(r#"{"description":"","size":"50","industry":"Retail","name":"Acme"}"#)
                .unwrap();
        assert_eq!(
            cache_key(Task::StrategicPlanning, &a),
            cache_key(Task::StrategicPlanning, &acme())
        );
    }

    #[test]
    fn get_returns_the_stored_set() {
        let mut cache = QuestionCache::new();
        assert!(cache.get(Task::StrategicPlanning, &acme()).is_none());

        let set = one_question("first");
        cache.put(Task::StrategicPlanning, &acme(), set.clone());
        let hit = cache.get(Task::StrategicPlanning, &acme()).unwrap();
        assert!(hit.ptr_eq(&set));
        assert!(cache.get(Task::OrganizationalAssessment, &acme()).is_none());
    }

    #[test]
    fn put_never_replaces_an_entry() {
        let mut cache = QuestionCache::new();
        let first = one_question("first");
        cache.put(Task::StrategicPlanning, &acme(), first.clone());
        let stored = cache.put(Task::StrategicPlanning, &acme(), one_question("second"));

        assert!(stored.ptr_eq(&first));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(Task::StrategicPlanning, &acme()).unwrap().get(0).unwrap().text(),
            "first"
        );
    }
}
