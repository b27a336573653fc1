//! Filter criteria for a dashboard view.
//!
//! A view keeps two [`FilterState`]s: the *draft*, edited control by
//! control, and the *committed* state, which is what queries are keyed on.
//! The committed state only changes through [`FilterStateManager::apply_filters`],
//! [`FilterStateManager::commit_draft`] and [`FilterStateManager::clear_filters`].
//!
//! An empty value (`""` or an empty list) means "no filter" for that key.
//! It is stored like any other value but left out of query keys and request
//! parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tablero_core::logging::targets;
use tablero_core::{Property, Signal};

/// The value selected for a single filter control.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// One selected value.
    Single(String),
    /// Several selected values, in selection order.
    Multi(Vec<String>),
}

impl FilterValue {
    /// Whether this value selects nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multi(values) => values.iter().all(String::is_empty),
        }
    }

    /// The non-empty selected values, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect()
    }

    /// The value if exactly one is selected.
    pub fn as_single(&self) -> Option<&str> {
        match self.values().as_slice() {
            [one] => Some(*one),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Single(value) => serde_json::Value::String(value.clone()),
            Self::Multi(values) => serde_json::Value::Array(
                values
                    .iter()
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .map(serde_json::Value::String)
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// A mapping from filter key to selected value.
///
/// Keys are kept sorted, so iteration order and the canonical form are
/// independent of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterState {
    /// An empty (unfiltered) state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    /// Get the single selected value for a key.
    pub fn get_single(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(FilterValue::as_single)
    }

    /// Set a key, keeping empty values as explicit "no filter" markers.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.entries.remove(key)
    }

    /// Merge `patch` key by key.
    ///
    /// Keys absent from the patch are kept and every patch key overwrites,
    /// empty values included.
    pub fn merge(&mut self, patch: &FilterState) {
        for (key, value) in &patch.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Number of keys, including empty markers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the keys that actually filter (non-empty values).
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.iter().filter(|(_, v)| !v.is_empty())
    }

    /// The canonical serialization used in query keys.
    ///
    /// Keys are sorted and empty values are dropped, so two states that
    /// filter the same way serialize identically. List order is kept.
    pub fn canonical(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .active()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for FilterState
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (key, value) in iter {
            state.insert(key, value);
        }
        state
    }
}

/// Draft and committed filter criteria for one dashboard view.
///
/// Performs no I/O. Listeners of [`committed_changed`](Self::committed_changed)
/// receive the new snapshot whenever the committed state actually changes.
pub struct FilterStateManager {
    draft: Property<FilterState>,
    committed: Property<FilterState>,
    /// Emitted with the new committed snapshot after every effective change.
    pub committed_changed: Signal<FilterState>,
    /// Emitted with the new draft after every effective draft edit.
    pub draft_changed: Signal<FilterState>,
}

impl Default for FilterStateManager {
    fn default() -> Self {
        Self::new(FilterState::new())
    }
}

impl FilterStateManager {
    /// Create a manager whose committed state starts as `initial`.
    ///
    /// The draft starts empty.
    pub fn new(initial: FilterState) -> Self {
        let mut committed = FilterState::new();
        committed.merge(&initial);
        Self {
            draft: Property::new(FilterState::new()),
            committed: Property::new(committed),
            committed_changed: Signal::new(),
            draft_changed: Signal::new(),
        }
    }

    /// Snapshot of the draft.
    pub fn draft(&self) -> FilterState {
        self.draft.get()
    }

    /// Snapshot of the committed state.
    pub fn committed(&self) -> FilterState {
        self.committed.get()
    }

    /// Set one draft key. The committed state is untouched.
    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(draft) = self.draft.update(|d| d.insert(key, value)) {
            self.draft_changed.emit(draft);
        }
    }

    /// Remove one draft key.
    pub fn remove_filter(&self, key: &str) {
        if let Some(draft) = self.draft.update(|d| {
            d.remove(key);
        }) {
            self.draft_changed.emit(draft);
        }
    }

    /// Merge `patch` into the committed state.
    ///
    /// Returns `true` when the committed state changed.
    pub fn apply_filters(&self, patch: &FilterState) -> bool {
        match self.committed.update(|c| c.merge(patch)) {
            Some(committed) => {
                tracing::debug!(
                    target: targets::FILTER,
                    filters = %committed.canonical(),
                    "committed filters changed"
                );
                self.committed_changed.emit(committed);
                true
            }
            None => false,
        }
    }

    /// Apply the whole draft as a patch. The draft is kept as is.
    pub fn commit_draft(&self) -> bool {
        let draft = self.draft.get();
        self.apply_filters(&draft)
    }

    /// Reset both draft and committed state to empty.
    ///
    /// Clearing an already empty state is a no-op without notification.
    pub fn clear_filters(&self) -> bool {
        if self.draft.set(FilterState::new()) {
            self.draft_changed.emit(FilterState::new());
        }
        if self.committed.set(FilterState::new()) {
            tracing::debug!(target: targets::FILTER, "committed filters cleared");
            self.committed_changed.emit(FilterState::new());
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for FilterStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStateManager")
            .field("draft", &self.draft.get())
            .field("committed", &self.committed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn state(pairs: &[(&str, &str)]) -> FilterState {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_apply_preserves_untouched_keys_and_sets_patch_keys() {
        let manager = FilterStateManager::new(state(&[("anio", "2026"), ("ue", "3")]));
        let patch = state(&[("ue", "5"), ("mes", "7")]);

        assert!(manager.apply_filters(&patch));

        let committed = manager.committed();
        assert_eq!(committed.get_single("anio"), Some("2026"));
        for (key, value) in patch.iter() {
            assert_eq!(committed.get(key), Some(value));
        }
        assert_eq!(committed.len(), 3);
    }

    #[test]
    fn test_empty_patch_value_is_kept_but_inactive() {
        let manager = FilterStateManager::new(state(&[("anio", "2026"), ("ue", "3")]));
        assert!(manager.apply_filters(&state(&[("ue", "")])));

        let committed = manager.committed();
        assert_eq!(committed.get("ue"), Some(&FilterValue::from("")));
        assert_eq!(committed.get_single("ue"), None);
        assert_eq!(committed.active().count(), 1);
        assert_eq!(committed.canonical(), state(&[("anio", "2026")]).canonical());
    }

    #[test]
    fn test_draft_edits_do_not_touch_committed() {
        let manager = FilterStateManager::new(state(&[("anio", "2026")]));
        manager.set_filter("anio", "2025");
        manager.set_filter("meta", vec!["1", "2"]);

        assert_eq!(manager.committed(), state(&[("anio", "2026")]));
        assert_eq!(manager.draft().get_single("anio"), Some("2025"));

        assert!(manager.commit_draft());
        assert_eq!(manager.committed().get_single("anio"), Some("2025"));
        assert_eq!(
            manager.committed().get("meta"),
            Some(&FilterValue::from(vec!["1", "2"]))
        );
    }

    #[test]
    fn test_committed_changed_only_on_change() {
        let manager = FilterStateManager::new(FilterState::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        manager.committed_changed.connect(move |s: &FilterState| {
            seen_clone.lock().push(s.canonical());
        });

        assert!(manager.apply_filters(&state(&[("anio", "2026")])));
        assert!(!manager.apply_filters(&state(&[("anio", "2026")])));
        assert!(manager.clear_filters());
        assert!(!manager.clear_filters());

        assert_eq!(*seen.lock(), vec![r#"{"anio":"2026"}"#.to_string(), "{}".to_string()]);
    }

    #[test]
    fn test_canonical_is_order_independent() {
        let a = state(&[("ue", "3"), ("anio", "2026"), ("mes", "")]);
        let b = state(&[("anio", "2026"), ("ue", "3")]);
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), r#"{"anio":"2026","ue":"3"}"#);
    }

    #[test]
    fn test_filter_value_serde_untagged() {
        let parsed: FilterState =
            serde_json::from_str(r#"{"anio":"2026","estado":["CONVOCADO","ADJUDICADO"]}"#)
                .unwrap();
        assert_eq!(parsed.get_single("anio"), Some("2026"));
        assert_eq!(
            parsed.get("estado").map(FilterValue::values),
            Some(vec!["CONVOCADO", "ADJUDICADO"])
        );
    }
}
