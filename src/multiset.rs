//! Frequency multiset
//!
//! Every pipeline stage consumes and produces a [`Multiset`]: a map from
//! non-empty string keys to strictly positive occurrence counts.

use ahash::RandomState;
use hashbrown::hash_map::Iter;
use hashbrown::HashMap;

/// Mapping from key to occurrence count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multiset {
    counts: HashMap<String, u64, RandomState>,
}

impl Multiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Add `count` occurrences of `key`
    ///
    /// Empty keys and zero counts are ignored so the invariants hold at entry.
    pub fn add(&mut self, key: impl Into<String>, count: u64) {
        let key = key.into();
        if key.is_empty() || count == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += count;
    }

    /// Add occurrences, keeping an empty key
    ///
    /// Only used by stages whose output deliberately carries an empty
    /// residue (mask removal of a fully masked key).
    pub(crate) fn add_allow_empty(&mut self, key: String, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += count;
    }

    /// Record a single occurrence (one input line)
    #[inline]
    pub fn insert(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        *self.counts.entry_ref(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> Iter<'_, String, u64> {
        self.counts.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Keep only the entries for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, u64) -> bool,
    {
        self.counts.retain(|k, v| keep(k, *v));
    }

    /// Merge another multiset into this one, summing shared keys
    pub fn merge(&mut self, other: &Multiset) {
        for (key, &count) in other.iter() {
            *self.counts.entry(key.clone()).or_insert(0) += count;
        }
    }

    /// Entries ordered by count descending, then key ascending
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Sum counts pointwise over the union of keys
pub fn combine_maps(a: &Multiset, b: &Multiset) -> Multiset {
    let mut combined = Multiset::with_capacity(a.len() + b.len());
    combined.merge(a);
    combined.merge(b);
    combined
}

impl<K: Into<String>> FromIterator<(K, u64)> for Multiset {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut set = Multiset::new();
        set.extend(iter);
        set
    }
}

impl<K: Into<String>> Extend<(K, u64)> for Multiset {
    fn extend<I: IntoIterator<Item = (K, u64)>>(&mut self, iter: I) {
        for (key, count) in iter {
            self.add(key, count);
        }
    }
}

impl IntoIterator for Multiset {
    type Item = (String, u64);
    type IntoIter = hashbrown::hash_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Multiset {
    type Item = (&'a String, &'a u64);
    type IntoIter = Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}
