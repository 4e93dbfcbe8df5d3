use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

///
/// A sparse frequency table: only values that were observed have an entry, and
/// iteration is in ascending value order.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Ord",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct Histogram<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Histogram<K> {
    fn default() -> Self {
        Histogram {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Histogram<K> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, value: K) {
        self.add_n(value, 1);
    }

    pub fn add_n(&mut self, value: K, n: u64) {
        if n == 0 {
            return;
        }
        *self.counts.entry(value).or_insert(0) += n;
    }

    pub fn get(&self, value: &K) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Sum of all frequencies.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }
}

impl<K: Ord> FromIterator<K> for Histogram<K> {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut hist = Histogram::new();
        for value in iter {
            hist.add(value);
        }
        hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_sparse_and_sorted() {
        let hist: Histogram<u8> = [60, 0, 60, 255, 3].into_iter().collect();
        let pairs: Vec<(u8, u64)> = hist.iter().map(|(k, v)| (*k, v)).collect();
        assert_eq!(pairs, vec![(0, 1), (3, 1), (60, 2), (255, 1)]);
        assert_eq!(hist.total(), 5);
        assert_eq!(hist.get(&42), 0);
    }

    #[rstest]
    fn test_zero_add_leaves_no_entry() {
        let mut hist: Histogram<u32> = Histogram::new();
        hist.add_n(4, 0);
        assert!(hist.is_empty());
    }
}
