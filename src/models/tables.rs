use std::collections::HashMap;

use crate::normalize::name_variants;

// ---------------------------------------------------------------------------
// VariantTable — auxiliary lookup keyed by every name variant
// ---------------------------------------------------------------------------

/// Lookup table from item-name variants to a value.
///
/// Every inserted row is stored under all of its [`name_variants`], so a
/// lookup is a handful of hash probes instead of a scan. When two rows share a
/// variant the later insert wins.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantTable<V> {
    entries: HashMap<String, V>,
    rows: usize,
}

impl<V> Default for VariantTable<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            rows: 0,
        }
    }
}

impl<V: Clone> VariantTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source row under every variant of its raw key.
    pub fn insert(&mut self, raw_name: &str, value: V) {
        for variant in name_variants(raw_name) {
            self.entries.insert(variant, value.clone());
        }
        self.rows += 1;
    }

    /// Probe the variants of `raw_name` in priority order.
    ///
    /// Returns the first variant that hit together with its value.
    pub fn lookup(&self, raw_name: &str) -> Option<(String, &V)> {
        name_variants(raw_name)
            .into_iter()
            .find_map(|variant| self.entries.get(&variant).map(|v| (variant, v)))
    }

    /// Exact-key probe, without expanding variants.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Number of source rows inserted.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of distinct variant keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone, S: AsRef<str>> FromIterator<(S, V)> for VariantTable<V> {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            table.insert(name.as_ref(), value);
        }
        table
    }
}

/// Estimated supply per item.
pub type SupplyTable = VariantTable<u64>;

/// Image URL per item.
pub type ImageTable = VariantTable<String>;
