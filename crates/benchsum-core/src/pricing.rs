//! Model price table with fuzzy model-name resolution.
//!
//! Prices are USD per one million tokens. Only input and output prices are
//! tracked (no cached-input pricing).

use serde::{Deserialize, Serialize};

/// Input and output price for one model, per million tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceEntry {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl PriceEntry {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Default price list, in lookup order.
const DEFAULT_PRICES: &[(&str, f64, f64)] = &[
    ("grok-3-fast", 0.30, 0.50),
    ("gpt-5", 1.25, 10.00),
    ("gpt-5-mini", 0.25, 2.00),
    ("gpt-5-nano", 0.05, 0.40),
    ("gpt-5-chat-latest", 1.25, 10.00),
    ("gpt-5-codex", 1.25, 10.00),
    ("gpt-5-pro", 15.00, 120.00),
    ("gpt-4.1", 2.00, 8.00),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1-nano", 0.10, 0.40),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4o-2024-05-13", 5.00, 15.00),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-realtime", 4.00, 16.00),
    ("gpt-realtime-mini", 0.60, 2.40),
    ("gpt-4o-realtime-preview", 5.00, 20.00),
    ("gpt-4o-mini-realtime-preview", 0.60, 2.40),
    ("gpt-audio", 2.50, 10.00),
    ("gpt-audio-mini", 0.60, 2.40),
    ("gpt-4o-audio-preview", 2.50, 10.00),
    ("gpt-4o-mini-audio-preview", 0.15, 0.60),
    ("o1", 15.00, 60.00),
    ("o1-pro", 150.00, 600.00),
    ("o3-pro", 20.00, 80.00),
    ("o3", 2.00, 8.00),
    ("o3-deep-research", 10.00, 40.00),
    ("o4-mini", 1.10, 4.40),
    ("o4-mini-deep-research", 2.00, 8.00),
    ("o3-mini", 1.10, 4.40),
    ("o1-mini", 1.10, 4.40),
    ("codex-mini-latest", 1.50, 6.00),
    ("gpt-5-search-api", 1.25, 10.00),
    ("gpt-4o-mini-search-preview", 0.15, 0.60),
    ("gpt-4o-search-preview", 2.50, 10.00),
    ("computer-use-preview", 3.00, 12.00),
    // Image models have no output token price.
    ("gpt-image-1", 5.00, 0.00),
    ("gpt-image-1-mini", 2.00, 0.00),
];

/// Ordered mapping from lower-cased model key to its price.
///
/// Insertion order is the tie-break for substring matching in
/// [`PriceTable::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    entries: Vec<(String, PriceEntry)>,
}

impl Default for PriceTable {
    fn default() -> Self {
        DEFAULT_PRICES
            .iter()
            .fold(Self::empty(), |table, (key, input, output)| {
                table.with_entry(*key, PriceEntry::new(*input, *output))
            })
    }
}

impl PriceTable {
    /// A table with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry, or replace the price of an existing key in place.
    pub fn with_entry(mut self, key: impl Into<String>, entry: PriceEntry) -> Self {
        let key = key.into().to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
        self
    }

    /// Exact lookup of a normalized key.
    pub fn get(&self, key: &str) -> Option<PriceEntry> {
        self.lookup(key).map(|(_, entry)| entry)
    }

    /// Keys in lookup order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a free-form model name to a table key.
    ///
    /// Tries, in order:
    /// 1. the trimmed, lower-cased name;
    /// 2. its tail after the last `.` and then the last `/`;
    /// 3. the first key (in table order) contained in the normalized name.
    ///
    /// The third tier is loose: `openai.gpt-4.1-nano` has tail
    /// `1-nano` and then matches `gpt-4.1` before `gpt-4.1-nano`.
    pub fn resolve(&self, model_name: &str) -> Option<(&str, PriceEntry)> {
        let normalized = model_name.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let tail = normalized.rsplit('.').next().unwrap_or(&normalized);
        let tail = tail.rsplit('/').next().unwrap_or(tail);

        self.lookup(&normalized)
            .or_else(|| self.lookup(tail))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(k, _)| normalized.contains(k.as_str()))
                    .map(|(k, entry)| (k.as_str(), *entry))
            })
    }

    fn lookup(&self, key: &str) -> Option<(&str, PriceEntry)> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(k, entry)| (k.as_str(), *entry))
    }
}
