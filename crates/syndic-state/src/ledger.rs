//! Publication ledger: slug -> ordered publication dates.
//!
//! Stored at `content/meta/published-log.json` as `{ "<slug>": ["YYYY-MM-DD", ...] }`.
//! Entries are only ever appended, and every rotation decision (eligibility,
//! selection priority, angle index) is derived from this file alone.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationLedger {
    entries: BTreeMap<String, Vec<NaiveDate>>,
}

impl PublicationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded publications for `slug`.
    pub fn count(&self, slug: &str) -> usize {
        self.entries.get(slug).map_or(0, Vec::len)
    }

    /// Most recent publication date for `slug`.
    pub fn last(&self, slug: &str) -> Option<NaiveDate> {
        self.entries.get(slug).and_then(|d| d.iter().max().copied())
    }

    pub fn dates(&self, slug: &str) -> &[NaiveDate] {
        self.entries.get(slug).map_or(&[], Vec::as_slice)
    }

    /// Append a publication. Existing entries are never rewritten.
    pub fn append(&mut self, slug: &str, date: NaiveDate) {
        self.entries.entry(slug.to_string()).or_default().push(date);
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
