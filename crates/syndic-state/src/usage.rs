//! Generation usage log (`content/meta/api-usage.json`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One text-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub date: NaiveDate,
    pub platform: String,
    pub purpose: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLog {
    #[serde(default)]
    pub entries: Vec<UsageEntry>,
}

impl UsageLog {
    /// Total (input, output) tokens across all entries.
    pub fn totals(&self) -> (u64, u64) {
        self.entries.iter().fold((0, 0), |(i, o), e| {
            (i + e.input_tokens, o + e.output_tokens)
        })
    }
}
