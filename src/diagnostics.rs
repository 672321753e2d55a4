// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;

const MAX_SAMPLES: usize = 5;

/// Counters collected while calculating bonuses. Passed down by `&mut` and
/// returned to the caller with the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub partner_lookups: u64,
    pub partners_loaded: u64,
    pub partners_skipped: u64,
    pub single_sales_fetches: u64,
    pub batch_sales_fetches: u64,
    pub batch_fetch_fallbacks: u64,
    pub sales_loaded: u64,
    pub sales_ignored: u64,
    pub unknown_tier_fallbacks: u64,
    pub unknown_tier_samples: Vec<String>,
    pub bonuses_written: u64,
    pub integrity_failures: u64,
    pub persistence_failures: u64,
}

impl Diagnostics {
    pub fn record_unknown_tier(&mut self, label: &str) {
        self.unknown_tier_fallbacks += 1;
        if self.unknown_tier_samples.len() >= MAX_SAMPLES
            || self.unknown_tier_samples.iter().any(|s| s == label)
        {
            return;
        }
        self.unknown_tier_samples.push(label.to_string());
    }

    /// Rows for `pretty_table`, skipping zero counters.
    pub fn table_rows(&self) -> Vec<Vec<String>> {
        let counters = [
            ("partner_lookups", self.partner_lookups),
            ("partners_loaded", self.partners_loaded),
            ("partners_skipped", self.partners_skipped),
            ("single_sales_fetches", self.single_sales_fetches),
            ("batch_sales_fetches", self.batch_sales_fetches),
            ("batch_fetch_fallbacks", self.batch_fetch_fallbacks),
            ("sales_loaded", self.sales_loaded),
            ("sales_ignored", self.sales_ignored),
            ("unknown_tier_fallbacks", self.unknown_tier_fallbacks),
            ("bonuses_written", self.bonuses_written),
            ("integrity_failures", self.integrity_failures),
            ("persistence_failures", self.persistence_failures),
        ];
        let mut rows: Vec<Vec<String>> = counters
            .iter()
            .filter(|(_, v)| *v > 0)
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();
        if !self.unknown_tier_samples.is_empty() {
            let quoted: Vec<String> = self
                .unknown_tier_samples
                .iter()
                .map(|s| format!("{:?}", s))
                .collect();
            rows.push(vec!["unknown_tier_samples".into(), quoted.join(", ")]);
        }
        rows
    }
}
