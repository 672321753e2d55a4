// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::engine::{BonusCalculator, SalesFetch};
use crate::store::{BonusStore, PartnerStore, SaleStore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub period: String,
    /// `None` means every active partner.
    pub partner_ids: Option<BTreeSet<i64>>,
    pub batch_size: usize,
    pub fetch: SalesFetch,
    pub progress_every: usize,
}

impl RunOptions {
    pub fn from_config(period: &str, config: &Config) -> Self {
        Self {
            period: period.to_string(),
            partner_ids: None,
            batch_size: config.batch_size,
            fetch: config.sales_fetch,
            progress_every: config.progress_every,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithFailures,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithFailures => "completed_with_failures",
            RunStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureLine {
    pub partner_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub period: String,
    pub requested: usize,
    pub processed: usize,
    pub bonuses_written: usize,
    pub skipped: Vec<i64>,
    pub failed: usize,
    pub failures: Vec<FailureLine>,
    pub elapsed_secs: f64,
    pub status: RunStatus,
    pub abort_reason: Option<String>,
    pub diagnostics: Diagnostics,
}

impl RunSummary {
    fn new(period: &str) -> Self {
        Self {
            period: period.to_string(),
            requested: 0,
            processed: 0,
            bonuses_written: 0,
            skipped: Vec::new(),
            failed: 0,
            failures: Vec::new(),
            elapsed_secs: 0.0,
            status: RunStatus::Completed,
            abort_reason: None,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }
}

/// Calculates bonuses for `opts.period`, one engine call per chunk of
/// `opts.batch_size` partner ids. Everything has been processed (or the run
/// aborted) by the time this returns. `processed` counts partners that were
/// saved or failed; skipped ids are only listed in `skipped`.
pub fn run<P, S, B>(partners: &P, sales: &S, bonuses: &B, opts: &RunOptions) -> RunSummary
where
    P: PartnerStore,
    S: SaleStore,
    B: BonusStore,
{
    let started = Instant::now();
    let mut summary = RunSummary::new(&opts.period);
    info!(period = %opts.period, fetch = %opts.fetch, batch_size = opts.batch_size, "bonus run started");

    let ids: Vec<i64> = match &opts.partner_ids {
        Some(subset) => subset.iter().copied().collect(),
        None => {
            summary.diagnostics.partner_lookups += 1;
            match partners.find_active_partners() {
                Ok(found) => found.into_iter().map(|p| p.id).collect(),
                Err(err) => {
                    error!(period = %opts.period, error = %err, "could not load active partners");
                    summary.status = RunStatus::Aborted;
                    summary.abort_reason = Some(err.to_string());
                    summary.elapsed_secs = started.elapsed().as_secs_f64();
                    return summary;
                }
            }
        }
    };
    summary.requested = ids.len();
    match &opts.partner_ids {
        Some(_) => info!(partners = ids.len(), "found {} requested partner ids", ids.len()),
        None => info!(partners = ids.len(), "found {} active partners", ids.len()),
    }

    let calculator = BonusCalculator::new(partners, sales, bonuses).with_fetch(opts.fetch);
    let every = opts.progress_every.max(1);
    let mut reported = 0;

    for chunk in ids.chunks(opts.batch_size.max(1)) {
        let chunk_ids: BTreeSet<i64> = chunk.iter().copied().collect();
        match calculator.calculate_for_partners(&chunk_ids, &opts.period, &mut summary.diagnostics)
        {
            Ok(report) => {
                summary.processed += report.processed();
                summary.bonuses_written += report.bonuses.len();
                summary.skipped.extend(report.skipped);
                summary
                    .failures
                    .extend(report.failures.into_iter().map(|f| FailureLine {
                        partner_id: f.partner_id,
                        error: f.error.to_string(),
                    }));
                if let Some(err) = report.aborted {
                    summary.status = RunStatus::Aborted;
                    summary.abort_reason = Some(err.to_string());
                    break;
                }
            }
            Err(err) => {
                summary.status = RunStatus::Aborted;
                summary.abort_reason = Some(err.to_string());
                break;
            }
        }
        if summary.processed / every > reported {
            reported = summary.processed / every;
            info!(processed = summary.processed, total = summary.requested, "progress");
        }
    }

    summary.failed = summary.failures.len();
    if summary.status != RunStatus::Aborted && summary.failed > 0 {
        summary.status = RunStatus::CompletedWithFailures;
    }
    summary.elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        period = %summary.period,
        processed = summary.processed,
        written = summary.bonuses_written,
        skipped = summary.skipped.len(),
        failed = summary.failed,
        elapsed_secs = summary.elapsed_secs,
        "bonus run finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, partner, sale};

    fn opts(batch_size: usize, fetch: SalesFetch) -> RunOptions {
        RunOptions {
            period: "2026-02".into(),
            partner_ids: None,
            batch_size,
            fetch,
            progress_every: 2,
        }
    }

    fn store() -> MemoryStore {
        let mut partners = vec![
            partner(1, "gold"),
            partner(2, "bronze"),
            partner(3, "silver"),
            partner(4, "silver"),
        ];
        partners[3].active = false;
        MemoryStore::new(
            partners,
            vec![
                sale(1, 1, "100.00", "completed"),
                sale(2, 1, "100.00", "completed"),
                sale(3, 2, "100.00", "completed"),
                sale(4, 3, "200.00", "completed"),
                sale(5, 4, "999.00", "completed"),
            ],
        )
    }

    fn saved_amounts(store: &MemoryStore) -> Vec<(i64, String)> {
        store
            .saved()
            .iter()
            .map(|b| (b.partner_id, b.amount_text()))
            .collect()
    }

    #[test]
    fn processes_every_active_partner() {
        let store = store();
        let summary = run(&store, &store, &store, &opts(100, SalesFetch::Batch));

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.requested, 3);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.bonuses_written, 3);
        assert_eq!(store.active_calls(), 1);
        assert_eq!(
            saved_amounts(&store),
            vec![
                (1, "15.00".to_string()),
                (2, "5.00".to_string()),
                (3, "12.00".to_string()),
            ]
        );
    }

    #[test]
    fn chunk_size_does_not_change_results() {
        let per_partner = store();
        run(&per_partner, &per_partner, &per_partner, &opts(1, SalesFetch::Batch));
        let one_chunk = store();
        run(&one_chunk, &one_chunk, &one_chunk, &opts(50, SalesFetch::PerPartner));

        assert_eq!(saved_amounts(&per_partner), saved_amounts(&one_chunk));
        assert_eq!(per_partner.batch_calls(), 3);
        assert_eq!(one_chunk.single_calls(), 3);
    }

    #[test]
    fn explicit_subset_skips_unknown_ids() {
        let store = store();
        let mut o = opts(10, SalesFetch::Batch);
        o.partner_ids = Some([2, 4, 42].into_iter().collect());
        let summary = run(&store, &store, &store, &o);

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.requested, 3);
        assert_eq!(summary.skipped, vec![4, 42]);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.bonuses_written, 1);
        assert_eq!(summary.diagnostics.partners_skipped, 2);
        assert_eq!(store.active_calls(), 0);
        assert_eq!(saved_amounts(&store), vec![(2, "5.00".to_string())]);
    }

    #[test]
    fn partner_failures_are_reported_and_run_continues() {
        let store = store().with_rejected_save_for(2);
        let summary = run(&store, &store, &store, &opts(1, SalesFetch::PerPartner));

        assert_eq!(summary.status, RunStatus::CompletedWithFailures);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.bonuses_written, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].partner_id, 2);
        assert!(summary.failures[0].error.contains("CHECK constraint"));
        assert!(!summary.aborted());
    }

    #[test]
    fn unavailable_store_aborts_the_run() {
        let store = store().with_unavailable_save_for(2);
        let summary = run(&store, &store, &store, &opts(1, SalesFetch::PerPartner));

        assert!(summary.aborted());
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.bonuses_written, 1);
        assert!(summary.abort_reason.unwrap().contains("unavailable"));
        assert_eq!(saved_amounts(&store), vec![(1, "15.00".to_string())]);
    }

    #[test]
    fn abort_inside_a_chunk_keeps_saved_bonuses_in_summary() {
        let store = store().with_unavailable_save_for(2);
        let summary = run(&store, &store, &store, &opts(100, SalesFetch::PerPartner));

        assert!(summary.aborted());
        assert_eq!(summary.requested, 3);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.bonuses_written, 1);
        assert_eq!(summary.bonuses_written, summary.diagnostics.bonuses_written as usize);
        assert!(summary.abort_reason.unwrap().contains("disk I/O error"));
        assert_eq!(saved_amounts(&store), vec![(1, "15.00".to_string())]);
    }

    #[test]
    fn failing_partner_listing_aborts_before_any_work() {
        let store = store().with_unavailable_reads();
        let summary = run(&store, &store, &store, &opts(10, SalesFetch::Batch));

        assert!(summary.aborted());
        assert_eq!(summary.requested, 0);
        assert!(store.saved().is_empty());
    }

    #[test]
    fn options_follow_config() {
        let config = Config {
            batch_size: 7,
            sales_fetch: SalesFetch::PerPartner,
            progress_every: 3,
            ..Config::default()
        };
        let o = RunOptions::from_config("2026-04", &config);
        assert_eq!(o.period, "2026-04");
        assert_eq!(o.batch_size, 7);
        assert_eq!(o.fetch, SalesFetch::PerPartner);
        assert_eq!(o.partner_ids, None);
    }
}
