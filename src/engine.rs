// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::diagnostics::Diagnostics;
use crate::error::{BonusError, StoreError};
use crate::models::{Bonus, Partner, Sale};
use crate::policy::compute_bonus;
use crate::store::{BonusStore, PartnerStore, SaleStore};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, warn};

/// How completed sales are loaded. Both modes produce the same bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SalesFetch {
    /// One query per partner.
    PerPartner,
    /// One query per engine call, grouped in memory.
    #[default]
    Batch,
}

impl FromStr for SalesFetch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "per-partner" => Ok(SalesFetch::PerPartner),
            "batch" => Ok(SalesFetch::Batch),
            other => Err(format!("unknown sales fetch mode '{}' (use single|batch)", other)),
        }
    }
}

impl fmt::Display for SalesFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesFetch::PerPartner => f.write_str("single"),
            SalesFetch::Batch => f.write_str("batch"),
        }
    }
}

#[derive(Debug)]
pub struct PartnerFailure {
    pub partner_id: i64,
    pub error: BonusError,
}

#[derive(Debug, Default)]
pub struct CalculationReport {
    pub bonuses: Vec<Bonus>,
    /// Requested ids with no matching active partner.
    pub skipped: Vec<i64>,
    pub failures: Vec<PartnerFailure>,
    /// Store failure that stopped the call. The partners before it were
    /// already saved and are listed above.
    pub aborted: Option<BonusError>,
}

impl CalculationReport {
    /// Partners that reached a result, saved or failed.
    pub fn processed(&self) -> usize {
        self.bonuses.len() + self.failures.len()
    }
}

pub struct BonusCalculator<'a, P, S, B> {
    partners: &'a P,
    sales: &'a S,
    bonuses: &'a B,
    fetch: SalesFetch,
}

type SalesByPartner = BTreeMap<i64, Vec<Sale>>;

impl<'a, P, S, B> BonusCalculator<'a, P, S, B>
where
    P: PartnerStore,
    S: SaleStore,
    B: BonusStore,
{
    pub fn new(partners: &'a P, sales: &'a S, bonuses: &'a B) -> Self {
        Self {
            partners,
            sales,
            bonuses,
            fetch: SalesFetch::PerPartner,
        }
    }

    pub fn with_fetch(mut self, fetch: SalesFetch) -> Self {
        self.fetch = fetch;
        self
    }

    /// Calculates and persists one bonus per active partner in `partner_ids`.
    ///
    /// Per-partner problems (bad sale data, a rejected write) are collected in
    /// the report and do not stop the remaining partners. A store failure
    /// before any partner is processed is returned as `Err`. Once saving has
    /// started it ends the call with `report.aborted` set, keeping the bonuses
    /// already written.
    pub fn calculate_for_partners(
        &self,
        partner_ids: &BTreeSet<i64>,
        period: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<CalculationReport, BonusError> {
        let mut report = CalculationReport::default();
        if partner_ids.is_empty() {
            return Ok(report);
        }

        diagnostics.partner_lookups += 1;
        let resolved: BTreeMap<i64, Partner> = self
            .partners
            .find_partners_by_ids(partner_ids)?
            .into_iter()
            .filter(|p| p.active && partner_ids.contains(&p.id))
            .map(|p| (p.id, p))
            .collect();
        diagnostics.partners_loaded += resolved.len() as u64;

        for id in partner_ids {
            if !resolved.contains_key(id) {
                debug!(partner_id = id, period, "no active partner with this id, skipping");
                report.skipped.push(*id);
            }
        }
        diagnostics.partners_skipped += report.skipped.len() as u64;

        let mut batch = match self.fetch {
            SalesFetch::Batch => {
                let ids: BTreeSet<i64> = resolved.keys().copied().collect();
                self.fetch_batch(&ids, diagnostics)?
            }
            SalesFetch::PerPartner => None,
        };

        for partner in resolved.values() {
            match self.process_partner(partner, period, batch.as_mut(), diagnostics) {
                Ok(bonus) => report.bonuses.push(bonus),
                Err(BonusError::Store(err)) => {
                    error!(partner_id = partner.id, period, error = %err, "data store failure, aborting");
                    report.aborted = Some(BonusError::Store(err));
                    break;
                }
                Err(err) => {
                    match &err {
                        BonusError::DataIntegrity { .. } => diagnostics.integrity_failures += 1,
                        BonusError::Persistence { .. } => diagnostics.persistence_failures += 1,
                        BonusError::Store(_) => {}
                    }
                    error!(partner_id = partner.id, period, error = %err, "bonus calculation failed");
                    report.failures.push(PartnerFailure {
                        partner_id: partner.id,
                        error: err,
                    });
                }
            }
        }
        Ok(report)
    }

    fn process_partner(
        &self,
        partner: &Partner,
        period: &str,
        batch: Option<&mut SalesByPartner>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Bonus, BonusError> {
        let sales = match batch {
            Some(grouped) => grouped.remove(&partner.id).unwrap_or_default(),
            None => self.fetch_one(partner.id, diagnostics)?,
        };

        let computation = compute_bonus(&sales, &partner.tier)?;
        diagnostics.sales_ignored += computation.sales.ignored as u64;
        if computation.multiplier.is_fallback() {
            diagnostics.record_unknown_tier(&partner.tier);
            warn!(
                partner_id = partner.id,
                tier = %partner.tier,
                "unrecognized tier, using neutral multiplier"
            );
        }

        let bonus = Bonus::new(partner.id, computation.amount, period);
        self.bonuses.save_bonus(&bonus).map_err(|err| {
            if err.is_fatal() {
                BonusError::Store(err)
            } else {
                BonusError::Persistence {
                    partner_id: partner.id,
                    source: err,
                }
            }
        })?;
        diagnostics.bonuses_written += 1;
        debug!(
            partner_id = partner.id,
            period,
            total = %computation.sales.total,
            amount = %bonus.amount,
            "bonus saved"
        );
        Ok(bonus)
    }

    fn fetch_one(
        &self,
        partner_id: i64,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Sale>, BonusError> {
        diagnostics.single_sales_fetches += 1;
        let sales = self
            .sales
            .find_completed_sales_by_partner_id(partner_id)
            .map_err(|err| match err {
                StoreError::Integrity { .. } => BonusError::DataIntegrity {
                    partner_id,
                    detail: err.to_string(),
                },
                other => BonusError::Store(other),
            })?;
        diagnostics.sales_loaded += sales.len() as u64;
        Ok(sales)
    }

    /// `Ok(None)` means the batch read hit a malformed row and the caller
    /// should load each partner on its own, so the bad row only fails its owner.
    fn fetch_batch(
        &self,
        partner_ids: &BTreeSet<i64>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<SalesByPartner>, BonusError> {
        if partner_ids.is_empty() {
            return Ok(Some(SalesByPartner::new()));
        }
        diagnostics.batch_sales_fetches += 1;
        match self.sales.find_completed_sales_by_partner_ids(partner_ids) {
            Ok(sales) => {
                diagnostics.sales_loaded += sales.len() as u64;
                let mut grouped = SalesByPartner::new();
                for sale in sales {
                    grouped.entry(sale.partner_id).or_default().push(sale);
                }
                Ok(Some(grouped))
            }
            Err(err @ StoreError::Integrity { .. }) => {
                warn!(error = %err, "batch sales fetch failed, falling back to per-partner fetch");
                diagnostics.batch_fetch_fallbacks += 1;
                Ok(None)
            }
            Err(err) => Err(BonusError::Store(err)),
        }
    }
}
