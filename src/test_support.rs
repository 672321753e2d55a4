// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StoreError;
use crate::models::{Bonus, Partner, Sale};
use crate::store::{BonusStore, PartnerStore, SaleStore};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};

pub fn partner(id: i64, tier: &str) -> Partner {
    Partner {
        id,
        name: format!("P{}", id),
        tier: tier.to_string(),
        active: true,
    }
}

pub fn sale(id: i64, partner_id: i64, amount: &str, status: &str) -> Sale {
    Sale {
        id,
        partner_id,
        amount: amount.to_string(),
        product_name: format!("SKU-{}", id),
        status: status.to_string(),
        created_at: NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(id),
    }
}

/// Vec-backed store. Sale lookups return every status so callers have to
/// filter for themselves.
#[derive(Default)]
pub struct MemoryStore {
    partners: Vec<Partner>,
    sales: Vec<Sale>,
    saved: RefCell<Vec<Bonus>>,
    single_calls: Cell<usize>,
    batch_calls: Cell<usize>,
    active_calls: Cell<usize>,
    corrupt_sales_for: HashSet<i64>,
    rejected_save_for: HashSet<i64>,
    unavailable_save_for: HashSet<i64>,
    unavailable_reads: bool,
}

impl MemoryStore {
    pub fn new(partners: Vec<Partner>, sales: Vec<Sale>) -> Self {
        Self {
            partners,
            sales,
            ..Default::default()
        }
    }

    pub fn with_corrupt_sales_for(mut self, partner_id: i64) -> Self {
        self.corrupt_sales_for.insert(partner_id);
        self
    }

    pub fn with_rejected_save_for(mut self, partner_id: i64) -> Self {
        self.rejected_save_for.insert(partner_id);
        self
    }

    pub fn with_unavailable_save_for(mut self, partner_id: i64) -> Self {
        self.unavailable_save_for.insert(partner_id);
        self
    }

    pub fn with_unavailable_reads(mut self) -> Self {
        self.unavailable_reads = true;
        self
    }

    pub fn saved(&self) -> Vec<Bonus> {
        self.saved.borrow().clone()
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.get()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.get()
    }

    pub fn active_calls(&self) -> usize {
        self.active_calls.get()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.unavailable_reads {
            return Err(StoreError::Unavailable("database is locked out".into()));
        }
        Ok(())
    }

    fn corrupt(partner_id: i64) -> StoreError {
        StoreError::Integrity {
            table: "sales",
            id: partner_id * 1000,
            detail: "invalid created_at 'soon'".into(),
        }
    }
}

impl PartnerStore for MemoryStore {
    fn find_active_partners(&self) -> Result<Vec<Partner>, StoreError> {
        self.active_calls.set(self.active_calls.get() + 1);
        self.check_reads()?;
        let mut out: Vec<Partner> = self
            .partners
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.id);
        Ok(out)
    }

    fn find_partners_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<Partner>, StoreError> {
        self.check_reads()?;
        Ok(self
            .partners
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

impl SaleStore for MemoryStore {
    fn find_completed_sales_by_partner_id(
        &self,
        partner_id: i64,
    ) -> Result<Vec<Sale>, StoreError> {
        self.single_calls.set(self.single_calls.get() + 1);
        self.check_reads()?;
        if self.corrupt_sales_for.contains(&partner_id) {
            return Err(Self::corrupt(partner_id));
        }
        Ok(self
            .sales
            .iter()
            .filter(|s| s.partner_id == partner_id)
            .cloned()
            .collect())
    }

    fn find_completed_sales_by_partner_ids(
        &self,
        partner_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Sale>, StoreError> {
        self.batch_calls.set(self.batch_calls.get() + 1);
        self.check_reads()?;
        if let Some(id) = partner_ids.iter().find(|id| self.corrupt_sales_for.contains(*id)) {
            return Err(Self::corrupt(*id));
        }
        Ok(self
            .sales
            .iter()
            .filter(|s| partner_ids.contains(&s.partner_id))
            .cloned()
            .collect())
    }
}

impl BonusStore for MemoryStore {
    fn save_bonus(&self, bonus: &Bonus) -> Result<(), StoreError> {
        if self.unavailable_save_for.contains(&bonus.partner_id) {
            return Err(StoreError::Unavailable("disk I/O error".into()));
        }
        if self.rejected_save_for.contains(&bonus.partner_id) {
            return Err(StoreError::Query("CHECK constraint failed: bonuses".into()));
        }
        self.saved.borrow_mut().push(bonus.clone());
        Ok(())
    }
}
