// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Data access for partners, sales and bonuses.
//!
//! The engine only sees the traits; `SqliteStore` borrows the connection that
//! `main` opened, so nothing here owns or caches a handle.

use crate::error::StoreError;
use crate::models::{Bonus, Partner, SALE_STATUS_COMPLETED, Sale, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params, params_from_iter};
use std::collections::BTreeSet;

pub trait PartnerStore {
    /// Active partners, id ascending.
    fn find_active_partners(&self) -> Result<Vec<Partner>, StoreError>;

    /// Partners with the given ids regardless of their active flag. Unknown
    /// ids are omitted; order is unspecified.
    fn find_partners_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<Partner>, StoreError>;
}

pub trait SaleStore {
    /// Completed sales of one partner, newest first.
    fn find_completed_sales_by_partner_id(
        &self,
        partner_id: i64,
    ) -> Result<Vec<Sale>, StoreError>;

    /// Completed sales of several partners, by partner id then newest first.
    fn find_completed_sales_by_partner_ids(
        &self,
        partner_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Sale>, StoreError>;
}

pub trait BonusStore {
    /// Appends one bonus row.
    fn save_bonus(&self, bonus: &Bonus) -> Result<(), StoreError>;
}

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

const PARTNER_COLUMNS: &str = "id, name, tier, active";
const SALE_COLUMNS: &str = "id, partner_id, amount, product_name, status, created_at";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn partner_from_row(r: &Row<'_>) -> rusqlite::Result<Partner> {
    Ok(Partner {
        id: r.get(0)?,
        name: r.get(1)?,
        tier: r.get(2)?,
        active: r.get(3)?,
    })
}

struct SaleRow {
    id: i64,
    partner_id: i64,
    amount: Option<String>,
    product_name: String,
    status: String,
    created_at: String,
}

fn sale_row(r: &Row<'_>) -> rusqlite::Result<SaleRow> {
    Ok(SaleRow {
        id: r.get(0)?,
        partner_id: r.get(1)?,
        amount: r.get(2)?,
        product_name: r.get(3)?,
        status: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

impl SaleRow {
    fn into_sale(self) -> Result<Sale, StoreError> {
        let amount = self.amount.ok_or_else(|| StoreError::Integrity {
            table: "sales",
            id: self.id,
            detail: "amount is missing".into(),
        })?;
        let created_at =
            parse_timestamp(&self.created_at).ok_or_else(|| StoreError::Integrity {
                table: "sales",
                id: self.id,
                detail: format!("invalid created_at '{}'", self.created_at),
            })?;
        Ok(Sale {
            id: self.id,
            partner_id: self.partner_id,
            amount,
            product_name: self.product_name,
            status: self.status,
            created_at,
        })
    }
}

impl SqliteStore<'_> {
    fn query_partners(
        &self,
        sql: &str,
        ids: Option<&BTreeSet<i64>>,
    ) -> Result<Vec<Partner>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match ids {
            Some(ids) => stmt.query_map(params_from_iter(ids.iter()), partner_from_row)?,
            None => stmt.query_map([], partner_from_row)?,
        };
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_sales(&self, sql: &str, ids: &BTreeSet<i64>) -> Result<Vec<Sale>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), sale_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_sale()?);
        }
        Ok(out)
    }
}

impl PartnerStore for SqliteStore<'_> {
    fn find_active_partners(&self) -> Result<Vec<Partner>, StoreError> {
        let sql = format!(
            "SELECT {} FROM partners WHERE active = 1 ORDER BY id",
            PARTNER_COLUMNS
        );
        self.query_partners(&sql, None)
    }

    fn find_partners_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<Partner>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM partners WHERE id IN ({})",
            PARTNER_COLUMNS,
            placeholders(ids.len())
        );
        self.query_partners(&sql, Some(ids))
    }
}

impl SaleStore for SqliteStore<'_> {
    fn find_completed_sales_by_partner_id(
        &self,
        partner_id: i64,
    ) -> Result<Vec<Sale>, StoreError> {
        let sql = format!(
            "SELECT {} FROM sales WHERE partner_id = ?1 AND status = '{}'
             ORDER BY created_at DESC, id DESC",
            SALE_COLUMNS, SALE_STATUS_COMPLETED
        );
        self.query_sales(&sql, &BTreeSet::from([partner_id]))
    }

    fn find_completed_sales_by_partner_ids(
        &self,
        partner_ids: &BTreeSet<i64>,
    ) -> Result<Vec<Sale>, StoreError> {
        if partner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM sales WHERE partner_id IN ({}) AND status = '{}'
             ORDER BY partner_id, created_at DESC, id DESC",
            SALE_COLUMNS,
            placeholders(partner_ids.len()),
            SALE_STATUS_COMPLETED
        );
        self.query_sales(&sql, partner_ids)
    }
}

impl BonusStore for SqliteStore<'_> {
    fn save_bonus(&self, bonus: &Bonus) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO bonuses(partner_id, amount, period, calculated_at) VALUES (?1,?2,?3,?4)",
            params![
                bonus.partner_id,
                bonus.amount_text(),
                bonus.period,
                bonus.calculated_at.format(TIMESTAMP_FORMAT).to_string()
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
    }

    #[test]
    fn timestamps_accept_sqlite_and_iso_forms() {
        assert!(parse_timestamp("2026-02-01 10:00:00").is_some());
        assert!(parse_timestamp("2026-02-01T10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
