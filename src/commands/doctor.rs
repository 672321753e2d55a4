// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Tier;
use crate::store::parse_timestamp;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

pub fn find_issues(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Sale rows the aggregator would reject
    let mut stmt = conn.prepare("SELECT id, partner_id, amount, created_at FROM sales ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let partner_id: i64 = r.get(1)?;
        let amount: Option<String> = r.get(2)?;
        let created_at: String = r.get(3)?;
        let amount_ok = amount
            .as_deref()
            .is_some_and(|a| Decimal::from_str_exact(a.trim()).is_ok());
        if !amount_ok {
            issues.push(issue(
                "malformed_sale_amount",
                format!(
                    "sale {} (partner {}): '{}'",
                    id,
                    partner_id,
                    amount.unwrap_or_default()
                ),
            ));
        }
        if parse_timestamp(&created_at).is_none() {
            issues.push(issue(
                "malformed_sale_timestamp",
                format!("sale {} (partner {}): '{}'", id, partner_id, created_at),
            ));
        }
    }

    // 2) Tiers that fall back to the neutral multiplier
    let mut stmt = conn.prepare("SELECT id, name, tier FROM partners ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let tier: String = r.get(2)?;
        if Tier::from_label(&tier).is_none() {
            issues.push(issue(
                "unknown_tier",
                format!("partner {} '{}': '{}'", id, name, tier),
            ));
        }
    }

    // 3) Re-runs of the same period
    let mut stmt = conn.prepare(
        "SELECT partner_id, period, COUNT(*) FROM bonuses
         GROUP BY partner_id, period HAVING COUNT(*) > 1
         ORDER BY period, partner_id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let partner_id: i64 = r.get(0)?;
        let period: String = r.get(1)?;
        let n: i64 = r.get(2)?;
        issues.push(issue(
            "duplicate_bonus",
            format!("partner {} period {}: {} rows", partner_id, period, n),
        ));
    }

    Ok(issues)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let issues = find_issues(conn)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
