// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::SALE_STATUS_COMPLETED;
use crate::policy::{SalesTotal, aggregate_completed};
use crate::store::{SaleStore, SqliteStore};
use crate::utils::{ensure_partner, maybe_print_json, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("top-products", sub)) => top_products_cmd(conn, sub)?,
        Some(("sales-total", sub)) => sales_total_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTotal {
    pub product_name: String,
    pub sales: usize,
    pub total: Decimal,
}

/// Completed-sale totals per product for one partner, largest first.
pub fn top_products(conn: &Connection, partner_id: i64, limit: usize) -> Result<Vec<ProductTotal>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_name, amount FROM sales WHERE partner_id=?1 AND status=?2",
    )?;
    let mut cur = stmt.query(params![partner_id, SALE_STATUS_COMPLETED])?;
    let mut by_product: HashMap<String, (usize, Decimal)> = HashMap::new();
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let product: String = r.get(1)?;
        let raw: String = r.get(2)?;
        let amount = Decimal::from_str_exact(raw.trim())
            .with_context(|| format!("sale {} has invalid amount '{}'", id, raw))?;
        let entry = by_product.entry(product).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry
            .1
            .checked_add(amount)
            .ok_or_else(|| anyhow!("sales total overflows at sale {}", id))?;
    }

    let mut out: Vec<ProductTotal> = by_product
        .into_iter()
        .map(|(product_name, (sales, total))| ProductTotal {
            product_name,
            sales,
            total,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    out.truncate(limit);
    Ok(out)
}

pub fn sales_total(conn: &Connection, partner_id: i64) -> Result<SalesTotal> {
    ensure_partner(conn, partner_id)?;
    let sales = SqliteStore::new(conn).find_completed_sales_by_partner_id(partner_id)?;
    Ok(aggregate_completed(&sales)?)
}

fn top_products_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let partner_id = *sub.get_one::<i64>("partner").unwrap();
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&10);
    ensure_partner(conn, partner_id)?;
    let data = top_products(conn, partner_id, limit)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| {
                vec![
                    p.product_name.clone(),
                    p.sales.to_string(),
                    format!("{:.2}", p.total),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Product", "Sales", "Total"], rows));
    }
    Ok(())
}

fn sales_total_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let partner_id = *sub.get_one::<i64>("partner").unwrap();
    let totals = sales_total(conn, partner_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        println!(
            "Partner #{}: {} completed sales totalling {:.2}",
            partner_id, totals.completed, totals.total
        );
    }
    Ok(())
}
