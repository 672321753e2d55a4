// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    ensure_partner, fmt_timestamp, maybe_print_json, parse_datetime, parse_decimal, pretty_table,
};
use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let partner_id = *sub.get_one::<i64>("partner").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let product = sub.get_one::<String>("product").unwrap().trim();
    if product.is_empty() {
        return Err(anyhow!("Product name must not be empty"));
    }
    let status = sub.get_one::<String>("status").unwrap().trim().to_lowercase();
    let created_at = match sub.get_one::<String>("at") {
        Some(at) => parse_datetime(at)?,
        None => Utc::now().naive_utc(),
    };

    ensure_partner(conn, partner_id)?;
    conn.execute(
        "INSERT INTO sales(partner_id, amount, product_name, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            partner_id,
            amount.to_string(),
            product,
            status,
            fmt_timestamp(&created_at)
        ],
    )?;
    println!(
        "Recorded {} sale of '{}' for {} (partner #{})",
        status, product, amount, partner_id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.created_at.clone(),
                    s.product_name.clone(),
                    s.amount.clone(),
                    s.status.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "When", "Product", "Amount", "Status"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SaleRow {
    pub id: i64,
    pub partner_id: i64,
    pub amount: String,
    pub product_name: String,
    pub status: String,
    pub created_at: String,
}

/// Sales of one partner in any status, newest first.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<SaleRow>> {
    let partner_id = *sub.get_one::<i64>("partner").unwrap();
    let limit = sub
        .get_one::<usize>("limit")
        .map(|n| *n as i64)
        .unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, partner_id, amount, product_name, status, created_at
         FROM sales WHERE partner_id=?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![partner_id, limit], |r| {
        Ok(SaleRow {
            id: r.get(0)?,
            partner_id: r.get(1)?,
            amount: r.get(2)?,
            product_name: r.get(3)?,
            status: r.get(4)?,
            created_at: r.get(5)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
