// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{SALE_STATUS_COMPLETED, Tier};
use crate::utils::{fmt_timestamp, parse_bool, parse_datetime, parse_decimal};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use csv::ReaderBuilder;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{HashMap, hash_map::Entry};
use tracing::{info, warn};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("partners", sub)) => import_partners(conn, sub),
        Some(("sales", sub)) => import_sales(conn, sub),
        _ => Ok(()),
    }
}

fn reader(path: &str) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))
}

fn optional(rec: &csv::StringRecord, idx: usize) -> Option<&str> {
    rec.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// `name,tier[,active]`. Tier labels are stored as given so that `doctor`
/// can report the ones no multiplier exists for.
fn import_partners(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = reader(path)?;

    let tx = conn.transaction()?;
    let mut count = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = line + 2;
        let name = optional(&rec, 0).with_context(|| format!("row {}: name missing", row))?;
        let tier = rec.get(1).unwrap_or("").trim();
        let active = match optional(&rec, 2) {
            Some(raw) => parse_bool(raw).with_context(|| format!("row {}: active", row))?,
            None => true,
        };
        if Tier::from_label(tier).is_none() {
            warn!(row, partner = name, tier, "partner imported with unrecognized tier");
        }
        tx.execute(
            "INSERT INTO partners(name, tier, active) VALUES (?1, ?2, ?3)",
            params![name, tier, active],
        )?;
        count += 1;
    }
    tx.commit()?;
    info!(path, count, "partners imported");
    println!("Imported {} partners from {}", count, path);
    Ok(())
}

/// `partner_id,amount,product_name[,status,created_at]`. Any bad row rolls
/// back the whole file.
fn import_sales(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = reader(path)?;

    let tx = conn.transaction()?;
    let mut known_partners: HashMap<i64, bool> = HashMap::new();
    let now = Utc::now().naive_utc();
    let mut count = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = line + 2;
        let partner_raw =
            optional(&rec, 0).with_context(|| format!("row {}: partner_id missing", row))?;
        let partner_id: i64 = partner_raw
            .parse()
            .with_context(|| format!("row {}: invalid partner_id '{}'", row, partner_raw))?;
        let amount_raw =
            optional(&rec, 1).with_context(|| format!("row {}: amount missing", row))?;
        let amount = parse_decimal(amount_raw)
            .with_context(|| format!("row {}: invalid amount for partner {}", row, partner_id))?;
        let product =
            optional(&rec, 2).with_context(|| format!("row {}: product_name missing", row))?;
        let status = optional(&rec, 3)
            .map(str::to_lowercase)
            .unwrap_or_else(|| SALE_STATUS_COMPLETED.to_string());
        let created_at = match optional(&rec, 4) {
            Some(raw) => parse_datetime(raw).with_context(|| format!("row {}", row))?,
            None => now,
        };

        let exists = match known_partners.entry(partner_id) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let found: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM partners WHERE id=?1",
                        params![partner_id],
                        |r| r.get(0),
                    )
                    .optional()?;
                *entry.insert(found.is_some())
            }
        };
        if !exists {
            return Err(anyhow!("row {}: partner {} not found", row, partner_id));
        }

        tx.execute(
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
        count += 1;
    }
    tx.commit()?;
    info!(path, count, "sales imported");
    println!("Imported {} sales from {}", count, path);
    Ok(())
}
