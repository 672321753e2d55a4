// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("bonuses", sub)) => export_bonuses(conn, sub),
        _ => Ok(()),
    }
}

fn export_bonuses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    let period = sub.get_one::<String>("period").map(|p| p.trim().to_string());

    let mut stmt = conn.prepare(
        "SELECT b.period, b.partner_id, IFNULL(p.name, ''), IFNULL(p.tier, ''), b.amount, b.calculated_at
         FROM bonuses b
         LEFT JOIN partners p ON p.id = b.partner_id
         WHERE ?1 IS NULL OR b.period = ?1
         ORDER BY b.period, b.partner_id, b.id",
    )?;
    let rows = stmt.query_map(params![period], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;

    let mut count = 0usize;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "period",
                "partner_id",
                "partner",
                "tier",
                "amount",
                "calculated_at",
            ])?;
            for row in rows {
                let (per, pid, name, tier, amt, at) = row?;
                wtr.write_record([per, pid.to_string(), name, tier, amt, at])?;
                count += 1;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (per, pid, name, tier, amt, at) = row?;
                items.push(json!({
                    "period": per, "partner_id": pid, "partner": name, "tier": tier,
                    "amount": amt, "calculated_at": at
                }));
            }
            count = items.len();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out))?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported {} bonuses to {}", count, out);
    Ok(())
}
