// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{TIMESTAMP_FORMAT, Tier};
use crate::store::parse_timestamp;
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s.trim()).with_context(|| format!("Invalid decimal '{}'", s))
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, or a bare date
/// (midnight).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    if let Some(ts) = parse_timestamp(s) {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Invalid timestamp '{}', expected YYYY-MM-DD[ HH:MM:SS]", s))
}

pub fn fmt_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Free-form period labels are allowed, but they must not be blank.
pub fn parse_period(s: &str) -> Result<String> {
    let p = s.trim();
    if p.is_empty() {
        return Err(anyhow!("Period must not be empty"));
    }
    Ok(p.to_string())
}

pub fn parse_tier(s: &str) -> Result<Tier> {
    Tier::from_label(s).ok_or_else(|| anyhow!("Unknown tier '{}' (use gold|silver|bronze)", s))
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(anyhow!("Invalid boolean '{}' (use true|false)", other)),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn ensure_partner(conn: &Connection, id: i64) -> Result<()> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM partners WHERE id=?1", params![id], |r| r.get(0))
        .optional()?;
    found
        .map(|_| ())
        .with_context(|| format!("Partner {} not found", id))
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
