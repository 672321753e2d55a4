// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, parse_bool, parse_tier, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-active", sub)) => set_active(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    if name.is_empty() {
        return Err(anyhow!("Partner name must not be empty"));
    }
    let tier = parse_tier(sub.get_one::<String>("tier").unwrap())?;
    let active = !sub.get_flag("inactive");
    conn.execute(
        "INSERT INTO partners(name, tier, active) VALUES (?1, ?2, ?3)",
        params![name, tier.as_str(), active],
    )?;
    println!(
        "Added partner #{} '{}' ({}{})",
        conn.last_insert_rowid(),
        name,
        tier,
        if active { "" } else { ", inactive" }
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    p.tier.clone(),
                    if p.active { "yes" } else { "no" }.to_string(),
                    p.created_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Tier", "Active", "Created"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PartnerRow {
    pub id: i64,
    pub name: String,
    pub tier: String,
    pub active: bool,
    pub created_at: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<PartnerRow>> {
    let sql = if sub.get_flag("all") {
        "SELECT id, name, tier, active, created_at FROM partners ORDER BY id"
    } else {
        "SELECT id, name, tier, active, created_at FROM partners WHERE active = 1 ORDER BY id"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| {
        Ok(PartnerRow {
            id: r.get(0)?,
            name: r.get(1)?,
            tier: r.get(2)?,
            active: r.get(3)?,
            created_at: r.get(4)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let active = parse_bool(sub.get_one::<String>("active").unwrap())?;
    let changed = conn.execute(
        "UPDATE partners SET active=?1 WHERE id=?2",
        params![active, id],
    )?;
    if changed == 0 {
        return Err(anyhow!("Partner {} not found", id));
    }
    println!(
        "Partner #{} is now {}",
        id,
        if active { "active" } else { "inactive" }
    );
    Ok(())
}
