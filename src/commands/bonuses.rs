// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::engine::SalesFetch;
use crate::runner::{self, RunOptions, RunSummary};
use crate::store::SqliteStore;
use crate::utils::{maybe_print_json, parse_period, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, ToSql, params_from_iter};
use serde::Serialize;

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("calculate", sub)) => calculate(conn, config, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Environment defaults from `config`, overridden by the flags given.
pub fn run_options(config: &Config, sub: &clap::ArgMatches) -> Result<RunOptions> {
    let period = parse_period(sub.get_one::<String>("period").unwrap())?;
    let mut opts = RunOptions::from_config(&period, config);
    if let Some(ids) = sub.get_many::<i64>("partner") {
        opts.partner_ids = Some(ids.copied().collect());
    }
    if let Some(n) = sub.get_one::<usize>("batch-size") {
        opts.batch_size = (*n).max(1);
    }
    if let Some(mode) = sub.get_one::<String>("fetch") {
        opts.fetch = mode.parse::<SalesFetch>().map_err(|e| anyhow!(e))?;
    }
    Ok(opts)
}

pub fn run_calculation(
    conn: &Connection,
    config: &Config,
    sub: &clap::ArgMatches,
) -> Result<RunSummary> {
    let opts = run_options(config, sub)?;
    let store = SqliteStore::new(conn);
    Ok(runner::run(&store, &store, &store, &opts))
}

fn calculate(conn: &Connection, config: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let summary = run_calculation(conn, config, sub)?;
    if !maybe_print_json(sub.get_flag("json"), false, &summary)? {
        print_summary(&summary);
    }
    if summary.aborted() {
        return Err(anyhow!(
            "Bonus run for period {} aborted after {} of {} partners: {}",
            summary.period,
            summary.processed,
            summary.requested,
            summary.abort_reason.as_deref().unwrap_or("unknown error")
        ));
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let rows = vec![
        vec!["Period".to_string(), summary.period.clone()],
        vec!["Requested".into(), summary.requested.to_string()],
        vec!["Processed".into(), summary.processed.to_string()],
        vec!["Bonuses written".into(), summary.bonuses_written.to_string()],
        vec!["Skipped".into(), summary.skipped.len().to_string()],
        vec!["Failed".into(), summary.failed.to_string()],
        vec!["Status".into(), summary.status.as_str().to_string()],
        vec!["Elapsed".into(), format!("{:.3}s", summary.elapsed_secs)],
    ];
    println!("{}", pretty_table(&["Run", "Value"], rows));

    if !summary.failures.is_empty() {
        let rows = summary
            .failures
            .iter()
            .map(|f| vec![f.partner_id.to_string(), f.error.clone()])
            .collect();
        println!("{}", pretty_table(&["Partner", "Error"], rows));
    }
    let diag = summary.diagnostics.table_rows();
    if !diag.is_empty() {
        println!("{}", pretty_table(&["Counter", "Value"], diag));
    }
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|b| {
                vec![
                    b.period.clone(),
                    b.partner_id.to_string(),
                    b.partner.clone(),
                    b.amount.clone(),
                    b.calculated_at.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Period", "Partner", "Name", "Bonus", "Calculated"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BonusRow {
    pub id: i64,
    pub partner_id: i64,
    pub partner: String,
    pub amount: String,
    pub period: String,
    pub calculated_at: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<BonusRow>> {
    let mut sql = String::from(
        "SELECT b.id, b.partner_id, IFNULL(p.name, ''), b.amount, b.period, b.calculated_at
         FROM bonuses b LEFT JOIN partners p ON p.id = b.partner_id WHERE 1=1",
    );
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(period) = sub.get_one::<String>("period") {
        sql.push_str(" AND b.period=?");
        args.push(Box::new(period.trim().to_string()));
    }
    if let Some(partner_id) = sub.get_one::<i64>("partner") {
        sql.push_str(" AND b.partner_id=?");
        args.push(Box::new(*partner_id));
    }
    sql.push_str(" ORDER BY b.period, b.partner_id, b.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |r| {
        Ok(BonusRow {
            id: r.get(0)?,
            partner_id: r.get(1)?,
            partner: r.get(2)?,
            amount: r.get(3)?,
            period: r.get(4)?,
            calculated_at: r.get(5)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
