// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use bonusclip::commands::{partners, sales};
use bonusclip::{cli, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &Connection, argv: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("partner", sub)) => partners::handle(conn, sub),
        Some(("sale", sub)) => sales::handle(conn, sub),
        _ => panic!("unexpected subcommand"),
    }
}

fn list_partners(conn: &Connection, all: bool) -> Vec<partners::PartnerRow> {
    let mut argv = vec!["bonusclip", "partner", "list"];
    if all {
        argv.push("--all");
    }
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, partner_m) = matches.subcommand().unwrap();
    let (_, list_m) = partner_m.subcommand().unwrap();
    partners::query_rows(conn, list_m).unwrap()
}

#[test]
fn partners_are_added_with_canonical_tiers() {
    let conn = setup();
    run(&conn, &["bonusclip", "partner", "add", "--name", "Acme", "--tier", " GOLD "]).unwrap();
    run(
        &conn,
        &["bonusclip", "partner", "add", "--name", "Beta", "--tier", "bronze", "--inactive"],
    )
    .unwrap();
    assert!(run(&conn, &["bonusclip", "partner", "add", "--name", "X", "--tier", "tin"]).is_err());

    let active = list_partners(&conn, false);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tier, "gold");
    assert_eq!(list_partners(&conn, true).len(), 2);
}

#[test]
fn set_active_toggles_and_reports_missing() {
    let conn = setup();
    run(&conn, &["bonusclip", "partner", "add", "--name", "Acme", "--tier", "silver"]).unwrap();
    run(&conn, &["bonusclip", "partner", "set-active", "--id", "1", "--active", "false"]).unwrap();
    assert!(list_partners(&conn, false).is_empty());
    let err = run(&conn, &["bonusclip", "partner", "set-active", "--id", "9", "--active", "true"])
        .unwrap_err();
    assert!(err.to_string().contains("Partner 9 not found"));
}

#[test]
fn sales_list_newest_first_with_limit() {
    let conn = setup();
    run(&conn, &["bonusclip", "partner", "add", "--name", "Acme", "--tier", "gold"]).unwrap();
    for (amount, at) in [("10.00", "2026-02-01"), ("-2.50", "2026-02-03"), ("7.00", "2026-02-02")] {
        run(
            &conn,
            &[
                "bonusclip", "sale", "add", "--partner", "1", "--amount", amount, "--product",
                "Widget", "--at", at,
            ],
        )
        .unwrap();
    }
    let bad = run(
        &conn,
        &["bonusclip", "sale", "add", "--partner", "2", "--amount", "1.00", "--product", "W"],
    );
    assert!(bad.is_err());

    let matches = cli::build_cli().get_matches_from([
        "bonusclip", "sale", "list", "--partner", "1", "--limit", "2",
    ]);
    let (_, sale_m) = matches.subcommand().unwrap();
    let (_, list_m) = sale_m.subcommand().unwrap();
    let rows = sales::query_rows(&conn, list_m).unwrap();
    let amounts: Vec<&str> = rows.iter().map(|r| r.amount.as_str()).collect();
    assert_eq!(amounts, vec!["-2.50", "7.00"]);
    assert!(rows.iter().all(|r| r.status == "completed"));
}
