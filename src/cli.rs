// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{ArgAction, Command, arg, value_parser};

fn with_output_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print JSON").action(ArgAction::SetTrue))
        .arg(
            arg!(--jsonl "Print one JSON object per line")
                .action(ArgAction::SetTrue)
                .conflicts_with("json"),
        )
}

fn partner_id_arg() -> clap::Arg {
    arg!(--partner <ID> "Partner id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("bonusclip")
        .about("Partner sales bonus calculator backed by SQLite")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database schema"))
        .subcommand(
            Command::new("partner")
                .about("Manage partners")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME> "Display name").required(true))
                        .arg(arg!(--tier <TIER> "gold|silver|bronze").required(true))
                        .arg(
                            arg!(--inactive "Create the partner as inactive")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(with_output_flags(
                    Command::new("list")
                        .arg(arg!(--all "Include inactive partners").action(ArgAction::SetTrue)),
                ))
                .subcommand(
                    Command::new("set-active")
                        .arg(
                            arg!(--id <ID> "Partner id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(arg!(--active <BOOL> "true|false").required(true)),
                ),
        )
        .subcommand(
            Command::new("sale")
                .about("Record and inspect sales")
                .subcommand(
                    Command::new("add")
                        .arg(partner_id_arg())
                        .arg(
                            arg!(--amount <AMOUNT> "Sale amount, e.g. 120.00")
                                .required(true)
                                .allow_negative_numbers(true),
                        )
                        .arg(arg!(--product <NAME> "Product name").required(true))
                        .arg(arg!(--status <STATUS> "Sale status").default_value("completed"))
                        .arg(arg!(--at <TIMESTAMP> "YYYY-MM-DD[ HH:MM:SS], defaults to now")),
                )
                .subcommand(with_output_flags(
                    Command::new("list").arg(partner_id_arg()).arg(
                        arg!(--limit <N> "Show at most N sales").value_parser(value_parser!(usize)),
                    ),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Load partners or sales from CSV")
                .subcommand(
                    Command::new("partners")
                        .arg(arg!(--path <CSV> "CSV with name,tier[,active]").required(true)),
                )
                .subcommand(Command::new("sales").arg(
                    arg!(--path <CSV> "CSV with partner_id,amount,product_name[,status,created_at]")
                        .required(true),
                )),
        )
        .subcommand(
            Command::new("bonus")
                .about("Calculate and inspect bonuses")
                .subcommand(
                    Command::new("calculate")
                        .arg(arg!(--period <PERIOD> "Period label, e.g. 2026-02").required(true))
                        .arg(
                            arg!(--partner <ID> "Only this partner (repeatable)")
                                .action(ArgAction::Append)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            arg!(--"batch-size" <N> "Partners per engine call")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            arg!(--fetch <MODE> "How sales are loaded")
                                .value_parser(["single", "batch"]),
                        )
                        .arg(
                            arg!(--json "Print the run summary as JSON")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(with_output_flags(
                    Command::new("list")
                        .arg(arg!(--period <PERIOD> "Filter by period"))
                        .arg(
                            arg!(--partner <ID> "Filter by partner")
                                .value_parser(value_parser!(i64)),
                        ),
                )),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("bonuses")
                    .arg(
                        arg!(--format <FORMAT> "csv|json")
                            .default_value("csv")
                            .value_parser(["csv", "json"]),
                    )
                    .arg(arg!(--out <PATH> "Output file").required(true))
                    .arg(arg!(--period <PERIOD> "Only this period")),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("Sales reports")
                .subcommand(with_output_flags(
                    Command::new("top-products").arg(partner_id_arg()).arg(
                        arg!(--limit <N> "Number of products")
                            .default_value("10")
                            .value_parser(value_parser!(usize)),
                    ),
                ))
                .subcommand(with_output_flags(
                    Command::new("sales-total").arg(partner_id_arg()),
                )),
        )
        .subcommand(with_output_flags(
            Command::new("doctor").about("Check stored data for problems"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn calculate_collects_repeated_partners() {
        let m = build_cli().get_matches_from([
            "bonusclip", "bonus", "calculate", "--period", "2026-02", "--partner", "3",
            "--partner", "1", "--batch-size", "5", "--fetch", "single",
        ]);
        let (_, bonus) = m.subcommand().unwrap();
        let (_, calc) = bonus.subcommand().unwrap();
        let ids: Vec<i64> = calc.get_many::<i64>("partner").unwrap().copied().collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(calc.get_one::<usize>("batch-size"), Some(&5));
        assert_eq!(calc.get_one::<String>("fetch").unwrap(), "single");
    }

    #[test]
    fn negative_sale_amounts_parse() {
        let m = build_cli().try_get_matches_from([
            "bonusclip", "sale", "add", "--partner", "1", "--amount", "-5.00", "--product", "X",
        ]);
        assert!(m.is_ok());
    }

    #[test]
    fn unknown_fetch_mode_is_rejected() {
        let m = build_cli().try_get_matches_from([
            "bonusclip", "bonus", "calculate", "--period", "p", "--fetch", "both",
        ]);
        assert!(m.is_err());
    }
}
