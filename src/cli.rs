// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

pub const USER_ENV: &str = "WALLETWISE_USER";

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn allow_negative_arg() -> Arg {
    Arg::new("allow_negative")
        .long("allow-negative")
        .action(ArgAction::SetTrue)
        .help("Allow the wallet balance to go below zero")
}

/// Flag that removes an optional field; conflicts with setting it.
fn clear_flag(id: &'static str, long: &'static str, field: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .action(ArgAction::SetTrue)
        .conflicts_with(field)
}

fn text(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

pub fn build_cli() -> Command {
    Command::new("walletwise")
        .about("Track a cash wallet, expenses, loans, credit cards and recurring income")
        .version(clap::crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env(USER_ENV)
                .help("User the command acts on"),
        )
        .subcommand(
            Command::new("init").about("Initialize database and wallet").arg(
                text("opening_balance")
                    .long("opening-balance")
                    .help("Starting wallet balance"),
            ),
        )
        .subcommand(
            Command::new("wallet")
                .about("Wallet balance and transactions")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .about("Override the balance")
                        .arg(text("balance").required(true))
                        .arg(text("reason").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("history").arg(
                        Arg::new("limit")
                            .long("limit")
                            .default_value("10")
                            .value_parser(value_parser!(usize)),
                    ),
                ))
                .subcommand(
                    Command::new("credit")
                        .about("Record money received")
                        .arg(text("amount").required(true))
                        .arg(text("description").required(true))
                        .arg(text("category").default_value("Income")),
                )
                .subcommand(
                    Command::new("debit")
                        .about("Record money spent")
                        .arg(text("amount").required(true))
                        .arg(text("description").required(true))
                        .arg(text("category").default_value("Other"))
                        .arg(allow_negative_arg()),
                ),
        )
        .subcommand(
            Command::new("expense")
                .about("One-off and recurring expenses")
                .subcommand(
                    Command::new("add")
                        .arg(text("name").required(true))
                        .arg(text("amount").required(true))
                        .arg(text("category").default_value("other"))
                        .arg(text("due").required(true).help("YYYY-MM-DD"))
                        .arg(text("description"))
                        .arg(
                            text("recurring_day")
                                .long("recurring-day")
                                .value_parser(value_parser!(u32)),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("pay").arg(id_arg()).arg(allow_negative_arg()))
                .subcommand(Command::new("unpay").arg(id_arg()))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(text("name"))
                        .arg(text("amount"))
                        .arg(text("category"))
                        .arg(text("due"))
                        .arg(text("description"))
                        .arg(clear_flag("clear_description", "clear-description", "description"))
                        .arg(
                            text("recurring_day")
                                .long("recurring-day")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(clear_flag("one_off", "one-off", "recurring_day")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("loan")
                .about("Loans and their payments")
                .subcommand(
                    Command::new("add")
                        .arg(text("name").required(true))
                        .arg(text("lender").required(true))
                        .arg(text("principal").required(true))
                        .arg(
                            text("monthly_payment")
                                .long("monthly-payment")
                                .required(true),
                        )
                        .arg(
                            text("due_day")
                                .long("due-day")
                                .required(true)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(text("rate").help("Annual interest rate in percent"))
                        .arg(text("start").help("YYYY-MM-DD, defaults to today")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("pay")
                        .arg(id_arg())
                        .arg(text("amount").required(true))
                        .arg(allow_negative_arg()),
                )
                .subcommand(json_flags(Command::new("history").arg(id_arg())))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(text("name"))
                        .arg(text("lender"))
                        .arg(text("rate"))
                        .arg(text("monthly_payment").long("monthly-payment"))
                        .arg(
                            text("due_day")
                                .long("due-day")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(
                            Arg::new("close")
                                .long("close")
                                .action(ArgAction::SetTrue)
                                .help("Mark the loan inactive"),
                        ),
                ),
        )
        .subcommand(
            Command::new("card")
                .about("Credit cards and statement payments")
                .subcommand(
                    Command::new("add")
                        .arg(text("name").required(true))
                        .arg(text("balance").required(true))
                        .arg(text("due").required(true).help("YYYY-MM-DD"))
                        .arg(text("minimum"))
                        .arg(
                            Arg::new("allow_overpayment")
                                .long("allow-overpayment")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("pay")
                        .arg(id_arg())
                        .arg(text("amount").required(true))
                        .arg(allow_negative_arg()),
                )
                .subcommand(
                    Command::new("statement")
                        .about("Start a new statement cycle")
                        .arg(id_arg())
                        .arg(text("balance").required(true))
                        .arg(text("due").required(true).help("YYYY-MM-DD")),
                )
                .subcommand(
                    Command::new("due").arg(id_arg()).arg(
                        text("day")
                            .required(true)
                            .value_parser(value_parser!(u32)),
                    ),
                )
                .subcommand(json_flags(Command::new("history").arg(id_arg()))),
        )
        .subcommand(
            Command::new("income")
                .about("Recurring income")
                .subcommand(
                    Command::new("add")
                        .arg(text("name").required(true))
                        .arg(text("amount").required(true))
                        .arg(
                            text("schedule")
                                .required(true)
                                .help("weekly:<0-6>, biweekly:<0-6>, monthly:<1-31> or 'every <n> days|weeks|months'"),
                        )
                        .arg(text("start").required(true).help("YYYY-MM-DD"))
                        .arg(text("end").help("YYYY-MM-DD"))
                        .arg(text("category"))
                        .arg(text("description")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(text("name"))
                        .arg(text("amount"))
                        .arg(text("schedule"))
                        .arg(text("start"))
                        .arg(text("end"))
                        .arg(text("category"))
                        .arg(text("description"))
                        .arg(clear_flag("clear_description", "clear-description", "description"))
                        .arg(clear_flag("clear_end", "clear-end", "end"))
                        .arg(
                            Arg::new("pause")
                                .long("pause")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("resume"),
                        )
                        .arg(Arg::new("resume").long("resume").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_flags(
                    Command::new("process")
                        .about("Credit incomes that are due")
                        .arg(text("as_of").long("as-of").help("YYYY-MM-DD, defaults to now")),
                )),
        )
        .subcommand(
            Command::new("prefs")
                .about("Per-user preferences")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(
                            text("allow_negative")
                                .long("allow-negative")
                                .value_parser(value_parser!(bool)),
                        )
                        .arg(
                            text("card_overpayment")
                                .long("card-overpayment")
                                .value_parser(["allow", "cap"]),
                        ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(
                            text("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(text("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check wallet and ledger consistency"))
}
