// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::ArgMatches;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tempfile::tempdir;
use walletwise::commands::{doctor, exporter, prefs, wallet as wallet_cmd};
use walletwise::config::{OverpaymentPolicy, Preferences};
use walletwise::ledger::{self, wallet};
use walletwise::{Session, cli, db};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> (Connection, Session) {
    let mut conn = db::open_in_memory().unwrap();
    let s = Session::new("alice");
    wallet::create_wallet(&mut conn, &s, dec("100")).unwrap();
    (conn, s)
}

fn sub<'a>(matches: &'a ArgMatches, name: &str) -> &'a ArgMatches {
    match matches.subcommand() {
        Some((n, m)) if n == name => m,
        _ => panic!("no {} subcommand", name),
    }
}

#[test]
fn user_flag_is_global() {
    let matches = cli::build_cli().get_matches_from(["walletwise", "wallet", "show", "--user", "bob"]);
    assert_eq!(
        matches.get_one::<String>("user").map(String::as_str),
        Some("bob")
    );
}

#[test]
fn debit_uses_stored_negative_preference() {
    let (mut conn, s) = setup();
    let debit = ["walletwise", "wallet", "debit", "--amount", "150", "--description", "TV"];

    let matches = cli::build_cli().get_matches_from(debit);
    let err = wallet_cmd::handle(&mut conn, &s, sub(&matches, "wallet")).unwrap_err();
    assert!(
        err.downcast_ref::<walletwise::Error>()
            .is_some_and(|e| e.is_insufficient_funds())
    );

    let matches =
        cli::build_cli().get_matches_from(["walletwise", "prefs", "set", "--allow-negative", "true"]);
    prefs::handle(&conn, &s, sub(&matches, "prefs")).unwrap();
    assert!(Preferences::load(&conn, &s).unwrap().allow_negative_balance);

    let matches = cli::build_cli().get_matches_from(debit);
    wallet_cmd::handle(&mut conn, &s, sub(&matches, "wallet")).unwrap();
    assert_eq!(
        wallet::get_wallet(&conn, &s).unwrap().unwrap().current_balance,
        dec("-50")
    );
}

#[test]
fn allow_negative_flag_overrides_default() {
    let (mut conn, s) = setup();
    let matches = cli::build_cli().get_matches_from([
        "walletwise",
        "wallet",
        "debit",
        "--amount",
        "150",
        "--description",
        "TV",
        "--allow-negative",
    ]);
    wallet_cmd::handle(&mut conn, &s, sub(&matches, "wallet")).unwrap();
    assert_eq!(
        ledger::recent_transactions(&conn, &s, 1).unwrap()[0].balance_after,
        dec("-50")
    );
}

#[test]
fn prefs_round_trip() {
    let (conn, s) = setup();
    assert_eq!(Preferences::load(&conn, &s).unwrap(), Preferences::default());
    let matches = cli::build_cli().get_matches_from([
        "walletwise",
        "prefs",
        "set",
        "--card-overpayment",
        "allow",
    ]);
    prefs::handle(&conn, &s, sub(&matches, "prefs")).unwrap();
    let loaded = Preferences::load(&conn, &s).unwrap();
    assert_eq!(loaded.card_overpayment, OverpaymentPolicy::Allow);
    assert!(!loaded.allow_negative_balance);
    // other users keep defaults
    assert_eq!(
        Preferences::load(&conn, &Session::new("bob")).unwrap(),
        Preferences::default()
    );
}

#[test]
fn export_transactions_csv() {
    let (mut conn, s) = setup();
    ledger::set_balance(&mut conn, &s, dec("80"), "recount").unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "walletwise",
        "export",
        "transactions",
        "--format",
        "csv",
        "--out",
        &out_str,
    ]);
    exporter::handle(&conn, &s, sub(&matches, "export")).unwrap();

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "date");
    assert_eq!(&headers[5], "balance_after");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "adjustment");
    assert_eq!(&rows[0][5], "100");
    assert_eq!(&rows[1][1], "expense");
    assert_eq!(&rows[1][3], "Manual balance adjustment: recount");
    assert_eq!(&rows[1][5], "80");
}

#[test]
fn export_transactions_json_only_has_callers_rows() {
    let (mut conn, s) = setup();
    let bob = Session::new("bob");
    ledger::set_balance(&mut conn, &bob, dec("5"), "bob").unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "walletwise",
        "export",
        "transactions",
        "--format",
        "json",
        "--out",
        &out_str,
    ]);
    exporter::handle(&conn, &s, sub(&matches, "export")).unwrap();

    let text = std::fs::read_to_string(&out_path).unwrap();
    let items: serde_json::Value = serde_json::from_str(&text).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Opening balance");
    assert_eq!(items[0]["balance_after"], "100");
}

#[test]
fn doctor_is_clean_after_normal_use() {
    let (mut conn, s) = setup();
    ledger::set_balance(&mut conn, &s, dec("70"), "x").unwrap();
    assert!(doctor::find_issues(&conn).unwrap().is_empty());
}

#[test]
fn doctor_flags_wallet_drift() {
    let (conn, _s) = setup();
    conn.execute(
        "UPDATE wallets SET current_balance='42' WHERE user_id='alice'",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO transactions(user_id, date, amount, kind, category, description, balance_after)
         VALUES ('ghost', '2025-01-01T00:00:00.000000Z', '1', 'income', 'x', 'x', '1')",
        [],
    )
    .unwrap();
    let kinds: Vec<String> = doctor::find_issues(&conn)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert!(kinds.contains(&"wallet_log_mismatch".to_string()));
    assert!(kinds.contains(&"txn_without_wallet".to_string()));
}
