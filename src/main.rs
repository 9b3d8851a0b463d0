// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use walletwise::{Error, Session, cli, commands, db};

fn run() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    let session = matches
        .get_one::<String>("user")
        .map(Session::new)
        .unwrap_or_default();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            println!("Database initialized at {}", db::db_path()?.display());
            commands::wallet::init(&mut conn, &session, sub)?;
        }
        Some(("wallet", sub)) => commands::wallet::handle(&mut conn, &session, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&mut conn, &session, sub)?,
        Some(("loan", sub)) => commands::loans::handle(&mut conn, &session, sub)?,
        Some(("card", sub)) => commands::cards::handle(&mut conn, &session, sub)?,
        Some(("income", sub)) => commands::income::handle(&mut conn, &session, sub)?,
        Some(("prefs", sub)) => commands::prefs::handle(&conn, &session, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, &session, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    walletwise::init_tracing();
    let result = run();
    if let Err(err) = &result {
        match err.downcast_ref::<Error>() {
            Some(Error::InsufficientFunds { .. }) => {
                eprintln!("hint: pass --allow-negative or `prefs set --allow-negative true`");
            }
            Some(Error::Unauthenticated) => {
                eprintln!("hint: pass --user <id> or set {}", cli::USER_ENV);
            }
            _ => {}
        }
    }
    result
}
