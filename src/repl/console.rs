//! The interactive console: a line-oriented prompt in front of the
//! engine. Meta commands start with a dot and are handled here; anything
//! else goes through the SQL front end.

use super::history;
use crate::command::{self, SqlResult};
use crate::errors::Error;
use crate::sql::parser;
use crate::storage::btree::constants_report;
use crate::storage::table::{tree_report, ExecuteResult, Table};
use crossterm::style::{Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{style, ExecutableCommand};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};
use uuid::Uuid;

const NAME: &str = env!("CARGO_PKG_NAME");

static HISTORY_FILE: Lazy<PathBuf> = Lazy::new(|| history::get_home_file(".rustlite_history"));

enum MetaCommandResult {
    Success,
    Exit,
    Unrecognized,
}

/// Runs the prompt loop until `.exit` or end of input. Recoverable
/// problems are echoed and the loop continues; an engine error ends the
/// session and propagates to the caller.
pub fn start(table: &mut Table) -> Result<(), Error> {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "Starting REPL session...");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print_prompt()?;

        line.clear();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            info!("End of input. Closing session.");
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Err(e) = history::append_history(input, &HISTORY_FILE) {
            debug!("Failed to append history: {}", e);
        }

        if input.starts_with('.') {
            match do_meta_command(input, table)? {
                MetaCommandResult::Success => continue,
                MetaCommandResult::Exit => break,
                MetaCommandResult::Unrecognized => {
                    echo(&format!("Unrecognized command '{}'\n", input));
                    continue;
                }
            }
        }

        let statement = match parser::parse(input) {
            Ok(statement) => statement,
            Err(e) => {
                echo_error(&format!("{}\n", e));
                continue;
            }
        };

        match command::execute(table, statement) {
            Ok(SqlResult::Executed(ExecuteResult::Success)) => echo("Executed.\n"),
            Ok(SqlResult::Executed(ExecuteResult::DuplicateKey)) => {
                echo_error("Error: Duplicate key.\n")
            }
            Ok(SqlResult::Executed(ExecuteResult::TableFull)) => echo_error("Error: Table full.\n"),
            Ok(SqlResult::Rows(rows)) => {
                for row in &rows {
                    echo(&format!("{}\n", row));
                }
                echo("Executed.\n");
            }
            Err(e) => {
                error!("Statement failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

fn do_meta_command(input: &str, table: &mut Table) -> Result<MetaCommandResult, Error> {
    match input {
        ".exit" => Ok(MetaCommandResult::Exit),
        ".btree" => {
            echo("Tree:\n");
            echo(&tree_report(table)?);
            Ok(MetaCommandResult::Success)
        }
        ".constants" => {
            echo("Constants:\n");
            echo(&constants_report());
            Ok(MetaCommandResult::Success)
        }
        _ => Ok(MetaCommandResult::Unrecognized),
    }
}

fn print_prompt() -> io::Result<()> {
    io::stdout()
        .execute(SetAttribute(style::Attribute::Bold))?
        .execute(Print(format!("{}> ", NAME)))?
        .execute(SetAttribute(style::Attribute::Reset))?;
    io::stdout().flush()?;
    Ok(())
}

pub fn echo(s: &str) {
    let _ = io::stdout().execute(Print(s));
    let _ = io::stdout().flush();
}

pub fn echo_error(s: &str) {
    let _ = io::stdout()
        .execute(SetForegroundColor(Color::Red))
        .and_then(|stdout| stdout.execute(Print(s)))
        .and_then(|stdout| stdout.execute(ResetColor));
    let _ = io::stdout().flush();
}
