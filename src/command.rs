//! Statement execution: the thin bridge between parsed statements and
//! the storage engine.

use crate::errors::Error;
use crate::sql::statement::Statement;
use crate::storage::{insert_row, select_rows, ExecuteResult, Row, Table};
use tracing::trace;

/// What a statement produced.
pub enum SqlResult {
    /// An insert ran; the engine's verdict is inside.
    Executed(ExecuteResult),
    /// A select ran and produced these rows, in key order.
    Rows(Vec<Row>),
}

/// Executes a statement against the table. Recoverable outcomes come
/// back as `SqlResult`; an `Err` is the fatal band and ends the session.
pub fn execute(table: &mut Table, statement: Statement) -> Result<SqlResult, Error> {
    match statement {
        Statement::Insert(row) => {
            trace!(key = row.id, "Executing insert.");
            Ok(SqlResult::Executed(insert_row(table, &row)?))
        }
        Statement::Select => {
            trace!("Executing select.");
            Ok(SqlResult::Rows(select_rows(table)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser;

    #[test]
    fn test_execute_insert_then_select() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        let statement = parser::parse("insert 1 user1 u1@example.com").unwrap();
        match execute(&mut table, statement).unwrap() {
            SqlResult::Executed(result) => assert_eq!(result, ExecuteResult::Success),
            SqlResult::Rows(_) => panic!("insert produced rows"),
        }

        let statement = parser::parse("select").unwrap();
        match execute(&mut table, statement).unwrap() {
            SqlResult::Rows(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].to_string(), "(1, user1, u1@example.com)");
            }
            SqlResult::Executed(_) => panic!("select produced no rows"),
        }
    }

    #[test]
    fn test_execute_reports_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        for _ in 0..2 {
            let statement = parser::parse("insert 7 user7 u7@example.com").unwrap();
            let result = execute(&mut table, statement).unwrap();
            match result {
                SqlResult::Executed(r) => {
                    assert!(matches!(r, ExecuteResult::Success | ExecuteResult::DuplicateKey))
                }
                SqlResult::Rows(_) => panic!("insert produced rows"),
            }
        }

        let statement = parser::parse("insert 7 again u7@example.com").unwrap();
        match execute(&mut table, statement).unwrap() {
            SqlResult::Executed(result) => assert_eq!(result, ExecuteResult::DuplicateKey),
            SqlResult::Rows(_) => panic!("insert produced rows"),
        }
    }
}
