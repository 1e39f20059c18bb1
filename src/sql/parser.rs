//! Statement parsing.
//!
//! Two statements exist: `insert <id> <username> <email>` and `select`.
//! The parser owns every row-validity rule, so invalid ids or oversized
//! strings never reach the storage engine.

use super::statement::Statement;
use super::tokenizer;
use crate::storage::row::{Row, COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};
use std::collections::VecDeque;
use std::fmt;

/// User-facing parse failures. These are recoverable: the REPL reports
/// them and keeps the session running.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    NegativeId,
    StringTooLong,
    SyntaxError,
    Unrecognized(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NegativeId => write!(f, "ID must be positive."),
            ParseError::StringTooLong => write!(f, "String is too long."),
            ParseError::SyntaxError => write!(f, "Syntax error. Could not parse statement."),
            ParseError::Unrecognized(input) => {
                write!(f, "Unrecognized keyword at start of '{}'.", input)
            }
        }
    }
}

pub fn parse(input: &str) -> Result<Statement, ParseError> {
    let mut tokens = tokenizer::tokenize(input);

    let keyword = match tokens.pop_front() {
        Some(keyword) => keyword,
        None => return Err(ParseError::Unrecognized(input.to_string())),
    };
    match keyword.as_str() {
        "insert" => parse_insert(&mut tokens),
        // A bare `select` only; anything trailing makes it a different
        // statement this grammar does not know.
        "select" if tokens.is_empty() => Ok(Statement::Select),
        _ => Err(ParseError::Unrecognized(input.to_string())),
    }
}

fn parse_insert(tokens: &mut VecDeque<String>) -> Result<Statement, ParseError> {
    let id_string = tokens.pop_front().ok_or(ParseError::SyntaxError)?;
    let username = tokens.pop_front().ok_or(ParseError::SyntaxError)?;
    let email = tokens.pop_front().ok_or(ParseError::SyntaxError)?;

    let id: i64 = id_string.parse().map_err(|_| ParseError::SyntaxError)?;
    if id < 0 {
        return Err(ParseError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| ParseError::SyntaxError)?;

    if username.len() > COLUMN_USERNAME_SIZE {
        return Err(ParseError::StringTooLong);
    }
    if email.len() > COLUMN_EMAIL_SIZE {
        return Err(ParseError::StringTooLong);
    }

    Ok(Statement::Insert(Row::new(id, &username, &email)))
}
