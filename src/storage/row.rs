//! # Row Management
//!
//! A row is a fixed-width record: a `u32` primary key followed by two
//! bounded string columns. Rows are stored serialized inside leaf node
//! cells, so the byte layout here is part of the database file format.
//! Integer fields are little-endian.

use std::borrow::Cow;
use std::fmt;

/// Maximum payload length of the `username` column.
pub const COLUMN_USERNAME_SIZE: usize = 32;
/// Maximum payload length of the `email` column.
pub const COLUMN_EMAIL_SIZE: usize = 255;

/// On-disk width of the `username` field (payload plus NUL terminator).
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
/// On-disk width of the `email` field (payload plus NUL terminator).
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized width of a row: the three fields back to back, no padding.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,                      // integer primary key
    pub username: [u8; USERNAME_SIZE], // varchar(32)
    pub email: [u8; EMAIL_SIZE],       // varchar(255)
}

impl Row {
    /// Builds a row from string columns. Inputs longer than the column
    /// bound are truncated; the parser rejects them before this point.
    pub fn new(id: u32, username: &str, email: &str) -> Self {
        Row {
            id,
            username: str_to_fixed_bytes(username),
            email: str_to_fixed_bytes(email),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.id,
            field_str(&self.username),
            field_str(&self.email)
        )
    }
}

/// Copies a string into a zero-filled fixed buffer, truncating at `N`.
/// The zero fill doubles as the NUL terminator.
pub fn str_to_fixed_bytes<const N: usize>(input: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let bytes = input.as_bytes();
    let len = bytes.len().min(N);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Text of a fixed field up to its first NUL.
pub fn field_str(bytes: &[u8]) -> Cow<'_, str> {
    let trimmed = bytes.split(|&b| b == 0).next().unwrap_or(&[]);
    String::from_utf8_lossy(trimmed)
}

/// Writes a row into `destination`, which must be at least `ROW_SIZE`
/// bytes. Field order and offsets are fixed by the file format.
pub fn serialize_row(row: &Row, destination: &mut [u8]) {
    destination[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&row.id.to_le_bytes());
    destination[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].copy_from_slice(&row.username);
    destination[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&row.email);
}

/// Reads a row back from a `ROW_SIZE` region written by [`serialize_row`].
pub fn deserialize_row(source: &[u8]) -> Row {
    let mut id_bytes = [0u8; ID_SIZE];
    id_bytes.copy_from_slice(&source[ID_OFFSET..ID_OFFSET + ID_SIZE]);

    let mut username = [0u8; USERNAME_SIZE];
    username.copy_from_slice(&source[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);

    let mut email = [0u8; EMAIL_SIZE];
    email.copy_from_slice(&source[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

    Row {
        id: u32::from_le_bytes(id_bytes),
        username,
        email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_size() {
        assert_eq!(ROW_SIZE, 293);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 37);
    }

    #[test]
    fn test_serialize_round_trip() {
        let row = Row::new(42, "alice", "alice@example.com");
        let mut buf = vec![0u8; ROW_SIZE];
        serialize_row(&row, &mut buf);
        assert_eq!(deserialize_row(&buf), row);
    }

    #[test]
    fn test_round_trip_at_column_bounds() {
        let username = "u".repeat(COLUMN_USERNAME_SIZE);
        let email = "e".repeat(COLUMN_EMAIL_SIZE);
        let row = Row::new(u32::MAX, &username, &email);
        let mut buf = vec![0u8; ROW_SIZE];
        serialize_row(&row, &mut buf);
        let back = deserialize_row(&buf);
        assert_eq!(back, row);
        assert_eq!(field_str(&back.username), username);
        assert_eq!(field_str(&back.email), email);
    }

    #[test]
    fn test_str_to_fixed_bytes_truncates() {
        let buf: [u8; 4] = str_to_fixed_bytes("abcdef");
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_display_trims_nul_padding() {
        let row = Row::new(1, "user1", "u1@example.com");
        assert_eq!(row.to_string(), "(1, user1, u1@example.com)");
    }
}
