//! Relational database helpers.
//!
//! Every operation exists in three flavours: one taking an open connection,
//! one opening (and closing) a connection with a username/password pair, and
//! one opening a connection with the operating system's identity.

mod connection;
mod read;
mod write;

pub use connection::{
    connect, connect_trusted, connect_with_credentials, Credentials, ServerAddress,
};
pub use read::{read_query, read_trusted, read_with_credentials};
pub use write::{insert_statement, write_rows, write_trusted, write_with_credentials};

use thiserror::Error;

use crate::table::TableError;

/// PostgreSQL port used when the server address does not name one.
pub const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Nothing to write: the row set is empty")]
    EmptyRows,

    #[error("No columns given for table {0}")]
    NoColumns(String),

    #[error("Row {row} has {actual} values, expected {expected}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid server address: {0}")]
    InvalidServer(String),

    #[error("Column {column} has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },

    #[error("Could not resolve the column types of table {0}")]
    UnknownColumnTypes(String),

    #[error("Unexpected result shape: {0}")]
    Table(#[from] TableError),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
