use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::types::PgMoney;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use std::fmt::Write;
use tracing::{debug, warn};

use super::connection::{connect, Credentials};
use super::DatabaseError;
use crate::table::{CellValue, Table};

/// Fraction digits of `MONEY` values under the default `lc_monetary`.
const MONEY_FRACTION_DIGITS: u32 = 2;

/// How the values of a result column are turned into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Money,
    Bool,
    Text,
    Uuid,
    Json,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
}

fn column_kind(type_name: &str) -> Option<ColumnKind> {
    let kind = match type_name.to_ascii_uppercase().as_str() {
        "INT2" => ColumnKind::Int2,
        "INT4" => ColumnKind::Int4,
        "INT8" => ColumnKind::Int8,
        "FLOAT4" => ColumnKind::Float4,
        "FLOAT8" => ColumnKind::Float8,
        "NUMERIC" => ColumnKind::Numeric,
        "MONEY" => ColumnKind::Money,
        "BOOL" => ColumnKind::Bool,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => ColumnKind::Text,
        "UUID" => ColumnKind::Uuid,
        "JSON" | "JSONB" => ColumnKind::Json,
        "BYTEA" => ColumnKind::Bytes,
        "DATE" => ColumnKind::Date,
        "TIME" => ColumnKind::Time,
        "TIMESTAMP" => ColumnKind::Timestamp,
        "TIMESTAMPTZ" => ColumnKind::TimestampTz,
        _ => return None,
    };
    Some(kind)
}

/// Same notation Postgres uses for `bytea` output, so the text casts back.
fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

fn cell<T>(value: Option<T>, to_cell: impl FnOnce(T) -> CellValue) -> CellValue {
    value.map(to_cell).unwrap_or(CellValue::Empty)
}

fn decode_cell(row: &PgRow, index: usize, kind: ColumnKind) -> Result<CellValue, sqlx::Error> {
    let value = match kind {
        ColumnKind::Int2 => cell(row.try_get::<Option<i16>, _>(index)?, |v| {
            CellValue::Int(v.into())
        }),
        ColumnKind::Int4 => cell(row.try_get::<Option<i32>, _>(index)?, |v| {
            CellValue::Int(v.into())
        }),
        ColumnKind::Int8 => cell(row.try_get::<Option<i64>, _>(index)?, CellValue::Int),
        ColumnKind::Float4 => cell(row.try_get::<Option<f32>, _>(index)?, |v| {
            CellValue::Float(v.into())
        }),
        ColumnKind::Float8 => cell(row.try_get::<Option<f64>, _>(index)?, CellValue::Float),
        // Text keeps every digit
        ColumnKind::Numeric => cell(row.try_get::<Option<Decimal>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::Money => cell(row.try_get::<Option<PgMoney>, _>(index)?, |v| {
            CellValue::Text(v.to_decimal(MONEY_FRACTION_DIGITS).to_string())
        }),
        ColumnKind::Bool => cell(row.try_get::<Option<bool>, _>(index)?, CellValue::Bool),
        ColumnKind::Text => cell(row.try_get::<Option<String>, _>(index)?, CellValue::Text),
        ColumnKind::Uuid => cell(row.try_get::<Option<Uuid>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::Json => cell(row.try_get::<Option<JsonValue>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::Bytes => cell(row.try_get::<Option<Vec<u8>>, _>(index)?, |v| {
            CellValue::Text(bytes_to_hex(&v))
        }),
        ColumnKind::Date => cell(row.try_get::<Option<NaiveDate>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::Time => cell(row.try_get::<Option<NaiveTime>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::Timestamp => cell(row.try_get::<Option<NaiveDateTime>, _>(index)?, |v| {
            CellValue::Text(v.to_string())
        }),
        ColumnKind::TimestampTz => cell(row.try_get::<Option<DateTime<Utc>>, _>(index)?, |v| {
            CellValue::Text(v.to_rfc3339())
        }),
    };
    Ok(value)
}

/// Runs `sql` and collects the result. Column names come from the prepared
/// statement, so they are present even when no row matches. A column whose
/// type has no cell representation fails the whole read before any row is
/// fetched.
pub async fn read_query(conn: &mut PgConnection, sql: &str) -> Result<Table, DatabaseError> {
    let statement = (&mut *conn).prepare(sql).await?;

    let kinds = statement
        .columns()
        .iter()
        .map(|column| {
            let type_name = column.type_info().name();
            column_kind(type_name).ok_or_else(|| DatabaseError::UnsupportedType {
                column: column.name().to_string(),
                type_name: type_name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut table = Table::new(statement.columns().iter().map(|c| c.name().to_string()));

    let rows = statement.query().fetch_all(&mut *conn).await?;
    for row in &rows {
        let cells = kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| decode_cell(row, index, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(cells)?;
    }

    debug!("Read {} rows for query", table.len());
    Ok(table)
}

async fn read_with(
    server: &str,
    db_name: &str,
    credentials: &Credentials,
    sql: &str,
) -> Result<Table, DatabaseError> {
    let mut conn = connect(server, db_name, credentials).await?;
    let result = read_query(&mut conn, sql).await;
    if let Err(e) = conn.close().await {
        warn!("Error closing connection: {}", e);
    }
    result
}

pub async fn read_with_credentials(
    server: &str,
    db_name: &str,
    username: &str,
    password: &str,
    sql: &str,
) -> Result<Table, DatabaseError> {
    let credentials = Credentials::Password {
        username: username.to_string(),
        password: password.to_string(),
    };
    read_with(server, db_name, &credentials, sql).await
}

pub async fn read_trusted(server: &str, db_name: &str, sql: &str) -> Result<Table, DatabaseError> {
    read_with(server, db_name, &Credentials::Trusted, sql).await
}
