use sqlx::postgres::PgConnection;
use sqlx::{Connection, Either, Executor, Statement, TypeInfo};
use tracing::{debug, info, warn};

use super::connection::{connect, Credentials};
use super::DatabaseError;
use crate::table::CellValue;

fn untyped_insert(table_name: &str, columns: &[String]) -> String {
    let values: Vec<String> = (1..=columns.len()).map(|n| format!("${}", n)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name,
        columns.join(", "),
        values.join(", ")
    )
}

/// Builds the insert for a single row. Empty cells become a `NULL` literal;
/// every other cell gets the next `$n` placeholder cast to the type of its
/// target column, since all values are sent as text.
pub fn insert_statement(
    table_name: &str,
    columns: &[String],
    column_types: &[String],
    row: &[CellValue],
) -> String {
    let mut next_param = 0;
    let values: Vec<String> = row
        .iter()
        .zip(column_types)
        .map(|(cell, column_type)| {
            if cell.is_empty() {
                "NULL".to_string()
            } else {
                next_param += 1;
                format!("${}::{}", next_param, column_type)
            }
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name,
        columns.join(", "),
        values.join(", ")
    )
}

/// Lets the server infer the parameters of a plain insert, which yields the
/// type of every target column.
async fn column_types(
    conn: &mut PgConnection,
    table_name: &str,
    columns: &[String],
) -> Result<Vec<String>, DatabaseError> {
    let sql = untyped_insert(table_name, columns);
    let statement = (&mut *conn).prepare(&sql).await?;
    match statement.parameters() {
        Some(Either::Left(types)) if types.len() == columns.len() => {
            Ok(types.iter().map(|t| t.name().to_string()).collect())
        }
        _ => Err(DatabaseError::UnknownColumnTypes(table_name.to_string())),
    }
}

fn check_rows(
    table_name: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), DatabaseError> {
    if rows.is_empty() {
        return Err(DatabaseError::EmptyRows);
    }
    if columns.is_empty() {
        return Err(DatabaseError::NoColumns(table_name.to_string()));
    }
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(DatabaseError::ColumnMismatch {
                row: index,
                expected: columns.len(),
                actual: row.len(),
            });
        }
    }
    Ok(())
}

/// Inserts every row into `table_name` inside one transaction.
pub async fn write_rows(
    conn: &mut PgConnection,
    table_name: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), DatabaseError> {
    check_rows(table_name, columns, rows)?;

    let mut tx = conn.begin().await?;
    let types = column_types(&mut tx, table_name, columns).await?;
    debug!("Column types of {}: {:?}", table_name, types);

    for row in rows {
        let sql = insert_statement(table_name, columns, &types, row);
        let query = row
            .iter()
            .filter(|cell| !cell.is_empty())
            .fold(sqlx::query(&sql), |query, cell| query.bind(cell.to_string()));
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("Wrote {} rows to {}", rows.len(), table_name);
    Ok(())
}

async fn write_with(
    server: &str,
    db_name: &str,
    credentials: &Credentials,
    table_name: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), DatabaseError> {
    check_rows(table_name, columns, rows)?;

    let mut conn = connect(server, db_name, credentials).await?;
    let result = write_rows(&mut conn, table_name, columns, rows).await;
    if let Err(e) = conn.close().await {
        warn!("Error closing connection: {}", e);
    }
    result
}

pub async fn write_with_credentials(
    server: &str,
    db_name: &str,
    username: &str,
    password: &str,
    table_name: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), DatabaseError> {
    let credentials = Credentials::Password {
        username: username.to_string(),
        password: password.to_string(),
    };
    write_with(server, db_name, &credentials, table_name, columns, rows).await
}

pub async fn write_trusted(
    server: &str,
    db_name: &str,
    table_name: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), DatabaseError> {
    write_with(server, db_name, &Credentials::Trusted, table_name, columns, rows).await
}
