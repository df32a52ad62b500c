mod mariadb;
mod postgres;

use crate::engine::sql::structure::{DBType, QueryResults, Schema, ServerParams};
use crate::Error;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Column, MySql as MariaDB, Pool, Postgres, Row};

#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Runs SQL text exactly as it is given, nothing gets escaped or parameterized.
    async fn run(&self, query: &str) -> Result<QueryResults, Error>;

    /// Lists the tables and columns of the database we are connected to.
    ///
    /// Only the default schema is looked at: `current_schema()` on postgres and `DATABASE()` on
    /// mariadb.
    async fn describe_schema(&self) -> Result<Schema, Error>;
}

pub struct Connection<T> {
    pool: T,
}

pub type MariaDBConnection = Connection<Pool<MariaDB>>;
pub type PostgresConnection = Connection<Pool<Postgres>>;

// Test queries are run one at a time, by hand, so one connection is plenty.
const MAX_CONNECTIONS: u32 = 1;

pub async fn connect(
    server_params: &ServerParams,
    password: &str,
) -> Result<Box<dyn QueryRunner>, Error> {
    let runner: Box<dyn QueryRunner> = match server_params.db_type {
        DBType::PostgresSQL => Box::new(postgres(server_params, password).await?),
        DBType::MariaDB => Box::new(mariadb(server_params, password).await?),
    };

    Ok(runner)
}

pub async fn postgres(
    server_params: &ServerParams,
    password: &str,
) -> Result<PostgresConnection, Error> {
    let options = PgConnectOptions::new()
        .host(&server_params.hostname)
        .port(server_params.port)
        .username(&server_params.user)
        .password(password)
        .database(&server_params.database.0);

    debug!("connecting to postgres at {server_params}");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    Ok(Connection { pool })
}

pub async fn mariadb(
    server_params: &ServerParams,
    password: &str,
) -> Result<MariaDBConnection, Error> {
    let options = MySqlConnectOptions::new()
        .host(&server_params.hostname)
        .port(server_params.port)
        .username(&server_params.user)
        .password(password)
        .database(&server_params.database.0);

    debug!("connecting to mariadb at {server_params}");

    let pool = MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    Ok(Connection { pool })
}

/// Column names are taken from the first row, so an empty result has no columns either.
fn collect_results<R, F>(rows: &[R], decode_cell: F) -> QueryResults
where
    R: Row,
    F: Fn(&R, usize) -> Value,
{
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|index| decode_cell(row, index)).collect())
        .collect();

    QueryResults::new(columns, rows)
}

/// Cells we can't decode are shown as null, the rest of the row is still useful.
fn cell_or_null(
    decoded: Result<Option<Value>, sqlx::Error>,
    column_name: &str,
    type_name: &str,
) -> Value {
    match decoded {
        Ok(Some(value)) => value,
        Ok(None) => Value::Null,
        Err(error) => {
            debug!("cannot decode column {column_name} of type {type_name}: {error}");
            Value::Null
        }
    }
}

#[cfg(test)]
mod test {
    use super::cell_or_null;
    use serde_json::{json, Value};

    #[test]
    fn test_decoded_cells_are_kept() {
        assert_eq!(json!(42), cell_or_null(Ok(Some(json!(42))), "id", "INT4"));
    }

    #[test]
    fn test_sql_nulls_stay_null() {
        assert_eq!(Value::Null, cell_or_null(Ok(None), "deleted_at", "TIMESTAMPTZ"));
    }

    #[test]
    fn test_undecodable_cells_become_null() {
        let decoded = Err(sqlx::Error::ColumnNotFound("location".to_string()));

        assert_eq!(Value::Null, cell_or_null(decoded, "location", "POINT"));
    }
}
