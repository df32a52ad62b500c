use super::{cell_or_null, collect_results, Connection, QueryRunner};
use crate::engine::sql::structure::{QueryResults, Schema};
use crate::Error;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Decode, MySql as MariaDB, Pool, Row, Type, TypeInfo};

#[async_trait]
impl QueryRunner for Connection<Pool<MariaDB>> {
    async fn run(&self, query: &str) -> Result<QueryResults, Error> {
        debug!("running on mariadb: {query}");

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(collect_results(&rows, decode_cell))
    }

    async fn describe_schema(&self) -> Result<Schema, Error> {
        let columns: Vec<(String, String)> = sqlx::query_as(
            "SELECT TABLE_NAME, COLUMN_NAME\n\
             FROM information_schema.COLUMNS\n\
             WHERE TABLE_SCHEMA = DATABASE()\n\
             ORDER BY TABLE_NAME, ORDINAL_POSITION",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("found {} columns on mariadb", columns.len());

        Ok(Schema::from_columns(columns))
    }
}

fn decode_cell(row: &MySqlRow, index: usize) -> Value {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "BOOLEAN" => cell::<bool>(row, index),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => cell::<i64>(row, index),
        unsigned if unsigned.ends_with("UNSIGNED") => cell::<u64>(row, index),
        "FLOAT" => cell::<f32>(row, index),
        "DOUBLE" => cell::<f64>(row, index),
        "JSON" => cell::<Value>(row, index),
        _ => cell::<String>(row, index),
    };

    cell_or_null(decoded, column.name(), type_name)
}

fn cell<'r, T>(row: &'r MySqlRow, index: usize) -> Result<Option<Value>, sqlx::Error>
where
    T: Decode<'r, MariaDB> + Type<MariaDB> + Into<Value>,
{
    Ok(row.try_get::<Option<T>, _>(index)?.map(Into::into))
}
