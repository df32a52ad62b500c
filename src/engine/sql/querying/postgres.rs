use super::{cell_or_null, collect_results, Connection, QueryRunner};
use crate::engine::sql::structure::{QueryResults, Schema};
use crate::Error;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Decode, Pool, Postgres, Row, Type, TypeInfo};

#[async_trait]
impl QueryRunner for Connection<Pool<Postgres>> {
    async fn run(&self, query: &str) -> Result<QueryResults, Error> {
        debug!("running on postgres: {query}");

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(collect_results(&rows, decode_cell))
    }

    async fn describe_schema(&self) -> Result<Schema, Error> {
        let columns: Vec<(String, String)> = sqlx::query_as(
            "SELECT table_name::text, column_name::text\n\
             FROM information_schema.columns\n\
             WHERE table_schema = current_schema()\n\
             ORDER BY table_name, ordinal_position",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("found {} columns on postgres", columns.len());

        Ok(Schema::from_columns(columns))
    }
}

fn decode_cell(row: &PgRow, index: usize) -> Value {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "BOOL" => cell::<bool>(row, index),
        "INT2" => cell::<i16>(row, index),
        "INT4" => cell::<i32>(row, index),
        "INT8" => cell::<i64>(row, index),
        "FLOAT4" => cell::<f32>(row, index),
        "FLOAT8" => cell::<f64>(row, index),
        "JSON" | "JSONB" => cell::<Value>(row, index),
        _ => cell::<String>(row, index),
    };

    cell_or_null(decoded, column.name(), type_name)
}

fn cell<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<Value>, sqlx::Error>
where
    T: Decode<'r, Postgres> + Type<Postgres> + Into<Value>,
{
    Ok(row.try_get::<Option<T>, _>(index)?.map(Into::into))
}
