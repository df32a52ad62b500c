//! Where to run queries, and what comes back from running them.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Parameters used to connect to a server.
///
/// There is no password in here on purpose, we never store those.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerParams {
    pub db_type: DBType,
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub database: DatabaseName,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DBType {
    PostgresSQL,
    MariaDB,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseName(pub String);

/// The result of a test query. Serializes to the `{columns, rows, row_count}` shape the
/// front end expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl QueryResults {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        QueryResults {
            columns,
            row_count: rows.len(),
            rows,
        }
    }
}

/// Tables of a database, by name. Serializes to `{"tables": {"name": {"columns": [...]}}}`, which
/// the schema browser renders as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: BTreeMap<String, TableSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// In the order the database lists them.
    pub columns: Vec<String>,
}

impl Schema {
    /// Groups `(table, column)` pairs by table. Columns keep the order they come in.
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tables: BTreeMap<String, TableSchema> = BTreeMap::new();

        for (table, column) in columns {
            tables.entry(table).or_default().columns.push(column);
        }

        Schema { tables }
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|table| table.columns.len()).sum()
    }
}

impl Display for ServerParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{user}@{host}:{port}/{database}",
            user = self.user,
            host = self.hostname,
            port = self.port,
            database = self.database,
        )
    }
}

impl Display for DatabaseName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for DBType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DBType::PostgresSQL => write!(f, "postgres"),
            DBType::MariaDB => write!(f, "mariadb"),
        }
    }
}

impl From<String> for DatabaseName {
    fn from(value: String) -> Self {
        DatabaseName(value)
    }
}
