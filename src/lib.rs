pub mod agent;
pub mod cache;
pub mod context;
mod engine;
mod error;

pub use engine::compiler::{compile, QueryCompiler, StrategyCompiler, ROW_CAP, SCORE_NULL_GUARD};
pub use engine::strategy::{
    AnalysisResult, JoinRequirement, QueryStrategy, WhereCondition, DEFAULT_JOIN_TYPE,
    DEFAULT_MAIN_TABLE,
};

/// Everything needed to run a compiled query against a real database.
pub mod analyze {
    pub use crate::engine::sql::querying::{
        connect, mariadb, postgres, Connection, MariaDBConnection, PostgresConnection, QueryRunner,
    };
    pub use crate::engine::sql::structure::*;
}

pub use error::{Error, ErrorKind, InternalError};
