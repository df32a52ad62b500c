use agent_query::analyze::{DBType as AnalyzeDBType, DatabaseName, ServerParams};
use agent_query::context::Context;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a context.
    ///
    /// Contexts are the database connections test queries run against.
    CreateContext(ContextParams),
    /// Selects an existing context.
    UseContext { name: String },
    /// List available contexts.
    ListContexts,
    /// Compiles a query strategy to SQL and prints it.
    Compile(InputParams),
    /// Compiles a query strategy and runs it against the current context.
    TestQuery {
        #[command(flatten)]
        input: InputParams,
        /// Run this SQL instead of compiling a strategy
        #[arg(long)]
        query: Option<String>,
    },
    /// Converts an agent configuration into the record stored by the agent service.
    AgentRecord {
        /// JSON file to read, - reads from stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
    /// Lists the tables and columns of the current context's database.
    ///
    /// The schema is saved the first time it is read, later calls show the saved copy.
    Schema {
        /// Read the schema from the database again, even if there is a saved copy
        #[arg(long)]
        refresh: bool,
    },
    /// Runs a local server the web client can use to compile strategies and test queries.
    ///
    /// The database password is read from the AGENT_QUERY_PASSWORD environment variable.
    Serve(ServeParams),
}

#[derive(clap::Args, Debug)]
pub struct InputParams {
    /// JSON file to read, - reads from stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,
    /// What the JSON holds
    #[arg(long = "from", value_enum, default_value_t = InputKind::Strategy)]
    pub kind: InputKind,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A bare query strategy
    Strategy,
    /// The full response of the intent analysis, with a suggested_query_strategy
    Analysis,
    /// A stored agent record, its query_config is used
    Agent,
}

#[derive(clap::Args, Debug)]
pub struct ServeParams {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub bind: String,
    /// Origin allowed to call the server, usually the web client's dev server
    #[arg(long, default_value = "http://localhost:3000")]
    pub allow_origin: String,
}

#[derive(clap::Args, Debug)]
pub struct ContextParams {
    /// You can reuse your context by referencing this name
    name: String,

    /// Database type: PostgresSQL, MariaDB.
    #[arg(long = "type")]
    db_type: DBType,
    /// Hostname or ip address of the database server (without the port number)
    #[arg(long = "host")]
    hostname_or_ip: String,
    /// Port number of the database server
    #[arg(short, long)]
    port: u16,
    /// Username
    #[arg(short, long)]
    username: String,
    /// Database the queries run in
    #[arg(short, long)]
    database: String,
    /// Use the new context
    #[arg(long = "use")]
    pub use_it: bool,
}

#[derive(Debug, ValueEnum, Clone)]
pub enum DBType {
    MariaDB,
    PostgresSQL,
}

impl From<ContextParams> for Context {
    fn from(value: ContextParams) -> Self {
        Context {
            name: value.name.into(),
            server_params: ServerParams {
                db_type: value.db_type.into(),
                hostname: value.hostname_or_ip,
                port: value.port,
                user: value.username,
                database: DatabaseName(value.database),
            },
        }
    }
}

impl From<DBType> for AnalyzeDBType {
    fn from(value: DBType) -> Self {
        match value {
            DBType::MariaDB => Self::MariaDB,
            DBType::PostgresSQL => Self::PostgresSQL,
        }
    }
}
