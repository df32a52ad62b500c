//! Runs a local server for the web client.
//!
//! The web client posts strategies here to see the SQL they compile to, posts SQL to run it
//! against one of the contexts, and browses the tables of a context. Contexts stand in for the
//! backend's database connections: the connection id is the context name.
use crate::args::ServeParams;
use agent_query::agent::ConnectionId;
use agent_query::analyze::{connect, QueryResults, Schema};
use agent_query::context::{Context, ContextName, SavedSchema};
use agent_query::{cache, compile, AnalysisResult, Error, ErrorKind, InternalError, QueryStrategy};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::runtime::Builder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

static PASSWORD_ENV_VAR: &str = "AGENT_QUERY_PASSWORD";

#[derive(Debug, Serialize)]
struct CompileResponse {
    query: String,
}

#[derive(Debug, Deserialize)]
struct TestQueryRequest {
    connection_id: ConnectionId,
    query: String,
}

#[derive(Debug, Serialize)]
struct ConnectionSummary {
    connection_id: String,
    hostname: String,
    database: String,
    db_type: String,
}

/// Contexts and saved schemas are read from `cache_root`.
#[derive(Debug, Clone)]
struct ServerState {
    cache_root: PathBuf,
}

/// Errors are sent as `{"detail": "..."}`, that's what the web client shows to users.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

pub fn run(params: ServeParams) -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let allowed_origin = params.allow_origin.parse::<HeaderValue>().map_err(|_| {
        InternalError(format!(
            "{} is not a valid origin",
            params.allow_origin
        ))
    })?;

    let state = ServerState {
        cache_root: cache::cache_root()?,
    };

    let app = router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(allowed_origin)
            .allow_headers([CONTENT_TYPE])
            .allow_methods([Method::GET, Method::POST]),
    );

    // A single thread is plenty, requests come from one person clicking buttons.
    let tokio = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;

    tokio.block_on(async {
        let listener = tokio::net::TcpListener::bind(&params.bind).await?;
        info!("listening on {}", params.bind);

        axum::serve(listener, app).await?;

        Ok(())
    })
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/query/compile", post(compile_strategy))
        .route("/query/test", post(test_query))
        .route("/database/connections", get(list_connections))
        .route("/database/:connection_id/schema", get(database_schema))
        .route("/database/:connection_id/refresh-schema", post(refresh_schema))
        .with_state(state)
}

/// Accepts either a whole analysis result or a bare strategy.
async fn compile_strategy(Json(body): Json<Value>) -> Result<Json<CompileResponse>, ApiError> {
    let strategy: QueryStrategy = if body.get("suggested_query_strategy").is_some() {
        serde_json::from_value::<AnalysisResult>(body)
            .map_err(Error::from)?
            .into()
    } else {
        serde_json::from_value(body).map_err(Error::from)?
    };

    Ok(Json(CompileResponse {
        query: compile(&strategy),
    }))
}

async fn test_query(
    State(state): State<ServerState>,
    Json(request): Json<TestQueryRequest>,
) -> Result<Json<QueryResults>, ApiError> {
    let context = state.context(&request.connection_id.to_string().into())?;
    let password = database_password()?;

    info!(
        "running test query on {context}: {query}",
        context = context.name,
        query = request.query
    );

    let runner = connect(&context.server_params, &password).await?;
    let results = runner.run(&request.query).await?;

    Ok(Json(results))
}

async fn list_connections(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ConnectionSummary>>, ApiError> {
    let summaries = Context::all_in(&state.cache_root)?
        .into_iter()
        .map(|context| ConnectionSummary {
            connection_id: context.name.to_string(),
            hostname: context.server_params.hostname,
            database: context.server_params.database.to_string(),
            db_type: context.server_params.db_type.to_string(),
        })
        .collect();

    Ok(Json(summaries))
}

/// Serves the saved schema when there is one, otherwise reads it from the database.
async fn database_schema(
    State(state): State<ServerState>,
    Path(connection_id): Path<String>,
) -> Result<Json<Schema>, ApiError> {
    let context = state.context(&connection_id.into())?;

    if let Some(saved) = SavedSchema::load(&state.cache_root, &context.name)? {
        return Ok(Json(saved.schema));
    }

    Ok(Json(state.read_schema(context).await?))
}

async fn refresh_schema(
    State(state): State<ServerState>,
    Path(connection_id): Path<String>,
) -> Result<Json<Schema>, ApiError> {
    let context = state.context(&connection_id.into())?;

    Ok(Json(state.read_schema(context).await?))
}

impl ServerState {
    fn context(&self, name: &ContextName) -> Result<Context, Error> {
        cache::read_from(&self.cache_root, name)
    }

    /// Reads the schema from the database and saves it for next time.
    async fn read_schema(&self, context: Context) -> Result<Schema, ApiError> {
        let password = database_password()?;

        info!("reading schema of {}", context.name);

        let runner = connect(&context.server_params, &password).await?;
        let schema = runner.describe_schema().await?;

        cache::write_to(
            &self.cache_root,
            &SavedSchema {
                context: context.name,
                schema: schema.clone(),
            },
        )?;

        Ok(schema)
    }
}

fn database_password() -> Result<String, ApiError> {
    Ok(std::env::var(PASSWORD_ENV_VAR)?)
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match error.kind() {
            ErrorKind::JsonError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::IoError(_) if error.is_not_found() => StatusCode::NOT_FOUND,
            ErrorKind::SqlError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            status,
            detail: error.to_string(),
        }
    }
}

impl From<std::env::VarError> for ApiError {
    fn from(error: std::env::VarError) -> Self {
        let mut api_error = ApiError::from(Error::from(error));
        api_error.detail = format!("{PASSWORD_ENV_VAR} is not set, cannot connect to the database");

        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("request failed with {}: {}", self.status, self.detail);

        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
