//! Catalog server - the demo `books` schema served over HTTP
//!
//! GraphQL is exposed at /graphql, liveness at /health.

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orm_connections::catalog::{self, CatalogSchema};
use orm_connections::config::{Config, LogFormat};
use orm_connections::db;
use orm_connections::orm::Viewer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orm_connections=debug,tower_http=debug".into()),
        )
        .with(pretty)
        .with(json)
        .init();

    tracing::info!("Starting catalog server");

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    catalog::setup(&pool, config.seed_demo_data).await?;

    let schema = catalog::build_schema(pool);
    tracing::info!("GraphQL schema built");

    let app = Router::new()
        .route("/health", get(health))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(schema);

    let addr = config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Caller identity header, exposed to query builders as a [`Viewer`]
const VIEWER_HEADER: &str = "x-viewer";

async fn graphql_handler(
    State(schema): State<CatalogSchema>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(viewer) = headers
        .get(VIEWER_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        request = request.data(Viewer(viewer.to_string()));
    }

    schema.execute(request).await.into()
}

/// GraphiQL playground (only for browsers)
async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
    } else {
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "Use POST with Content-Type: application/json for GraphQL queries"
            })),
        )
            .into_response()
    }
}
