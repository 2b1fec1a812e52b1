use axum::Router;
use axum::http::header;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::iter::once;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AuthState;
use crate::config::Config;
use crate::task::api::v1::TaskState;
use crate::task::{DefaultTaskService, SeaOrmTaskRepository};

pub mod api;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app(&config, db);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires repository, service and routers together.
pub fn create_app(config: &Config, db: DatabaseConnection) -> Router {
    let auth_state = Arc::new(AuthState::from_config(config));

    let repository = SeaOrmTaskRepository::new(db);
    let service = DefaultTaskService::new(repository);
    let task_state = Arc::new(TaskState::new(Arc::new(service)));

    let api_router = api::create_api_router(auth_state, task_state);

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new(once(
                    header::AUTHORIZATION,
                )))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
