#![allow(dead_code)]

use axum::http::StatusCode;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use serde::Serialize;
use tasks_server::entities::tasks;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Test context holding a migrated database.
pub struct TestContext {
    // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = setup_container().await?;
    let db = setup_db(&container).await?;
    Ok(TestContext { db, container })
}

/// Inserts a task row directly, bypassing the repository.
pub async fn insert_task(db: &DatabaseConnection, title: &str, user_id: i64) -> tasks::Model {
    let active_model = tasks::ActiveModel {
        title: ActiveValue::Set(title.to_string()),
        status: ActiveValue::Set(false),
        user_id: ActiveValue::Set(user_id),
        ..Default::default()
    };
    active_model
        .insert(db)
        .await
        .expect("Failed to insert task")
}

/// HTTP response snapshot for JSON endpoints.
#[derive(Debug, Serialize)]
pub struct HttpResponseSnapshot {
    pub test_context: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub json_body: serde_json::Value,
}

impl HttpResponseSnapshot {
    pub fn new(
        body: &[u8],
        status: StatusCode,
        headers: &axum::http::HeaderMap,
        test_context: &str,
    ) -> Self {
        Self {
            test_context: test_context.to_string(),
            status: status.as_u16(),
            content_type: headers
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            json_body: serde_json::from_slice(body).unwrap_or(serde_json::Value::Null),
        }
    }
}
