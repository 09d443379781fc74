use axum::Router;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{self, Config};
use crate::todo::api::{TodoState, v1};
use crate::todo::{Priority, Status};

pub mod api;

#[derive(OpenApi)]
#[openapi(
    paths(
        v1::create_todo_handler,
        v1::get_todo_handler,
        v1::get_todos_handler,
        v1::update_todo_handler,
        v1::delete_todos_handler,
    ),
    components(schemas(
        v1::TodoJson,
        v1::CreateTodoResponse,
        v1::TodosResponse,
        v1::DeleteTodosRequest,
        v1::ErrorResponse,
        Priority,
        Status,
    )),
    tags((name = "Todos", description = "Todo management"))
)]
pub struct ApiDoc;

/// Builds the complete application router around an open database connection.
pub fn create_app(db: DatabaseConnection) -> Router {
    let todo_state = Arc::new(TodoState { db: Arc::new(db) });

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(todo_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let db = connect(&config).await?;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, create_app(db)).await?;
    Ok(())
}

/// Opens the connection pool and brings the schema up to date.
pub async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(db)
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_document_every_todo_route() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/todos"));
        assert!(doc.paths.paths.contains_key("/api/v1/todos/{id}"));
    }

    #[test]
    fn can_document_priority_and_status_members() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components should be generated").schemas;

        assert!(schemas.contains_key("Priority"));
        assert!(schemas.contains_key("Status"));
    }

    #[tokio::test]
    async fn can_report_health() {
        assert_eq!(health_check_handler().await, "OK");
    }
}
