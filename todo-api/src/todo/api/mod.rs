use std::sync::Arc;

pub mod v1;

/// Shared state for the todo routes.
#[derive(Clone, Debug)]
pub struct TodoState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}
