use super::{Todo, TodoFilter, ValidationError};
use crate::entities::todo;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use tracing::Span;

/// Error type for TodoRepository operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoRepositoryError {
    /// A filter status or priority outside its enumeration.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored row that does not decode into a todo.
    #[error("stored todo {id} is invalid: {source}")]
    InvalidRow { id: i32, source: ValidationError },
    /// An update was requested for a todo that has no id.
    #[error("todo ID is required for update")]
    MissingId,
    /// No todo matched the lookup.
    #[error("record not found")]
    NotFound,
    /// The update touched no rows; the todo does not exist (any more).
    #[error("update failed: no todo with ID {0}")]
    UpdateFailed(i32),
    /// The delete touched no rows; none of the todos exist (any more).
    #[error("delete failed: none of the todos {0:?} exist")]
    DeleteFailed(Vec<i32>),
    /// A delete was requested with an empty id batch.
    #[error("no IDs provided for deletion")]
    NoIdsProvided,
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Data access for todos.
///
/// The repository borrows the shared connection pool; every call takes its
/// own connection from it. Mutations run in a transaction that is committed
/// only when the whole operation succeeded.
pub struct TodoRepository<'a> {
    db: &'a DatabaseConnection,
    span: Span,
}

impl<'a> TodoRepository<'a> {
    /// Creates a repository that logs under the caller's current span.
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self::with_span(db, Span::current())
    }

    /// Creates a repository whose operations log under `span`.
    pub fn with_span(db: &'a DatabaseConnection, span: Span) -> Self {
        Self { db, span }
    }

    /// Stores a new todo and writes the generated id back onto it.
    ///
    /// # Returns
    ///
    /// The id assigned by the database.
    #[tracing::instrument(parent = &self.span, skip(self, todo), fields(title = %todo.title))]
    pub async fn create(&self, todo: &mut Todo) -> Result<i32, TodoRepositoryError> {
        let txn = self.db.begin().await?;
        let inserted = todo
            .to_active_model()
            .insert(&txn)
            .await
            .map_err(TodoRepositoryError::from);
        let created = finish(txn, inserted).await?;

        todo.id = created.id;
        tracing::info!(id = todo.id, "created todo");
        Ok(todo.id)
    }

    /// Retrieves a todo by its id.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn get_by_id(&self, id: i32) -> Result<Todo, TodoRepositoryError> {
        let model = todo::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TodoRepositoryError::NotFound)?;
        decode(model)
    }

    /// Retrieves every todo matching `filter`, ordered by id.
    ///
    /// An empty result is not an error.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn get_all(&self, filter: &TodoFilter) -> Result<Vec<Todo>, TodoRepositoryError> {
        let statement = filter.to_statement()?;
        tracing::debug!(sql = %statement.sql, "listing todos");

        let models = todo::Entity::find()
            .from_raw_sql(statement)
            .all(self.db)
            .await?;
        models.into_iter().map(decode).collect()
    }

    /// Overwrites every column of an existing todo.
    ///
    /// Fails with [`TodoRepositoryError::MissingId`] for an unsaved todo and
    /// with [`TodoRepositoryError::UpdateFailed`] when no row has its id.
    #[tracing::instrument(parent = &self.span, skip(self, todo), fields(id = todo.id))]
    pub async fn update(&self, todo: &Todo) -> Result<(), TodoRepositoryError> {
        if todo.id == 0 {
            return Err(TodoRepositoryError::MissingId);
        }

        let txn = self.db.begin().await?;
        let updated = todo::Entity::update_many()
            .set(todo.to_active_model())
            .filter(todo::Column::Id.eq(todo.id))
            .exec(&txn)
            .await
            .map_err(TodoRepositoryError::from)
            .and_then(|result| match result.rows_affected {
                0 => Err(TodoRepositoryError::UpdateFailed(todo.id)),
                _ => Ok(()),
            });
        finish(txn, updated).await?;

        tracing::info!("updated todo");
        Ok(())
    }

    /// Deletes a batch of todos in one statement.
    ///
    /// Succeeds when at least one of the ids existed.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn delete(&self, ids: &[i32]) -> Result<(), TodoRepositoryError> {
        if ids.is_empty() {
            return Err(TodoRepositoryError::NoIdsProvided);
        }

        let txn = self.db.begin().await?;
        let deleted = todo::Entity::delete_many()
            .filter(todo::Column::Id.is_in(ids.iter().copied()))
            .exec(&txn)
            .await
            .map_err(TodoRepositoryError::from)
            .and_then(|result| match result.rows_affected {
                0 => Err(TodoRepositoryError::DeleteFailed(ids.to_vec())),
                count => Ok(count),
            });
        let count = finish(txn, deleted).await?;

        tracing::info!(count, "deleted todos");
        Ok(())
    }
}

fn decode(model: todo::Model) -> Result<Todo, TodoRepositoryError> {
    let id = model.id;
    Todo::try_from(model).map_err(|source| TodoRepositoryError::InvalidRow { id, source })
}

/// Commits `txn` when `result` is a success and rolls it back otherwise.
///
/// The transaction is consumed on every path. If the future is dropped
/// before this runs, sea-orm rolls the transaction back on drop.
async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, TodoRepositoryError>,
) -> Result<T, TodoRepositoryError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "rolling back transaction");
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "failed to roll back transaction");
            }
            Err(err)
        }
    }
}
