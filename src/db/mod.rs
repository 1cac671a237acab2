use crate::domain::{NewTodo, ObjectId, Todo, TodoUpdate};
use crate::errors::AppError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub mod queries;


/// Document collection holding the todos.
///
/// Each call is atomic for the single document it touches. Implementations
/// must be safe to share across concurrent requests.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Every document, in the store's natural order.
    async fn find_all(&self) -> Result<Vec<Todo>, AppError>;

    async fn find_one(&self, id: ObjectId) -> Result<Option<Todo>, AppError>;

    /// Inserts the document and returns the id assigned to it.
    async fn insert_one(&self, todo: &NewTodo) -> Result<ObjectId, AppError>;

    /// Sets the given fields, returning the number of matched documents.
    async fn update_one(&self, id: ObjectId, update: &TodoUpdate) -> Result<u64, AppError>;

    /// Returns the number of deleted documents.
    async fn delete_one(&self, id: ObjectId) -> Result<u64, AppError>;
}

/// Initialize the SQLite connection pool with appropriate options.
///
/// # Arguments
///
/// * `database_url` - The database URL string.
///
/// # Returns
/// * `Pool<Sqlite>` - The initialized SQLite connection pool.
pub async fn init_pool(database_url: &str) -> sqlx::Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
