use crate::db::TodoStore;
use crate::domain::{NewTodo, ObjectId, Todo, TodoUpdate};
use crate::errors::AppError;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteRow};

/// `TodoStore` backed by the `todos` table. One row per document, keyed by
/// the hex form of its `ObjectId` in `_id`.
#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: SqlitePool,
}

impl SqliteTodoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn todo_from_row(row: &SqliteRow) -> sqlx::Result<Todo> {
    let raw_id: String = row.try_get("_id")?;
    let id = ObjectId::parse_str(&raw_id).map_err(|e| sqlx::Error::ColumnDecode {
        index: "_id".to_string(),
        source: Box::new(e),
    })?;

    Ok(Todo {
        id,
        description: row.try_get("description")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT _id, description, completed, created_at, updated_at
            FROM todos
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let todos = rows.iter().map(todo_from_row).collect::<sqlx::Result<_>>()?;
        Ok(todos)
    }

    /// Retrieves a todo by its id.
    ///
    /// # Returns
    /// * `Option<Todo>` - The todo if found, or None if no row matches.
    async fn find_one(&self, id: ObjectId) -> Result<Option<Todo>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT _id, description, completed, created_at, updated_at
            FROM todos
            WHERE _id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        Ok(Some(todo_from_row(&row)?))
    }

    async fn insert_one(&self, todo: &NewTodo) -> Result<ObjectId, AppError> {
        let id = ObjectId::generate();

        sqlx::query(
            r#"
            INSERT INTO todos (_id, description, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Sets only the fields present in `update`, plus `updated_at`.
    ///
    /// # Returns
    /// * `u64` - The number of rows matched by the id.
    async fn update_one(&self, id: ObjectId, update: &TodoUpdate) -> Result<u64, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
        query.push_bind(update.updated_at);

        if let Some(description) = &update.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(completed) = update.completed {
            query.push(", completed = ").push_bind(completed);
        }

        query.push(" WHERE _id = ").push_bind(id.to_string());

        let result = query.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: ObjectId) -> Result<u64, AppError> {
        tracing::debug!(%id, "Deleting todo document");
        let result = sqlx::query("DELETE FROM todos WHERE _id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
