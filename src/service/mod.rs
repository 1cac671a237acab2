use crate::api::dto::{CreateTodoReq, UpdateTodoReq};
use crate::db::TodoStore;
use crate::domain::{NewTodo, ObjectId, Todo, TodoUpdate};
use crate::errors::AppError;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod tests;

/// The five todo operations. Each one issues its writes as a single store
/// call bounded by `call_timeout`.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    call_timeout: Duration,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>, AppError> {
        let todos = self.bounded("find_all", self.store.find_all()).await?;
        tracing::debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    pub async fn get_todo(&self, id: &str) -> Result<Todo, AppError> {
        let id = parse_id(id)?;

        self.bounded("find_one", self.store.find_one(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create_todo(&self, req: CreateTodoReq) -> Result<Todo, AppError> {
        let description = req
            .description
            .ok_or_else(|| AppError::ValidationError("description is required".into()))?;
        validate_description(&description)?;

        let new_todo = NewTodo::new(description, req.completed.unwrap_or(false), Utc::now());

        let id = self
            .bounded("insert_one", self.store.insert_one(&new_todo))
            .await?;

        tracing::info!(%id, "Todo created");
        Ok(Todo::from_new(id, new_todo))
    }

    /// Presence-aware merge: fields missing from `req` keep their stored
    /// value. `updated_at` is always refreshed.
    pub async fn update_todo(&self, id: &str, req: UpdateTodoReq) -> Result<Todo, AppError> {
        let id = parse_id(id)?;
        if let Some(description) = &req.description {
            validate_description(description)?;
        }

        let update = TodoUpdate {
            description: req.description,
            completed: req.completed,
            updated_at: Utc::now(),
        };

        let matched = self
            .bounded("update_one", self.store.update_one(id, &update))
            .await?;
        if matched == 0 {
            return Err(AppError::NotFound);
        }

        tracing::info!(%id, "Todo updated");

        // The write and this read are separate calls. A delete landing in
        // between yields NotFound even though the write succeeded.
        self.bounded("find_one", self.store.find_one(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;

        let deleted = self
            .bounded("delete_one", self.store.delete_one(id))
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }

        tracing::info!(%id, "Todo deleted");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(AppError::Timeout)
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    raw.parse::<ObjectId>()
        .map_err(|e| AppError::InvalidIdentifier(format!("'{}': {}", raw, e)))
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().is_empty() {
        return Err(AppError::ValidationError(
            "description must not be blank".into(),
        ));
    }
    Ok(())
}
