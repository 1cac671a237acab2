use crate::api::dto::{CreateTodoReq, UpdateTodoReq};
use crate::db::{TodoStore, queries::SqliteTodoStore};
use crate::domain::{NewTodo, ObjectId, Todo, TodoUpdate};
use crate::errors::AppError;
use crate::service::TodoService;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn setup_service(pool: SqlitePool) -> TodoService {
    TodoService::new(
        Arc::new(SqliteTodoStore::new(pool)),
        Duration::from_secs(5),
    )
}

fn create_req(description: &str) -> CreateTodoReq {
    CreateTodoReq {
        description: Some(description.to_string()),
        completed: None,
    }
}

/// Counts calls and reports an empty collection.
#[derive(Default)]
struct CountingStore {
    calls: AtomicUsize,
}

#[async_trait]
impl TodoStore for CountingStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn find_one(&self, _id: ObjectId) -> Result<Option<Todo>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn insert_one(&self, _todo: &NewTodo) -> Result<ObjectId, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ObjectId::generate())
    }

    async fn update_one(&self, _id: ObjectId, _update: &TodoUpdate) -> Result<u64, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn delete_one(&self, _id: ObjectId) -> Result<u64, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

/// Every call fails the way a dropped connection would.
struct FailingStore;

#[async_trait]
impl TodoStore for FailingStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn find_one(&self, _id: ObjectId) -> Result<Option<Todo>, AppError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn insert_one(&self, _todo: &NewTodo) -> Result<ObjectId, AppError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn update_one(&self, _id: ObjectId, _update: &TodoUpdate) -> Result<u64, AppError> {
        Err(sqlx::Error::PoolClosed.into())
    }

    async fn delete_one(&self, _id: ObjectId) -> Result<u64, AppError> {
        Err(sqlx::Error::PoolClosed.into())
    }
}

/// Never answers within any reasonable timeout.
struct StalledStore;

impl StalledStore {
    async fn stall() {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}

#[async_trait]
impl TodoStore for StalledStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn find_one(&self, _id: ObjectId) -> Result<Option<Todo>, AppError> {
        Self::stall().await;
        Ok(None)
    }

    async fn insert_one(&self, _todo: &NewTodo) -> Result<ObjectId, AppError> {
        Self::stall().await;
        Ok(ObjectId::generate())
    }

    async fn update_one(&self, _id: ObjectId, _update: &TodoUpdate) -> Result<u64, AppError> {
        Self::stall().await;
        Ok(1)
    }

    async fn delete_one(&self, _id: ObjectId) -> Result<u64, AppError> {
        Self::stall().await;
        Ok(1)
    }
}

#[sqlx::test]
async fn test_create_then_get_round_trip(pool: SqlitePool) -> Result<(), AppError> {
    let service = setup_service(pool);

    let created = service.create_todo(create_req("buy milk")).await?;
    let fetched = service.get_todo(&created.id.to_string()).await?;

    assert_eq!(fetched, created);
    assert_eq!(fetched.description, "buy milk");
    assert!(!fetched.completed, "completed should default to false");
    assert_eq!(fetched.created_at, fetched.updated_at);

    Ok(())
}

#[sqlx::test]
async fn test_create_requires_description(pool: SqlitePool) {
    let service = setup_service(pool);

    let missing = service
        .create_todo(CreateTodoReq {
            description: None,
            completed: Some(true),
        })
        .await;
    assert!(matches!(missing, Err(AppError::ValidationError(_))));

    let blank = service.create_todo(create_req("   ")).await;
    assert!(matches!(blank, Err(AppError::ValidationError(_))));

    assert!(service.list_todos().await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_update_overwrites_given_fields(pool: SqlitePool) -> Result<(), AppError> {
    let service = setup_service(pool);

    let created = service.create_todo(create_req("buy milk")).await?;
    let id = created.id.to_string();

    tokio::time::sleep(Duration::from_millis(5)).await;

    let updated = service
        .update_todo(
            &id,
            UpdateTodoReq {
                description: Some(created.description.clone()),
                completed: Some(true),
            },
        )
        .await?;

    assert!(updated.completed);
    assert_eq!(updated.description, "buy milk");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let stored = service.get_todo(&id).await?;
    assert_eq!(stored, updated);

    Ok(())
}

#[sqlx::test]
async fn test_update_leaves_absent_fields_unchanged(pool: SqlitePool) -> Result<(), AppError> {
    let service = setup_service(pool);

    let created = service.create_todo(create_req("water plants")).await?;
    let id = created.id.to_string();

    let updated = service
        .update_todo(
            &id,
            UpdateTodoReq {
                description: None,
                completed: Some(true),
            },
        )
        .await?;
    assert_eq!(updated.description, "water plants");
    assert!(updated.completed);

    let updated = service
        .update_todo(
            &id,
            UpdateTodoReq {
                description: Some("water all plants".to_string()),
                completed: None,
            },
        )
        .await?;
    assert_eq!(updated.description, "water all plants");
    assert!(updated.completed, "completed should be kept when omitted");

    let blank = service
        .update_todo(
            &id,
            UpdateTodoReq {
                description: Some(String::new()),
                completed: None,
            },
        )
        .await;
    assert!(matches!(blank, Err(AppError::ValidationError(_))));

    Ok(())
}

#[sqlx::test]
async fn test_unknown_id_is_not_found(pool: SqlitePool) {
    let service = setup_service(pool);
    let unknown = ObjectId::generate().to_string();

    assert!(matches!(
        service.get_todo(&unknown).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        service
            .update_todo(
                &unknown,
                UpdateTodoReq {
                    description: None,
                    completed: Some(true),
                },
            )
            .await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        service.delete_todo(&unknown).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_invalid_id_never_reaches_store() {
    let store = Arc::new(CountingStore::default());
    let service = TodoService::new(store.clone(), Duration::from_secs(1));

    for bad in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "65f1c0ffee000000000000011"] {
        assert!(matches!(
            service.get_todo(bad).await,
            Err(AppError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            service
                .update_todo(
                    bad,
                    UpdateTodoReq {
                        description: Some("x".to_string()),
                        completed: None,
                    },
                )
                .await,
            Err(AppError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            service.delete_todo(bad).await,
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[sqlx::test]
async fn test_delete_removes_todo(pool: SqlitePool) -> Result<(), AppError> {
    let service = setup_service(pool);

    let created = service.create_todo(create_req("temporary")).await?;
    let id = created.id.to_string();

    service.delete_todo(&id).await?;

    assert!(matches!(service.get_todo(&id).await, Err(AppError::NotFound)));
    assert!(
        service
            .list_todos()
            .await?
            .iter()
            .all(|todo| todo.id != created.id)
    );

    // Deleting again is reported, not ignored.
    assert!(matches!(
        service.delete_todo(&id).await,
        Err(AppError::NotFound)
    ));

    Ok(())
}

#[sqlx::test]
async fn test_list_reflects_live_todos(pool: SqlitePool) -> Result<(), AppError> {
    let service = setup_service(pool);

    let mut created = Vec::new();
    for i in 0..5 {
        created.push(service.create_todo(create_req(&format!("todo {}", i))).await?);
    }

    for todo in &created[..2] {
        service.delete_todo(&todo.id.to_string()).await?;
    }

    let listed = service.list_todos().await?;
    assert_eq!(listed.len(), 3);
    for survivor in &created[2..] {
        assert!(listed.contains(survivor));
    }

    Ok(())
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let service = TodoService::new(Arc::new(FailingStore), Duration::from_secs(1));
    let id = ObjectId::generate().to_string();

    assert!(matches!(
        service.list_todos().await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        service.get_todo(&id).await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        service.create_todo(create_req("anything")).await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        service
            .update_todo(
                &id,
                UpdateTodoReq {
                    description: None,
                    completed: Some(true),
                },
            )
            .await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        service.delete_todo(&id).await,
        Err(AppError::Database(_))
    ));
}

#[tokio::test]
async fn test_stalled_backend_times_out() {
    let service = TodoService::new(Arc::new(StalledStore), Duration::from_millis(20));
    let id = ObjectId::generate().to_string();

    assert!(matches!(service.list_todos().await, Err(AppError::Timeout)));
    assert!(matches!(service.get_todo(&id).await, Err(AppError::Timeout)));
    assert!(matches!(
        service
            .update_todo(
                &id,
                UpdateTodoReq {
                    description: Some("faster".to_string()),
                    completed: None,
                },
            )
            .await,
        Err(AppError::Timeout)
    ));
    assert!(matches!(
        service.create_todo(create_req("slow")).await,
        Err(AppError::Timeout)
    ));
    assert!(matches!(
        service.delete_todo(&id).await,
        Err(AppError::Timeout)
    ));
}
