//! Ownership and state-transition rules for todos.
//!
//! Every operation takes the acting user explicitly. A todo that exists but
//! belongs to someone else is reported exactly like one that does not exist.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tickbox_api::v1::{FieldErrors, Todo, TodoForm, TodoId, UserId};
use tracing::info;

use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),

    #[error("todo not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug)]
pub struct TodoService {
    store: Arc<Store>,
}

impl TodoService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn list_open(&self, owner: UserId) -> Vec<Todo> {
        self.store.find_by_owner_and_status(owner, false).await
    }

    pub async fn list_completed(&self, owner: UserId) -> Vec<Todo> {
        self.store.find_by_owner_and_status(owner, true).await
    }

    pub async fn create(&self, owner: UserId, form: &TodoForm) -> Result<Todo, TodoError> {
        let todo = Todo::new(owner, form.validate()?);
        self.store.insert(todo.clone()).await?;

        info!(
            id = %todo.id,
            owner = %owner,
            title = %todo.title,
            "created todo"
        );

        Ok(todo)
    }

    pub async fn get(&self, owner: UserId, id: TodoId) -> Result<Todo, TodoError> {
        self.store
            .find_by_id(id)
            .await
            .filter(|todo| todo.owner == owner)
            .ok_or(TodoError::NotFound)
    }

    pub async fn update(
        &self,
        owner: UserId,
        id: TodoId,
        form: &TodoForm,
    ) -> Result<Todo, TodoError> {
        self.get(owner, id).await?;
        let draft = form.validate()?;

        let todo = self
            .store
            .update(id, |todo| {
                if todo.owner != owner {
                    return false;
                }
                todo.apply(draft);
                true
            })
            .await?;
        let todo = owned(todo, owner)?;

        info!(
            id = %todo.id,
            title = %todo.title,
            "updated todo"
        );

        Ok(todo)
    }

    /// Completing an already completed todo succeeds and leaves its
    /// completion time untouched.
    pub async fn complete(&self, owner: UserId, id: TodoId) -> Result<Todo, TodoError> {
        let now = Utc::now();
        let todo = self
            .store
            .update(id, |todo| todo.owner == owner && todo.complete(now))
            .await?;
        let todo = owned(todo, owner)?;

        info!(
            id = %todo.id,
            completed_at = ?todo.completed_at,
            "completed todo"
        );

        Ok(todo)
    }

    pub async fn delete(&self, owner: UserId, id: TodoId) -> Result<(), TodoError> {
        self.get(owner, id).await?;
        self.store.delete(id).await?.ok_or(TodoError::NotFound)?;

        info!(id = %id, "deleted todo");

        Ok(())
    }
}

fn owned(todo: Option<Todo>, owner: UserId) -> Result<Todo, TodoError> {
    todo.filter(|todo| todo.owner == owner)
        .ok_or(TodoError::NotFound)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn service() -> TodoService {
        TodoService::new(Arc::new(Store::in_memory()))
    }

    fn form(title: &str, memo: &str) -> TodoForm {
        TodoForm {
            title: title.to_string(),
            memo: memo.to_string(),
            important: None,
        }
    }

    #[tokio::test]
    async fn todos_are_invisible_to_other_owners() {
        let todos = service();
        let alice = UserId::new();
        let bob = UserId::new();

        let open = todos.create(alice, &form("alice open", "")).await.unwrap();
        let done = todos.create(alice, &form("alice done", "")).await.unwrap();
        todos.complete(alice, done.id).await.unwrap();

        assert!(todos.list_open(bob).await.is_empty());
        assert!(todos.list_completed(bob).await.is_empty());
        for id in [open.id, done.id] {
            assert!(matches!(todos.get(bob, id).await, Err(TodoError::NotFound)));
            assert!(matches!(
                todos.update(bob, id, &form("mine now", "")).await,
                Err(TodoError::NotFound)
            ));
            assert!(matches!(todos.complete(bob, id).await, Err(TodoError::NotFound)));
            assert!(matches!(todos.delete(bob, id).await, Err(TodoError::NotFound)));
        }

        assert_eq!(todos.get(alice, open.id).await.unwrap().title, "alice open");
        assert!(todos.get(alice, open.id).await.unwrap().completed_at.is_none());
    }

    #[tokio::test]
    async fn create_with_empty_title_persists_nothing() {
        let todos = service();
        let owner = UserId::new();

        let err = todos.create(owner, &form("  ", "memo")).await.unwrap_err();
        let TodoError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.for_field("title").count(), 1);
        assert!(todos.list_open(owner).await.is_empty());
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let todos = service();
        let owner = UserId::new();
        let todo = todos.create(owner, &form("Buy milk", "")).await.unwrap();

        let first = todos.complete(owner, todo.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = todos.complete(owner, todo.id).await.unwrap();

        assert!(first.completed_at.is_some());
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn completed_list_is_newest_first() {
        let todos = service();
        let owner = UserId::new();

        let mut ids = Vec::new();
        for title in ["t1", "t2", "t3"] {
            ids.push(todos.create(owner, &form(title, "")).await.unwrap().id);
        }
        for id in &ids {
            todos.complete(owner, *id).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let titles: Vec<_> = todos
            .list_completed(owner)
            .await
            .into_iter()
            .map(|todo| todo.title)
            .collect();
        assert_eq!(titles, ["t3", "t2", "t1"]);
        assert!(todos.list_open(owner).await.is_empty());
    }

    #[tokio::test]
    async fn open_list_keeps_creation_order() {
        let todos = service();
        let owner = UserId::new();

        for title in ["a", "b", "c"] {
            todos.create(owner, &form(title, "")).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let titles: Vec<_> = todos
            .list_open(owner)
            .await
            .into_iter()
            .map(|todo| todo.title)
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn update_round_trip() {
        let todos = service();
        let owner = UserId::new();
        let todo = todos.create(owner, &form("Buy milk", "")).await.unwrap();

        todos
            .update(owner, todo.id, &form("Buy oat milk", "two cartons"))
            .await
            .unwrap();

        let stored = todos.get(owner, todo.id).await.unwrap();
        assert_eq!(stored.title, "Buy oat milk");
        assert_eq!(stored.memo.as_deref(), Some("two cartons"));
        assert_eq!(stored.created_at, todo.created_at);
    }

    #[tokio::test]
    async fn failed_update_keeps_original() {
        let todos = service();
        let owner = UserId::new();
        let todo = todos.create(owner, &form("Buy milk", "semi")).await.unwrap();

        let err = todos
            .update(owner, todo.id, &form("", "changed"))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));

        assert_eq!(todos.get(owner, todo.id).await.unwrap(), todo);
    }

    #[tokio::test]
    async fn update_of_missing_todo_is_not_found() {
        let todos = service();

        let err = todos
            .update(UserId::new(), TodoId::new(), &form("", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::NotFound));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let todos = service();
        let owner = UserId::new();
        let todo = todos.create(owner, &form("Buy milk", "")).await.unwrap();

        todos.delete(owner, todo.id).await.unwrap();

        assert!(matches!(todos.get(owner, todo.id).await, Err(TodoError::NotFound)));
        assert!(matches!(
            todos.delete(owner, todo.id).await,
            Err(TodoError::NotFound)
        ));
    }
}
