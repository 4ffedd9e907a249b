//! Persistent storage for users and todos.
//!
//! Everything lives in memory behind one lock and every change is written
//! through to a RON file before the call returns. A failed write rolls the
//! in-memory change back, so memory and disk never disagree.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickbox_api::v1::{Todo, TodoId, User, UserId};
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    #[error("failed to access data file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read data file: {0}")]
    Decode(#[from] ron::error::SpannedError),

    #[error("failed to write data file: {0}")]
    Encode(#[from] ron::Error),
}

#[derive(Clone, Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    todos: HashMap<TodoId, Todo>,
}

#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl Store {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Opens the data file at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let tables = match fs::File::open(&path) {
            Ok(file) => match ron::de::from_reader(file)? {
                DataOwned::V1 { users, todos } => Tables { users, todos },
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Tables::default(),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            path = %path.display(),
            users = tables.users.len(),
            todos = tables.todos.len(),
            "opened data file"
        );

        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    pub async fn insert(&self, todo: Todo) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let id = todo.id;
        tables.todos.insert(id, todo);

        if let Err(err) = self.flush(&tables).await {
            tables.todos.remove(&id);
            return Err(err);
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: TodoId) -> Option<Todo> {
        self.tables.lock().await.todos.get(&id).cloned()
    }

    /// Open todos come back in creation order, completed ones most recently
    /// completed first.
    pub async fn find_by_owner_and_status(&self, owner: UserId, is_completed: bool) -> Vec<Todo> {
        let tables = self.tables.lock().await;
        let mut todos: Vec<_> = tables
            .todos
            .values()
            .filter(|todo| todo.owner == owner && todo.is_completed() == is_completed)
            .cloned()
            .collect();

        if is_completed {
            todos.sort_unstable_by(|a, b| {
                (a.completed_at, a.id).cmp(&(b.completed_at, b.id)).reverse()
            });
        } else {
            todos.sort_unstable_by_key(|todo| (todo.created_at, todo.id));
        }

        todos
    }

    /// Runs `change` against the stored todo while holding the lock and
    /// persists the result if `change` reports a modification.
    ///
    /// Returns `None` if no todo has this id.
    pub async fn update<F>(&self, id: TodoId, change: F) -> Result<Option<Todo>, StoreError>
    where
        F: FnOnce(&mut Todo) -> bool,
    {
        let mut tables = self.tables.lock().await;
        let Some(todo) = tables.todos.get_mut(&id) else {
            return Ok(None);
        };

        let before = todo.clone();
        if !change(todo) {
            return Ok(Some(before));
        }
        let after = todo.clone();

        if let Err(err) = self.flush(&tables).await {
            tables.todos.insert(id, before);
            return Err(err);
        }

        Ok(Some(after))
    }

    /// Removes the todo permanently, returning it if it existed.
    pub async fn delete(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(todo) = tables.todos.remove(&id) else {
            return Ok(None);
        };

        if let Err(err) = self.flush(&tables).await {
            tables.todos.insert(id, todo);
            return Err(err);
        }

        Ok(Some(todo))
    }

    pub async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        let id = user.id;
        tables.users.insert(id, user);

        if let Err(err) = self.flush(&tables).await {
            tables.users.remove(&id);
            return Err(err);
        }

        Ok(())
    }

    pub async fn find_user(&self, id: UserId) -> Option<User> {
        self.tables.lock().await.users.get(&id).cloned()
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        let tables = self.tables.lock().await;
        tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Serializes under the caller's lock; the file write itself runs on the
    /// blocking pool.
    async fn flush(&self, tables: &Tables) -> Result<(), StoreError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let data = DataBorrowed::V1 {
            users: &tables.users,
            todos: &tables.todos,
        };
        let text = ron::ser::to_string_pretty(&data, Default::default())?;

        tokio::task::spawn_blocking(move || write_replace(&path, text.as_bytes()))
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))??;
        Ok(())
    }
}

/// Writes `bytes` next to `path` and renames over it, so a crash mid-write
/// never leaves a truncated data file.
fn write_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("ron.tmp");

    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;

    fs::rename(&tmp, path)
}

#[derive(Serialize)]
enum DataBorrowed<'a> {
    V1 {
        users: &'a HashMap<UserId, User>,
        todos: &'a HashMap<TodoId, Todo>,
    },
}

#[derive(Deserialize)]
enum DataOwned {
    V1 {
        users: HashMap<UserId, User>,
        todos: HashMap<TodoId, Todo>,
    },
}
