pub mod form;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use form::{FieldError, FieldErrors, LoginForm, NewAccount, SignupForm, TodoForm};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id taken from a request path. Anything that is not a UUID
    /// yields `None`, which callers report as not found.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC formatted hash, only ever read by the account service.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Validated todo fields, produced by [`TodoForm::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub memo: Option<String>,
    pub important: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub owner: UserId,
    pub title: String,
    pub memo: Option<String>,
    pub important: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(owner: UserId, draft: TodoDraft) -> Self {
        Self {
            id: TodoId::new(),
            owner,
            title: draft.title,
            memo: draft.memo,
            important: draft.important,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Replaces the editable fields. Owner and timestamps are left alone.
    pub fn apply(&mut self, draft: TodoDraft) {
        self.title = draft.title;
        self.memo = draft.memo;
        self.important = draft.important;
    }

    /// Marks the todo completed at `at`, returning `false` if it already was.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.completed_at.is_some() {
            return false;
        }

        self.completed_at = Some(at);
        true
    }

    /// The todo rendered back into the shape of its edit form.
    pub fn to_form(&self) -> TodoForm {
        TodoForm {
            title: self.title.clone(),
            memo: self.memo.clone().unwrap_or_default(),
            important: self.important.then(|| String::from("on")),
        }
    }
}
