//! Form input and its validation.
//!
//! Validation never touches storage or rendering: each form turns into
//! either a validated value or a list of [`FieldError`]s that the caller
//! shows next to the submitted input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TodoDraft;

pub const TITLE_MAX_CHARS: usize = 100;
pub const USERNAME_MAX_CHARS: usize = 150;

const REQUIRED: &str = "This field is required.";
const USERNAME_CHARS: &str = "@.+-_";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// `None` for errors that concern the form as a whole.
    pub field: Option<&'static str>,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("invalid input ({} error(s))", .0.len())]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: Some(field),
            message: message.into(),
        });
    }

    pub fn form(&mut self, message: impl Into<String>) {
        self.0.push(FieldError {
            field: None,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == Some(field))
            .map(|e| e.message.as_str())
    }

    pub fn non_field(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|e| e.field.is_none())
            .map(|e| e.message.as_str())
    }

    fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub memo: String,
    /// Checkbox value; browsers omit the field entirely when unchecked.
    #[serde(default)]
    pub important: Option<String>,
}

impl TodoForm {
    pub fn validate(&self) -> Result<TodoDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.field("title", REQUIRED);
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.field(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_CHARS} characters."),
            );
        }

        let memo = self.memo.trim();
        let memo = (!memo.is_empty()).then(|| memo.to_string());

        errors.finish(TodoDraft {
            title: title.to_string(),
            memo,
            important: is_checked(self.important.as_deref()),
        })
    }

    pub fn is_important(&self) -> bool {
        is_checked(self.important.as_deref())
    }
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true" | "1"))
}

/// Username and password that passed signup validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    pub const PASSWORD_MISMATCH: &'static str = "Your passwords did not match.";

    pub fn validate(&self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.field("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_CHARS {
            errors.field(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_CHARS} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || USERNAME_CHARS.contains(c))
        {
            errors.field(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if self.password1.is_empty() {
            errors.field("password1", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.form(Self::PASSWORD_MISMATCH);
        }

        errors.finish(NewAccount {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo_form(title: &str, memo: &str, important: Option<&str>) -> TodoForm {
        TodoForm {
            title: title.to_string(),
            memo: memo.to_string(),
            important: important.map(str::to_string),
        }
    }

    #[test]
    fn todo_title_is_required() {
        let errors = todo_form("   ", "", None).validate().unwrap_err();
        assert_eq!(errors.for_field("title").collect::<Vec<_>>(), [REQUIRED]);
    }

    #[test]
    fn todo_title_is_bounded() {
        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(todo_form(&long, "", None).validate().is_err());

        let exact = "é".repeat(TITLE_MAX_CHARS);
        assert!(todo_form(&exact, "", None).validate().is_ok());
    }

    #[test]
    fn todo_fields_are_normalised() {
        let draft = todo_form("  Buy milk ", "  ", Some("on")).validate().unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.memo, None);
        assert!(draft.important);

        let draft = todo_form("Buy milk", "2%", None).validate().unwrap();
        assert_eq!(draft.memo.as_deref(), Some("2%"));
        assert!(!draft.important);
    }

    #[test]
    fn signup_rejects_mismatched_passwords() {
        let form = SignupForm {
            username: "alice".into(),
            password1: "pw1".into(),
            password2: "pw2".into(),
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.non_field().collect::<Vec<_>>(),
            [SignupForm::PASSWORD_MISMATCH]
        );
    }

    #[test]
    fn signup_rejects_bad_usernames() {
        for username in ["", "has space", "semi;colon"] {
            let form = SignupForm {
                username: username.into(),
                password1: "pw".into(),
                password2: "pw".into(),
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.for_field("username").count(), 1, "{username:?}");
        }
    }

    #[test]
    fn signup_accepts_valid_input() {
        let form = SignupForm {
            username: "alice.b+todo@home".into(),
            password1: "pw1".into(),
            password2: "pw1".into(),
        };

        let account = form.validate().unwrap();
        assert_eq!(account.username, "alice.b+todo@home");
        assert_eq!(account.password, "pw1");
    }
}
