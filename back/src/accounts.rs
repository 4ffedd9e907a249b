//! User registration and credential checks.

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use thiserror::Error;
use tickbox_api::v1::{FieldErrors, LoginForm, NewAccount, SignupForm, User, UserId};
use tracing::{info, warn};

use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),

    #[error("username is already taken")]
    DuplicateUsername,

    #[error("username and password did not match")]
    AuthenticationFailure,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => Self::DuplicateUsername,
            err => Self::Store(err),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccountService {
    store: Arc<Store>,
}

impl AccountService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<User, AccountError> {
        let NewAccount { username, password } = form.validate()?;

        if self.store.find_user_by_username(&username).await.is_some() {
            return Err(AccountError::DuplicateUsername);
        }

        let password_hash = blocking(move || hash_password(&password)).await??;
        let user = User {
            id: UserId::new(),
            username,
            password_hash,
            created_at: Utc::now(),
        };

        self.store.insert_user(user.clone()).await?;

        info!(user = %user.id, username = %user.username, "signed up");

        Ok(user)
    }

    pub async fn authenticate(&self, form: &LoginForm) -> Result<User, AccountError> {
        let password = form.password.clone();

        let Some(user) = self.store.find_user_by_username(form.username.trim()).await else {
            // unknown names pay the same argon2 cost as real ones
            blocking(move || verify_password(&password, unknown_user_hash())).await?;
            warn!(username = %form.username, "login for unknown user");
            return Err(AccountError::AuthenticationFailure);
        };

        let hash = user.password_hash.clone();
        if !blocking(move || verify_password(&password, &hash)).await? {
            warn!(user = %user.id, "login with wrong password");
            return Err(AccountError::AuthenticationFailure);
        }

        info!(user = %user.id, "logged in");

        Ok(user)
    }

    pub async fn user(&self, id: UserId) -> Option<User> {
        self.store.find_user(id).await
    }
}

// argon2 is deliberately slow, keep it off the async workers
async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, AccountError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| AccountError::Hash(err.to_string()))
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hash(err.to_string()))
}

/// Hash checked for logins naming no account.
fn unknown_user_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();

    HASH.get_or_init(|| {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(b"tickbox unknown user", &salt)
            .map(|hash| hash.to_string())
            .unwrap_or_default()
    })
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}
