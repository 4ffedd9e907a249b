use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{accounts::AccountError, store::StoreError, todos::TodoError, views};

/// Failures that end a request with an error page. Form validation errors
/// never get here; handlers re-render the form instead.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Internal(eyre::Report),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(views::not_found())).into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("request failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::server_error()),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound => AppError::NotFound,
            err => AppError::Internal(err.into()),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        AppError::Internal(err.into())
    }
}
