use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tickbox_api::v1::{FieldErrors, LoginForm, SignupForm, TodoForm, TodoId, UserId};

use crate::{
    accounts::AccountError,
    auth::{self, CurrentUser},
    error::AppError,
    todos::TodoError,
    views, AppState,
};

const TODOS_PATH: &str = "/todos";
const USERNAME_TAKEN: &str = "That username has already been taken.";
const LOGIN_FAILED: &str = "Your username and password did not match";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/todos", get(current_todos))
        .route("/todos/completed", get(completed_todos))
        .route("/todos/new", get(create_todo_page).post(create_todo))
        .route("/todos/:id", get(view_todo).post(update_todo))
        .route("/todos/:id/complete", post(complete_todo))
        .route("/todos/:id/delete", post(delete_todo))
        .fallback(not_found)
}

async fn home() -> Html<String> {
    Html(views::home())
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn signup_page() -> Html<String> {
    Html(views::signup(&SignupForm::default(), &FieldErrors::new()))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let errors = match state.accounts.signup(&form).await {
        Ok(user) => return Ok(start_session(&state, &headers, user.id).await),
        Err(AccountError::Validation(errors)) => errors,
        Err(AccountError::DuplicateUsername) => {
            let mut errors = FieldErrors::new();
            errors.form(USERNAME_TAKEN);
            errors
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Html(views::signup(&form, &errors)).into_response())
}

async fn login_page() -> Html<String> {
    Html(views::login("", None))
}

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.accounts.authenticate(&form).await {
        Ok(user) => Ok(start_session(&state, &headers, user.id).await),
        Err(AccountError::AuthenticationFailure) => {
            Ok(Html(views::login(&form.username, Some(LOGIN_FAILED))).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Replaces whatever session the request carried with a fresh one.
async fn start_session(state: &AppState, headers: &HeaderMap, user: UserId) -> Response {
    if let Some(previous) = auth::session_cookie(headers) {
        state.sessions.logout(&previous).await;
    }

    let token = state.sessions.login(user).await;
    let cookie = auth::set_session_cookie(&token, state.sessions.ttl(), state.secure_cookies);
    ([(header::SET_COOKIE, cookie)], Redirect::to(TODOS_PATH)).into_response()
}

async fn logout(State(state): State<Arc<AppState>>, user: CurrentUser) -> Response {
    state.sessions.logout(&user.token).await;

    let cookie = auth::clear_session_cookie(state.secure_cookies);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

async fn current_todos(State(state): State<Arc<AppState>>, user: CurrentUser) -> Html<String> {
    let todos = state.todos.list_open(user.id).await;
    Html(views::current_todos(&user.username, &todos))
}

async fn completed_todos(State(state): State<Arc<AppState>>, user: CurrentUser) -> Html<String> {
    let todos = state.todos.list_completed(user.id).await;
    Html(views::completed_todos(&user.username, &todos))
}

async fn create_todo_page(user: CurrentUser) -> Html<String> {
    Html(views::create_todo(
        &user.username,
        &TodoForm::default(),
        &FieldErrors::new(),
    ))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    match state.todos.create(user.id, &form).await {
        Ok(_) => Ok(Redirect::to(TODOS_PATH).into_response()),
        Err(TodoError::Validation(errors)) => Ok((
            StatusCode::BAD_REQUEST,
            Html(views::create_todo(&user.username, &form, &errors)),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

fn todo_id(id: &str) -> Result<TodoId, AppError> {
    TodoId::parse(id).ok_or(AppError::NotFound)
}

async fn view_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let todo = state.todos.get(user.id, todo_id(&id)?).await?;

    Ok(Html(views::view_todo(
        &user.username,
        &todo,
        &todo.to_form(),
        &FieldErrors::new(),
    )))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    let id = todo_id(&id)?;

    match state.todos.update(user.id, id, &form).await {
        Ok(_) => Ok(Redirect::to(TODOS_PATH).into_response()),
        Err(TodoError::Validation(errors)) => {
            let todo = state.todos.get(user.id, id).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                Html(views::view_todo(&user.username, &todo, &form, &errors)),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn complete_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.todos.complete(user.id, todo_id(&id)?).await?;
    Ok(Redirect::to(TODOS_PATH))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.todos.delete(user.id, todo_id(&id)?).await?;
    Ok(Redirect::to(TODOS_PATH))
}
