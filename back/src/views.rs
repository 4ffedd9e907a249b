//! HTML pages.
//!
//! Pages are plain strings assembled around a shared layout. Anything that
//! came from a user goes through [`escape`].

use std::fmt::Write;

use chrono::{DateTime, Utc};
use tickbox_api::v1::{FieldErrors, SignupForm, Todo, TodoForm};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, user: Option<&str>, body: &str) -> String {
    let nav = match user {
        Some(username) => format!(
            r#"<span>Logged in as {}</span>
<a href="/todos">Current</a>
<a href="/todos/completed">Completed</a>
<a href="/todos/new">Create</a>
<form method="post" action="/logout" class="inline"><button type="submit">Logout</button></form>"#,
            escape(username)
        ),
        None => String::from(
            r#"<a href="/signup">Sign up</a>
<a href="/login">Login</a>"#,
        ),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Tickbox</title>
</head>
<body>
<nav><a href="/">Tickbox</a>
{nav}
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn form_errors(errors: &FieldErrors) -> String {
    let mut out = String::new();
    for message in errors.non_field() {
        let _ = writeln!(out, r#"<p class="error">{}</p>"#, escape(message));
    }
    out
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
    let mut out = String::new();
    for message in errors.for_field(field) {
        let _ = writeln!(out, r#"<p class="error">{}</p>"#, escape(message));
    }
    out
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn home() -> String {
    page(
        "Tickbox",
        None,
        r#"<p>Keep track of the things you need to do.</p>
<p><a href="/signup">Sign up</a> or <a href="/login">log in</a> to get started.</p>"#,
    )
}

pub fn signup(form: &SignupForm, errors: &FieldErrors) -> String {
    let body = format!(
        r#"{form_errors}<form method="post" action="/signup">
<label>Username <input name="username" value="{username}" maxlength="150" required></label>
{username_errors}<label>Password <input type="password" name="password1" required></label>
{password_errors}<label>Password confirmation <input type="password" name="password2" required></label>
<button type="submit">Sign up</button>
</form>"#,
        form_errors = form_errors(errors),
        username = escape(&form.username),
        username_errors = field_errors(errors, "username"),
        password_errors = field_errors(errors, "password1"),
    );

    page("Sign up", None, &body)
}

pub fn login(username: &str, error: Option<&str>) -> String {
    let error = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .unwrap_or_default();

    let body = format!(
        r#"{error}<form method="post" action="/login">
<label>Username <input name="username" value="{username}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Login</button>
</form>"#,
        username = escape(username),
    );

    page("Login", None, &body)
}

fn todo_title(todo: &Todo) -> String {
    let title = escape(&todo.title);
    if todo.important {
        format!("<strong>{title}</strong>")
    } else {
        title
    }
}

pub fn current_todos(user: &str, todos: &[Todo]) -> String {
    let mut body = String::new();

    if todos.is_empty() {
        body.push_str(r#"<p>Looks like you don't have any todos! <a href="/todos/new">Create one</a>.</p>"#);
    } else {
        body.push_str("<ul>\n");
        for todo in todos {
            let memo = todo
                .memo
                .as_deref()
                .map(|memo| format!(" - {}", escape(memo)))
                .unwrap_or_default();
            let _ = writeln!(
                body,
                r#"<li><a href="/todos/{id}">{title}</a>{memo}</li>"#,
                id = todo.id,
                title = todo_title(todo),
            );
        }
        body.push_str("</ul>\n");
    }

    page(
        &format!("Current Todos ({})", todos.len()),
        Some(user),
        &body,
    )
}

pub fn completed_todos(user: &str, todos: &[Todo]) -> String {
    let mut body = String::new();

    if todos.is_empty() {
        body.push_str("<p>Nothing completed yet.</p>");
    } else {
        body.push_str("<ul>\n");
        for todo in todos {
            let completed = todo
                .completed_at
                .as_ref()
                .map(timestamp)
                .unwrap_or_default();
            let _ = writeln!(
                body,
                r#"<li><a href="/todos/{id}">{title}</a> - completed {completed}</li>"#,
                id = todo.id,
                title = todo_title(todo),
            );
        }
        body.push_str("</ul>\n");
    }

    page("Completed Todos", Some(user), &body)
}

fn todo_fields(form: &TodoForm, errors: &FieldErrors) -> String {
    let checked = if form.is_important() { " checked" } else { "" };

    format!(
        r#"{form_errors}<label>Title <input name="title" value="{title}" maxlength="100" required></label>
{title_errors}<label>Memo <textarea name="memo">{memo}</textarea></label>
<label><input type="checkbox" name="important"{checked}> Important</label>
"#,
        form_errors = form_errors(errors),
        title = escape(&form.title),
        title_errors = field_errors(errors, "title"),
        memo = escape(&form.memo),
    )
}

pub fn create_todo(user: &str, form: &TodoForm, errors: &FieldErrors) -> String {
    let body = format!(
        r#"<form method="post" action="/todos/new">
{fields}<button type="submit">Save</button>
</form>"#,
        fields = todo_fields(form, errors),
    );

    page("New Todo", Some(user), &body)
}

pub fn view_todo(user: &str, todo: &Todo, form: &TodoForm, errors: &FieldErrors) -> String {
    let mut body = format!(
        r#"<p>Created {created}</p>
<form method="post" action="/todos/{id}">
{fields}<button type="submit">Save</button>
</form>
"#,
        created = timestamp(&todo.created_at),
        id = todo.id,
        fields = todo_fields(form, errors),
    );

    match &todo.completed_at {
        Some(at) => {
            let _ = writeln!(body, "<p>Completed {}</p>", timestamp(at));
        }
        None => {
            let _ = writeln!(
                body,
                r#"<form method="post" action="/todos/{}/complete"><button type="submit">Complete</button></form>"#,
                todo.id
            );
        }
    }

    let _ = writeln!(
        body,
        r#"<form method="post" action="/todos/{}/delete"><button type="submit">Delete</button></form>"#,
        todo.id
    );

    page(&todo.title, Some(user), &body)
}

pub fn not_found() -> String {
    page(
        "Not found",
        None,
        r#"<p>The page you asked for does not exist.</p><p><a href="/todos">Back to your todos</a></p>"#,
    )
}

pub fn server_error() -> String {
    page(
        "Something went wrong",
        None,
        "<p>The server could not complete your request. Please try again.</p>",
    )
}

#[cfg(test)]
mod tests {
    use tickbox_api::v1::{TodoDraft, UserId};

    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn lists_escape_titles_and_mark_important() {
        let todo = Todo::new(
            UserId::new(),
            TodoDraft {
                title: String::from("<b>milk</b>"),
                memo: None,
                important: true,
            },
        );

        let html = current_todos("alice", &[todo]);
        assert!(html.contains("<strong>&lt;b&gt;milk&lt;/b&gt;</strong>"));
        assert!(html.contains("Current Todos (1)"));
    }

    #[test]
    fn forms_show_field_errors() {
        let mut errors = FieldErrors::new();
        errors.field("title", "This field is required.");

        let html = create_todo("alice", &TodoForm::default(), &errors);
        assert!(html.contains(r#"<p class="error">This field is required.</p>"#));
    }
}
