//! Todo resource handler.
//!
//! The todo domain itself lives elsewhere; this service only proves the
//! gate works end to end. The handler returns an empty, user-scoped
//! collection shaped like the real one.

use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::shared_types::ApiResponse;
use crate::session::SessionInfo;

#[derive(Debug, Serialize)]
pub struct TodoItem {
    // ---
    pub id: Uuid,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Serialize)]
pub struct TodoCollection {
    // ---
    pub owner: Uuid,
    pub todos: Vec<TodoItem>,
}

/// GET /api/todos
pub async fn list_todos(Extension(session): Extension<SessionInfo>) -> ApiResponse<TodoCollection> {
    ApiResponse {
        data: TodoCollection {
            owner: session.user_id,
            todos: Vec::new(),
        },
    }
}
