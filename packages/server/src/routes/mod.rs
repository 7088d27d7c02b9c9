use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/tasks", task_routes())
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::task::list_tasks).post(handlers::task::create_task),
        )
        .route("/{task_id}", get(handlers::task::get_task))
}
