use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/activities/:id", get(handlers::activity_page))
        .route("/api/users", post(handlers::create_user))
        .route(
            "/api/activities",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route("/api/activities/:id", get(handlers::get_activity))
        .route("/api/activities/:id/replies", get(handlers::list_replies))
        .route("/api/replies", post(handlers::create_reply))
        .route(
            "/api/likes",
            post(handlers::join_activity).delete(handlers::leave_activity),
        )
        .route(
            "/api/time",
            get(handlers::get_time)
                .post(handlers::select_time)
                .delete(handlers::unselect_time),
        )
        .route("/api/info", delete(handlers::delete_info))
        .with_state(state)
}
