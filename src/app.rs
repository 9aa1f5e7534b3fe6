use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/hunts", post(handlers::submit_hunt))
        .route("/hunts/:id/delete", post(handlers::delete_hunt))
        .route("/season", post(handlers::update_season))
        .route("/incognito", post(handlers::update_incognito))
        .route(
            "/api/hunts",
            get(handlers::list_hunts).post(handlers::create_hunt),
        )
        .route("/api/hunts/:id", delete(handlers::remove_hunt))
        .route(
            "/api/season",
            get(handlers::get_season).put(handlers::put_season),
        )
        .route(
            "/api/incognito",
            get(handlers::get_incognito).put(handlers::put_incognito),
        )
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/weather", get(handlers::get_weather))
        .with_state(state)
}
