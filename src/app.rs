use crate::handlers;
use crate::models::{MealEntry, WeightSample, WorkoutEntry};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/today", get(handlers::get_today))
        .route(
            "/api/workouts",
            get(handlers::list_records::<WorkoutEntry>).post(handlers::create_workout),
        )
        .route(
            "/api/meals",
            get(handlers::list_records::<MealEntry>).post(handlers::create_meal),
        )
        .route(
            "/api/weights",
            get(handlers::list_records::<WeightSample>).post(handlers::create_weight),
        )
        .route("/api/changes", get(handlers::wait_for_changes))
        .with_state(state)
}
