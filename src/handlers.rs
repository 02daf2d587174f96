use crate::dashboard::{days_back_since, load_dashboard, load_today};
use crate::errors::AppError;
use crate::events::{LONG_POLL_TIMEOUT, RefreshEvent};
use crate::models::{
    DashboardResponse, MealEntry, NewMeal, NewWeight, NewWorkout, TodayResponse, WeightSample,
    WorkoutEntry,
};
use crate::state::AppState;
use crate::stats::Window;
use crate::store::{Record, RecordQuery, RecordStore, SortOrder};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub window: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordListParams {
    pub days: Option<u32>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub struct ChangesParams {
    pub since: Option<u64>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let dashboard = dashboard_for(&state, state.config.window).await;
    Html(render_index(&dashboard))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    let window = match params.window.as_deref() {
        Some(value) => value
            .parse::<Window>()
            .map_err(|err| AppError::bad_request(err.to_string()))?,
        None => state.config.window,
    };

    Ok(Json(dashboard_for(&state, window).await))
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    Json(load_today(state.store.as_ref()).await)
}

pub async fn list_records<R: Record>(
    State(state): State<AppState>,
    Query(params): Query<RecordListParams>,
) -> Result<Json<Vec<R>>, AppError> {
    let mut query = RecordQuery::default();
    // Spans reaching past the earliest representable date return everything.
    if let Some(since) = params
        .days
        .and_then(|days| days_back_since(days, Local::now().date_naive(), &Local))
    {
        query = query.since(since);
    }
    if let Some(order) = params.order {
        query = query.order(order);
    }

    let records = state.store.query::<R>(query).await?;
    Ok(Json(records))
}

pub async fn create_workout(
    State(state): State<AppState>,
    Json(draft): Json<NewWorkout>,
) -> Result<(StatusCode, Json<WorkoutEntry>), AppError> {
    draft.validate().map_err(AppError::bad_request)?;
    insert_record::<WorkoutEntry>(&state, draft).await
}

pub async fn create_meal(
    State(state): State<AppState>,
    Json(draft): Json<NewMeal>,
) -> Result<(StatusCode, Json<MealEntry>), AppError> {
    draft.validate().map_err(AppError::bad_request)?;
    insert_record::<MealEntry>(&state, draft).await
}

pub async fn create_weight(
    State(state): State<AppState>,
    Json(draft): Json<NewWeight>,
) -> Result<(StatusCode, Json<WeightSample>), AppError> {
    draft.validate().map_err(AppError::bad_request)?;
    insert_record::<WeightSample>(&state, draft).await
}

pub async fn wait_for_changes(
    State(state): State<AppState>,
    Query(params): Query<ChangesParams>,
) -> Json<RefreshEvent> {
    let event = match params.since {
        Some(since) => state.refresh.wait_for_change(since, LONG_POLL_TIMEOUT).await,
        None => state.refresh.current(),
    };
    Json(event)
}

async fn insert_record<R: Record>(
    state: &AppState,
    draft: R::Draft,
) -> Result<(StatusCode, Json<R>), AppError> {
    let record = state.store.insert::<R>(draft).await?;
    let event = state.refresh.publish(R::KIND);
    info!(kind = %R::KIND, id = %record.id(), revision = event.revision, "record logged");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn dashboard_for(state: &AppState, window: Window) -> DashboardResponse {
    load_dashboard(
        state.store.as_ref(),
        window,
        state.config.weeks,
        state.motivation.as_ref(),
    )
    .await
}
