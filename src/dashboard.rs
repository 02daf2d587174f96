use crate::errors::StoreError;
use crate::models::{
    DashboardResponse, MealEntry, RecordKind, TodayResponse, WeightSample, WorkoutEntry,
};
use crate::motivation::MotivationGenerator;
use crate::stats::{
    Window, compute_daily_summary_at, compute_series_at, compute_weekly_at, earliest_day,
};
use crate::store::{RecordQuery, RecordStore, SortOrder};
use chrono::{DateTime, Days, Duration, Local, NaiveDate, TimeZone, Utc};
use tracing::{debug, error};

pub async fn load_dashboard<S: RecordStore>(
    store: &S,
    window: Window,
    weeks: usize,
    motivation: &dyn MotivationGenerator,
) -> DashboardResponse {
    load_dashboard_at(
        store,
        window,
        weeks,
        motivation,
        Local::now().date_naive(),
        &Local,
    )
    .await
}

/// Fetches the three record kinds concurrently and runs the aggregation over
/// the snapshot. A failed fetch is logged and treated as an empty collection,
/// so this never fails.
pub async fn load_dashboard_at<S, Tz>(
    store: &S,
    window: Window,
    weeks: usize,
    motivation: &dyn MotivationGenerator,
    today: NaiveDate,
    tz: &Tz,
) -> DashboardResponse
where
    S: RecordStore,
    Tz: TimeZone + Sync,
{
    let query = fetch_query(window, weeks, today, tz);

    let (workouts, meals, weights) = tokio::join!(
        store.query::<WorkoutEntry>(query),
        store.query::<MealEntry>(query),
        store.query::<WeightSample>(query),
    );
    let workouts = or_empty(workouts, RecordKind::Workout);
    let meals = or_empty(meals, RecordKind::Meal);
    let weights = or_empty(weights, RecordKind::Weight);
    debug!(
        workouts = workouts.len(),
        meals = meals.len(),
        weights = weights.len(),
        %window,
        "dashboard snapshot fetched"
    );

    let window_days = window.resolve_days(earliest_day(&workouts, &meals, &weights, tz), today);
    let series = compute_series_at(&workouts, &meals, &weights, window_days, today, tz);
    let weekly_totals = compute_weekly_at(&workouts, &meals, weeks, today, tz);
    let summary = compute_daily_summary_at(&workouts, &meals, &weights, today, tz);

    DashboardResponse {
        date: today.to_string(),
        window: window.to_string(),
        motivation: motivation.generate(&summary),
        summary,
        calories_chart: series.calories,
        workouts_chart: series.workouts,
        weight_chart: series.weight,
        weekly_totals,
    }
}

pub async fn load_today<S: RecordStore>(store: &S) -> TodayResponse {
    load_today_at(store, Local::now().date_naive(), &Local).await
}

/// Today's totals only: meals and workouts since local midnight, and the
/// newest weight sample on record.
pub async fn load_today_at<S, Tz>(store: &S, today: NaiveDate, tz: &Tz) -> TodayResponse
where
    S: RecordStore,
    Tz: TimeZone + Sync,
{
    let mut since_midnight = RecordQuery::default();
    if let Some(since) = local_midnight(today, tz) {
        since_midnight = since_midnight.since(since);
    }

    let (workouts, meals, weights) = tokio::join!(
        store.query::<WorkoutEntry>(since_midnight),
        store.query::<MealEntry>(since_midnight),
        store.query::<WeightSample>(RecordQuery::default()),
    );
    let workouts = or_empty(workouts, RecordKind::Workout);
    let meals = or_empty(meals, RecordKind::Meal);
    let weights = or_empty(weights, RecordKind::Weight);

    TodayResponse {
        date: today.to_string(),
        summary: compute_daily_summary_at(&workouts, &meals, &weights, today, tz),
    }
}

/// Lower bound covering the last `days` calendar days including `today`.
/// `None` when the start falls outside the representable date range.
pub fn days_back_since<Tz: TimeZone>(
    days: u32,
    today: NaiveDate,
    tz: &Tz,
) -> Option<DateTime<Utc>> {
    let start = today.checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))?;
    local_midnight(start, tz)
}

/// One lower bound for all three collections: the earlier of the window start
/// and the first weekly bucket, at local midnight.
fn fetch_query<Tz: TimeZone>(
    window: Window,
    weeks: usize,
    today: NaiveDate,
    tz: &Tz,
) -> RecordQuery {
    let query = RecordQuery::default().order(SortOrder::Asc);
    let Some(window_start) = window.start_day(today) else {
        return query;
    };

    let weeks_back = Duration::weeks(weeks.saturating_sub(1) as i64) + Duration::days(6);
    let weekly_start = today.checked_sub_signed(weeks_back).unwrap_or(NaiveDate::MIN);
    let start = window_start.min(weekly_start);

    match local_midnight(start, tz) {
        Some(since) => query.since(since),
        None => query,
    }
}

fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0)?;
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        // Midnight skipped by a DST jump; UTC midnight is close enough.
        .unwrap_or_else(|| naive.and_utc());
    Some(local)
}

fn or_empty<R>(result: Result<Vec<R>, StoreError>, kind: RecordKind) -> Vec<R> {
    match result {
        Ok(records) => records,
        Err(err) => {
            error!(%kind, "record fetch failed, continuing without it: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMeal, NewWeight, NewWorkout};
    use crate::motivation::FallbackMotivation;
    use crate::store::{JsonFileStore, Record};
    use uuid::Uuid;

    /// Store that serves fixed records and fails the listed kinds.
    struct FixtureStore {
        data: crate::models::StoreData,
        failing: Vec<RecordKind>,
    }

    impl RecordStore for FixtureStore {
        async fn query<R: Record>(&self, query: RecordQuery) -> Result<Vec<R>, StoreError> {
            if self.failing.contains(&R::KIND) {
                return Err(StoreError::Io(std::io::Error::other("store offline")));
            }
            Ok(query.apply(R::collection(&self.data)))
        }

        async fn insert<R: Record>(&self, _draft: R::Draft) -> Result<R, StoreError> {
            Err(StoreError::Io(std::io::Error::other("read only")))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
        day.and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    fn fixture(failing: Vec<RecordKind>) -> FixtureStore {
        let today = today();
        let mut data = crate::models::StoreData::default();
        data.workouts.push(WorkoutEntry {
            id: Uuid::new_v4(),
            exercise_name: "Swim".into(),
            duration: Some(40),
            calories: Some(200),
            created_at: at(today, 7),
        });
        data.meals.push(MealEntry {
            id: Uuid::new_v4(),
            meal_name: "Pasta".into(),
            calories: Some(300),
            created_at: at(today, 12),
        });
        data.weights.push(WeightSample {
            id: Uuid::new_v4(),
            weight: Some(70.5),
            created_at: at(today, 6),
        });
        FixtureStore { data, failing }
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_partial_dashboard() {
        let store = fixture(vec![RecordKind::Meal]);
        let dashboard =
            load_dashboard_at(&store, Window::Days(7), 8, &FallbackMotivation, today(), &Utc)
                .await;

        assert_eq!(dashboard.summary.calories_consumed, 0);
        assert_eq!(dashboard.summary.calories_burned, 200);
        assert_eq!(dashboard.summary.latest_weight, Some(70.5));
        assert_eq!(dashboard.calories_chart.len(), 7);
        assert_eq!(dashboard.weight_chart.len(), 1);
    }

    #[tokio::test]
    async fn all_fetches_failing_still_renders() {
        let store = fixture(vec![RecordKind::Workout, RecordKind::Meal, RecordKind::Weight]);
        let dashboard =
            load_dashboard_at(&store, Window::Days(3), 2, &FallbackMotivation, today(), &Utc)
                .await;

        assert_eq!(dashboard.summary, crate::models::DailySummary::default());
        assert_eq!(dashboard.calories_chart.len(), 3);
        assert!(dashboard.calories_chart.iter().all(|p| p.calories_in == 0));
        assert_eq!(dashboard.weekly_totals.len(), 2);
        assert!(dashboard.weight_chart.is_empty());
        assert!(!dashboard.motivation.is_empty());
    }

    #[tokio::test]
    async fn dashboard_reflects_inserted_records() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "caltrack_dashboard_{}_{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = JsonFileStore::open(path.clone()).await;
        let _: WorkoutEntry = store
            .insert(NewWorkout {
                exercise_name: "Row".into(),
                duration: Some(25),
                calories: Some(350),
            })
            .await
            .unwrap();
        let _: MealEntry = store
            .insert(NewMeal {
                meal_name: "Bowl".into(),
                calories: Some(650),
            })
            .await
            .unwrap();
        let _: WeightSample = store
            .insert(NewWeight { weight: Some(68.9) })
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let dashboard =
            load_dashboard_at(&store, Window::AllTime, 4, &FallbackMotivation, today, &Utc).await;

        assert_eq!(dashboard.window, "all");
        assert_eq!(dashboard.summary.workout_count, 1);
        assert_eq!(dashboard.summary.calories_burned, 350);
        assert_eq!(dashboard.summary.calories_consumed, 650);
        assert_eq!(dashboard.summary.latest_weight, Some(68.9));
        assert_eq!(dashboard.calories_chart.len(), 1);
        assert_eq!(dashboard.weekly_totals.last().unwrap().workout_count, 1);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn today_counts_only_todays_records() {
        let mut store = fixture(Vec::new());
        store.data.meals.push(MealEntry {
            id: Uuid::new_v4(),
            meal_name: "Leftovers".into(),
            calories: Some(900),
            created_at: at(today() - Duration::days(1), 20),
        });
        store.data.weights.push(WeightSample {
            id: Uuid::new_v4(),
            weight: Some(72.0),
            created_at: at(today() - Duration::days(30), 8),
        });

        let response = load_today_at(&store, today(), &Utc).await;
        assert_eq!(response.date, "2026-01-05");
        assert_eq!(response.summary.calories_consumed, 300);
        assert_eq!(response.summary.calories_burned, 200);
        assert_eq!(response.summary.workout_count, 1);
        assert_eq!(response.summary.latest_weight, Some(70.5));
    }

    #[tokio::test]
    async fn today_survives_failing_fetch() {
        let store = fixture(vec![RecordKind::Workout]);
        let response = load_today_at(&store, today(), &Utc).await;
        assert_eq!(response.summary.workout_count, 0);
        assert_eq!(response.summary.calories_consumed, 300);
    }

    #[test]
    fn days_back_starts_at_local_midnight() {
        let today = today();
        assert_eq!(days_back_since(1, today, &Utc), Some(at(today, 0)));
        assert_eq!(days_back_since(0, today, &Utc), Some(at(today, 0)));
        assert_eq!(
            days_back_since(7, today, &Utc),
            Some(at(today - Duration::days(6), 0))
        );
        assert_eq!(days_back_since(u32::MAX, today, &Utc), None);
    }

    #[test]
    fn fetch_bound_covers_window_and_weeks() {
        let today = today();
        let query = fetch_query(Window::Days(7), 1, today, &Utc);
        assert_eq!(query.since, Some(at(today - Duration::days(6), 0)));
        assert_eq!(query.order, Some(SortOrder::Asc));

        let query = fetch_query(Window::Days(3), 2, today, &Utc);
        assert_eq!(query.since, Some(at(today - Duration::days(13), 0)));

        assert_eq!(fetch_query(Window::AllTime, 8, today, &Utc).since, None);
    }
}
