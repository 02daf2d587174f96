use crate::errors::StoreError;
use crate::models::{
    MealEntry, NewMeal, NewWeight, NewWorkout, RecordKind, StoreData, WeightSample, WorkoutEntry,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// A persisted record of one kind, tied to its collection in [`StoreData`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Draft: Send + 'static;

    const KIND: RecordKind;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn from_draft(id: Uuid, created_at: DateTime<Utc>, draft: Self::Draft) -> Self;
    fn collection(data: &StoreData) -> &Vec<Self>;
    fn collection_mut(data: &mut StoreData) -> &mut Vec<Self>;
}

impl Record for WorkoutEntry {
    type Draft = NewWorkout;

    const KIND: RecordKind = RecordKind::Workout;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, created_at: DateTime<Utc>, draft: NewWorkout) -> Self {
        Self {
            id,
            exercise_name: draft.exercise_name.trim().to_string(),
            duration: draft.duration,
            calories: draft.calories,
            created_at,
        }
    }

    fn collection(data: &StoreData) -> &Vec<Self> {
        &data.workouts
    }

    fn collection_mut(data: &mut StoreData) -> &mut Vec<Self> {
        &mut data.workouts
    }
}

impl Record for MealEntry {
    type Draft = NewMeal;

    const KIND: RecordKind = RecordKind::Meal;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, created_at: DateTime<Utc>, draft: NewMeal) -> Self {
        Self {
            id,
            meal_name: draft.meal_name.trim().to_string(),
            calories: draft.calories,
            created_at,
        }
    }

    fn collection(data: &StoreData) -> &Vec<Self> {
        &data.meals
    }

    fn collection_mut(data: &mut StoreData) -> &mut Vec<Self> {
        &mut data.meals
    }
}

impl Record for WeightSample {
    type Draft = NewWeight;

    const KIND: RecordKind = RecordKind::Weight;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, created_at: DateTime<Utc>, draft: NewWeight) -> Self {
        Self {
            id,
            weight: draft.weight,
            created_at,
        }
    }

    fn collection(data: &StoreData) -> &Vec<Self> {
        &data.weights
    }

    fn collection_mut(data: &mut StoreData) -> &mut Vec<Self> {
        &mut data.weights
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

/// Range filter and ordering applied to a single record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordQuery {
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// `None` keeps insertion order.
    pub order: Option<SortOrder>,
}

impl RecordQuery {
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn apply<R: Record>(&self, records: &[R]) -> Vec<R> {
        let mut matched: Vec<R> = records
            .iter()
            .filter(|record| self.since.is_none_or(|since| record.created_at() >= since))
            .cloned()
            .collect();

        match self.order {
            Some(SortOrder::Asc) => matched.sort_by_key(|record| record.created_at()),
            Some(SortOrder::Desc) => {
                matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()))
            }
            None => {}
        }
        matched
    }
}

/// Query/insert boundary of the record store. The store assigns identifiers
/// and creation timestamps.
pub trait RecordStore: Send + Sync {
    fn query<R: Record>(
        &self,
        query: RecordQuery,
    ) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;

    fn insert<R: Record>(
        &self,
        draft: R::Draft,
    ) -> impl Future<Output = Result<R, StoreError>> + Send;
}

/// Record store kept in memory and mirrored to a JSON file after every insert.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::with_data(path, data)
    }

    pub fn with_data(path: PathBuf, data: StoreData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn counts(&self) -> (usize, usize, usize) {
        let data = self.data.lock().await;
        (data.workouts.len(), data.meals.len(), data.weights.len())
    }
}

impl RecordStore for JsonFileStore {
    async fn query<R: Record>(&self, query: RecordQuery) -> Result<Vec<R>, StoreError> {
        let data = self.data.lock().await;
        Ok(query.apply(R::collection(&data)))
    }

    async fn insert<R: Record>(&self, draft: R::Draft) -> Result<R, StoreError> {
        let mut data = self.data.lock().await;

        // Timestamps never run backwards within a collection, even if the
        // wall clock does.
        let now = Utc::now();
        let created_at = R::collection(&data)
            .iter()
            .map(|record| record.created_at())
            .max()
            .filter(|latest| *latest > now)
            .unwrap_or(now);

        let record = R::from_draft(Uuid::new_v4(), created_at, draft);
        R::collection_mut(&mut data).push(record.clone());

        if let Err(err) = persist_data(&self.path, &data).await {
            R::collection_mut(&mut data).pop();
            return Err(err);
        }

        debug!(kind = %R::KIND, id = %record.id(), "record inserted");
        Ok(record)
    }
}

/// Loads the store file. A missing file starts empty; a file that cannot be
/// read or parsed is moved aside first so the next insert cannot overwrite it.
pub async fn load_data(path: &Path) -> StoreData {
    let reason = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => return data,
            Err(err) => format!("failed to parse record store {}: {err}", path.display()),
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("record store {} not found, starting empty", path.display());
            return StoreData::default();
        }
        Err(err) => format!("failed to read record store {}: {err}", path.display()),
    };
    error!("{reason}");

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.f");
    let aside = sibling_path(path, &format!("corrupt-{stamp}"));
    match fs::rename(path, &aside).await {
        Ok(()) => warn!("moved unreadable record store to {}", aside.display()),
        Err(err) => error!(
            "failed to move unreadable record store to {}: {err}",
            aside.display()
        ),
    }
    StoreData::default()
}

/// Writes to a temporary sibling and renames it over the store, so a crash
/// mid-write leaves the previous file intact.
pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let temp_path = sibling_path(path, "tmp");
    fs::write(&temp_path, payload).await?;
    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err.into());
    }
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("caltrack_store_{tag}_{}_{nanos}.json", std::process::id()));
        path
    }

    fn meal(name: &str, calories: u32) -> NewMeal {
        NewMeal {
            meal_name: name.into(),
            calories: Some(calories),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_monotonic_timestamps() {
        let path = temp_path("insert");
        let store = JsonFileStore::open(path.clone()).await;

        let first: MealEntry = store.insert(meal("Oatmeal", 350)).await.unwrap();
        let second: MealEntry = store.insert(meal("Salad", 420)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.created_at >= first.created_at);
        assert_eq!(second.meal_name, "Salad");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn insert_never_goes_behind_existing_records() {
        let path = temp_path("future");
        let future = Utc::now() + Duration::hours(2);
        let data = StoreData {
            weights: vec![WeightSample {
                id: Uuid::new_v4(),
                weight: Some(71.0),
                created_at: future,
            }],
            ..StoreData::default()
        };
        let store = JsonFileStore::with_data(path.clone(), data);

        let sample: WeightSample = store
            .insert(NewWeight { weight: Some(70.4) })
            .await
            .unwrap();
        assert_eq!(sample.created_at, future);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn records_survive_reload() {
        let path = temp_path("reload");
        let store = JsonFileStore::open(path.clone()).await;
        let inserted: WorkoutEntry = store
            .insert(NewWorkout {
                exercise_name: " Running ".into(),
                duration: Some(30),
                calories: Some(280),
            })
            .await
            .unwrap();
        assert_eq!(inserted.exercise_name, "Running");

        let reopened = JsonFileStore::open(path.clone()).await;
        let workouts: Vec<WorkoutEntry> = reopened.query(RecordQuery::default()).await.unwrap();
        assert_eq!(workouts, vec![inserted]);

        let _ = std::fs::remove_file(path);
    }

    fn set_aside_files(path: &Path) -> Vec<PathBuf> {
        let prefix = format!("{}.corrupt-", path.file_name().unwrap().to_string_lossy());
        std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|candidate| {
                candidate
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
            })
            .collect()
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStore::open(path.clone()).await;
        assert_eq!(store.counts().await, (0, 0, 0));

        for aside in set_aside_files(&path) {
            let _ = std::fs::remove_file(aside);
        }
    }

    #[tokio::test]
    async fn corrupt_file_survives_next_insert() {
        let path = temp_path("truncated");
        let truncated = br#"{"workouts":[],"meals":[{"id":"00000000-0000-0000-0000-000000000000","meal_name":"Old","#;
        std::fs::write(&path, truncated).unwrap();

        let store = JsonFileStore::open(path.clone()).await;
        let _: MealEntry = store.insert(meal("New", 500)).await.unwrap();

        let asides = set_aside_files(&path);
        assert_eq!(asides.len(), 1);
        assert_eq!(std::fs::read(&asides[0]).unwrap(), truncated.to_vec());

        let reopened = JsonFileStore::open(path.clone()).await;
        let meals: Vec<MealEntry> = reopened.query(RecordQuery::default()).await.unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].meal_name, "New");

        let _ = std::fs::remove_file(&asides[0]);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn persist_replaces_file_without_leftovers() {
        let path = temp_path("atomic");
        let store = JsonFileStore::open(path.clone()).await;
        let _: MealEntry = store.insert(meal("Toast", 180)).await.unwrap();
        let _: MealEntry = store.insert(meal("Soup", 240)).await.unwrap();

        assert!(!sibling_path(&path, "tmp").exists());
        let on_disk: StoreData = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.meals.len(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn failed_write_rolls_back_insert() {
        let mut path = temp_path("missing_dir");
        path.push("nested/store.json");
        let store = JsonFileStore::open(path).await;

        let result: Result<MealEntry, _> = store.insert(meal("Soup", 200)).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.counts().await, (0, 0, 0));
    }

    #[test]
    fn query_filters_and_orders() {
        let base = DateTime::parse_from_rfc3339("2026-01-05T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let samples: Vec<WeightSample> = [(2, 70.5), (0, 71.0), (1, 70.8)]
            .into_iter()
            .map(|(day, weight)| WeightSample {
                id: Uuid::new_v4(),
                weight: Some(weight),
                created_at: base + Duration::days(day),
            })
            .collect();

        let ascending = RecordQuery::default().order(SortOrder::Asc).apply(&samples);
        let weights: Vec<_> = ascending.iter().filter_map(|s| s.weight).collect();
        assert_eq!(weights, vec![71.0, 70.8, 70.5]);

        let recent = RecordQuery::default()
            .since(base + Duration::days(1))
            .order(SortOrder::Desc)
            .apply(&samples);
        let weights: Vec<_> = recent.iter().filter_map(|s| s.weight).collect();
        assert_eq!(weights, vec![70.5, 70.8]);

        let unordered = RecordQuery::default().apply(&samples);
        assert_eq!(unordered, samples);
    }
}
