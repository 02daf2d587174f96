use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Workout,
    Meal,
    Weight,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Workout => "workout",
            Self::Meal => "meal",
            Self::Weight => "weight",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: Uuid,
    #[serde(default)]
    pub exercise_name: String,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub calories: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    #[serde(default)]
    pub meal_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub calories: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub id: Uuid,
    /// Kilograms.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Everything the record store holds, in insertion order per kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    #[serde(default)]
    pub weights: Vec<WeightSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkout {
    #[serde(default)]
    pub exercise_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub calories: Option<u32>,
}

impl NewWorkout {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.exercise_name.trim().is_empty() {
            return Err("exercise_name is required");
        }
        require_positive(self.duration.map(f64::from), "duration must be at least 1 minute")?;
        require_positive(self.calories.map(f64::from), "calories must be at least 1")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeal {
    #[serde(default)]
    pub meal_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub calories: Option<u32>,
}

impl NewMeal {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.meal_name.trim().is_empty() {
            return Err("meal_name is required");
        }
        require_positive(self.calories.map(f64::from), "calories must be at least 1")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeight {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight: Option<f64>,
}

impl NewWeight {
    pub fn validate(&self) -> Result<(), &'static str> {
        require_positive(self.weight, "weight must be at least 1 kg")
    }
}

fn require_positive(value: Option<f64>, message: &'static str) -> Result<(), &'static str> {
    match value {
        Some(value) if value >= 1.0 => Ok(()),
        _ => Err(message),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub calories_consumed: u64,
    pub calories_burned: u64,
    pub workout_count: u64,
    /// `None` means no weight has been logged.
    pub latest_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaloriesPoint {
    pub date: String,
    pub calories_in: u64,
    pub calories_out: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPoint {
    pub date: String,
    pub workout_count: u64,
    pub calories_out: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPoint {
    pub date: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub calories_in: u64,
    pub calories_out: u64,
    pub workout_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub calories: Vec<CaloriesPoint>,
    pub workouts: Vec<WorkoutPoint>,
    pub weight: Vec<WeightPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub date: String,
    pub window: String,
    pub summary: DailySummary,
    pub calories_chart: Vec<CaloriesPoint>,
    pub workouts_chart: Vec<WorkoutPoint>,
    pub weight_chart: Vec<WeightPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub motivation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    pub date: String,
    #[serde(flatten)]
    pub summary: DailySummary,
}

// Numeric columns come back as numbers, numeric strings, or null depending on
// the column type and the client that wrote them. Anything unusable is `None`.

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_number))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_number)
        .map(f64::trunc)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
