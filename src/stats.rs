//! Daily and weekly aggregation over raw fitness records.
//!
//! Every function here is pure and total: records with missing numeric
//! fields count as zero, totals saturate, and nothing returns an error.
//! Each operation has a `*_at` form taking the reference date and the time
//! zone that decides which calendar day a timestamp belongs to.

use crate::models::{
    CaloriesPoint, ChartSeries, DailySummary, MealEntry, WeeklyPoint, WeightPoint, WeightSample,
    WorkoutEntry, WorkoutPoint,
};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use std::{fmt, str::FromStr};

/// Widest trailing window accepted from user input (about ten years).
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Trailing window the dashboard is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Days(u32),
    AllTime,
}

impl Default for Window {
    fn default() -> Self {
        Self::Days(7)
    }
}

impl Window {
    /// Number of day buckets this window covers. `AllTime` reaches back to
    /// the earliest record, or just today when there are none.
    pub fn resolve_days(&self, earliest: Option<NaiveDate>, today: NaiveDate) -> u32 {
        match *self {
            Self::Days(days) => days,
            Self::AllTime => earliest
                .filter(|day| *day <= today)
                .map(|day| (today - day).num_days() + 1)
                .map(|days| days.clamp(1, i64::from(MAX_WINDOW_DAYS)) as u32)
                .unwrap_or(1),
        }
    }

    /// First calendar day inside the window, or `None` for all-time.
    pub fn start_day(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Days(days) => Some(window_start(today, days)),
            Self::AllTime => None,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{days}"),
            Self::AllTime => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("window must be `all` or a day count between 1 and {max}, got `{0}`", max = MAX_WINDOW_DAYS)]
pub struct InvalidWindow(pub String);

impl FromStr for Window {
    type Err = InvalidWindow;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("all-time") {
            return Ok(Self::AllTime);
        }
        match trimmed.parse::<u32>() {
            Ok(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => Ok(Self::Days(days)),
            _ => Err(InvalidWindow(value.to_string())),
        }
    }
}

pub fn compute_daily_summary(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weights: &[WeightSample],
) -> DailySummary {
    compute_daily_summary_at(workouts, meals, weights, Local::now().date_naive(), &Local)
}

/// Totals for records created on `as_of`, plus the most recent weight across
/// all of `weights` regardless of day.
pub fn compute_daily_summary_at<Tz: TimeZone>(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weights: &[WeightSample],
    as_of: NaiveDate,
    tz: &Tz,
) -> DailySummary {
    let mut calories_burned = 0u64;
    let mut workout_count = 0u64;
    for workout in workouts
        .iter()
        .filter(|workout| day_of(&workout.created_at, tz) == as_of)
    {
        calories_burned = calories_burned.saturating_add(calories(workout.calories));
        workout_count += 1;
    }

    let calories_consumed = meals
        .iter()
        .filter(|meal| day_of(&meal.created_at, tz) == as_of)
        .fold(0u64, |sum, meal| sum.saturating_add(calories(meal.calories)));

    // Ties on created_at go to the later element.
    let latest_weight = weights
        .iter()
        .max_by_key(|sample| sample.created_at)
        .and_then(|sample| sample.weight)
        .filter(|weight| *weight > 0.0);

    DailySummary {
        calories_consumed,
        calories_burned,
        workout_count,
        latest_weight,
    }
}

pub fn compute_series(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weights: &[WeightSample],
    window_days: u32,
) -> ChartSeries {
    compute_series_at(
        workouts,
        meals,
        weights,
        window_days,
        Local::now().date_naive(),
        &Local,
    )
}

/// Chart series over the `window_days` calendar days ending at `today`.
///
/// Calorie and workout series always have one zero-filled point per day,
/// oldest first. The weight series has one point per sample inside the
/// window, sorted by creation time.
pub fn compute_series_at<Tz: TimeZone>(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weights: &[WeightSample],
    window_days: u32,
    today: NaiveDate,
    tz: &Tz,
) -> ChartSeries {
    if window_days == 0 {
        return ChartSeries::default();
    }

    let start = window_start(today, window_days);
    let days: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= today).collect();
    let mut buckets = vec![DayBucket::default(); days.len()];
    let slot = |created_at: &DateTime<Utc>| bucket_index(day_of(created_at, tz), start, days.len());

    for meal in meals {
        if let Some(index) = slot(&meal.created_at) {
            let bucket = &mut buckets[index];
            bucket.calories_in = bucket.calories_in.saturating_add(calories(meal.calories));
        }
    }

    for workout in workouts {
        if let Some(index) = slot(&workout.created_at) {
            let bucket = &mut buckets[index];
            bucket.calories_out = bucket
                .calories_out
                .saturating_add(calories(workout.calories));
            bucket.workout_count += 1;
        }
    }

    let mut in_window: Vec<&WeightSample> = weights
        .iter()
        .filter(|sample| slot(&sample.created_at).is_some())
        .collect();
    in_window.sort_by_key(|sample| sample.created_at);

    let mut series = ChartSeries {
        calories: Vec::with_capacity(days.len()),
        workouts: Vec::with_capacity(days.len()),
        weight: Vec::new(),
    };

    for (day, bucket) in days.iter().zip(&buckets) {
        let date = day_label(*day);
        series.calories.push(CaloriesPoint {
            date: date.clone(),
            calories_in: bucket.calories_in,
            calories_out: bucket.calories_out,
        });
        series.workouts.push(WorkoutPoint {
            date,
            workout_count: bucket.workout_count,
            calories_out: bucket.calories_out,
        });
    }

    series.weight = in_window
        .into_iter()
        .map(|sample| WeightPoint {
            date: day_label(day_of(&sample.created_at, tz)),
            weight: sample.weight.unwrap_or(0.0),
        })
        .collect();

    series
}

/// Monday-based weekly totals for the `weeks` weeks ending with the week
/// that contains `today`, oldest first.
pub fn compute_weekly_at<Tz: TimeZone>(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weeks: usize,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<WeeklyPoint> {
    if weeks == 0 {
        return Vec::new();
    }

    let current_week_start = week_start(today);
    let first_week_start = current_week_start
        .checked_sub_signed(Duration::weeks(weeks as i64 - 1))
        .unwrap_or(NaiveDate::MIN);
    let starts: Vec<NaiveDate> = first_week_start
        .iter_weeks()
        .take_while(|start| *start <= current_week_start)
        .collect();
    let mut buckets = vec![DayBucket::default(); starts.len()];
    let slot = |created_at: &DateTime<Utc>| {
        let offset = (week_start(day_of(created_at, tz)) - first_week_start).num_weeks();
        usize::try_from(offset)
            .ok()
            .filter(|index| *index < starts.len())
    };

    for meal in meals {
        if let Some(index) = slot(&meal.created_at) {
            let bucket = &mut buckets[index];
            bucket.calories_in = bucket.calories_in.saturating_add(calories(meal.calories));
        }
    }

    for workout in workouts {
        if let Some(index) = slot(&workout.created_at) {
            let bucket = &mut buckets[index];
            bucket.calories_out = bucket
                .calories_out
                .saturating_add(calories(workout.calories));
            bucket.workout_count += 1;
        }
    }

    starts
        .into_iter()
        .zip(buckets)
        .map(|(start, bucket)| WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: (start + Duration::days(6)).to_string(),
            calories_in: bucket.calories_in,
            calories_out: bucket.calories_out,
            workout_count: bucket.workout_count,
        })
        .collect()
}

/// Calendar day of the oldest record across all three collections.
pub fn earliest_day<Tz: TimeZone>(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    weights: &[WeightSample],
    tz: &Tz,
) -> Option<NaiveDate> {
    workouts
        .iter()
        .map(|workout| workout.created_at)
        .chain(meals.iter().map(|meal| meal.created_at))
        .chain(weights.iter().map(|sample| sample.created_at))
        .min()
        .map(|created_at| day_of(&created_at, tz))
}

/// Display label used as the bucket key on chart axes, e.g. `Jan 05`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

pub fn day_of<Tz: TimeZone>(created_at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    created_at.with_timezone(tz).date_naive()
}

#[derive(Debug, Clone, Copy, Default)]
struct DayBucket {
    calories_in: u64,
    calories_out: u64,
    workout_count: u64,
}

fn calories(value: Option<u32>) -> u64 {
    value.map(u64::from).unwrap_or(0)
}

fn window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    let span = i64::from(window_days.saturating_sub(1));
    today
        .checked_sub_signed(Duration::days(span))
        .unwrap_or(NaiveDate::MIN)
}

fn bucket_index(day: NaiveDate, start: NaiveDate, len: usize) -> Option<usize> {
    usize::try_from((day - start).num_days())
        .ok()
        .filter(|index| *index < len)
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
