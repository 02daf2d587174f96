use crate::models::DailySummary;

/// Produces the short encouragement line shown under the daily summary.
pub trait MotivationGenerator: Send + Sync {
    fn generate(&self, summary: &DailySummary) -> String;
}

/// Local generator used when no remote text service is configured. Rules are
/// checked in order and the first match wins, so the same summary always
/// yields the same message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackMotivation;

const BIG_BURN_KCAL: u64 = 300;

type Rule = (fn(&DailySummary) -> bool, &'static str);

const RULES: &[Rule] = &[
    (big_burn, "Amazing calorie burn today! You're on fire!"),
    (several_workouts, "Multiple workouts today? You're unstoppable!"),
    (in_deficit, "Great calorie deficit! You're crushing your goals!"),
    (any_workout, "Consistency is key! Great job staying active today!"),
    (any_meal, "Fuel your body, fuel your dreams! Keep tracking!"),
    (
        weight_logged,
        "Progress over perfection. Log a workout to keep the streak going!",
    ),
];

fn big_burn(s: &DailySummary) -> bool {
    s.calories_burned > BIG_BURN_KCAL
}

fn several_workouts(s: &DailySummary) -> bool {
    s.workout_count >= 2
}

fn in_deficit(s: &DailySummary) -> bool {
    s.calories_consumed > 0 && s.calories_burned > s.calories_consumed
}

fn any_workout(s: &DailySummary) -> bool {
    s.workout_count > 0
}

fn any_meal(s: &DailySummary) -> bool {
    s.calories_consumed > 0
}

fn weight_logged(s: &DailySummary) -> bool {
    s.latest_weight.is_some()
}

const NOTHING_LOGGED: &str = "Start logging your activities to get personalized motivation!";

impl MotivationGenerator for FallbackMotivation {
    fn generate(&self, summary: &DailySummary) -> String {
        RULES
            .iter()
            .find(|(matches, _)| matches(summary))
            .map(|(_, message)| *message)
            .unwrap_or(NOTHING_LOGGED)
            .to_string()
    }
}
