//! Aggregation over one member's workout history.
//!
//! Pure functions over already-loaded rows; both the bot's "My stats" view
//! and the dashboard API render from here.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::db::Workout;

pub struct Progress {
    workouts: Vec<Workout>,
}

impl Progress {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn total_points(&self) -> i64 {
        self.workouts.iter().map(|w| w.points).sum()
    }

    pub fn total_minutes(&self) -> i64 {
        self.workouts.iter().map(|w| w.duration_mins).sum()
    }

    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }

    /// Points collected in the 7-day window ending at `today` (inclusive)
    pub fn week_points(&self, today: NaiveDate) -> i64 {
        self.this_week(today).map(|w| w.points).sum()
    }

    pub fn week_sessions(&self, today: NaiveDate) -> usize {
        self.this_week(today).count()
    }

    fn this_week(&self, today: NaiveDate) -> impl Iterator<Item = &Workout> {
        let cutoff = today - Duration::days(7);
        self.workouts
            .iter()
            .filter(move |w| w.performed_on > cutoff && w.performed_on <= today)
    }

    /// Consecutive days with at least one workout, counting back from today
    /// (or from yesterday: a streak is not broken until a full day is missed).
    pub fn streak_days(&self, today: NaiveDate) -> u32 {
        let days: HashSet<NaiveDate> = self.workouts.iter().map(|w| w.performed_on).collect();

        let mut cursor = if days.contains(&today) {
            today
        } else if days.contains(&(today - Duration::days(1))) {
            today - Duration::days(1)
        } else {
            return 0;
        };

        let mut streak = 0;
        while days.contains(&cursor) {
            streak += 1;
            cursor = cursor - Duration::days(1);
        }
        streak
    }

    /// Category with the most accumulated minutes; alphabetically first on a
    /// tie so the answer is stable.
    pub fn favorite_category(&self) -> Option<&str> {
        let mut minutes: HashMap<&str, i64> = HashMap::new();
        for workout in &self.workouts {
            *minutes.entry(workout.category.as_str()).or_default() += workout.duration_mins;
        }
        minutes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(category, _)| category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn workout_on(category: &str, mins: i64, points: i64, days_ago: i64) -> Workout {
        Workout {
            id: None,
            user_id: 100,
            activity_id: "running".to_string(),
            category: category.to_string(),
            duration_mins: mins,
            points,
            performed_on: today() - Duration::days(days_ago),
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn totals_on_empty_history() {
        let progress = Progress::new(vec![]);
        assert_eq!(progress.total_points(), 0);
        assert_eq!(progress.total_minutes(), 0);
        assert_eq!(progress.workout_count(), 0);
        assert_eq!(progress.streak_days(today()), 0);
        assert!(progress.favorite_category().is_none());
    }

    #[test]
    fn totals_sum_all_workouts() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 0),
            workout_on("strength", 20, 60, 10),
        ]);
        assert_eq!(progress.total_points(), 150);
        assert_eq!(progress.total_minutes(), 50);
        assert_eq!(progress.workout_count(), 2);
    }

    #[test]
    fn week_window_excludes_older_workouts() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 0),
            workout_on("cardio", 30, 90, 6),
            workout_on("cardio", 30, 90, 8),
        ]);
        assert_eq!(progress.week_points(today()), 180);
        assert_eq!(progress.week_sessions(today()), 2);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 0),
            workout_on("cardio", 30, 90, 1),
            workout_on("strength", 30, 90, 2),
            // Gap at 3 days ago.
            workout_on("cardio", 30, 90, 4),
        ]);
        assert_eq!(progress.streak_days(today()), 3);
    }

    #[test]
    fn streak_survives_missing_today() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 1),
            workout_on("cardio", 30, 90, 2),
        ]);
        assert_eq!(progress.streak_days(today()), 2);
    }

    #[test]
    fn streak_broken_after_a_full_missed_day() {
        let progress = Progress::new(vec![workout_on("cardio", 30, 90, 2)]);
        assert_eq!(progress.streak_days(today()), 0);
    }

    #[test]
    fn multiple_workouts_one_day_count_once_for_streak() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 0),
            workout_on("strength", 30, 90, 0),
        ]);
        assert_eq!(progress.streak_days(today()), 1);
    }

    #[test]
    fn favorite_category_by_minutes() {
        let progress = Progress::new(vec![
            workout_on("cardio", 30, 90, 0),
            workout_on("strength", 40, 120, 1),
            workout_on("cardio", 20, 60, 2),
        ]);
        assert_eq!(progress.favorite_category(), Some("cardio"));
    }

    #[test]
    fn favorite_category_tie_is_alphabetical() {
        let progress = Progress::new(vec![
            workout_on("strength", 30, 90, 0),
            workout_on("cardio", 30, 90, 1),
        ]);
        assert_eq!(progress.favorite_category(), Some("cardio"));
    }
}
