//! Activity catalog - categories, point weights, id lookup

use serde::{Deserialize, Serialize};

/// Activity categories, each with its own points-per-minute weight
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Cardio,
    Strength,
    Flexibility,
    Sports,
    Outdoors,
}

impl Category {
    /// Stable key used in callback data and database rows
    pub fn key(&self) -> &'static str {
        match self {
            Category::Cardio => "cardio",
            Category::Strength => "strength",
            Category::Flexibility => "flexibility",
            Category::Sports => "sports",
            Category::Outdoors => "outdoors",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::all().iter().copied().find(|c| c.key() == key)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Cardio => "Cardio",
            Category::Strength => "Strength",
            Category::Flexibility => "Flexibility",
            Category::Sports => "Sports",
            Category::Outdoors => "Outdoors",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Cardio => "🏃",
            Category::Strength => "💪",
            Category::Flexibility => "🧘",
            Category::Sports => "⚽",
            Category::Outdoors => "🥾",
        }
    }

    /// Points awarded per minute of activity
    pub fn points_per_min(&self) -> i64 {
        match self {
            Category::Cardio => 3,
            Category::Strength => 3,
            Category::Flexibility => 1,
            Category::Sports => 2,
            Category::Outdoors => 2,
        }
    }

    /// All categories for iteration
    pub fn all() -> &'static [Category] {
        &[
            Category::Cardio,
            Category::Strength,
            Category::Flexibility,
            Category::Sports,
            Category::Outdoors,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
}

pub const ACTIVITIES: &[Activity] = &[
    // Cardio
    Activity { id: "running", name: "Running", category: Category::Cardio },
    Activity { id: "cycling", name: "Cycling", category: Category::Cardio },
    Activity { id: "swimming", name: "Swimming", category: Category::Cardio },
    Activity { id: "rowing", name: "Rowing", category: Category::Cardio },
    Activity { id: "jump_rope", name: "Jump rope", category: Category::Cardio },
    // Strength
    Activity { id: "weightlifting", name: "Weightlifting", category: Category::Strength },
    Activity { id: "bodyweight", name: "Bodyweight circuit", category: Category::Strength },
    Activity { id: "crossfit", name: "CrossFit", category: Category::Strength },
    Activity { id: "kettlebell", name: "Kettlebell", category: Category::Strength },
    // Flexibility
    Activity { id: "yoga", name: "Yoga", category: Category::Flexibility },
    Activity { id: "stretching", name: "Stretching", category: Category::Flexibility },
    Activity { id: "pilates", name: "Pilates", category: Category::Flexibility },
    // Sports
    Activity { id: "football", name: "Football", category: Category::Sports },
    Activity { id: "basketball", name: "Basketball", category: Category::Sports },
    Activity { id: "tennis", name: "Tennis", category: Category::Sports },
    Activity { id: "volleyball", name: "Volleyball", category: Category::Sports },
    // Outdoors
    Activity { id: "hiking", name: "Hiking", category: Category::Outdoors },
    Activity { id: "climbing", name: "Climbing", category: Category::Outdoors },
    Activity { id: "kayaking", name: "Kayaking", category: Category::Outdoors },
];

pub fn find_activity(id: &str) -> Option<&'static Activity> {
    ACTIVITIES.iter().find(|a| a.id == id)
}

pub fn activities_in(category: Category) -> Vec<&'static Activity> {
    ACTIVITIES.iter().filter(|a| a.category == category).collect()
}

/// Points earned for a workout of the given length
pub fn points_for(category: Category, duration_mins: i64) -> i64 {
    duration_mins * category.points_per_min()
}
