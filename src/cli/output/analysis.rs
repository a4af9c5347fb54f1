use std::collections::HashMap;

use crate::{
    ledger::activity::{Activity, Category},
    utils::percentage::Percentage,
};

#[derive(Debug, PartialEq, Eq)]
pub struct CategoryUsage {
    pub category: Category,
    pub minutes: u32,
}

/// Returns per-category totals for one day's activities + the day's logged
/// total. Categories below `min_percentage` of the total are dropped, which
/// also drops categories with nothing logged.
pub fn analyze_categories(
    activities: &[Activity],
    min_percentage: Percentage,
) -> (Vec<CategoryUsage>, u32) {
    let mut map = HashMap::<Category, u32>::new();

    let mut total = 0u32;

    for activity in activities {
        total += activity.duration_minutes;
        *map.entry(activity.category).or_default() += activity.duration_minutes;
    }

    let threshold = (total as f64 * *min_percentage / 100.) as u32;

    let mut usages = map
        .into_iter()
        .map(|(category, minutes)| CategoryUsage { category, minutes })
        .filter(|v| v.minutes > threshold)
        .collect::<Vec<_>>();
    // Ties break on category so the output is deterministic.
    usages.sort_by(|a, b| b.minutes.cmp(&a.minutes).then(a.category.cmp(&b.category)));
    (usages, total)
}

/// Activities ranked by duration descending, capped at `limit`. The sort is
/// stable, so equal durations keep insertion order.
pub fn rank_activities(activities: &[Activity], limit: usize) -> Vec<&Activity> {
    let mut ranked: Vec<&Activity> = activities.iter().collect();
    ranked.sort_by(|a, b| b.duration_minutes.cmp(&a.duration_minutes));
    ranked.truncate(limit);
    ranked
}
