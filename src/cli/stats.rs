use chrono::NaiveDate;

use crate::{
    ledger::activity::{DayView, MINUTES_PER_DAY},
    utils::percentage::{minutes_percentage, Percentage},
};

use super::output::{
    analysis::{analyze_categories, rank_activities},
    category_colour, category_label, format_minutes, scaled_bar, truncate_name,
};

const BAR_WIDTH: usize = 24;
const TOP_ACTIVITY_LIMIT: usize = 8;
const NAME_DISPLAY_LIMIT: usize = 15;

/// Shown when analytics are requested for a date with nothing logged.
pub fn print_empty_state(date: NaiveDate) {
    println!("No activities on {date} yet, nothing to analyze.");
    println!("Log one with `daybudget add` first.");
}

/// Renders the aggregate view of one day: category breakdown, top
/// activities by duration and a summary line.
pub fn print_stats(view: &DayView, min_percentage: Percentage) {
    let (categories, total) = analyze_categories(&view.activities, min_percentage);

    println!("Daily analytics for {}", view.date);
    println!();

    println!("Time by category");
    let largest = categories.first().map(|c| c.minutes).unwrap_or(0);
    for usage in &categories {
        let colour = category_colour(usage.category);
        println!(
            "  {:<13} {}  {} ({}%)",
            category_label(usage.category),
            scaled_bar(usage.minutes, largest, BAR_WIDTH, colour),
            format_minutes(usage.minutes),
            (*minutes_percentage(usage.minutes, total)).round() as i32,
        );
    }
    println!();

    println!("Top activities");
    for (position, activity) in rank_activities(&view.activities, TOP_ACTIVITY_LIMIT)
        .iter()
        .enumerate()
    {
        println!(
            "  {}. {:<18} {} ({})",
            position + 1,
            truncate_name(&activity.name, NAME_DISPLAY_LIMIT),
            format_minutes(activity.duration_minutes),
            category_label(activity.category),
        );
    }
    println!();

    let top_category = categories
        .first()
        .map(|c| category_label(c.category))
        .unwrap_or("N/A");
    println!(
        "{} logged across {} activities, {}% of the day, mostly {}",
        format_minutes(total),
        view.activities.len(),
        (*minutes_percentage(total, MINUTES_PER_DAY)).round() as i32,
        top_category,
    );
}
