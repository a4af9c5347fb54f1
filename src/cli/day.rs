use crate::{
    ledger::activity::{DayView, MINUTES_PER_DAY},
    utils::percentage::minutes_percentage,
};

use super::output::{
    category_colour, category_icon, category_label, day_progress_bar, format_minutes,
};

const BAR_WIDTH: usize = 36;

/// Renders one day of the ledger: the activity table plus the running
/// 24 hour budget bar.
pub fn print_day(view: &DayView) {
    println!("{}", view.date);

    if view.activities.is_empty() {
        println!("Nothing logged yet. Track your first activity with `daybudget add`.");
    } else {
        for activity in &view.activities {
            let colour = category_colour(activity.category);
            println!(
                "{}  {} {}\t{:>7}\t{}",
                activity.short_id(),
                category_icon(activity.category),
                colour.paint(format!("{:<13}", category_label(activity.category))),
                format_minutes(activity.duration_minutes),
                activity.name,
            );
        }
    }

    println!();
    println!(
        "[{}] {} used, {} free ({}% of the day)",
        day_progress_bar(view.total_minutes, BAR_WIDTH),
        format_minutes(view.total_minutes),
        format_minutes(view.remaining_minutes),
        (*minutes_percentage(view.total_minutes, MINUTES_PER_DAY)).round() as i32,
    );
}
