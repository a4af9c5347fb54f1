//! Display concerns for the terminal: the category lookup tables
//! (color/label/icon) and small formatting helpers. None of this leaks into
//! the ledger; the core only knows the [Category](crate::ledger::activity::Category) variants.

pub mod analysis;

use ansi_term::Colour;

use crate::ledger::activity::{Category, MINUTES_PER_DAY};

pub fn category_colour(category: Category) -> Colour {
    match category {
        Category::Work => Colour::Blue,
        Category::Sleep => Colour::Cyan,
        Category::Exercise => Colour::Green,
        Category::Study => Colour::Yellow,
        Category::Entertainment => Colour::Purple,
        Category::Other => Colour::Fixed(245),
    }
}

pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Work => "Work",
        Category::Sleep => "Sleep",
        Category::Exercise => "Exercise",
        Category::Study => "Study",
        Category::Entertainment => "Entertainment",
        Category::Other => "Other",
    }
}

pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Work => "💼",
        Category::Sleep => "😴",
        Category::Exercise => "🏃",
        Category::Study => "📚",
        Category::Entertainment => "🎮",
        Category::Other => "📌",
    }
}

pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours == 0 {
        format!("{mins}m")
    } else if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {mins}m")
    }
}

/// A fixed-width bar showing how much of the 24 hour budget is used.
pub fn day_progress_bar(total_minutes: u32, width: usize) -> String {
    let filled = (total_minutes.min(MINUTES_PER_DAY) as usize * width) / MINUTES_PER_DAY as usize;
    let mut bar = String::new();
    bar.push_str(&Colour::Green.paint("█".repeat(filled)).to_string());
    bar.push_str(&Colour::Fixed(240).paint("░".repeat(width - filled)).to_string());
    bar
}

/// Bar scaled against the largest entry in a breakdown.
pub fn scaled_bar(minutes: u32, max_minutes: u32, width: usize, colour: Colour) -> String {
    let max_minutes = max_minutes.max(1);
    let filled = ((minutes.min(max_minutes) as usize * width) / max_minutes as usize).max(1);
    colour.paint("█".repeat(filled)).to_string()
}

pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let mut shortened: String = name.chars().take(max).collect();
        shortened.push_str("...");
        shortened
    } else {
        name.to_string()
    }
}
