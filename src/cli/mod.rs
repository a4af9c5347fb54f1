pub mod day;
pub mod output;
pub mod stats;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

use crate::{
    ledger::{
        activity::{ActivityDraft, ActivityPatch, Category},
        Ledger,
    },
    session::SessionStore,
    storage::activity_store::{ActivityStore, JsonActivityStore},
    utils::{
        clock::DefaultClock, dir::create_application_default_path, logging::enable_logging,
        percentage::Percentage,
    },
};

use day::print_day;
use output::format_minutes;
use stats::{print_empty_state, print_stats};

#[derive(Parser, Debug)]
#[command(name = "Daybudget", version, long_about = None)]
#[command(about = "Command line ledger for budgeting the 24 hours of your day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log an activity against a day's budget")]
    Add {
        #[arg(long, short, help = "Display name of the activity")]
        name: String,
        #[arg(long, short, value_parser = parse_category, help = "Category used for grouping and analytics")]
        category: Category,
        #[arg(long, short, help = "Duration in minutes")]
        duration: u32,
        #[command(flatten)]
        date: DateArgs,
    },
    #[command(about = "Change the name, category or duration of an activity")]
    Edit {
        #[arg(help = "Activity id. A unique prefix is enough")]
        id: String,
        #[arg(long, help = "New display name")]
        name: Option<String>,
        #[arg(long, value_parser = parse_category, help = "New category")]
        category: Option<Category>,
        #[arg(long, help = "New duration in minutes")]
        duration: Option<u32>,
    },
    #[command(about = "Remove an activity from its day")]
    Remove {
        #[arg(help = "Activity id. A unique prefix is enough")]
        id: String,
    },
    #[command(about = "Show a day's activities and the remaining 24 hour budget")]
    Day {
        #[command(flatten)]
        date: DateArgs,
    },
    #[command(about = "Show aggregate analytics for a day")]
    Stats {
        #[command(flatten)]
        date: DateArgs,
        #[arg(short = 'p', long = "percentage", help = "Hide categories below the specified percentage of logged time", default_value_t = Percentage::new_opt(0.).unwrap())]
        min_percentage: Percentage,
    },
    #[command(
        about = "Store a local session. This is a convenience check, not real authentication"
    )]
    Login {
        #[arg(long, short)]
        email: String,
        #[arg(long, short)]
        password: String,
        #[arg(long, short, help = "Display name. Defaults to the email local part")]
        name: Option<String>,
    },
    #[command(about = "Drop the local session")]
    Logout {},
    #[command(about = "Show the logged in user")]
    Whoami {},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, clap::Args)]
struct DateArgs {
    #[arg(
        long,
        help = "Day to operate on. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let data_path = match &args.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&data_path, logging_level, args.log)?;

    match args.commands {
        Commands::Add {
            name,
            category,
            duration,
            date,
        } => {
            let date = parse_cli_date(&date)?;
            let mut ledger = open_ledger(&data_path).await?;

            let activity = ledger
                .add(ActivityDraft {
                    name,
                    category,
                    duration_minutes: duration,
                    date,
                })
                .await?;
            println!(
                "Added {} ({}) to {}, {} of the day left",
                activity.name,
                format_minutes(activity.duration_minutes),
                activity.date,
                format_minutes(ledger.remaining_minutes(date)),
            );
            warn_if_not_durable(&mut ledger);
            Ok(())
        }
        Commands::Edit {
            id,
            name,
            category,
            duration,
        } => {
            let mut ledger = open_ledger(&data_path).await?;

            let id = match resolve_id(&ledger, &id) {
                IdMatch::One(id) => id,
                IdMatch::None => bail!("No activity with id {id}"),
                IdMatch::Ambiguous => bail!("Id prefix {id} is ambiguous, use more characters"),
            };
            let patch = ActivityPatch {
                name,
                category,
                duration_minutes: duration,
            };
            if patch.is_empty() {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::MissingRequiredArgument,
                        "Nothing to change, pass at least one of --name, --category, --duration",
                    )
                    .into());
            }

            let updated = ledger.update(id, patch).await?;
            println!(
                "Updated {}: {} of {} on {}",
                updated.name,
                format_minutes(updated.duration_minutes),
                updated.category,
                updated.date,
            );
            warn_if_not_durable(&mut ledger);
            Ok(())
        }
        Commands::Remove { id } => {
            let mut ledger = open_ledger(&data_path).await?;

            match resolve_id(&ledger, &id) {
                IdMatch::One(resolved) => {
                    let removed = ledger.find(resolved).cloned();
                    ledger.remove(resolved).await;
                    match removed {
                        Some(activity) => {
                            println!("Removed {} from {}", activity.name, activity.date)
                        }
                        // Removing something already gone is fine.
                        None => println!("No activity with id {id}, nothing to remove"),
                    }
                    warn_if_not_durable(&mut ledger);
                }
                IdMatch::None => println!("No activity with id {id}, nothing to remove"),
                IdMatch::Ambiguous => {
                    bail!("Id prefix {id} is ambiguous, use more characters")
                }
            }
            Ok(())
        }
        Commands::Day { date } => {
            let date = parse_cli_date(&date)?;
            let ledger = open_ledger(&data_path).await?;

            print_day(&ledger.day_view(date));
            Ok(())
        }
        Commands::Stats {
            date,
            min_percentage,
        } => {
            let date = parse_cli_date(&date)?;
            let ledger = open_ledger(&data_path).await?;

            if ledger.has_activity_on(date) {
                print_stats(&ledger.day_view(date), min_percentage);
            } else {
                print_empty_state(date);
            }
            Ok(())
        }
        Commands::Login {
            email,
            password,
            name,
        } => {
            let session = SessionStore::new(&data_path);
            let user = session.login(&email, &password, name.as_deref()).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
            Ok(())
        }
        Commands::Logout {} => {
            SessionStore::new(&data_path).logout().await?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami {} => {
            match SessionStore::new(&data_path).current().await {
                Some(user) => println!("{} <{}>", user.name, user.email),
                None => println!("Not logged in"),
            }
            Ok(())
        }
    }
}

async fn open_ledger(data_path: &Path) -> Result<Ledger<JsonActivityStore>> {
    let store = JsonActivityStore::new(data_path)?;
    Ok(Ledger::load(store, Box::new(DefaultClock)).await)
}

/// A failed save never rolls back the mutation, but the user should know
/// their change is not on disk.
fn warn_if_not_durable<S: ActivityStore>(ledger: &mut Ledger<S>) {
    if let Some(e) = ledger.take_save_failure() {
        eprintln!("Warning: the change is recorded for this run only, saving failed: {e}");
    }
}

/// Maps the flag value onto the closed category set. Lives here so the
/// ledger types stay free of argument-parsing concerns.
fn parse_category(raw: &str) -> Result<Category, String> {
    let wanted = raw.to_ascii_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| category.to_string() == wanted)
        .ok_or_else(|| {
            let options = Category::ALL.map(|c| c.to_string()).join(", ");
            format!("unknown category '{raw}', expected one of: {options}")
        })
}

fn parse_cli_date(date: &DateArgs) -> Result<NaiveDate> {
    let Some(raw) = &date.date else {
        return Ok(Local::now().date_naive());
    };

    match parse_date_string(raw, Local::now(), date.date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
    }
}

enum IdMatch {
    One(Uuid),
    None,
    Ambiguous,
}

/// Full uuids are unergonomic to type, so a unique prefix of the id is
/// accepted anywhere an id is expected. The ledger API itself stays exact-id.
fn resolve_id<S: ActivityStore>(ledger: &Ledger<S>, raw: &str) -> IdMatch {
    if let Ok(id) = raw.parse::<Uuid>() {
        return IdMatch::One(id);
    }

    let mut matches = ledger
        .all()
        .iter()
        .filter(|a| a.id.to_string().starts_with(raw))
        .map(|a| a.id);

    match (matches.next(), matches.next()) {
        (Some(id), None) => IdMatch::One(id),
        (Some(_), Some(_)) => IdMatch::Ambiguous,
        (None, _) => IdMatch::None,
    }
}
