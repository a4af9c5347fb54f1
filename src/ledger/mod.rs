//! The ledger owns the authoritative collection of activities across all
//! dates and guards the capacity invariant: no calendar date may hold more
//! than [MINUTES_PER_DAY](activity::MINUTES_PER_DAY) minutes of logged
//! activity. Mutations that would break it are rejected before any state
//! changes. Every applied mutation saves the full collection through the
//! configured [ActivityStore].

pub mod activity;
pub mod error;

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::{
    storage::activity_store::{ActivityStore, StoreError},
    utils::clock::Clock,
};

use activity::{Activity, ActivityDraft, ActivityPatch, DayView, MINUTES_PER_DAY};
use error::{LedgerError, Result};

pub struct Ledger<S> {
    store: S,
    clock: Box<dyn Clock>,
    activities: Vec<Activity>,
    save_failure: Option<StoreError>,
}

impl<S: ActivityStore> Ledger<S> {
    /// Reads the stored collection. A failed or malformed load is non-fatal:
    /// the ledger starts from an empty collection and logs the anomaly. A
    /// document that already breaks the capacity invariant (hand-edited, or
    /// produced by another tool) counts as malformed too; accepting it would
    /// let every later query operate past the ceiling.
    pub async fn load(store: S, clock: Box<dyn Clock>) -> Self {
        let activities = match store.load().await {
            Ok(activities) => activities,
            Err(e) => {
                warn!("Failed to load stored activities, starting empty: {e}");
                vec![]
            }
        };

        let activities = match over_capacity_date(&activities) {
            Some((date, total)) => {
                warn!(
                    "Stored activities hold {total} minutes on {date}, over the {MINUTES_PER_DAY} minute capacity, starting empty"
                );
                vec![]
            }
            None => activities,
        };

        Self {
            store,
            clock,
            activities,
            save_failure: None,
        }
    }

    /// Validates the draft, checks the date against remaining capacity and
    /// appends a new activity with a fresh id and creation timestamp.
    pub async fn add(&mut self, draft: ActivityDraft) -> Result<Activity> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if draft.duration_minutes == 0 {
            return Err(LedgerError::InvalidDuration);
        }

        // Saturating keeps absurd durations on the rejection path instead of
        // wrapping past the ceiling.
        let attempted = self.day_total(draft.date).saturating_add(draft.duration_minutes);
        if attempted > MINUTES_PER_DAY {
            return Err(LedgerError::capacity(draft.date, attempted));
        }

        let activity = Activity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: draft.category,
            duration_minutes: draft.duration_minutes,
            date: draft.date,
            created_at: self.clock.now(),
        };
        self.activities.push(activity.clone());

        self.persist().await;
        Ok(activity)
    }

    /// Replaces the supplied fields of an existing activity. Id, creation
    /// timestamp and date are untouched; the capacity check excludes the
    /// activity's own current duration.
    pub async fn update(&mut self, id: Uuid, patch: ActivityPatch) -> Result<Activity> {
        let index = self
            .activities
            .iter()
            .position(|a| a.id == id)
            .ok_or(LedgerError::NotFound(id))?;

        let name = match &patch.name {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(LedgerError::EmptyName);
                }
                Some(name.to_string())
            }
            None => None,
        };
        if patch.duration_minutes == Some(0) {
            return Err(LedgerError::InvalidDuration);
        }

        let current = &self.activities[index];
        let date = current.date;
        let new_duration = patch.duration_minutes.unwrap_or(current.duration_minutes);
        let other_total: u32 = self
            .activities
            .iter()
            .filter(|a| a.date == date && a.id != id)
            .map(|a| a.duration_minutes)
            .sum();

        let attempted = other_total.saturating_add(new_duration);
        if attempted > MINUTES_PER_DAY {
            return Err(LedgerError::capacity(date, attempted));
        }

        let activity = &mut self.activities[index];
        if let Some(name) = name {
            activity.name = name;
        }
        if let Some(category) = patch.category {
            activity.category = category;
        }
        activity.duration_minutes = new_duration;
        let updated = activity.clone();

        self.persist().await;
        Ok(updated)
    }

    /// Removes an activity. Removing an id that does not exist is a no-op,
    /// not an error.
    pub async fn remove(&mut self, id: Uuid) {
        self.activities.retain(|a| a.id != id);
        self.persist().await;
    }

    pub fn all(&self) -> &[Activity] {
        &self.activities
    }

    pub fn find(&self, id: Uuid) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Activities logged on `date`, in insertion order.
    pub fn activities_for(&self, date: NaiveDate) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(move |a| a.date == date)
    }

    pub fn day_total(&self, date: NaiveDate) -> u32 {
        self.activities_for(date).map(|a| a.duration_minutes).sum()
    }

    pub fn remaining_minutes(&self, date: NaiveDate) -> u32 {
        MINUTES_PER_DAY.saturating_sub(self.day_total(date))
    }

    pub fn has_activity_on(&self, date: NaiveDate) -> bool {
        self.day_total(date) > 0
    }

    pub fn day_view(&self, date: NaiveDate) -> DayView {
        let activities: Vec<Activity> = self.activities_for(date).cloned().collect();
        let total_minutes = activities.iter().map(|a| a.duration_minutes).sum();

        DayView {
            date,
            activities,
            total_minutes,
            remaining_minutes: MINUTES_PER_DAY.saturating_sub(total_minutes),
        }
    }

    /// Hands back the error of the most recent failed save, if the last
    /// mutation could not be made durable. The in-memory collection is
    /// still correct in that case.
    pub fn take_save_failure(&mut self) -> Option<StoreError> {
        self.save_failure.take()
    }

    async fn persist(&mut self) {
        match self.store.save(&self.activities).await {
            Ok(()) => self.save_failure = None,
            Err(e) => {
                warn!("Failed to save activities, the last change is in memory only: {e}");
                self.save_failure = Some(e);
            }
        }
    }
}

/// The first date whose logged minutes exceed the daily capacity, with its
/// total, if any.
fn over_capacity_date(activities: &[Activity]) -> Option<(NaiveDate, u32)> {
    let mut totals: HashMap<NaiveDate, u32> = HashMap::new();
    for activity in activities {
        let total = totals.entry(activity.date).or_default();
        *total = total.saturating_add(activity.duration_minutes);
    }
    totals
        .into_iter()
        .find(|(_, total)| *total > MINUTES_PER_DAY)
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use crate::storage::activity_store::{ActivityStore, StoreError};
    use crate::utils::clock::MockClock;

    use super::activity::{Activity, ActivityDraft, ActivityPatch, Category, MINUTES_PER_DAY};
    use super::error::LedgerError;
    use super::Ledger;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    /// In-memory store recording every saved snapshot.
    #[derive(Default)]
    struct MemStore {
        initial: Vec<Activity>,
        saved: Mutex<Vec<Vec<Activity>>>,
        fail_loads: bool,
        fail_saves: bool,
    }

    impl MemStore {
        fn save_count(&self) -> usize {
            self.saved.lock().unwrap().len()
        }

        fn last_saved(&self) -> Vec<Activity> {
            self.saved.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    impl ActivityStore for MemStore {
        async fn load(&self) -> Result<Vec<Activity>, StoreError> {
            if self.fail_loads {
                return Err(StoreError::Io(std::io::Error::new(
                    ErrorKind::PermissionDenied,
                    "no read access",
                )));
            }
            Ok(self.initial.clone())
        }

        async fn save(&self, activities: &[Activity]) -> Result<(), StoreError> {
            if self.fail_saves {
                return Err(StoreError::Io(std::io::Error::new(
                    ErrorKind::Other,
                    "disk full",
                )));
            }
            self.saved.lock().unwrap().push(activities.to_vec());
            Ok(())
        }
    }

    fn fixed_clock() -> Box<MockClock> {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(test_time());
        Box::new(clock)
    }

    async fn empty_ledger() -> (Arc<MemStore>, Ledger<Arc<MemStore>>) {
        let store = Arc::new(MemStore::default());
        let ledger = Ledger::load(store.clone(), fixed_clock()).await;
        (store, ledger)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn draft(name: &str, category: Category, duration: u32, day: u32) -> ActivityDraft {
        ActivityDraft {
            name: name.into(),
            category,
            duration_minutes: duration,
            date: date(day),
        }
    }

    #[tokio::test]
    async fn add_then_reject_over_capacity() {
        let (store, mut ledger) = empty_ledger().await;

        let sleep = ledger
            .add(draft("Sleep", Category::Sleep, 480, 1))
            .await
            .unwrap();
        assert_eq!(sleep.name, "Sleep");
        assert_eq!(sleep.created_at, test_time());
        assert_eq!(ledger.day_total(date(1)), 480);
        assert_eq!(ledger.remaining_minutes(date(1)), 960);

        let err = ledger
            .add(draft("Work", Category::Work, 1000, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CapacityExceeded {
                attempted: 1480,
                capacity: MINUTES_PER_DAY,
                ..
            }
        ));

        // The rejected add changed nothing and saved nothing.
        assert_eq!(ledger.day_total(date(1)), 480);
        assert_eq!(ledger.all().len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn filling_the_day_exactly_is_allowed() {
        let (_, mut ledger) = empty_ledger().await;

        ledger
            .add(draft("Sleep", Category::Sleep, 1000, 1))
            .await
            .unwrap();
        ledger
            .add(draft("Work", Category::Work, 440, 1))
            .await
            .unwrap();

        assert_eq!(ledger.day_total(date(1)), MINUTES_PER_DAY);
        assert_eq!(ledger.remaining_minutes(date(1)), 0);

        let err = ledger
            .add(draft("One more", Category::Other, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CapacityExceeded { attempted: 1441, .. }));
    }

    #[tokio::test]
    async fn rejects_blank_names_and_zero_durations() {
        let (store, mut ledger) = empty_ledger().await;

        let err = ledger
            .add(draft("   ", Category::Work, 60, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyName));

        let err = ledger
            .add(draft("Read", Category::Study, 0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDuration));

        assert!(ledger.all().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn add_trims_the_name() {
        let (_, mut ledger) = empty_ledger().await;

        let added = ledger
            .add(draft("  Morning run  ", Category::Exercise, 45, 1))
            .await
            .unwrap();
        assert_eq!(added.name, "Morning run");
    }

    #[tokio::test]
    async fn update_excludes_the_activity_from_its_own_total() {
        let (_, mut ledger) = empty_ledger().await;

        let a = ledger.add(draft("A", Category::Work, 600, 1)).await.unwrap();
        ledger.add(draft("B", Category::Study, 600, 1)).await.unwrap();

        // 840 + 600 lands exactly on the ceiling.
        let updated = ledger
            .update(
                a.id,
                ActivityPatch {
                    duration_minutes: Some(840),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 840);
        assert_eq!(ledger.day_total(date(1)), MINUTES_PER_DAY);

        let err = ledger
            .update(
                a.id,
                ActivityPatch {
                    duration_minutes: Some(841),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CapacityExceeded { attempted: 1441, .. }));
        assert_eq!(ledger.find(a.id).unwrap().duration_minutes, 840);
    }

    #[tokio::test]
    async fn update_replaces_only_supplied_fields() {
        let (_, mut ledger) = empty_ledger().await;

        let added = ledger
            .add(draft("Jog", Category::Exercise, 30, 1))
            .await
            .unwrap();

        let updated = ledger
            .update(
                added.id,
                ActivityPatch {
                    name: Some("Evening jog".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Evening jog");
        assert_eq!(updated.category, Category::Exercise);
        assert_eq!(updated.duration_minutes, 30);
        assert_eq!(updated.id, added.id);
        assert_eq!(updated.created_at, added.created_at);
        assert_eq!(updated.date, added.date);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_, mut ledger) = empty_ledger().await;

        let id = Uuid::new_v4();
        let err = ledger.update(id, ActivityPatch::default()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(e) if e == id));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, mut ledger) = empty_ledger().await;

        let added = ledger.add(draft("Nap", Category::Sleep, 60, 1)).await.unwrap();

        ledger.remove(added.id).await;
        assert!(ledger.all().is_empty());

        ledger.remove(added.id).await;
        assert!(ledger.all().is_empty());

        // Each remove is still a mutation with a persistence side effect.
        assert_eq!(store.save_count(), 3);
        assert_eq!(store.last_saved(), vec![]);
    }

    #[tokio::test]
    async fn queries_never_cross_dates() {
        let (_, mut ledger) = empty_ledger().await;

        ledger.add(draft("Sleep", Category::Sleep, 480, 1)).await.unwrap();
        ledger.add(draft("Work", Category::Work, 480, 2)).await.unwrap();
        ledger.add(draft("Gym", Category::Exercise, 60, 1)).await.unwrap();

        let day_one: Vec<&str> = ledger
            .activities_for(date(1))
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(day_one, vec!["Sleep", "Gym"]);

        assert_eq!(ledger.day_total(date(1)), 540);
        assert_eq!(ledger.day_total(date(2)), 480);
        assert_eq!(ledger.day_total(date(3)), 0);
        assert!(ledger.has_activity_on(date(2)));
        assert!(!ledger.has_activity_on(date(3)));
    }

    #[tokio::test]
    async fn day_view_matches_queries() {
        let (_, mut ledger) = empty_ledger().await;

        ledger.add(draft("Sleep", Category::Sleep, 480, 1)).await.unwrap();
        ledger.add(draft("Work", Category::Work, 300, 1)).await.unwrap();

        let view = ledger.day_view(date(1));
        assert_eq!(view.date, date(1));
        assert_eq!(view.total_minutes, 780);
        assert_eq!(view.remaining_minutes, 660);
        assert_eq!(view.activities.len(), 2);

        let empty = ledger.day_view(date(9));
        assert_eq!(empty.total_minutes, 0);
        assert_eq!(empty.remaining_minutes, MINUTES_PER_DAY);
        assert!(empty.activities.is_empty());
    }

    #[tokio::test]
    async fn every_mutation_saves_the_full_collection() {
        let (store, mut ledger) = empty_ledger().await;

        let first = ledger.add(draft("Sleep", Category::Sleep, 480, 1)).await.unwrap();
        let second = ledger.add(draft("Work", Category::Work, 300, 1)).await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.last_saved(), vec![first.clone(), second.clone()]);

        ledger
            .update(
                first.id,
                ActivityPatch {
                    duration_minutes: Some(500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.save_count(), 3);
        assert_eq!(store.last_saved()[0].duration_minutes, 500);

        ledger.remove(second.id).await;
        assert_eq!(store.save_count(), 4);
        assert_eq!(store.last_saved().len(), 1);
    }

    #[tokio::test]
    async fn failed_save_keeps_the_mutation_and_surfaces_a_warning() {
        let store = Arc::new(MemStore {
            fail_saves: true,
            ..Default::default()
        });
        let mut ledger = Ledger::load(store, fixed_clock()).await;

        let added = ledger.add(draft("Sleep", Category::Sleep, 480, 1)).await.unwrap();

        assert_eq!(ledger.find(added.id).unwrap().duration_minutes, 480);
        assert!(ledger.take_save_failure().is_some());
        assert!(ledger.take_save_failure().is_none());
    }

    #[tokio::test]
    async fn failed_load_starts_empty() {
        let store = Arc::new(MemStore {
            fail_loads: true,
            ..Default::default()
        });
        let ledger = Ledger::load(store, fixed_clock()).await;

        assert!(ledger.all().is_empty());
    }

    fn stored(name: &str, duration: u32, day: u32) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            name: name.into(),
            category: Category::Work,
            duration_minutes: duration,
            date: date(day),
            created_at: test_time(),
        }
    }

    #[tokio::test]
    async fn over_capacity_stored_document_starts_empty() {
        // A hand-edited document can hold more minutes on a date than the
        // ledger itself would ever accept.
        let store = Arc::new(MemStore {
            initial: vec![stored("Sleep", 900, 1), stored("Work", 900, 1)],
            ..Default::default()
        });
        let ledger = Ledger::load(store, fixed_clock()).await;

        assert!(ledger.all().is_empty());
        assert_eq!(ledger.day_total(date(1)), 0);
        assert_eq!(ledger.remaining_minutes(date(1)), MINUTES_PER_DAY);
        assert_eq!(ledger.day_view(date(1)).remaining_minutes, MINUTES_PER_DAY);
    }

    #[tokio::test]
    async fn a_stored_day_at_exact_capacity_is_kept() {
        let store = Arc::new(MemStore {
            initial: vec![stored("Sleep", 1000, 1), stored("Work", 440, 1)],
            ..Default::default()
        });
        let ledger = Ledger::load(store, fixed_clock()).await;

        assert_eq!(ledger.all().len(), 2);
        assert_eq!(ledger.remaining_minutes(date(1)), 0);
    }

    #[tokio::test]
    async fn loads_the_stored_collection() {
        let store = Arc::new(MemStore::default());
        let mut seed = Ledger::load(store.clone(), fixed_clock()).await;
        seed.add(draft("Sleep", Category::Sleep, 480, 1)).await.unwrap();

        let reloaded = Ledger::load(
            Arc::new(MemStore {
                initial: store.last_saved(),
                ..Default::default()
            }),
            fixed_clock(),
        )
        .await;

        assert_eq!(reloaded.day_total(date(1)), 480);
        assert_eq!(reloaded.all(), seed.all());
    }
}
