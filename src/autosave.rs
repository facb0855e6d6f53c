//! Debounced saving of streak-day notes.
//!
//! A coordinator belongs to one open detail view. The note being edited sits
//! in a single pending slot until the debounce timer fires, the note panel is
//! closed, another day is selected, or the view is torn down. All of those go
//! through [`AutosaveCoordinator::flush`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::entity::StreakEntry;
use crate::error::{Result, ScripError};
use crate::store::Store;

#[derive(Default)]
struct Slot {
    /// Entry shown in the note panel, with the text as typed.
    open: Option<StreakEntry>,
    /// Latest edit not yet written.
    pending: Option<StreakEntry>,
    /// Bumped on every edit; a timer only flushes if nothing newer arrived.
    generation: u64,
}

struct Shared {
    store: Arc<Store>,
    scrip_id: i64,
    slot: Mutex<Slot>,
    /// Held for the whole of a flush so later flushes wait for a running write.
    write: tokio::sync::Mutex<()>,
}

pub struct AutosaveCoordinator {
    shared: Arc<Shared>,
    delay: Duration,
}

impl AutosaveCoordinator {
    pub fn new(store: Arc<Store>, scrip_id: i64, delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                scrip_id,
                slot: Mutex::new(Slot::default()),
                write: tokio::sync::Mutex::new(()),
            }),
            delay,
        }
    }

    pub fn scrip_id(&self) -> i64 {
        self.shared.scrip_id
    }

    /// Entry currently open in the note panel.
    pub fn open_entry(&self) -> Option<StreakEntry> {
        lock(&self.shared.slot).open.clone()
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.shared.slot).pending.is_some()
    }

    /// Click on a calendar day.
    ///
    /// Saves any pending edit, then opens the day's note if the day is
    /// marked and closes the panel otherwise.
    pub async fn select_day(&self, date: NaiveDate) -> Result<Option<StreakEntry>> {
        self.flush().await?;
        let entry = self
            .shared
            .store
            .scrip_by_id(self.shared.scrip_id)
            .and_then(|scrip| scrip.entry(date).cloned());
        lock(&self.shared.slot).open = entry.clone();
        Ok(entry)
    }

    /// Replace the open entry's note and restart the debounce timer.
    ///
    /// Returns false when no note panel is open.
    pub fn edit_note(&self, note: impl Into<String>) -> bool {
        let generation = {
            let mut slot = lock(&self.shared.slot);
            let Some(open) = slot.open.as_mut() else {
                return false;
            };
            open.note = note.into();
            let edited = open.clone();
            slot.pending = Some(edited);
            slot.generation += 1;
            slot.generation
        };
        self.schedule(generation);
        true
    }

    /// Close the note panel, saving what was typed.
    pub async fn close_panel(&self) -> Result<bool> {
        lock(&self.shared.slot).open = None;
        self.flush().await
    }

    /// Write the pending edit now. Returns false if there was nothing to write.
    ///
    /// Waits for a write already started by the timer, and retries its edit
    /// if that write failed.
    pub async fn flush(&self) -> Result<bool> {
        flush_pending(&self.shared).await
    }

    /// Tear the view down, saving any pending edit first.
    pub async fn teardown(self) -> Result<bool> {
        lock(&self.shared.slot).open = None;
        self.flush().await
    }

    fn schedule(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = lock(&shared.slot).generation;
            if current != generation {
                return;
            }
            if let Err(e) = flush_pending(&shared).await {
                warn!(scrip_id = shared.scrip_id, error = %e, "autosave failed");
            }
        });
    }
}

impl Drop for AutosaveCoordinator {
    fn drop(&mut self) {
        if lock(&self.shared.slot).pending.is_none() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::clone(&self.shared);
                handle.spawn(async move {
                    if let Err(e) = flush_pending(&shared).await {
                        warn!(scrip_id = shared.scrip_id, error = %e, "autosave on drop failed");
                    }
                });
            }
            Err(_) => warn!(
                scrip_id = self.shared.scrip_id,
                "autosave coordinator dropped outside a runtime; pending note lost"
            ),
        }
    }
}

async fn flush_pending(shared: &Shared) -> Result<bool> {
    let _writing = shared.write.lock().await;
    let pending = lock(&shared.slot).pending.take();
    let Some(entry) = pending else {
        return Ok(false);
    };

    let Some(scrip) = shared.store.scrip_by_id(shared.scrip_id) else {
        lock(&shared.slot).pending.get_or_insert(entry);
        return Err(ScripError::NotFound(shared.scrip_id.to_string()));
    };
    let Some(updated) = scrip.with_entry(&entry) else {
        warn!(
            scrip_id = shared.scrip_id,
            date = %entry.date,
            "day was unmarked while its note was open; note dropped"
        );
        return Err(ScripError::NotFound(format!(
            "{} is no longer marked on scrip {:03}",
            entry.date, shared.scrip_id
        )));
    };
    let result = shared.store.update(updated).await;

    match result {
        Ok(_) => {
            debug!(scrip_id = shared.scrip_id, date = %entry.date, "saved note");
            Ok(true)
        }
        Err(e) => {
            // keep the edit for the next trigger unless a newer one arrived
            lock(&shared.slot).pending.get_or_insert(entry);
            Err(e)
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{create_scrip, StreakToggle};
    use crate::gateway::SqliteGateway;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const LONG: Duration = Duration::from_secs(60);

    /// Store holding one scrip with 2024-01-05 and 2024-01-06 marked.
    async fn setup() -> (Arc<Store>, i64) {
        let store = Arc::new(Store::new(SqliteGateway::in_memory()));
        store.initialize().await.unwrap();
        let scrip = create_scrip(
            "Journal",
            "",
            vec!["daily".to_string()],
            day("2024-01-01"),
            day("2024-01-31"),
            day("2024-01-01"),
        );
        let id = store.create(scrip).await.unwrap()[0].id.unwrap();
        store.toggle_day(id, day("2024-01-05")).await.unwrap();
        store.toggle_day(id, day("2024-01-06")).await.unwrap();
        (store, id)
    }

    fn note(store: &Store, id: i64, date: &str) -> String {
        store.scrip_by_id(id).unwrap().entry(day(date)).unwrap().note.clone()
    }

    #[tokio::test]
    async fn test_edit_without_open_panel_is_ignored() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(store, id, LONG);
        assert!(!autosave.edit_note("nowhere"));
        assert!(!autosave.has_pending());
    }

    #[tokio::test]
    async fn test_select_unmarked_day_closes_panel() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(store, id, LONG);
        assert!(autosave.select_day(day("2024-01-05")).await.unwrap().is_some());
        assert!(autosave.select_day(day("2024-01-20")).await.unwrap().is_none());
        assert!(autosave.open_entry().is_none());
    }

    #[tokio::test]
    async fn test_teardown_flushes_before_timer() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-05")).await.unwrap();
        assert!(autosave.edit_note("ran 5k"));
        assert_eq!(note(&store, id, "2024-01-05"), "");

        assert!(autosave.teardown().await.unwrap());
        assert_eq!(note(&store, id, "2024-01-05"), "ran 5k");
        let reread = store.initialize().await.unwrap();
        assert_eq!(reread[0].entry(day("2024-01-05")).unwrap().note, "ran 5k");
    }

    #[tokio::test]
    async fn test_close_panel_flushes() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-06")).await.unwrap();
        autosave.edit_note("rest day");
        assert!(autosave.close_panel().await.unwrap());
        assert!(!autosave.has_pending());
        assert_eq!(note(&store, id, "2024-01-06"), "rest day");
        assert!(!autosave.flush().await.unwrap());
    }

    #[tokio::test]
    async fn test_selecting_another_day_flushes_previous() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-05")).await.unwrap();
        autosave.edit_note("first");
        autosave.select_day(day("2024-01-06")).await.unwrap();
        autosave.edit_note("second");
        autosave.teardown().await.unwrap();

        assert_eq!(note(&store, id, "2024-01-05"), "first");
        assert_eq!(note(&store, id, "2024-01-06"), "second");
    }

    #[tokio::test]
    async fn test_timer_flushes_latest_edit_only() {
        let (store, id) = setup().await;
        let delay = Duration::from_millis(300);
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, delay);
        autosave.select_day(day("2024-01-05")).await.unwrap();

        autosave.edit_note("d");
        tokio::time::sleep(Duration::from_millis(150)).await;
        autosave.edit_note("draft");
        // the first timer has fired by now but was superseded
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(note(&store, id, "2024-01-05"), "");
        assert!(autosave.has_pending());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(note(&store, id, "2024-01-05"), "draft");
        assert!(!autosave.has_pending());
    }

    #[tokio::test]
    async fn test_drop_saves_pending_edit() {
        let (store, id) = setup().await;
        {
            let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
            autosave.select_day(day("2024-01-05")).await.unwrap();
            autosave.edit_note("dropped");
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(note(&store, id, "2024-01-05"), "dropped");
    }

    #[tokio::test]
    async fn test_teardown_waits_for_running_write() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-05")).await.unwrap();
        autosave.edit_note("typed");

        // stand in for a timer write that is still in flight
        let shared = Arc::clone(&autosave.shared);
        let writing = shared.write.lock().await;
        let teardown = tokio::spawn(async move { autosave.teardown().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!teardown.is_finished());
        assert_eq!(note(&store, id, "2024-01-05"), "");

        drop(writing);
        assert!(teardown.await.unwrap().unwrap());
        assert_eq!(note(&store, id, "2024-01-05"), "typed");
    }

    #[tokio::test]
    async fn test_flush_after_day_unmarked_fails() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-05")).await.unwrap();
        autosave.edit_note("orphan");

        assert_eq!(
            store.toggle_day(id, day("2024-01-05")).await.unwrap(),
            StreakToggle::Unmarked
        );
        assert!(matches!(autosave.flush().await, Err(ScripError::NotFound(_))));
        assert!(!autosave.has_pending());
        assert!(!store.scrip_by_id(id).unwrap().has_entry(day("2024-01-05")));
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_edit() {
        let (store, id) = setup().await;
        let autosave = AutosaveCoordinator::new(Arc::clone(&store), id, LONG);
        autosave.select_day(day("2024-01-05")).await.unwrap();
        autosave.edit_note("kept");

        store.delete(id).await.unwrap();
        assert!(autosave.flush().await.is_err());
        assert!(autosave.has_pending());
    }
}
