//! The in-memory authoritative collection of scrips.
//!
//! Every async action follows the same lifecycle: dispatch `Pending`, run the
//! gateway call, then dispatch `Fulfilled` with the freshly read collection or
//! `Rejected` with the error message. A rejected action never touches the
//! collection. Concurrent actions are not sequenced; whichever finishes last
//! decides the final collection.

mod state;
mod transfer;

pub use state::{Action, Operation, ScripState, Status};
pub use transfer::{PathPicker, PresetPicker, EXPORT_EXTENSION};

use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::entity::{dedupe_streak, Scrip, StreakToggle};
use crate::error::{Result, ScripError};
use crate::gateway::SqliteGateway;
use crate::row::{from_row, to_row, ScripRow};

const DEFAULT_EXPORT_NAME: &str = "streak_data_export.json";

pub struct Store {
    gateway: SqliteGateway,
    state: watch::Sender<ScripState>,
    export_file_name: String,
}

impl Store {
    pub fn new(gateway: SqliteGateway) -> Self {
        let (state, _) = watch::channel(ScripState::default());
        Self {
            gateway,
            state,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
        }
    }

    /// File name suggested to the picker on export.
    pub fn with_export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = name.into();
        self
    }

    pub fn dispatch(&self, action: Action) {
        self.state
            .send_modify(|state| *state = std::mem::take(state).reduce(action));
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ScripState {
        self.state.borrow().clone()
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ScripState> {
        self.state.subscribe()
    }

    pub fn select_scrip(&self, id: Option<i64>) {
        self.dispatch(Action::SelectScrip(id));
    }

    pub fn scrips(&self) -> Vec<Scrip> {
        self.state.borrow().all_scrips().to_vec()
    }

    pub fn scrip_by_id(&self, id: i64) -> Option<Scrip> {
        self.state.borrow().scrip_by_id(id).cloned()
    }

    pub fn selected_scrip(&self) -> Option<Scrip> {
        self.state.borrow().selected_scrip().cloned()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Ensure the table exists and load it.
    pub async fn initialize(&self) -> Result<Vec<Scrip>> {
        self.perform(Operation::Initialize, reloaded, async move {
            let rows = self.gateway.initialize().await?;
            Ok(parse_rows(&rows))
        })
        .await
    }

    /// Insert a new scrip. Any id it carries is ignored.
    pub async fn create(&self, scrip: Scrip) -> Result<Vec<Scrip>> {
        self.perform(Operation::Create, reloaded, async move {
            let rows = self.gateway.insert(to_row(&scrip)).await?;
            Ok(parse_rows(&rows))
        })
        .await
    }

    /// Write every field of `scrip` except `created_at`.
    ///
    /// Streak entries sharing a day are merged first.
    pub async fn update(&self, scrip: Scrip) -> Result<Vec<Scrip>> {
        self.perform(Operation::Update, reloaded, async move {
            let id = scrip.id.ok_or(ScripError::NotPersisted)?;
            let scrip = Scrip {
                streak: dedupe_streak(scrip.streak),
                ..scrip
            };
            let rows = self.gateway.update(id, to_row(&scrip)).await?;
            Ok(parse_rows(&rows))
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<Vec<Scrip>> {
        self.perform(Operation::Delete, reloaded, async move {
            let rows = self.gateway.delete(id).await?;
            Ok(parse_rows(&rows))
        })
        .await
    }

    /// Mark or unmark `date` on scrip `id` and persist the change.
    pub async fn toggle_day(&self, id: i64, date: NaiveDate) -> Result<StreakToggle> {
        let mut scrip = self
            .scrip_by_id(id)
            .ok_or_else(|| ScripError::NotFound(id.to_string()))?;
        let outcome = scrip.toggle_day(date);
        if outcome != StreakToggle::KeptWithNote {
            self.update(scrip).await?;
        }
        Ok(outcome)
    }

    /// Write the raw table rows to a file chosen through `picker`.
    ///
    /// Returns the written path, or `None` if the user cancelled. The
    /// collection is left as it is either way.
    pub async fn export(&self, picker: &dyn PathPicker) -> Result<Option<PathBuf>> {
        let unchanged = |_: &Option<PathBuf>| None;
        self.perform(Operation::Export, unchanged, async move {
            let rows = self.gateway.select_all().await?;
            let Some(path) = picker.pick_save_path(&self.export_file_name, EXPORT_EXTENSION)
            else {
                info!("export cancelled");
                return Ok(None);
            };
            transfer::write_rows(&path, &rows).await?;
            info!(path = %path.display(), rows = rows.len(), "exported scrips");
            Ok(Some(path))
        })
        .await
    }

    /// Replace the whole table with the rows of a file chosen through `picker`.
    ///
    /// Existing rows are deleted first and imported rows keep their ids. If
    /// an item cannot be read or inserted, the rows before it stay in the
    /// table and the collection is not refreshed. Cancelling leaves both the
    /// table and the collection alone and returns `None`.
    pub async fn import(&self, picker: &dyn PathPicker) -> Result<Option<Vec<Scrip>>> {
        let keep_imported = |imported: &Option<Vec<Scrip>>| imported.clone();
        self.perform(Operation::Import, keep_imported, async move {
            let Some(path) = picker.pick_open_path(EXPORT_EXTENSION) else {
                info!("import cancelled");
                return Ok(None);
            };
            let items = transfer::read_items(&path).await?;
            let rows = items
                .into_iter()
                .map(|item| serde_json::from_value::<ScripRow>(item).map_err(ScripError::from));
            let inserted = self.gateway.replace_all(rows).await?;
            info!(path = %path.display(), rows = inserted.len(), "imported scrips");
            Ok(Some(parse_rows(&inserted)))
        })
        .await
    }

    /// Run one async action through the status lifecycle.
    ///
    /// `collection` picks the new collection out of a successful result;
    /// `None` keeps the current one.
    async fn perform<T, F, Fut>(&self, op: Operation, collection: F, action: Fut) -> Result<T>
    where
        F: FnOnce(&T) -> Option<Vec<Scrip>>,
        Fut: Future<Output = Result<T>>,
    {
        debug!(%op, "dispatch");
        self.dispatch(Action::Pending(op));
        match action.await {
            Ok(value) => {
                let scrips = collection(&value);
                self.dispatch(Action::Fulfilled { op, scrips });
                Ok(value)
            }
            Err(e) => {
                warn!(%op, error = %e, "operation failed");
                self.dispatch(Action::Rejected {
                    op,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

#[allow(clippy::ptr_arg)]
fn reloaded(scrips: &Vec<Scrip>) -> Option<Vec<Scrip>> {
    Some(scrips.clone())
}

fn parse_rows(rows: &[ScripRow]) -> Vec<Scrip> {
    rows.iter().map(from_row).collect()
}
