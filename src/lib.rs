pub mod autosave;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod row;
pub mod store;
pub mod warnings;

pub use autosave::AutosaveCoordinator;
pub use entity::{create_scrip, Scrip, StreakEntry, TimeSpan};
pub use error::{Result, ScripError};
pub use gateway::SqliteGateway;
pub use row::{from_row, to_row, ScripRow};
pub use store::{Status, Store};
