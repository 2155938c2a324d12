// Pixelfleet - Library Entry Point

pub mod constants;
pub mod error;
pub mod db;
pub mod legacy;
pub mod convert;
pub mod migrate;
pub mod schedule;

pub use error::{FleetError, Result};
pub use migrate::{migrate_legacy_db, MigrationSummary};
