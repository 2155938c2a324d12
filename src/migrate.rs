// Migration orchestrator: legacy blob store -> relational fleet database

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::convert::{self, ConvertedUser};
use crate::db::{self, schema};
use crate::error::Result;
use crate::legacy;

/// Outcome of one migration run. Per-user failures are counted here, not
/// surfaced as errors; the run itself only fails when the legacy source is
/// unreadable or the destination schema cannot be created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub total_rows: usize,
    pub users_migrated: usize,
    pub users_skipped: usize,
    pub rows_invalid: usize,
    pub devices_created: usize,
    pub apps_created: usize,
}

/// Migrate every user from the legacy key/value store at `source` into the
/// relational database at `dest`, creating the destination schema if needed.
///
/// Runs single-threaded: each user is read, converted, and persisted before
/// the next. One user's subtree is written inside a single transaction, so
/// a persistence failure rolls the whole user back and leaves no orphaned
/// devices or apps. Not re-entrant against a populated destination: re-runs
/// fail per user on uniqueness constraints, and callers are expected to
/// pre-check whether migration is needed at all.
pub fn migrate_legacy_db(
    source: &Path,
    dest: &Path,
    assets_dir: Option<&Path>,
) -> Result<MigrationSummary> {
    let legacy_conn = legacy::open_legacy_db(source)?;
    let mut dest_conn = db::open_db(dest)?;

    log::info!("Migrating legacy rows from {}", source.display());

    let mut summary = MigrationSummary::default();

    // Rows stream straight off the legacy statement; nothing buffers the
    // whole store in memory.
    legacy::for_each_row(&legacy_conn, |row| {
        summary.total_rows += 1;

        let legacy_user = match legacy::decode_row(&row) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Skipping malformed legacy row '{}': {}", row.key, e);
                summary.rows_invalid += 1;
                return;
            }
        };

        let converted = convert::convert_user(&legacy_user);

        if let Some(assets) = assets_dir {
            check_script_paths(&converted, assets);
        }

        match persist_user(&mut dest_conn, &converted) {
            Ok((devices, apps)) => {
                summary.users_migrated += 1;
                summary.devices_created += devices;
                summary.apps_created += apps;
            }
            Err(e) => {
                log::error!("Skipping user '{}': {}", converted.user.username, e);
                summary.users_skipped += 1;
            }
        }
    })?;

    log::info!(
        "Migration finished: {} migrated, {} skipped, {} invalid rows",
        summary.users_migrated,
        summary.users_skipped,
        summary.rows_invalid
    );

    Ok(summary)
}

/// Persist one user's subtree in dependency order (user, then devices, then
/// each device's apps) inside a single transaction. Returns the device and
/// app counts on success; any failure rolls back the whole user.
fn persist_user(conn: &mut Connection, converted: &ConvertedUser) -> Result<(usize, usize)> {
    let tx = conn.transaction()?;

    schema::insert_user(&tx, &converted.user)?;

    let mut devices = 0;
    let mut apps = 0;
    for dev in &converted.devices {
        schema::insert_device(&tx, &dev.device)?;
        devices += 1;
        for app in &dev.apps {
            schema::insert_app(&tx, app)?;
            apps += 1;
        }
    }

    tx.commit()?;
    Ok((devices, apps))
}

/// Warn about normalized script paths that don't resolve under the assets
/// directory. Validation only -- file contents are never read here, and a
/// missing script never fails the user.
fn check_script_paths(converted: &ConvertedUser, assets_dir: &Path) {
    for dev in &converted.devices {
        for app in &dev.apps {
            if let Some(path) = &app.path {
                if !Path::new(path).is_absolute() && !assets_dir.join(path).exists() {
                    log::warn!(
                        "Script for app '{}' on device '{}' not found under assets dir: {}",
                        app.iname,
                        dev.device.id,
                        path
                    );
                }
            }
        }
    }
}
