// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use anyhow::Result;
use rusqlite::Connection;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial relational schema (users -> devices -> apps)
    r#"
    -- Users table
    CREATE TABLE users (
        username TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        email TEXT,
        theme TEXT,
        app_repo_url TEXT,
        system_repo_url TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Devices table (legacy 8-character ids preserved)
    CREATE TABLE devices (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL REFERENCES users(username),
        name TEXT NOT NULL,
        device_type TEXT NOT NULL CHECK (device_type IN (
            'tidbyt_gen1', 'tidbyt_gen2', 'tronbyt_s3', 'tronbyt_s3_wide',
            'pixoticker', 'matrixportal_s3', 'other'
        )),
        api_key TEXT,
        brightness INTEGER NOT NULL DEFAULT 0,
        night_mode_enabled INTEGER NOT NULL DEFAULT 0,
        night_brightness INTEGER NOT NULL DEFAULT 0,
        night_start TEXT,
        night_end TEXT,
        night_mode_app TEXT,
        dim_start TEXT,
        dim_brightness INTEGER,
        default_interval_ns INTEGER NOT NULL DEFAULT 0,
        timezone TEXT,
        loc_locality TEXT,
        loc_description TEXT,
        loc_place_id TEXT,
        loc_lat REAL NOT NULL DEFAULT 0,
        loc_lng REAL NOT NULL DEFAULT 0,
        loc_timezone TEXT,
        firmware_version TEXT,
        protocol TEXT,
        img_url TEXT,
        pinned_app TEXT,
        interstitial_app TEXT,
        color_filter TEXT,
        night_color_filter TEXT,
        brightness_scale TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Installed app instances, identified by (device, install name)
    CREATE TABLE apps (
        device_id TEXT NOT NULL REFERENCES devices(id),
        iname TEXT NOT NULL,
        name TEXT NOT NULL,
        path TEXT,
        uinterval INTEGER NOT NULL DEFAULT 0,
        display_time_ns INTEGER NOT NULL DEFAULT 0,
        enabled INTEGER NOT NULL DEFAULT 0,
        pushed INTEGER NOT NULL DEFAULT 0,
        sort_order INTEGER NOT NULL DEFAULT 0,
        last_render INTEGER,
        last_render_duration_ns INTEGER NOT NULL DEFAULT 0,
        start_time TEXT,
        end_time TEXT,
        days TEXT,
        recurrence_type TEXT,
        recurrence_interval INTEGER,
        recurrence_pattern TEXT,
        recurrence_start TEXT,
        recurrence_end TEXT,
        config TEXT NOT NULL DEFAULT '{}',
        render_messages TEXT,
        autopin INTEGER NOT NULL DEFAULT 0,
        color_filter TEXT,
        PRIMARY KEY (device_id, iname)
    );

    -- Indexes for common queries
    CREATE INDEX idx_devices_username ON devices(username);
    CREATE INDEX idx_apps_device_order ON apps(device_id, sort_order);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Run all pending migrations (crash-safe)
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a DB created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}). Please upgrade pixelfleet.",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    // Apply pending migrations one-by-one
    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied migration {}", migration_version);
    }

    Ok(())
}
