// Database schema types and query helpers

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ----- Device type -----

/// Closed enumeration of supported hardware. Legacy type strings that do not
/// match any known value coerce to `Other` during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    TidbytGen1,
    TidbytGen2,
    TronbytS3,
    TronbytS3Wide,
    Pixoticker,
    MatrixportalS3,
    Other,
}

impl DeviceType {
    pub fn from_legacy(s: &str) -> DeviceType {
        match s {
            "tidbyt_gen1" | "gen1" => DeviceType::TidbytGen1,
            "tidbyt_gen2" | "gen2" => DeviceType::TidbytGen2,
            "tronbyt_s3" => DeviceType::TronbytS3,
            "tronbyt_s3_wide" => DeviceType::TronbytS3Wide,
            "pixoticker" => DeviceType::Pixoticker,
            "matrixportal_s3" => DeviceType::MatrixportalS3,
            _ => DeviceType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::TidbytGen1 => "tidbyt_gen1",
            DeviceType::TidbytGen2 => "tidbyt_gen2",
            DeviceType::TronbytS3 => "tronbyt_s3",
            DeviceType::TronbytS3Wide => "tronbyt_s3_wide",
            DeviceType::Pixoticker => "pixoticker",
            DeviceType::MatrixportalS3 => "matrixportal_s3",
            DeviceType::Other => "other",
        }
    }

    fn from_column(s: &str) -> DeviceType {
        // Stored values always come from as_str(), but an unknown value
        // reads back as Other rather than failing the row.
        DeviceType::from_legacy(s)
    }
}

// ----- User -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub theme: Option<String>,
    pub app_repo_url: Option<String>,
    pub system_repo_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub theme: Option<String>,
    pub app_repo_url: Option<String>,
    pub system_repo_url: Option<String>,
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (username, password_hash, email, theme, app_repo_url, system_repo_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.username,
            user.password_hash,
            user.email,
            user.theme,
            user.app_repo_url,
            user.system_repo_url,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let result = conn
        .query_row(
            "SELECT username, password_hash, email, theme, app_repo_url, system_repo_url, created_at
             FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                    email: row.get(2)?,
                    theme: row.get(3)?,
                    app_repo_url: row.get(4)?,
                    system_repo_url: row.get(5)?,
                    created_at: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

pub fn list_usernames(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT username FROM users ORDER BY username ASC")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

// ----- Device -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub username: String,
    pub name: String,
    pub device_type: DeviceType,
    pub api_key: Option<String>,
    pub brightness: i64,
    pub night_mode_enabled: bool,
    pub night_brightness: i64,
    pub night_start: Option<String>,
    pub night_end: Option<String>,
    pub night_mode_app: Option<String>,
    pub dim_start: Option<String>,
    pub dim_brightness: Option<i64>,
    pub default_interval_ns: i64,
    pub timezone: Option<String>,
    pub loc_locality: Option<String>,
    pub loc_description: Option<String>,
    pub loc_place_id: Option<String>,
    pub loc_lat: f64,
    pub loc_lng: f64,
    pub loc_timezone: Option<String>,
    pub firmware_version: Option<String>,
    pub protocol: Option<String>,
    pub img_url: Option<String>,
    pub pinned_app: Option<String>,
    pub interstitial_app: Option<String>,
    pub color_filter: Option<String>,
    pub night_color_filter: Option<String>,
    pub brightness_scale: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewDevice {
    pub id: String,
    pub username: String,
    pub name: String,
    pub device_type: DeviceType,
    pub api_key: Option<String>,
    pub brightness: i64,
    pub night_mode_enabled: bool,
    pub night_brightness: i64,
    pub night_start: Option<String>,
    pub night_end: Option<String>,
    pub night_mode_app: Option<String>,
    pub dim_start: Option<String>,
    pub dim_brightness: Option<i64>,
    pub default_interval_ns: i64,
    pub timezone: Option<String>,
    pub loc_locality: Option<String>,
    pub loc_description: Option<String>,
    pub loc_place_id: Option<String>,
    pub loc_lat: f64,
    pub loc_lng: f64,
    pub loc_timezone: Option<String>,
    pub firmware_version: Option<String>,
    pub protocol: Option<String>,
    pub img_url: Option<String>,
    pub pinned_app: Option<String>,
    pub interstitial_app: Option<String>,
    pub color_filter: Option<String>,
    pub night_color_filter: Option<String>,
    pub brightness_scale: Option<String>,
}

pub fn insert_device(conn: &Connection, device: &NewDevice) -> Result<()> {
    conn.execute(
        "INSERT INTO devices (id, username, name, device_type, api_key, brightness,
                              night_mode_enabled, night_brightness, night_start, night_end,
                              night_mode_app, dim_start, dim_brightness, default_interval_ns,
                              timezone, loc_locality, loc_description, loc_place_id, loc_lat,
                              loc_lng, loc_timezone, firmware_version, protocol, img_url,
                              pinned_app, interstitial_app, color_filter, night_color_filter,
                              brightness_scale)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
        params![
            device.id,
            device.username,
            device.name,
            device.device_type.as_str(),
            device.api_key,
            device.brightness,
            device.night_mode_enabled,
            device.night_brightness,
            device.night_start,
            device.night_end,
            device.night_mode_app,
            device.dim_start,
            device.dim_brightness,
            device.default_interval_ns,
            device.timezone,
            device.loc_locality,
            device.loc_description,
            device.loc_place_id,
            device.loc_lat,
            device.loc_lng,
            device.loc_timezone,
            device.firmware_version,
            device.protocol,
            device.img_url,
            device.pinned_app,
            device.interstitial_app,
            device.color_filter,
            device.night_color_filter,
            device.brightness_scale,
        ],
    )?;
    Ok(())
}

const DEVICE_COLUMNS: &str = "id, username, name, device_type, api_key, brightness,
    night_mode_enabled, night_brightness, night_start, night_end, night_mode_app,
    dim_start, dim_brightness, default_interval_ns, timezone, loc_locality,
    loc_description, loc_place_id, loc_lat, loc_lng, loc_timezone, firmware_version,
    protocol, img_url, pinned_app, interstitial_app, color_filter, night_color_filter,
    brightness_scale, created_at";

fn map_device(row: &rusqlite::Row) -> rusqlite::Result<Device> {
    let device_type: String = row.get(3)?;
    Ok(Device {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        device_type: DeviceType::from_column(&device_type),
        api_key: row.get(4)?,
        brightness: row.get(5)?,
        night_mode_enabled: row.get(6)?,
        night_brightness: row.get(7)?,
        night_start: row.get(8)?,
        night_end: row.get(9)?,
        night_mode_app: row.get(10)?,
        dim_start: row.get(11)?,
        dim_brightness: row.get(12)?,
        default_interval_ns: row.get(13)?,
        timezone: row.get(14)?,
        loc_locality: row.get(15)?,
        loc_description: row.get(16)?,
        loc_place_id: row.get(17)?,
        loc_lat: row.get(18)?,
        loc_lng: row.get(19)?,
        loc_timezone: row.get(20)?,
        firmware_version: row.get(21)?,
        protocol: row.get(22)?,
        img_url: row.get(23)?,
        pinned_app: row.get(24)?,
        interstitial_app: row.get(25)?,
        color_filter: row.get(26)?,
        night_color_filter: row.get(27)?,
        brightness_scale: row.get(28)?,
        created_at: row.get(29)?,
    })
}

pub fn get_device(conn: &Connection, id: &str) -> Result<Option<Device>> {
    let sql = format!("SELECT {} FROM devices WHERE id = ?1", DEVICE_COLUMNS);
    let result = conn.query_row(&sql, params![id], map_device).optional()?;
    Ok(result)
}

pub fn list_devices(conn: &Connection, username: &str) -> Result<Vec<Device>> {
    let sql = format!(
        "SELECT {} FROM devices WHERE username = ?1 ORDER BY id ASC",
        DEVICE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let devices = stmt
        .query_map(params![username], map_device)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(devices)
}

pub fn count_devices(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
    Ok(count)
}

// ----- App -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub device_id: String,
    pub iname: String,
    pub name: String,
    pub path: Option<String>,
    pub uinterval: i64,
    pub display_time_ns: i64,
    pub enabled: bool,
    pub pushed: bool,
    pub sort_order: i64,
    pub last_render: Option<i64>,
    pub last_render_duration_ns: i64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub days: Option<String>,
    pub recurrence_type: Option<String>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_pattern: Option<String>,
    pub recurrence_start: Option<String>,
    pub recurrence_end: Option<String>,
    pub config: String,
    pub render_messages: Option<String>,
    pub autopin: bool,
    pub color_filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewApp {
    pub device_id: String,
    pub iname: String,
    pub name: String,
    pub path: Option<String>,
    pub uinterval: i64,
    pub display_time_ns: i64,
    pub enabled: bool,
    pub pushed: bool,
    pub sort_order: i64,
    pub last_render: Option<i64>,
    pub last_render_duration_ns: i64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub days: Option<String>,
    pub recurrence_type: Option<String>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_pattern: Option<String>,
    pub recurrence_start: Option<String>,
    pub recurrence_end: Option<String>,
    pub config: String,
    pub render_messages: Option<String>,
    pub autopin: bool,
    pub color_filter: Option<String>,
}

pub fn insert_app(conn: &Connection, app: &NewApp) -> Result<()> {
    conn.execute(
        "INSERT INTO apps (device_id, iname, name, path, uinterval, display_time_ns, enabled,
                           pushed, sort_order, last_render, last_render_duration_ns, start_time,
                           end_time, days, recurrence_type, recurrence_interval,
                           recurrence_pattern, recurrence_start, recurrence_end, config,
                           render_messages, autopin, color_filter)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            app.device_id,
            app.iname,
            app.name,
            app.path,
            app.uinterval,
            app.display_time_ns,
            app.enabled,
            app.pushed,
            app.sort_order,
            app.last_render,
            app.last_render_duration_ns,
            app.start_time,
            app.end_time,
            app.days,
            app.recurrence_type,
            app.recurrence_interval,
            app.recurrence_pattern,
            app.recurrence_start,
            app.recurrence_end,
            app.config,
            app.render_messages,
            app.autopin,
            app.color_filter,
        ],
    )?;
    Ok(())
}

const APP_COLUMNS: &str = "device_id, iname, name, path, uinterval, display_time_ns, enabled,
    pushed, sort_order, last_render, last_render_duration_ns, start_time, end_time, days,
    recurrence_type, recurrence_interval, recurrence_pattern, recurrence_start,
    recurrence_end, config, render_messages, autopin, color_filter";

fn map_app(row: &rusqlite::Row) -> rusqlite::Result<App> {
    Ok(App {
        device_id: row.get(0)?,
        iname: row.get(1)?,
        name: row.get(2)?,
        path: row.get(3)?,
        uinterval: row.get(4)?,
        display_time_ns: row.get(5)?,
        enabled: row.get(6)?,
        pushed: row.get(7)?,
        sort_order: row.get(8)?,
        last_render: row.get(9)?,
        last_render_duration_ns: row.get(10)?,
        start_time: row.get(11)?,
        end_time: row.get(12)?,
        days: row.get(13)?,
        recurrence_type: row.get(14)?,
        recurrence_interval: row.get(15)?,
        recurrence_pattern: row.get(16)?,
        recurrence_start: row.get(17)?,
        recurrence_end: row.get(18)?,
        config: row.get(19)?,
        render_messages: row.get(20)?,
        autopin: row.get(21)?,
        color_filter: row.get(22)?,
    })
}

pub fn get_app(conn: &Connection, device_id: &str, iname: &str) -> Result<Option<App>> {
    let sql = format!(
        "SELECT {} FROM apps WHERE device_id = ?1 AND iname = ?2",
        APP_COLUMNS
    );
    let result = conn
        .query_row(&sql, params![device_id, iname], map_app)
        .optional()?;
    Ok(result)
}

/// List a device's apps in display order. Ordering comes from the explicit
/// sort_order column, never from insertion order.
pub fn list_apps(conn: &Connection, device_id: &str) -> Result<Vec<App>> {
    let sql = format!(
        "SELECT {} FROM apps WHERE device_id = ?1 ORDER BY sort_order ASC, iname ASC",
        APP_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let apps = stmt
        .query_map(params![device_id], map_app)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(apps)
}

pub fn count_apps(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM apps", [], |row| row.get(0))?;
    Ok(count)
}
