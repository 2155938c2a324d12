// Legacy record shapes
//
// One JSON document per user, as written by the deprecated blob store.
// Fields whose JSON type drifted across releases are kept as raw
// serde_json::Value so a single odd field can never fail whole-record
// deserialization; the decoders in decode.rs normalize them. Devices and
// apps are maps in the source format and their iteration order carries
// no meaning.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyUser {
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub app_repo_url: Option<String>,
    #[serde(default)]
    pub system_repo_url: Option<String>,
    #[serde(default)]
    pub devices: HashMap<String, LegacyDevice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyDevice {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    // Bare percentage in old releases, {"value": n} later
    #[serde(default)]
    pub brightness: Option<Value>,
    // true/false or 0/1
    #[serde(default)]
    pub night_mode_enabled: Option<Value>,
    #[serde(default)]
    pub night_brightness: Option<Value>,
    // "HH:MM" or a bare hour number
    #[serde(default)]
    pub night_start: Option<Value>,
    #[serde(default)]
    pub night_end: Option<Value>,
    #[serde(default)]
    pub night_mode_app: Option<String>,
    #[serde(default)]
    pub dim_time: Option<Value>,
    #[serde(default)]
    pub dim_brightness: Option<Value>,
    // Seconds or "PT<seconds>S"
    #[serde(default)]
    pub default_interval: Option<Value>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<LegacyLocation>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub pinned_app: Option<String>,
    #[serde(default)]
    pub interstitial_app: Option<String>,
    #[serde(default)]
    pub color_filter: Option<Value>,
    #[serde(default)]
    pub night_color_filter: Option<Value>,
    #[serde(default)]
    pub brightness_scale: Option<Value>,
    #[serde(default)]
    pub apps: HashMap<String, LegacyApp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyLocation {
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    // Floats or numeric strings
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyApp {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub uinterval: Option<Value>,
    // Seconds or "PT<seconds>S"; 0 means no override
    #[serde(default)]
    pub display_time: Option<Value>,
    #[serde(default)]
    pub enabled: Option<Value>,
    #[serde(default)]
    pub pushed: Option<Value>,
    #[serde(default)]
    pub order: Option<Value>,
    #[serde(default)]
    pub last_render: Option<Value>,
    #[serde(default)]
    pub last_render_duration: Option<Value>,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub end_time: Option<Value>,
    #[serde(default)]
    pub days: Option<Vec<String>>,
    #[serde(default)]
    pub recurrence_type: Option<String>,
    #[serde(default)]
    pub recurrence_interval: Option<Value>,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    #[serde(default)]
    pub recurrence_start: Option<String>,
    #[serde(default)]
    pub recurrence_end: Option<String>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub render_messages: Option<Vec<String>>,
    #[serde(default)]
    pub autopin: Option<Value>,
    #[serde(default)]
    pub color_filter: Option<Value>,
}
