// Entity converter: legacy user records -> normalized relational entities
//
// Pure mapping, no IO. Every polymorphic field goes through the decoders in
// legacy::decode; every unrecognized enum string resolves to a catch-all.
// Nothing in here can fail a user -- anomalies resolve to documented
// fallbacks so the orchestrator only ever deals with persistence errors.

use serde_json::Value;

use crate::constants::{BRIGHTNESS_MAX, BRIGHTNESS_MIN, SYSTEM_APPS_MARKER, USER_APPS_MARKER};
use crate::db::schema::{DeviceType, NewApp, NewDevice, NewUser};
use crate::legacy::decode::{
    decode_bool, decode_brightness, decode_coordinate, decode_duration, decode_time_of_day,
};
use crate::legacy::record::{LegacyApp, LegacyDevice, LegacyUser};

/// One user's converted subtree, in persistence order.
#[derive(Debug, Clone)]
pub struct ConvertedUser {
    pub user: NewUser,
    pub devices: Vec<ConvertedDevice>,
}

#[derive(Debug, Clone)]
pub struct ConvertedDevice {
    pub device: NewDevice,
    pub apps: Vec<NewApp>,
}

/// Map a legacy record to the target model. Devices are sorted by id and
/// apps by their explicit order field; the source maps carry no ordering.
pub fn convert_user(legacy: &LegacyUser) -> ConvertedUser {
    let user = NewUser {
        username: legacy.username.clone(),
        password_hash: legacy.password.clone(),
        email: normalize_email(legacy.email.as_deref()),
        theme: legacy.theme.clone(),
        app_repo_url: legacy.app_repo_url.clone(),
        system_repo_url: legacy.system_repo_url.clone(),
    };

    let mut devices: Vec<ConvertedDevice> = legacy
        .devices
        .iter()
        .map(|(id, dev)| convert_device(id, &legacy.username, dev))
        .collect();
    devices.sort_by(|a, b| a.device.id.cmp(&b.device.id));

    ConvertedUser { user, devices }
}

/// Legacy sentinel emails ("" and "none") mean no address was ever set.
/// They become truly absent, not a placeholder string.
fn normalize_email(email: Option<&str>) -> Option<String> {
    match email {
        None | Some("") | Some("none") => None,
        Some(other) => Some(other.to_string()),
    }
}

fn convert_device(id: &str, username: &str, legacy: &LegacyDevice) -> ConvertedDevice {
    let location = legacy.location.as_ref();

    let device = NewDevice {
        id: id.to_string(),
        username: username.to_string(),
        name: legacy.name.clone().unwrap_or_else(|| id.to_string()),
        device_type: legacy
            .device_type
            .as_deref()
            .map(DeviceType::from_legacy)
            .unwrap_or(DeviceType::Other),
        api_key: legacy.api_key.clone(),
        brightness: clamp_brightness(opt_brightness(legacy.brightness.as_ref())),
        night_mode_enabled: opt_bool(legacy.night_mode_enabled.as_ref()),
        night_brightness: clamp_brightness(opt_brightness(legacy.night_brightness.as_ref())),
        night_start: opt_time(legacy.night_start.as_ref()),
        night_end: opt_time(legacy.night_end.as_ref()),
        night_mode_app: legacy.night_mode_app.clone(),
        dim_start: opt_time(legacy.dim_time.as_ref()),
        dim_brightness: legacy
            .dim_brightness
            .as_ref()
            .map(|v| clamp_brightness(decode_brightness(v))),
        default_interval_ns: opt_duration(legacy.default_interval.as_ref()),
        timezone: legacy.timezone.clone(),
        loc_locality: location.and_then(|l| l.locality.clone()),
        loc_description: location.and_then(|l| l.description.clone()),
        loc_place_id: location.and_then(|l| l.place_id.clone()),
        loc_lat: location
            .and_then(|l| l.lat.as_ref())
            .map(decode_coordinate)
            .unwrap_or(0.0),
        loc_lng: location
            .and_then(|l| l.lng.as_ref())
            .map(decode_coordinate)
            .unwrap_or(0.0),
        loc_timezone: location.and_then(|l| l.timezone.clone()),
        firmware_version: legacy.firmware_version.clone(),
        protocol: legacy.protocol.clone(),
        img_url: legacy.img_url.clone(),
        pinned_app: legacy.pinned_app.clone(),
        interstitial_app: legacy.interstitial_app.clone(),
        color_filter: json_opt(legacy.color_filter.as_ref()),
        night_color_filter: json_opt(legacy.night_color_filter.as_ref()),
        brightness_scale: json_opt(legacy.brightness_scale.as_ref()),
    };

    let mut apps: Vec<NewApp> = legacy
        .apps
        .iter()
        .map(|(iname, app)| convert_app(id, iname, app))
        .collect();
    // Re-establish determinism: the legacy map is unordered, display order
    // comes solely from the explicit order field. Stable sort keeps the
    // encounter order for ties.
    apps.sort_by_key(|a| a.sort_order);

    ConvertedDevice { device, apps }
}

fn convert_app(device_id: &str, iname: &str, legacy: &LegacyApp) -> NewApp {
    NewApp {
        device_id: device_id.to_string(),
        iname: iname.to_string(),
        name: legacy.name.clone().unwrap_or_else(|| iname.to_string()),
        path: legacy.path.as_deref().map(normalize_script_path),
        uinterval: opt_int(legacy.uinterval.as_ref()),
        display_time_ns: opt_duration(legacy.display_time.as_ref()),
        enabled: opt_bool(legacy.enabled.as_ref()),
        pushed: opt_bool(legacy.pushed.as_ref()),
        sort_order: legacy
            .order
            .as_ref()
            .and_then(Value::as_i64)
            .unwrap_or(0),
        last_render: legacy.last_render.as_ref().and_then(Value::as_i64),
        last_render_duration_ns: opt_duration(legacy.last_render_duration.as_ref()),
        start_time: opt_time(legacy.start_time.as_ref()),
        end_time: opt_time(legacy.end_time.as_ref()),
        days: legacy
            .days
            .as_ref()
            .map(|d| serde_json::to_string(d).unwrap_or_else(|_| "[]".to_string())),
        recurrence_type: legacy.recurrence_type.clone(),
        recurrence_interval: legacy.recurrence_interval.as_ref().and_then(Value::as_i64),
        recurrence_pattern: legacy.recurrence_pattern.clone(),
        recurrence_start: legacy.recurrence_start.clone(),
        recurrence_end: legacy.recurrence_end.clone(),
        config: legacy
            .config
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "{}".to_string()),
        render_messages: legacy
            .render_messages
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_else(|_| "[]".to_string())),
        autopin: opt_bool(legacy.autopin.as_ref()),
        color_filter: json_opt(legacy.color_filter.as_ref()),
    }
}

/// Strip the host-specific prefix from a legacy absolute script path. The
/// result starts at the system-apps or per-user apps marker; paths with
/// neither marker pass through unchanged.
pub fn normalize_script_path(path: &str) -> String {
    if let Some(idx) = path.find(SYSTEM_APPS_MARKER) {
        return path[idx..].to_string();
    }
    if let Some(idx) = path.find(USER_APPS_MARKER) {
        return path[idx..].to_string();
    }
    path.to_string()
}

fn clamp_brightness(v: i64) -> i64 {
    v.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX)
}

fn opt_bool(v: Option<&Value>) -> bool {
    v.map(decode_bool).unwrap_or(false)
}

fn opt_brightness(v: Option<&Value>) -> i64 {
    v.map(decode_brightness).unwrap_or(0)
}

fn opt_duration(v: Option<&Value>) -> i64 {
    v.map(decode_duration).unwrap_or(0)
}

/// Plain integer fields that occasionally drifted to floats. Truncates.
fn opt_int(v: Option<&Value>) -> i64 {
    v.and_then(Value::as_f64).map(|f| f as i64).unwrap_or(0)
}

/// Empty decode results stay absent so they don't shadow schema defaults.
fn opt_time(v: Option<&Value>) -> Option<String> {
    let t = v.map(decode_time_of_day).unwrap_or_default();
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}

/// Optional JSON blob columns are stored as serialized text, absent stays NULL.
fn json_opt(v: Option<&Value>) -> Option<String> {
    v.map(|val| val.to_string())
}
