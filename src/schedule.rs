// Derived-state rules: scheduling predicates consumed by the live service
//
// All functions here are pure and operate on persisted entities; they are
// safe to call concurrently from multiple readers.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

use crate::constants::{
    NIGHT_END_DEFAULT, NIGHT_START_DEFAULT, UI_SCALE_DEFAULT, UI_SCALE_FALLBACK_PERCENT,
};
use crate::db::schema::{App, Device};

/// Resolve the device's timezone: explicit setting first, then the
/// location-derived zone, then none (callers fall back to local time).
fn resolve_timezone(device: &Device) -> Option<Tz> {
    if let Some(tz) = device.timezone.as_deref().and_then(|s| s.parse::<Tz>().ok()) {
        return Some(tz);
    }
    device
        .loc_timezone
        .as_deref()
        .and_then(|s| s.parse::<Tz>().ok())
}

/// The current wall-clock time on the device, formatted "HH:MM".
fn device_local_hhmm(device: &Device, now: DateTime<Utc>) -> String {
    match resolve_timezone(device) {
        Some(tz) => now.with_timezone(&tz).format("%H:%M").to_string(),
        None => now.with_timezone(&Local).format("%H:%M").to_string(),
    }
}

/// Membership test for a "HH:MM" window. When start > end the window wraps
/// past midnight and membership is now >= start OR now <= end; otherwise
/// both bounds apply. Zero-padded strings compare correctly as text.
fn window_contains(now_hhmm: &str, start: &str, end: &str) -> bool {
    if start > end {
        now_hhmm >= start || now_hhmm <= end
    } else {
        now_hhmm >= start && now_hhmm <= end
    }
}

/// Whether the device is inside its night-mode window right now.
pub fn night_mode_active(device: &Device, now: DateTime<Utc>) -> bool {
    if !device.night_mode_enabled {
        return false;
    }
    let start = device.night_start.as_deref().unwrap_or(NIGHT_START_DEFAULT);
    let end = device.night_end.as_deref().unwrap_or(NIGHT_END_DEFAULT);
    window_contains(&device_local_hhmm(device, now), start, end)
}

/// Whether the device is inside its dim window: from the configured dim
/// start until night mode's end (or its default). No dim start, no dim mode.
pub fn dim_mode_active(device: &Device, now: DateTime<Utc>) -> bool {
    let Some(dim_start) = device.dim_start.as_deref() else {
        return false;
    };
    let end = device.night_end.as_deref().unwrap_or(NIGHT_END_DEFAULT);
    window_contains(&device_local_hhmm(device, now), dim_start, end)
}

/// Current brightness for the device: night value when night mode is
/// active, else the dim value when dimming is active and configured, else
/// the base brightness.
pub fn effective_brightness(device: &Device, now: DateTime<Utc>) -> i64 {
    if night_mode_active(device, now) {
        return device.night_brightness;
    }
    if dim_mode_active(device, now) {
        if let Some(dim) = device.dim_brightness {
            return dim;
        }
    }
    device.brightness
}

/// How long an app stays on screen, in nanoseconds: the app's own positive
/// display-time override wins, otherwise the device default interval.
pub fn effective_dwell_time(device: &Device, app: &App) -> i64 {
    if app.display_time_ns > 0 {
        app.display_time_ns
    } else {
        device.default_interval_ns
    }
}

/// Map a 0-100 brightness percentage to the 0-5 UI level.
///
/// The scale (default table or a device's custom six level->percent pairs)
/// is sorted by percent ascending and bucketed by the midpoint between
/// successive percents: v <= midpoint takes the lower bucket, and the last
/// level catches everything above the final midpoint. With the default
/// table the 12/35 midpoint is 23.5, so 20 is level 3.
pub fn brightness_ui_scale(brightness: i64, custom: Option<&[(u8, i64)]>) -> u8 {
    let mut pairs: Vec<(u8, i64)> = custom.unwrap_or(&UI_SCALE_DEFAULT).to_vec();
    pairs.sort_by_key(|(_, percent)| *percent);
    for window in pairs.windows(2) {
        let (level, percent) = window[0];
        let (_, next_percent) = window[1];
        let midpoint = (percent + next_percent) as f64 / 2.0;
        if (brightness as f64) <= midpoint {
            return level;
        }
    }
    pairs.last().map(|(level, _)| *level).unwrap_or(0)
}

/// Inverse of brightness_ui_scale: UI level back to a percentage. Unknown
/// levels resolve to a documented fallback of 20, not an error.
pub fn brightness_from_ui_scale(level: u8, custom: Option<&[(u8, i64)]>) -> i64 {
    let table: &[(u8, i64)] = custom.unwrap_or(&UI_SCALE_DEFAULT);
    table
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, percent)| *percent)
        .unwrap_or(UI_SCALE_FALLBACK_PERCENT)
}

/// Parse a device's stored custom brightness scale (JSON object of
/// level -> percent). Malformed entries are dropped; a scale without the
/// full six levels is treated as absent.
pub fn parse_brightness_scale(json: &str) -> Option<Vec<(u8, i64)>> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let map = value.as_object()?;
    let mut pairs: Vec<(u8, i64)> = map
        .iter()
        .filter_map(|(k, v)| Some((k.parse::<u8>().ok()?, v.as_i64()?)))
        .collect();
    if pairs.len() != 6 {
        return None;
    }
    pairs.sort_by_key(|(level, _)| *level);
    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::db::schema::DeviceType;

    /// A UTC-pinned device so window tests are deterministic.
    fn utc_device() -> Device {
        Device {
            id: "a1b2c3d4".to_string(),
            username: "alice".to_string(),
            name: "Kitchen".to_string(),
            device_type: DeviceType::TronbytS3,
            api_key: None,
            brightness: 40,
            night_mode_enabled: true,
            night_brightness: 5,
            night_start: None,
            night_end: None,
            night_mode_app: None,
            dim_start: None,
            dim_brightness: None,
            default_interval_ns: 10_000_000_000,
            timezone: Some("UTC".to_string()),
            loc_locality: None,
            loc_description: None,
            loc_place_id: None,
            loc_lat: 0.0,
            loc_lng: 0.0,
            loc_timezone: None,
            firmware_version: None,
            protocol: None,
            img_url: None,
            pinned_app: None,
            interstitial_app: None,
            color_filter: None,
            night_color_filter: None,
            brightness_scale: None,
            created_at: String::new(),
        }
    }

    fn utc(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, h, m, 0).unwrap()
    }

    #[test]
    fn test_night_window_wraps_midnight() {
        let device = utc_device();
        // Default window 22:00-06:00
        assert!(night_mode_active(&device, utc(23, 30)));
        assert!(night_mode_active(&device, utc(2, 0)));
        assert!(!night_mode_active(&device, utc(12, 0)));
        // Boundary membership is inclusive
        assert!(night_mode_active(&device, utc(22, 0)));
        assert!(night_mode_active(&device, utc(6, 0)));
        assert!(!night_mode_active(&device, utc(6, 1)));
    }

    #[test]
    fn test_night_window_non_wrapping() {
        let mut device = utc_device();
        device.night_start = Some("13:00".to_string());
        device.night_end = Some("15:00".to_string());
        assert!(night_mode_active(&device, utc(14, 0)));
        assert!(!night_mode_active(&device, utc(12, 59)));
        assert!(!night_mode_active(&device, utc(15, 1)));
    }

    #[test]
    fn test_night_mode_disabled_is_never_active() {
        let mut device = utc_device();
        device.night_mode_enabled = false;
        assert!(!night_mode_active(&device, utc(23, 30)));
    }

    #[test]
    fn test_location_timezone_used_when_unset() {
        let mut device = utc_device();
        device.timezone = None;
        device.loc_timezone = Some("America/Chicago".to_string());
        // 04:00 UTC is 23:00 or 22:00 in Chicago depending on DST; June is
        // CDT (UTC-5), so 04:00 UTC = 23:00 local, inside the night window.
        assert!(night_mode_active(&device, utc(4, 0)));
        // 17:00 UTC = 12:00 local, outside.
        assert!(!night_mode_active(&device, utc(17, 0)));
    }

    #[test]
    fn test_dim_mode_requires_dim_start() {
        let mut device = utc_device();
        assert!(!dim_mode_active(&device, utc(21, 0)));

        device.dim_start = Some("20:00".to_string());
        // Window 20:00 -> 06:00 (night end default), wrapping
        assert!(dim_mode_active(&device, utc(21, 0)));
        assert!(dim_mode_active(&device, utc(3, 0)));
        assert!(!dim_mode_active(&device, utc(12, 0)));
    }

    #[test]
    fn test_effective_brightness_priority() {
        let mut device = utc_device();
        device.dim_start = Some("20:00".to_string());
        device.dim_brightness = Some(15);

        // Night active at 23:30 wins over dim
        assert_eq!(effective_brightness(&device, utc(23, 30)), 5);
        // Dim window but before night start
        assert_eq!(effective_brightness(&device, utc(21, 0)), 15);
        // Daytime: base
        assert_eq!(effective_brightness(&device, utc(12, 0)), 40);

        // Dim active but no dim value set: base brightness
        device.dim_brightness = None;
        assert_eq!(effective_brightness(&device, utc(21, 0)), 40);
    }

    #[test]
    fn test_effective_dwell_time() {
        let device = utc_device();
        let mut app = crate::db::schema::App {
            device_id: device.id.clone(),
            iname: "clock".to_string(),
            name: "Clock".to_string(),
            path: None,
            uinterval: 10,
            display_time_ns: 0,
            enabled: true,
            pushed: false,
            sort_order: 0,
            last_render: None,
            last_render_duration_ns: 0,
            start_time: None,
            end_time: None,
            days: None,
            recurrence_type: None,
            recurrence_interval: None,
            recurrence_pattern: None,
            recurrence_start: None,
            recurrence_end: None,
            config: "{}".to_string(),
            render_messages: None,
            autopin: false,
            color_filter: None,
        };

        assert_eq!(effective_dwell_time(&device, &app), 10_000_000_000);
        app.display_time_ns = 7_000_000_000;
        assert_eq!(effective_dwell_time(&device, &app), 7_000_000_000);
    }

    #[test]
    fn test_brightness_ui_scale_default_table() {
        // Default percents 0/3/5/12/35/100 give midpoints 1.5/4/8.5/23.5/67.5
        assert_eq!(brightness_ui_scale(0, None), 0);
        assert_eq!(brightness_ui_scale(1, None), 0);
        assert_eq!(brightness_ui_scale(3, None), 1);
        assert_eq!(brightness_ui_scale(5, None), 2);
        assert_eq!(brightness_ui_scale(20, None), 3);
        assert_eq!(brightness_ui_scale(24, None), 4);
        assert_eq!(brightness_ui_scale(35, None), 4);
        assert_eq!(brightness_ui_scale(68, None), 5);
        assert_eq!(brightness_ui_scale(100, None), 5);

        // Each level's own percentage maps back to that level
        for level in 0u8..=5 {
            assert_eq!(brightness_ui_scale(brightness_from_ui_scale(level, None), None), level);
        }
    }

    #[test]
    fn test_brightness_ui_scale_custom_midpoint_rule() {
        let scale: Vec<(u8, i64)> = vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40), (5, 50)];
        // 25 sits exactly on the 20/30 midpoint; v <= midpoint takes the
        // lower bucket.
        assert_eq!(brightness_ui_scale(25, Some(&scale)), 2);
        assert_eq!(brightness_ui_scale(26, Some(&scale)), 3);
        assert_eq!(brightness_ui_scale(0, Some(&scale)), 0);
        // Beyond the last midpoint everything lands in the top level
        assert_eq!(brightness_ui_scale(99, Some(&scale)), 5);
    }

    #[test]
    fn test_brightness_from_ui_scale() {
        assert_eq!(brightness_from_ui_scale(0, None), 0);
        assert_eq!(brightness_from_ui_scale(3, None), 12);
        assert_eq!(brightness_from_ui_scale(5, None), 100);
        // Unknown level: documented fallback, not an error
        assert_eq!(brightness_from_ui_scale(9, None), 20);

        let scale: Vec<(u8, i64)> = vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40), (5, 50)];
        assert_eq!(brightness_from_ui_scale(4, Some(&scale)), 40);
    }

    #[test]
    fn test_parse_brightness_scale() {
        let scale =
            parse_brightness_scale(r#"{"0":0,"1":10,"2":20,"3":30,"4":40,"5":50}"#).unwrap();
        assert_eq!(scale.len(), 6);
        assert_eq!(scale[5], (5, 50));

        assert!(parse_brightness_scale(r#"{"0":0,"1":10}"#).is_none());
        assert!(parse_brightness_scale("not json").is_none());
    }
}
