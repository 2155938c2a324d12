// Pixelfleet Constants
// Schema defaults shared by the converter, the scheduler, and the live service.
// Do not change without a schema migration.

// Night mode window defaults, applied when a device has no stored window
pub const NIGHT_START_DEFAULT: &str = "22:00";
pub const NIGHT_END_DEFAULT: &str = "06:00";

// Brightness
pub const BRIGHTNESS_MIN: i64 = 0;
pub const BRIGHTNESS_MAX: i64 = 100;

// Default UI brightness scale: level -> representative percentage. Percent
// -> level bucketing uses midpoints between successive entries.
pub const UI_SCALE_DEFAULT: [(u8, i64); 6] = [(0, 0), (1, 3), (2, 5), (3, 12), (4, 35), (5, 100)];

// Fallback percentage for an unknown UI level (documented, not an error)
pub const UI_SCALE_FALLBACK_PERCENT: i64 = 20;

// Legacy script path markers. Anything before a marker is a host-specific
// prefix and gets stripped during migration.
pub const SYSTEM_APPS_MARKER: &str = "system-apps";
pub const USER_APPS_MARKER: &str = "users";

// Legacy key/value store: historical table name used by the blob store
pub const LEGACY_TABLE_PREFERRED: &str = "unnamed";
