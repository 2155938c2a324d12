// Polymorphic field decoders for the legacy JSON format.
//
// The same logical field was serialized as different JSON types across
// releases. Every decoder is total: any unrecognized shape resolves to a
// documented fallback, never an error, so one odd field can't block a
// whole fleet migration.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Boolean-like: true/false pass through, non-zero numbers are true,
/// zero and everything else is false.
pub fn decode_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// Brightness: a bare number, or `{"value": <number>}` from the era when
/// brightness carried metadata. Fractions truncate. Fallback 0.
pub fn decode_brightness(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n.as_f64().map(|f| f as i64).unwrap_or(0),
        Value::Object(map) => match map.get("value") {
            Some(Value::Number(n)) => n.as_f64().map(|f| f as i64).unwrap_or(0),
            _ => 0,
        },
        _ => 0,
    }
}

/// Time-of-day: "HH:MM" strings pass through; a bare hour number becomes
/// "HH:00". Fallback is the empty string, which callers replace with the
/// schema default.
pub fn decode_time_of_day(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_f64()
            .map(|h| format!("{:02}:00", h as i64))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PT(?:(\d+(?:\.\d+)?)S)?$").unwrap())
}

/// Duration in nanoseconds. Accepts a bare number of seconds or the
/// restricted ISO-8601 form "PT<seconds>S". Absent or unparsable is 0.
pub fn decode_duration(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_f64()
            .map(|s| (s * NANOS_PER_SEC).round() as i64)
            .unwrap_or(0),
        Value::String(s) => match duration_re().captures(s) {
            Some(caps) => caps
                .get(1)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|secs| (secs * NANOS_PER_SEC).round() as i64)
                .unwrap_or(0),
            None => 0,
        },
        _ => 0,
    }
}

/// Coordinate: a float, or a numeric string from the era when lat/lng were
/// serialized as text. Fallback 0.0.
pub fn decode_coordinate(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_bool_legacy_encodings() {
        let cases: Vec<(Value, bool)> = vec![
            (json!(true), true),
            (json!(false), false),
            (json!(0), false),
            (json!(1), true),
            (json!(0.0), false),
            (json!(2.0), true),
        ];
        for (input, expected) in cases {
            assert_eq!(decode_bool(&input), expected, "input: {}", input);
        }
        // Unrecognized shapes are false
        assert!(!decode_bool(&json!("true")));
        assert!(!decode_bool(&json!(null)));
        assert!(!decode_bool(&json!({"on": true})));
    }

    #[test]
    fn test_decode_brightness() {
        assert_eq!(decode_brightness(&json!(42)), 42);
        assert_eq!(decode_brightness(&json!(42.9)), 42);
        assert_eq!(decode_brightness(&json!({"value": 30})), 30);
        assert_eq!(decode_brightness(&json!({"value": "30"})), 0);
        assert_eq!(decode_brightness(&json!("42")), 0);
        assert_eq!(decode_brightness(&json!(null)), 0);
    }

    #[test]
    fn test_decode_time_of_day() {
        assert_eq!(decode_time_of_day(&json!("22:30")), "22:30");
        assert_eq!(decode_time_of_day(&json!(6)), "06:00");
        assert_eq!(decode_time_of_day(&json!(22)), "22:00");
        assert_eq!(decode_time_of_day(&json!(null)), "");
        assert_eq!(decode_time_of_day(&json!([22, 0])), "");
    }

    #[test]
    fn test_decode_duration() {
        assert_eq!(decode_duration(&json!("PT1.5S")), 1_500_000_000);
        assert_eq!(decode_duration(&json!("PT10S")), 10_000_000_000);
        assert_eq!(decode_duration(&json!(2.0)), 2_000_000_000);
        assert_eq!(decode_duration(&json!(7)), 7_000_000_000);
        // "PT" with no seconds component is a valid zero duration
        assert_eq!(decode_duration(&json!("PT")), 0);
        assert_eq!(decode_duration(&json!("")), 0);
        assert_eq!(decode_duration(&json!("10s")), 0);
        assert_eq!(decode_duration(&json!(null)), 0);
    }

    #[test]
    fn test_decode_coordinate() {
        assert_eq!(decode_coordinate(&json!(41.89)), 41.89);
        assert_eq!(decode_coordinate(&json!("-87.62")), -87.62);
        assert_eq!(decode_coordinate(&json!(" 12.5 ")), 12.5);
        assert_eq!(decode_coordinate(&json!("north")), 0.0);
        assert_eq!(decode_coordinate(&json!(null)), 0.0);
    }
}
