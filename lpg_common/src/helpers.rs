use std::time::Duration;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a duration given either as a bare number of seconds (`"5"`) or with a unit suffix (`"500ms"`, `"2s"`, `"60m"`,
/// `"1h"`).
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let n = digits.parse::<u64>().map_err(|e| format!("'{value}' is not a valid duration. {e}"))?;
    let out_of_range = || format!("'{value}' is out of range");
    match unit {
        "" | "s" => Ok(Duration::from_secs(n)),
        "ms" => Ok(Duration::from_millis(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs).ok_or_else(out_of_range),
        "h" => n.checked_mul(3600).map(Duration::from_secs).ok_or_else(out_of_range),
        u => Err(format!("'{u}' is not a supported duration unit. Use ms, s, m or h")),
    }
}
