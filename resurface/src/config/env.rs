//! Lenient env parsing: malformed values fall back to the default with a warning.

use std::env;
use std::str::FromStr;

use tracing::warn;

pub fn var_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(var = %name, value = %raw, "Malformed value, using default");
                default
            }
        },
        _ => default,
    }
}

pub fn bool_or(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            "" => default,
            _ => {
                warn!(var = %name, value = %raw, "Malformed boolean, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Comma-separated list, trimmed, empties dropped.
pub fn list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
