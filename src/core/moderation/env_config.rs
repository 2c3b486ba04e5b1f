// Environment variable parsing shared by the settings loaders.
//
// Set-but-unparsable values are logged and treated as unset.

use std::fmt::Display;
use std::str::FromStr;

/// Read a boolean flag. Accepts `1/true/yes/on` and `0/false/no/off`
/// (case-insensitive); anything else logs a warning and counts as `false`.
pub(crate) fn env_flag(name: &str) -> bool {
    let Ok(value) = std::env::var(name) else {
        return false;
    };

    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        other => {
            tracing::warn!("Ignoring {}={:?}: expected a boolean", name, other);
            false
        }
    }
}

/// Read and parse a value, returning `None` when unset or unparsable.
pub(crate) fn env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", name, trimmed, e);
            None
        }
    }
}

/// Read a string, treating blank values as unset.
pub(crate) fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
