//! Typed reads of configuration from environment variables.

use std::str::FromStr;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("failed reading {var}: {reason}")]
    Unreadable { var: String, reason: String },

    #[error("invalid value for {var}={value}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

/// Read and parse `var`. Unset or blank variables yield `Ok(None)`.
pub fn parse_var<T>(var: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = match std::env::var(var) {
        Ok(v) => v,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => {
            return Err(EnvError::Unreadable {
                var: var.to_string(),
                reason: e.to_string(),
            });
        }
    };

    let Some(value) = non_empty(raw) else {
        return Ok(None);
    };

    value.parse::<T>().map(Some).map_err(|e| EnvError::Invalid {
        var: var.to_string(),
        value,
        reason: e.to_string(),
    })
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
