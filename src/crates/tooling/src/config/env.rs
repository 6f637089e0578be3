//! Environment variable loading.
//!
//! Helpers for reading and parsing environment variables with error
//! handling instead of panics.

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;

/// Read an environment variable.
///
/// Returns `Ok(None)` when the variable is unset, an error only when it
/// is set but not valid UTF-8.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::Env(format!(
            "{} contains invalid UTF-8",
            key
        ))),
    }
}

/// Read and parse an environment variable.
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => {
            let parsed = val
                .parse::<T>()
                .map_err(|e| ToolingError::Env(format!("failed to parse {}: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Read an environment variable, falling back to a default when unset.
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Read and parse an environment variable, falling back when unset.
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_is_none() {
        assert!(get_env("TOOLING_TEST_DOES_NOT_EXIST").unwrap().is_none());
    }

    #[test]
    fn parse_with_default() {
        std::env::remove_var("TOOLING_TEST_PORT");
        let port: u16 = get_env_parse_or("TOOLING_TEST_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn parse_present_value() {
        std::env::set_var("TOOLING_TEST_WORKERS", "12");
        let workers: usize = get_env_parse("TOOLING_TEST_WORKERS").unwrap().unwrap();
        assert_eq!(workers, 12);
        std::env::remove_var("TOOLING_TEST_WORKERS");
    }

    #[test]
    fn parse_failure_is_error() {
        std::env::set_var("TOOLING_TEST_BAD_NUM", "not-a-number");
        let result: Result<Option<u32>> = get_env_parse("TOOLING_TEST_BAD_NUM");
        assert!(result.is_err());
        std::env::remove_var("TOOLING_TEST_BAD_NUM");
    }

    #[test]
    fn string_default_applies() {
        std::env::remove_var("TOOLING_TEST_URL");
        let url = get_env_or("TOOLING_TEST_URL", "http://localhost").unwrap();
        assert_eq!(url, "http://localhost");
    }
}
