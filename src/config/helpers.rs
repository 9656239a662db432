use std::str::FromStr;

use alloy_primitives::Address;

use crate::error::ConfigError;

/// Read an env var, treating unset and blank values alike.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Parse an env var, falling back to `default` when it is unset.
pub(crate) fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{e}"),
        })
        .map(|value| value.unwrap_or(default))
}

/// Parse a checksummed or lower-case hex address.
pub(crate) fn parse_address(value: &str, key: &str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a 0x-prefixed 20-byte address, got '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_lower_case() {
        let parsed = parse_address("0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789", "KEY").unwrap();
        assert_eq!(
            parsed.to_string(),
            "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
        );
    }

    #[test]
    fn parse_address_names_the_key() {
        let err = parse_address("0x1234", "ENTRY_POINT_ADDRESS").unwrap_err();
        assert!(err.to_string().contains("ENTRY_POINT_ADDRESS"));
    }
}
