//! String option conversion shared by appenders and filters.
//!
//! Every converter takes the option name only to build a useful error.

use super::ConfigError;
use crate::domain::Level;
use std::str::FromStr;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Parses a byte count with an optional `KB`, `MB` or `GB` suffix
/// (case-insensitive, binary multiples).
pub fn to_file_size(option: &str, value: &str) -> Result<u64, ConfigError> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = if let Some(number) = upper.strip_suffix("KB") {
        (number, KB)
    } else if let Some(number) = upper.strip_suffix("MB") {
        (number, MB)
    } else if let Some(number) = upper.strip_suffix("GB") {
        (number, GB)
    } else {
        (upper.as_str(), 1)
    };

    let count: u64 = digits
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid_option(option, value, format!("{e}")))?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| ConfigError::invalid_option(option, value, "file size overflows u64"))
}

pub fn to_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::invalid_option(
            option,
            value,
            "expected true or false",
        ))
    }
}

pub fn to_level(_option: &str, value: &str) -> Result<Level, ConfigError> {
    value.parse()
}

pub fn to_u16(option: &str, value: &str) -> Result<u16, ConfigError> {
    parse_number(option, value)
}

pub fn to_u32(option: &str, value: &str) -> Result<u32, ConfigError> {
    parse_number(option, value)
}

pub fn to_u64(option: &str, value: &str) -> Result<u64, ConfigError> {
    parse_number(option, value)
}

pub fn to_usize(option: &str, value: &str) -> Result<usize, ConfigError> {
    parse_number(option, value)
}

fn parse_number<T>(option: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid_option(option, value, format!("{e}")))
}
