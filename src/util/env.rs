//! Environment detection utilities.

use std::io::IsTerminal;

/// Check if stdout is a TTY.
#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Read an environment variable, treating empty values as unset.
#[must_use]
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a boolean-ish environment value (`1`, `true`, `yes`, `on`).
#[must_use]
pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_flag_accepts_common_spellings() {
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag("TRUE"), Some(true));
        assert_eq!(parse_bool_flag(" off "), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
