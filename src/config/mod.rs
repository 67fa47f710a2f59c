//! Command-line and environment configuration.

mod duration;

pub use duration::{duration_arg, parse_duration};

/// Reject empty values so a blank environment variable reads as missing.
pub fn non_empty(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(" app ").unwrap(), "app");
        assert!(non_empty("").is_err());
        assert!(non_empty("   ").is_err());
    }
}
