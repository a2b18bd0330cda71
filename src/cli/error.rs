// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, denied access, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exit with an internal error (exit code 2)
/// Internal errors are for unexpected system failures, database corruption, etc.
pub fn internal_error(message: &str) -> ! {
    eprintln!("Internal error: {}", message);
    process::exit(2);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate an entity ID (positive integer)
pub fn validate_id(id_str: &str, kind: &str) -> Result<i64, String> {
    id_str.parse::<i64>()
        .map_err(|_| format!("Invalid {} ID: '{}'. {} ID must be a number.", kind.to_lowercase(), id_str, kind))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid {} ID: {}. {} ID must be positive.", kind.to_lowercase(), id, kind))
            }
        })
}

/// Validate an organization, department, or user name
/// (alphanumeric, dots, underscores, hyphens)
pub fn validate_name(name: &str, kind: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} name cannot be empty", kind));
    }

    if name.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(format!("Invalid {} name: '{}'. Names can only contain letters, numbers, dots, underscores, and hyphens.", kind.to_lowercase(), name))
    }
}

/// Split an `org/dept` path into its two names
pub fn parse_department_path(path: &str) -> Result<(&str, &str), String> {
    match path.split_once('/') {
        Some((org, dept)) if !org.is_empty() && !dept.is_empty() && !dept.contains('/') => Ok((org, dept)),
        _ => Err(format!("Invalid department '{}'. Use <organization>/<department>.", path)),
    }
}

/// Validate a non-negative point amount
pub fn validate_points(value: i64, field_name: &str) -> Result<i64, String> {
    if value < 0 {
        Err(format!("{} cannot be negative", field_name))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("test", "field").is_ok());
        assert!(validate_non_empty("", "field").is_err());
        assert!(validate_non_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("1", "Task"), Ok(1));
        assert_eq!(validate_id("42", "Prize"), Ok(42));
        assert!(validate_id("0", "Task").is_err());
        assert!(validate_id("-1", "Task").is_err());
        assert_eq!(
            validate_id("abc", "Task"),
            Err("Invalid task ID: 'abc'. Task ID must be a number.".to_string())
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("acme", "Organization").is_ok());
        assert!(validate_name("sales.north", "Department").is_ok());
        assert!(validate_name("j_doe-2", "User").is_ok());
        assert!(validate_name("", "User").is_err());
        assert!(validate_name("a/b", "Department").is_err());
        assert!(validate_name("john doe", "User").is_err());
    }

    #[test]
    fn test_parse_department_path() {
        assert_eq!(parse_department_path("acme/ops"), Ok(("acme", "ops")));
        assert!(parse_department_path("acme").is_err());
        assert!(parse_department_path("/ops").is_err());
        assert!(parse_department_path("acme/").is_err());
        assert!(parse_department_path("acme/ops/extra").is_err());
    }

    #[test]
    fn test_validate_points() {
        assert_eq!(validate_points(0, "Points"), Ok(0));
        assert!(validate_points(-5, "Cost").is_err());
    }
}
