//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::{NodeId, FAILED, FULL_HEALTH, MAX_NAME_LENGTH};

/// Validate a node ID. Accepts `42` or `#42`.
pub fn validate_node_id(s: &str) -> Result<NodeId, String> {
    s.parse()
}

/// Validate a node name.
///
/// Must be non-empty after trimming and at most 200 characters.
pub fn validate_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name cannot exceed {MAX_NAME_LENGTH} characters"));
    }

    Ok(trimmed.to_string())
}

/// Validate a category label such as `IT_Infrastructure`.
pub fn validate_category(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Type cannot be empty".to_string());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(format!("Type '{trimmed}' cannot contain whitespace (use '_' instead)"));
    }
    Ok(trimmed.to_string())
}

/// Validate a resilience score in `0..=100`.
pub fn validate_score(s: &str) -> Result<f64, String> {
    let score: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;

    if !score.is_finite() || !(FAILED..=FULL_HEALTH).contains(&score) {
        return Err(format!(
            "Resilience score must be between {FAILED} and {FULL_HEALTH}, got {score}"
        ));
    }

    Ok(score)
}

/// Validate a downtime cost per hour. Underscores and commas are accepted
/// as digit separators (`1_000_000`, `450,000`).
pub fn validate_cost(s: &str) -> Result<f64, String> {
    let digits: String = s.trim().chars().filter(|c| *c != '_' && *c != ',').collect();
    let cost: f64 = digits
        .parse()
        .map_err(|_| format!("'{s}' is not an amount"))?;

    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("Downtime cost must be a non-negative amount, got {s}"));
    }

    Ok(cost)
}
