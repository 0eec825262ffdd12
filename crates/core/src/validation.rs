//! Input normalization and validation rules.
//!
//! Every externally supplied string passes through here before it reaches
//! the registry, pool, or ledger. Normalization trims whitespace; empty
//! results are rejected rather than defaulted.

use crate::error::CoreError;
use crate::types::Units;

/// Maximum length of a project id or hardware kind name.
const MAX_ID_LEN: usize = 64;

/// Maximum length of a project display name.
const MAX_NAME_LEN: usize = 128;

/// Maximum length of an identity (username).
const MAX_IDENTITY_LEN: usize = 64;

/// Normalize a project id or hardware kind name.
///
/// Rules:
/// - Trimmed of surrounding whitespace.
/// - Must not be empty after trimming.
/// - Must not exceed `MAX_ID_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
pub fn normalize_identifier(raw: &str, field: &'static str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_ID_LEN} characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(format!(
            "{field} may only contain alphanumeric, hyphen, underscore, or dot characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize a display name: trimmed, non-empty, bounded length.
pub fn normalize_display_name(raw: &str, field: &'static str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize a caller identity.
///
/// Identities arrive already authenticated; this only guards against
/// empty or absurdly long values leaking into authorization checks.
pub fn normalize_identity(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "identity must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_IDENTITY_LEN {
        return Err(CoreError::Validation(format!(
            "identity must not exceed {MAX_IDENTITY_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Reject a zero checkout/check-in amount.
///
/// Amounts are unsigned, so "negative" cannot be represented; zero is the
/// only invalid value left to catch.
pub fn validate_amount(amount: Units) -> Result<Units, CoreError> {
    if amount == 0 {
        return Err(CoreError::InvalidAmount);
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;

    // -- normalize_identifier -------------------------------------------------

    #[test]
    fn identifier_is_trimmed() {
        assert_eq!(
            normalize_identifier("  proj-1  ", "project_id").unwrap(),
            "proj-1"
        );
    }

    #[test]
    fn empty_identifier_rejected() {
        assert_matches!(
            normalize_identifier("   ", "project_id"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn identifier_with_spaces_rejected() {
        assert_matches!(
            normalize_identifier("proj 1", "project_id"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn identifier_too_long_rejected() {
        let id = "a".repeat(MAX_ID_LEN + 1);
        assert_matches!(
            normalize_identifier(&id, "project_id"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn dotted_identifier_accepted() {
        assert!(normalize_identifier("hwset.v2_a-1", "kind").is_ok());
    }

    // -- normalize_display_name -----------------------------------------------

    #[test]
    fn display_name_allows_spaces() {
        assert_eq!(
            normalize_display_name(" Lab Bench One ", "project_name").unwrap(),
            "Lab Bench One"
        );
    }

    #[test]
    fn empty_display_name_rejected() {
        assert_matches!(
            normalize_display_name("", "project_name"),
            Err(CoreError::Validation(_))
        );
    }

    // -- validate_amount ------------------------------------------------------

    #[test]
    fn zero_amount_rejected() {
        assert_matches!(validate_amount(0), Err(CoreError::InvalidAmount));
    }

    #[test]
    fn positive_amount_accepted() {
        assert_eq!(validate_amount(5).unwrap(), 5);
    }
}
