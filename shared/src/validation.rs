//! Validation utilities for the Farm Parcel Management Platform

use rust_decimal::Decimal;

/// Maximum accepted length for entity names.
pub const MAX_NAME_LEN: usize = 120;

/// Validate an entity name: non-empty after trimming, bounded length.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err("Name is too long");
    }
    Ok(())
}

/// Validate the change-justification attached to a crop placement update.
/// Every update call must carry one, even when no field value changes.
pub fn validate_justification(justification: &str) -> Result<(), &'static str> {
    if justification.trim().is_empty() {
        return Err("Justification cannot be empty");
    }
    Ok(())
}

/// Validate a cost amount posted to a placement ledger.
pub fn validate_cost_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Cost amount must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rejects_whitespace_only() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("North Field").is_ok());
    }

    #[test]
    fn name_rejects_over_long_input() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name(&long).is_err());
    }

    #[test]
    fn justification_must_carry_content() {
        assert!(validate_justification("").is_err());
        assert!(validate_justification("  \t ").is_err());
        assert!(validate_justification("relocated due to drainage issue").is_ok());
    }

    #[test]
    fn cost_amount_must_be_positive() {
        assert!(validate_cost_amount(Decimal::ZERO).is_err());
        assert!(validate_cost_amount(Decimal::from(-5)).is_err());
        assert!(validate_cost_amount(Decimal::new(1250, 2)).is_ok());
    }
}
