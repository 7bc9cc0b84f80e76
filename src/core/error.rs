use thiserror::Error;

use super::types::MAX_TERM_YEARS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("term must be at least one year, got {years}")]
    NonPositiveTerm { years: u32 },

    #[error("term must be at most {max} years, got {years}")]
    TermTooLong { years: u32, max: u32 },

    #[error("{field} must be >= 0, got {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("adjustments of {adjustments} exceed the base principal of {principal}")]
    AdjustmentsExceedPrincipal { principal: f64, adjustments: f64 },

    #[error("{quantity} is too large to represent")]
    Overflow { quantity: &'static str },
}

pub(crate) fn ensure_term(years: u32) -> Result<(), DomainError> {
    if years == 0 {
        return Err(DomainError::NonPositiveTerm { years });
    }
    if years > MAX_TERM_YEARS {
        return Err(DomainError::TermTooLong {
            years,
            max: MAX_TERM_YEARS,
        });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() {
        return Err(DomainError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(DomainError::NegativeValue { field, value });
    }
    Ok(())
}

pub(crate) fn ensure_representable(
    quantity: &'static str,
    value: f64,
) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::Overflow { quantity })
    }
}
