//! Error types for policy and store construction.
//!
//! Everything in the hot `access` path either succeeds or panics on a
//! contract violation (see [`crate::store::BlockStore::add`]); `PolicyError`
//! only covers the construction-time failures a caller can actually recover
//! from.

/// Errors raised while constructing a [`crate::store::BlockStore`] or a
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// `capacity` must be a positive integer.
    #[error("capacity must be positive, got {0}")]
    InvalidCapacity(i64),

    /// A ratio or weight parameter was outside its valid range, or not
    /// finite.
    #[error("{name} must be finite and within {min}..={max}, got {value}")]
    InvalidRatio {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Convenience alias used throughout constructors.
pub type PolicyResult<T> = Result<T, PolicyError>;

pub(crate) fn check_capacity(capacity: usize) -> PolicyResult<()> {
    if capacity == 0 {
        return Err(PolicyError::InvalidCapacity(0));
    }
    Ok(())
}

pub(crate) fn check_unit_ratio(name: &'static str, value: f64) -> PolicyResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(PolicyError::InvalidRatio {
            name,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

pub(crate) fn check_nonnegative_weight(name: &'static str, value: f64) -> PolicyResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PolicyError::InvalidRatio {
            name,
            value,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(check_capacity(0), Err(PolicyError::InvalidCapacity(0)));
    }

    #[test]
    fn accepts_positive_capacity() {
        assert!(check_capacity(1).is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        assert!(check_unit_ratio("sm_ratio", 1.5).is_err());
        assert!(check_unit_ratio("sm_ratio", -0.1).is_err());
        assert!(check_unit_ratio("sm_ratio", f64::NAN).is_err());
    }

    #[test]
    fn accepts_in_range_ratio() {
        assert!(check_unit_ratio("sm_ratio", 0.1).is_ok());
        assert!(check_unit_ratio("sm_ratio", 0.0).is_ok());
        assert!(check_unit_ratio("sm_ratio", 1.0).is_ok());
    }

    #[test]
    fn rejects_negative_weight() {
        assert!(check_nonnegative_weight("pos_alpha", -1.0).is_err());
        assert!(check_nonnegative_weight("pos_alpha", f64::INFINITY).is_err());
    }
}
