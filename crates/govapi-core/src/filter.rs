//! Expiry-date classification.
//!
//! Every listing runs under exactly one [`FilterMode`]. A day window implies
//! expiry visibility, so [`FilterMode::resolve`] lets it override the plain
//! has-expiry flag.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

use crate::constants::MAX_WITHIN_DAYS;
use crate::errors::ExemptionError;

/// Which records a listing keeps, based on `properties.expiresOn`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    /// Records that expire on or before `today + n` days (past dates included).
    WithinDays(u32),
    /// Records that carry any non-empty expiry.
    HasExpiry,
    /// Records with no expiry.
    NoExpiry,
}

impl FilterMode {
    /// Derive the mode from the caller's flags.
    pub fn resolve(with_expiry_date: bool, within_days: Option<u32>) -> Self {
        match (within_days, with_expiry_date) {
            (Some(days), _) => Self::WithinDays(days),
            (None, true) => Self::HasExpiry,
            (None, false) => Self::NoExpiry,
        }
    }

    /// Whether projections under this mode surface `expiresOn`.
    pub fn shows_expiry(self) -> bool {
        !matches!(self, Self::NoExpiry)
    }

    /// Decide whether a record with the given `expiresOn` is kept.
    pub fn includes(self, expires_on: Option<&str>, today: NaiveDate) -> bool {
        let expires_on = expires_on.filter(|value| !value.is_empty());
        match self {
            Self::WithinDays(days) => {
                let Some(expiry) = expires_on.and_then(parse_expiry_date) else {
                    return false;
                };
                let threshold = today
                    .checked_add_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MAX);
                expiry <= threshold
            }
            Self::HasExpiry => expires_on.is_some(),
            Self::NoExpiry => expires_on.is_none(),
        }
    }
}

/// Validate the raw "within N days" query value.
///
/// `None` and the empty string mean no window. Anything else must be an
/// integer in `0..=365`.
pub fn parse_within_days(raw: Option<&str>) -> Result<Option<u32>, ExemptionError> {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|days| u32::try_from(days).ok())
        .filter(|days| *days <= MAX_WITHIN_DAYS)
        .map(Some)
        .ok_or_else(|| {
            ExemptionError::invalid_argument(format!(
                "withExpiryDateWithinDays must be an integer between 0 and {MAX_WITHIN_DAYS}."
            ))
        })
}

/// Calendar date of an expiry timestamp.
///
/// Accepts RFC 3339 (offsets are normalised to UTC), an offset-less
/// date-time, or a bare date.
pub fn parse_expiry_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc().date());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
