//! Common type definitions.
//!
//! # ID Types
//!
//! All entity IDs are Postgres `SERIAL` integers wrapped in type aliases:
//!
//! - [`CompanyId`]: Tenant identifier
//! - [`UserId`]: User account identifier
//! - [`AssetId`], [`AssetGroupId`], [`VendorId`], [`StatusId`]: Company-owned inventory
//!
//! Path segments arrive as raw strings so that a malformed id can be reported as the entity being
//! missing rather than as a routing failure. [`parse_id`] does that conversion.

// Type aliases for IDs
pub type CompanyId = i32;
pub type UserId = i32;
pub type AssetId = i32;
pub type AssetGroupId = i32;
pub type VendorId = i32;
pub type StatusId = i32;

/// Parse a path or body id. Anything that is not a plain integer in range yields `None`.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id("99999999999"), None);
        assert_eq!(parse_id(""), None);
    }
}
