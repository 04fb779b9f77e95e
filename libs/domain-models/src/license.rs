// [libs/domain-models/src/license.rs]
//! The decoded sealed-artifact payload. Field names are bit-exact: they are
//! the serde wire format written into the encrypted file and must not be
//! renamed without breaking compatibility with previously-issued artifacts.

use serde::{Deserialize, Serialize};

/// Marks the license pool as unbounded for the statement quota.
pub const UNLIMITED_STATEMENTS: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub license_key: String,
    pub current_timestamp: i64,
    pub expiry_timestamp: i64,
    pub number_of_users: i64,
    pub number_of_statements: i64,
    pub role: String,
    #[serde(default)]
    pub used_statements: i64,
    #[serde(default)]
    pub system_up_time: i64,
}

impl LicenseRecord {
    /// `IsValid` from spec.md §3: key non-empty, current>0, expiry>current,
    /// users>0, statements != 0.
    pub fn is_valid(&self) -> bool {
        !self.license_key.is_empty()
            && self.current_timestamp > 0
            && self.expiry_timestamp > self.current_timestamp
            && self.number_of_users > 0
            && self.number_of_statements != 0
    }

    pub fn statements_unlimited(&self) -> bool {
        self.number_of_statements == UNLIMITED_STATEMENTS
    }

    pub fn is_expired_at(&self, wall_now_secs: i64) -> bool {
        self.expiry_timestamp < wall_now_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> LicenseRecord {
        LicenseRecord {
            license_key: "K".into(),
            current_timestamp: 1_000,
            expiry_timestamp: 2_000,
            number_of_users: 5,
            number_of_statements: 100,
            role: "standard".into(),
            used_statements: 0,
            system_up_time: 0,
        }
    }

    #[test]
    fn valid_record_passes_is_valid() {
        assert!(valid_record().is_valid());
    }

    #[test]
    fn empty_key_is_invalid() {
        let mut record = valid_record();
        record.license_key.clear();
        assert!(!record.is_valid());
    }

    #[test]
    fn expiry_not_after_current_is_invalid() {
        let mut record = valid_record();
        record.expiry_timestamp = record.current_timestamp;
        assert!(!record.is_valid());
    }

    #[test]
    fn zero_users_is_invalid() {
        let mut record = valid_record();
        record.number_of_users = 0;
        assert!(!record.is_valid());
    }

    #[test]
    fn zero_statements_is_invalid_but_negative_one_is_unlimited() {
        let mut record = valid_record();
        record.number_of_statements = 0;
        assert!(!record.is_valid());

        record.number_of_statements = UNLIMITED_STATEMENTS;
        assert!(record.is_valid());
        assert!(record.statements_unlimited());
    }

    #[test]
    fn expiry_check_uses_wall_clock_seconds() {
        let record = valid_record();
        assert!(!record.is_expired_at(1_500));
        assert!(record.is_expired_at(2_001));
    }
}
