//! Core data models for student-records
//!
//! This module contains the structures that represent the records domain:
//! students, departments and institutes, and operator accounts.

pub mod department;
pub mod student;
pub mod user;
pub mod validation;

pub use department::{Department, DepartmentOption, Institute};
pub use student::{
    NewStudent, StudentColumn, StudentDetails, StudentListing, StudentUpdate, SENSITIVE_FIELDS,
};
pub use user::User;
pub use validation::{is_valid_initials, normalize_phone, StudentValidationError};

use serde::{Deserialize, Deserializer};

/// A record as a key/value mapping
///
/// Used for query rows and for the field-level encryption contract.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Deserialize a boolean stored either as a JSON bool or as an integer flag
pub(crate) fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
