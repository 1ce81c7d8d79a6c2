//! Department and Institute models
//!
//! Reference data: every student belongs to a department, and every
//! department belongs to an institute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An institute (faculty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institute {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A department within an institute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub institute_id: i64,
    pub code: String,
    pub name: String,
}

/// A department as offered for selection, with its institute code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentOption {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub institute_code: String,
}

impl fmt::Display for DepartmentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} - {}", self.institute_code, self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_display() {
        let option = DepartmentOption {
            id: 1,
            code: "ВТ".into(),
            name: "Вычислительная техника".into(),
            institute_code: "ИИТ".into(),
        };
        assert_eq!(option.to_string(), "ИИТ/ВТ - Вычислительная техника");
    }
}
