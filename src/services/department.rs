//! Department service
//!
//! Manages the institute and department reference data students point at.

use crate::error::{RecordsError, RecordsResult};
use crate::models::{DepartmentOption, Institute};
use crate::storage::Database;

fn required<'s>(field: &str, value: &'s str) -> RecordsResult<&'s str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RecordsError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value)
}

/// Service for institute and department management
pub struct DepartmentService<'a> {
    db: &'a mut Database,
}

impl<'a> DepartmentService<'a> {
    /// Create a new department service
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// List departments for selection
    pub fn list(&mut self) -> RecordsResult<Vec<DepartmentOption>> {
        self.db.list_departments()
    }

    /// List institutes
    pub fn list_institutes(&mut self) -> RecordsResult<Vec<Institute>> {
        self.db.list_institutes()
    }

    /// Add an institute
    pub fn add_institute(&mut self, code: &str, name: &str) -> RecordsResult<i64> {
        let code = required("Institute code", code)?;
        let name = required("Institute name", name)?;
        self.db.add_institute(code, name)
    }

    /// Add a department to the institute with the given code
    pub fn add_department(
        &mut self,
        institute_code: &str,
        code: &str,
        name: &str,
    ) -> RecordsResult<i64> {
        let code = required("Department code", code)?;
        let name = required("Department name", name)?;
        let institute = self
            .db
            .find_institute(institute_code.trim())?
            .ok_or_else(|| RecordsError::NotFound {
                entity_type: "Institute",
                identifier: institute_code.to_string(),
            })?;

        self.db.add_department(institute.id, code, name)
    }
}
