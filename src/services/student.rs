//! Student service
//!
//! Business rules for student records: validation and normalization before
//! anything is written, department checks, and decryption on display.

use crate::crypto::LazyEncryptor;
use crate::error::{RecordsError, RecordsResult};
use crate::models::{NewStudent, StudentDetails, StudentListing, StudentUpdate};
use crate::storage::Database;

/// Default number of rows returned by [`StudentService::list`]
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Service for student management
pub struct StudentService<'a> {
    db: &'a mut Database,
    encryptor: &'a LazyEncryptor,
}

impl<'a> StudentService<'a> {
    /// Create a new student service
    pub fn new(db: &'a mut Database, encryptor: &'a LazyEncryptor) -> Self {
        Self { db, encryptor }
    }

    fn ensure_department(&mut self, department_id: i64) -> RecordsResult<()> {
        if self.db.get_department(department_id)?.is_none() {
            return Err(RecordsError::department_not_found(department_id));
        }
        Ok(())
    }

    /// List students ordered by last name
    pub fn list(&mut self, limit: usize) -> RecordsResult<Vec<StudentListing>> {
        self.db.get_students(limit)
    }

    /// Load a student with phone and record-book number decrypted
    pub fn show(&mut self, id: i64) -> RecordsResult<StudentDetails> {
        let encryptor = self.encryptor.get()?;
        self.db
            .get_student_decrypted(id, encryptor)?
            .ok_or_else(|| RecordsError::student_not_found(id))
    }

    /// Load a student as stored, leaving encrypted fields untouched
    ///
    /// Does not need the encryption key.
    pub fn find(&mut self, id: i64) -> RecordsResult<StudentDetails> {
        self.db
            .get_student(id)?
            .ok_or_else(|| RecordsError::student_not_found(id))
    }

    /// Validate and add a student, returning the new id
    pub fn create(&mut self, student: NewStudent) -> RecordsResult<i64> {
        student.validate()?;
        let student = student.normalized();
        self.ensure_department(student.department_id)?;

        let encryptor = self.encryptor.get()?;
        self.db.add_student_with_encryption(&student, encryptor)
    }

    /// Validate and apply a partial update
    pub fn update(&mut self, id: i64, update: StudentUpdate) -> RecordsResult<()> {
        if update.is_empty() {
            return Err(RecordsError::Validation("No fields to update".into()));
        }
        let current = self.find(id)?;
        update.validate_against(&current)?;
        let update = update.normalized();

        if let Some(department_id) = update.department_id {
            self.ensure_department(department_id)?;
        }

        let encryptor = self.encryptor.get()?;
        if self.db.update_student_with_encryption(id, &update, encryptor)? {
            Ok(())
        } else {
            Err(RecordsError::student_not_found(id))
        }
    }

    /// Delete a student; the encryption key is not touched
    pub fn delete(&mut self, id: i64) -> RecordsResult<()> {
        if self.db.delete_student(id)? {
            Ok(())
        } else {
            Err(RecordsError::student_not_found(id))
        }
    }
}
