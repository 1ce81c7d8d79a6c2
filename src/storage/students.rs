//! Student storage operations
//!
//! Phone and record-book numbers are encrypted before they reach any SQL
//! statement; only the `*_encrypted` columns ever hold them.

use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::crypto::FieldEncryptor;
use crate::error::{RecordsError, RecordsResult};
use crate::models::{
    NewStudent, Record, StudentColumn, StudentDetails, StudentListing, StudentUpdate,
    SENSITIVE_FIELDS,
};

use super::database::json_to_sql;
use super::Database;

/// Columns written when inserting a student, before `created_by`
const INSERT_COLUMNS: [StudentColumn; 9] = StudentColumn::ALL;

const LIST_QUERY: &str = "\
    SELECT s.id, s.last_name, s.initials, s.birth_year, s.admission_year, \
           s.group_name, s.city_before, \
           d.code AS department_code, d.name AS department_name, \
           i.code AS institute_code, i.name AS institute_name \
    FROM students s \
    JOIN departments d ON s.department_id = d.id \
    JOIN institutes i ON d.institute_id = i.id \
    ORDER BY s.last_name, s.initials, s.id \
    LIMIT ?1";

const DETAILS_QUERY: &str = "\
    SELECT s.id, s.last_name, s.initials, s.birth_year, s.admission_year, \
           s.group_name, s.department_id, s.city_before, \
           s.phone_encrypted, s.record_book_number_encrypted, \
           s.created_at, s.updated_at, \
           d.code AS department_code, i.code AS institute_code \
    FROM students s \
    JOIN departments d ON s.department_id = d.id \
    JOIN institutes i ON d.institute_id = i.id \
    WHERE s.id = ?1";

/// Value of a record field as an SQL parameter, NULL when absent
fn column_value(record: &Record, column: StudentColumn) -> SqlValue {
    record
        .get(column.as_str())
        .map(json_to_sql)
        .unwrap_or(SqlValue::Null)
}

/// Whether a plaintext sensitive field carries no value
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// First `id` column of a RETURNING result
fn returned_id(rows: Option<Vec<Record>>) -> Option<i64> {
    rows.and_then(|rows| rows.into_iter().next())
        .and_then(|row| row.get("id").and_then(Value::as_i64))
}

impl Database {
    /// List students ordered by last name, at most `limit` rows
    pub fn get_students(&mut self, limit: usize) -> RecordsResult<Vec<StudentListing>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_as(LIST_QUERY, [limit])
    }

    /// Load one student with the encrypted columns still encrypted
    pub fn get_student(&mut self, id: i64) -> RecordsResult<Option<StudentDetails>> {
        let mut rows: Vec<StudentDetails> = self.query_as(DETAILS_QUERY, [id])?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Load one student and decrypt the sensitive fields
    pub fn get_student_decrypted(
        &mut self,
        id: i64,
        encryptor: &FieldEncryptor,
    ) -> RecordsResult<Option<StudentDetails>> {
        let rows = self.execute_query(DETAILS_QUERY, [id], true)?.unwrap_or_default();
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let decrypted = encryptor.decrypt_fields(&row, &SENSITIVE_FIELDS)?;
        Ok(Some(serde_json::from_value(Value::Object(decrypted))?))
    }

    /// Insert a student, encrypting the sensitive fields first
    ///
    /// Returns the new student's id.
    pub fn add_student_with_encryption(
        &mut self,
        student: &NewStudent,
        encryptor: &FieldEncryptor,
    ) -> RecordsResult<i64> {
        let record = encryptor.encrypt_fields(&student.to_record()?, &SENSITIVE_FIELDS)?;

        let mut values: Vec<SqlValue> = INSERT_COLUMNS
            .iter()
            .map(|column| column_value(&record, *column))
            .collect();
        values.push(
            self.acting_user()
                .map(SqlValue::Integer)
                .unwrap_or(SqlValue::Null),
        );

        let columns: Vec<&str> = INSERT_COLUMNS.iter().map(StudentColumn::as_str).collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO students ({}, created_by) VALUES ({}) RETURNING id",
            columns.join(", "),
            placeholders
        );

        let rows = self.execute_query(&sql, params_from_iter(values), true)?;
        let id = returned_id(rows)
            .ok_or_else(|| RecordsError::Query("Insert did not return an id".into()))?;

        tracing::info!(student_id = id, "Student added");
        Ok(id)
    }

    /// Update the fields set in `update`, encrypting sensitive ones first
    ///
    /// Blank phone or record-book values leave the stored values unchanged.
    /// Only allow-listed columns are written, and `updated_at` is refreshed.
    /// Returns `false` when no student has the given id.
    pub fn update_student_with_encryption(
        &mut self,
        id: i64,
        update: &StudentUpdate,
        encryptor: &FieldEncryptor,
    ) -> RecordsResult<bool> {
        let mut record = update.to_record()?;
        record.retain(|key, value| !(SENSITIVE_FIELDS.contains(&key.as_str()) && is_blank(value)));
        let record = encryptor.encrypt_fields(&record, &SENSITIVE_FIELDS)?;

        let mut assignments = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len() + 1);
        for (key, value) in &record {
            let column = StudentColumn::from_name(key).ok_or_else(|| {
                RecordsError::Validation(format!("Column '{}' cannot be updated", key))
            })?;
            assignments.push(format!("{} = ?", column.as_str()));
            values.push(json_to_sql(value));
        }

        if assignments.is_empty() {
            return Err(RecordsError::Validation("No fields to update".into()));
        }

        values.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE students SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ? RETURNING id",
            assignments.join(", ")
        );

        let rows = self.execute_query(&sql, params_from_iter(values), true)?;
        let updated = returned_id(rows).is_some();

        if updated {
            tracing::info!(student_id = id, fields = assignments.len(), "Student updated");
        } else {
            tracing::warn!(student_id = id, "Student to update was not found");
        }
        Ok(updated)
    }

    /// Delete a student; returns `false` when no student has the given id
    pub fn delete_student(&mut self, id: i64) -> RecordsResult<bool> {
        let rows = self.execute_query(
            "DELETE FROM students WHERE id = ?1 RETURNING id",
            [id],
            true,
        )?;
        let deleted = returned_id(rows).is_some();

        if deleted {
            tracing::info!(student_id = id, "Student deleted");
        }
        Ok(deleted)
    }

    /// Number of stored students
    pub fn count_students(&mut self) -> RecordsResult<i64> {
        let rows = self
            .execute_query("SELECT COUNT(*) AS n FROM students", [], true)?
            .unwrap_or_default();
        Ok(rows
            .first()
            .and_then(|row| row.get("n"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use serde_json::json;

    fn setup() -> (Database, FieldEncryptor, i64) {
        let mut db = Database::open_in_memory().unwrap();
        let institute = db.add_institute("ИИТ", "Институт информационных технологий").unwrap();
        let department = db
            .add_department(institute, "ВТ", "Вычислительная техника")
            .unwrap();
        (db, FieldEncryptor::new(&EncryptionKey::generate()), department)
    }

    fn student(last_name: &str, department_id: i64) -> NewStudent {
        NewStudent {
            last_name: last_name.into(),
            initials: "И.И.".into(),
            birth_year: 2002,
            phone: "+79991234567".into(),
            record_book_number: "12345678".into(),
            admission_year: 2020,
            group_name: "ИВТ-21".into(),
            department_id,
            city_before: "Тверь".into(),
        }
    }

    fn raw_row(db: &mut Database, id: i64) -> Record {
        db.execute_query("SELECT * FROM students WHERE id = ?1", [id], true)
            .unwrap()
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_add_stores_only_ciphertext() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();

        let row = raw_row(&mut db, id);
        assert!(!row.contains_key("phone"));
        assert!(!row.contains_key("record_book_number"));

        let stored: Vec<String> = row.values().map(|v| v.to_string()).collect();
        assert!(stored.iter().all(|v| !v.contains("79991234567")));
        assert!(stored.iter().all(|v| !v.contains("12345678")));

        let phone_token = row["phone_encrypted"].as_str().unwrap();
        assert_eq!(
            encryptor.decrypt(phone_token).unwrap().as_deref(),
            Some("+79991234567")
        );
        let book_token = row["record_book_number_encrypted"].as_str().unwrap();
        assert_eq!(
            encryptor.decrypt(book_token).unwrap().as_deref(),
            Some("12345678")
        );
        assert_eq!(row["created_by"], Value::Null);
    }

    #[test]
    fn test_add_records_acting_user() {
        let (mut db, encryptor, department) = setup();
        let user = db.create_user("operator", "secret", None).unwrap();
        db.set_acting_user(Some(user));

        let id = db
            .add_student_with_encryption(&student("Петров", department), &encryptor)
            .unwrap();
        assert_eq!(raw_row(&mut db, id)["created_by"], json!(user));
    }

    #[test]
    fn test_add_with_unknown_department_fails() {
        let (mut db, encryptor, _) = setup();
        let err = db
            .add_student_with_encryption(&student("Сидоров", 999), &encryptor)
            .unwrap_err();
        assert!(matches!(err, RecordsError::Query(_)));
        assert!(db.is_connected());
        assert_eq!(db.count_students().unwrap(), 0);
    }

    #[test]
    fn test_get_students_limit_and_order() {
        let (mut db, encryptor, department) = setup();
        for name in ["Смирнов", "Антонов", "Кузнецов", "Волков", "Борисов"] {
            db.add_student_with_encryption(&student(name, department), &encryptor)
                .unwrap();
        }

        let listing = db.get_students(2).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].last_name, "Антонов");
        assert_eq!(listing[1].last_name, "Борисов");
        assert_eq!(listing[0].department_code, "ВТ");
        assert_eq!(listing[0].institute_code, "ИИТ");

        let all = db.get_students(100).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.last_name.as_str()).collect();
        assert_eq!(names, ["Антонов", "Борисов", "Волков", "Кузнецов", "Смирнов"]);
    }

    #[test]
    fn test_get_student_decrypted() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();

        let stored = db.get_student(id).unwrap().unwrap();
        assert!(stored.phone.is_none());
        assert!(stored.phone_encrypted.is_some());

        let details = db.get_student_decrypted(id, &encryptor).unwrap().unwrap();
        assert_eq!(details.phone.as_deref(), Some("+79991234567"));
        assert_eq!(details.record_book_number.as_deref(), Some("12345678"));
        assert_eq!(details.full_name(), "Иванов И.И.");

        assert!(db.get_student(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_update_encrypts_and_touches_only_given_fields() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();
        let before = raw_row(&mut db, id);

        let update = StudentUpdate {
            phone: Some("+79990000000".into()),
            group_name: Some("ИВТ-22".into()),
            ..Default::default()
        };
        assert!(db
            .update_student_with_encryption(id, &update, &encryptor)
            .unwrap());

        let after = raw_row(&mut db, id);
        assert_eq!(after["group_name"], json!("ИВТ-22"));
        assert_eq!(after["last_name"], before["last_name"]);
        assert_eq!(
            after["record_book_number_encrypted"],
            before["record_book_number_encrypted"]
        );
        assert!(after
            .values()
            .all(|v| !v.to_string().contains("79990000000")));

        let details = db.get_student_decrypted(id, &encryptor).unwrap().unwrap();
        assert_eq!(details.phone.as_deref(), Some("+79990000000"));
    }

    #[test]
    fn test_update_blank_phone_keeps_stored_value() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();
        let before = raw_row(&mut db, id);

        let update = StudentUpdate {
            phone: Some(String::new()),
            city_before: Some("Москва".into()),
            ..Default::default()
        };
        assert!(db
            .update_student_with_encryption(id, &update, &encryptor)
            .unwrap());

        let after = raw_row(&mut db, id);
        assert_eq!(after["phone_encrypted"], before["phone_encrypted"]);
        assert_eq!(after["city_before"], json!("Москва"));
    }

    #[test]
    fn test_update_with_nothing_to_change() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();

        let err = db
            .update_student_with_encryption(id, &StudentUpdate::default(), &encryptor)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_missing_student() {
        let (mut db, encryptor, _) = setup();
        let update = StudentUpdate {
            group_name: Some("ИВТ-22".into()),
            ..Default::default()
        };
        assert!(!db
            .update_student_with_encryption(42, &update, &encryptor)
            .unwrap());
    }

    #[test]
    fn test_delete_student() {
        let (mut db, encryptor, department) = setup();
        let id = db
            .add_student_with_encryption(&student("Иванов", department), &encryptor)
            .unwrap();

        assert!(db.delete_student(id).unwrap());
        assert!(!db.delete_student(id).unwrap());
        assert_eq!(db.count_students().unwrap(), 0);
    }
}
