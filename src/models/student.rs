//! Student models
//!
//! A student row keeps the phone number and record-book number only in
//! encrypted form (`phone_encrypted`, `record_book_number_encrypted`). The
//! plaintext values exist in memory while a record is being created, edited
//! or shown.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{
    is_valid_initials, normalize_phone, StudentValidationError, MIN_ADMISSION_AGE, MIN_YEAR,
};
use super::Record;
use crate::error::{RecordsError, RecordsResult};

/// Student fields that are encrypted before storage
pub const SENSITIVE_FIELDS: [&str; 2] = ["phone", "record_book_number"];

/// Columns of the `students` table that an update may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentColumn {
    LastName,
    Initials,
    BirthYear,
    PhoneEncrypted,
    RecordBookNumberEncrypted,
    AdmissionYear,
    GroupName,
    DepartmentId,
    CityBefore,
}

impl StudentColumn {
    /// Every updatable column, in table order
    pub const ALL: [StudentColumn; 9] = [
        Self::LastName,
        Self::Initials,
        Self::BirthYear,
        Self::PhoneEncrypted,
        Self::RecordBookNumberEncrypted,
        Self::AdmissionYear,
        Self::GroupName,
        Self::DepartmentId,
        Self::CityBefore,
    ];

    /// Column name in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::Initials => "initials",
            Self::BirthYear => "birth_year",
            Self::PhoneEncrypted => "phone_encrypted",
            Self::RecordBookNumberEncrypted => "record_book_number_encrypted",
            Self::AdmissionYear => "admission_year",
            Self::GroupName => "group_name",
            Self::DepartmentId => "department_id",
            Self::CityBefore => "city_before",
        }
    }

    /// Look up a column by its database name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for StudentColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_year(
    errors: &mut Vec<StudentValidationError>,
    field: &'static str,
    year: i32,
    max: i32,
) {
    if !(MIN_YEAR..=max).contains(&year) {
        errors.push(StudentValidationError::YearOutOfRange { field, year });
    }
}

fn check_required(errors: &mut Vec<StudentValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(StudentValidationError::Required(field));
    }
}

fn check_admission_age(errors: &mut Vec<StudentValidationError>, birth_year: i32, admission_year: i32) {
    let age = admission_year - birth_year;
    if age < MIN_ADMISSION_AGE {
        errors.push(StudentValidationError::TooYoung { age });
    }
}

fn into_result(errors: Vec<StudentValidationError>) -> RecordsResult<()> {
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(RecordsError::Validation(messages.join("; ")))
}

/// A student about to be inserted, with sensitive fields in plaintext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub last_name: String,
    pub initials: String,
    pub birth_year: i32,
    pub phone: String,
    pub record_book_number: String,
    pub admission_year: i32,
    pub group_name: String,
    pub department_id: i64,
    pub city_before: String,
}

impl NewStudent {
    /// Collect every problem with this student's data
    pub fn validation_errors(&self) -> Vec<StudentValidationError> {
        let mut errors = Vec::new();
        let this_year = Utc::now().year();

        check_required(&mut errors, "Last name", &self.last_name);

        if self.initials.trim().is_empty() {
            errors.push(StudentValidationError::Required("Initials"));
        } else if !is_valid_initials(self.initials.trim()) {
            errors.push(StudentValidationError::InvalidInitials(self.initials.clone()));
        }

        if self.phone.trim().is_empty() {
            errors.push(StudentValidationError::Required("Phone"));
        } else if normalize_phone(self.phone.trim()).is_none() {
            errors.push(StudentValidationError::InvalidPhone(self.phone.clone()));
        }

        check_required(&mut errors, "Record book number", &self.record_book_number);
        check_required(&mut errors, "Group", &self.group_name);
        check_required(&mut errors, "City", &self.city_before);

        if self.department_id <= 0 {
            errors.push(StudentValidationError::InvalidDepartment(self.department_id));
        }

        check_year(&mut errors, "Birth year", self.birth_year, this_year);
        check_year(&mut errors, "Admission year", self.admission_year, this_year + 1);

        check_admission_age(&mut errors, self.birth_year, self.admission_year);

        errors
    }

    /// Validate this student's data
    pub fn validate(&self) -> RecordsResult<()> {
        into_result(self.validation_errors())
    }

    /// Trim text fields and normalize the phone number
    pub fn normalized(mut self) -> Self {
        self.last_name = self.last_name.trim().to_string();
        self.initials = self.initials.trim().to_string();
        self.record_book_number = self.record_book_number.trim().to_string();
        self.group_name = self.group_name.trim().to_string();
        self.city_before = self.city_before.trim().to_string();
        if let Some(phone) = normalize_phone(self.phone.trim()) {
            self.phone = phone;
        }
        self
    }

    /// Convert to a key/value record
    pub fn to_record(&self) -> RecordsResult<Record> {
        to_record(self)
    }
}

/// A partial update of a student; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_book_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_before: Option<String>,
}

impl StudentUpdate {
    /// Build an update from a key/value record
    ///
    /// An `id` key is ignored. Any key that is not an updatable student
    /// field is rejected.
    pub fn from_record(record: &Record) -> RecordsResult<Self> {
        let mut fields = record.clone();
        fields.remove("id");

        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| RecordsError::Validation(format!("Invalid student update: {}", e)))
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Problems with the individual fields that are set
    fn field_errors(&self) -> Vec<StudentValidationError> {
        let mut errors = Vec::new();
        let this_year = Utc::now().year();

        if let Some(last_name) = &self.last_name {
            check_required(&mut errors, "Last name", last_name);
        }
        if let Some(initials) = &self.initials {
            if !is_valid_initials(initials.trim()) {
                errors.push(StudentValidationError::InvalidInitials(initials.clone()));
            }
        }
        if let Some(phone) = &self.phone {
            if !phone.trim().is_empty() && normalize_phone(phone.trim()).is_none() {
                errors.push(StudentValidationError::InvalidPhone(phone.clone()));
            }
        }
        if let Some(group) = &self.group_name {
            check_required(&mut errors, "Group", group);
        }
        if let Some(city) = &self.city_before {
            check_required(&mut errors, "City", city);
        }
        if let Some(department_id) = self.department_id {
            if department_id <= 0 {
                errors.push(StudentValidationError::InvalidDepartment(department_id));
            }
        }
        if let Some(year) = self.birth_year {
            check_year(&mut errors, "Birth year", year, this_year);
        }
        if let Some(year) = self.admission_year {
            check_year(&mut errors, "Admission year", year, this_year + 1);
        }

        errors
    }

    /// Validate the fields that are set
    ///
    /// The admission age rule is only checked when both years are supplied;
    /// use [`StudentUpdate::validate_against`] when the stored row is known.
    pub fn validate(&self) -> RecordsResult<()> {
        let mut errors = self.field_errors();
        if let (Some(birth), Some(admission)) = (self.birth_year, self.admission_year) {
            check_admission_age(&mut errors, birth, admission);
        }
        into_result(errors)
    }

    /// Validate this update as applied to the stored student
    ///
    /// The admission age rule runs on the years the student will have after
    /// the update, taking unchanged years from `current`.
    pub fn validate_against(&self, current: &StudentDetails) -> RecordsResult<()> {
        let mut errors = self.field_errors();
        check_admission_age(
            &mut errors,
            self.birth_year.unwrap_or(current.birth_year),
            self.admission_year.unwrap_or(current.admission_year),
        );
        into_result(errors)
    }

    /// Trim text fields and normalize the phone number
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.last_name,
            &mut self.initials,
            &mut self.record_book_number,
            &mut self.group_name,
            &mut self.city_before,
        ] {
            if let Some(value) = field {
                *value = value.trim().to_string();
            }
        }
        if let Some(phone) = self.phone.as_mut() {
            if let Some(normalized) = normalize_phone(phone.trim()) {
                *phone = normalized;
            }
        }
        self
    }

    /// Convert the set fields to a key/value record
    pub fn to_record(&self) -> RecordsResult<Record> {
        to_record(self)
    }
}

fn to_record<T: Serialize>(value: &T) -> RecordsResult<Record> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(RecordsError::Json(format!(
            "Expected an object, got {}",
            other
        ))),
    }
}

/// One row of the student list, joined with department and institute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentListing {
    pub id: i64,
    pub last_name: String,
    pub initials: String,
    pub birth_year: i32,
    pub admission_year: i32,
    pub group_name: String,
    #[serde(default)]
    pub city_before: Option<String>,
    pub department_code: String,
    pub department_name: String,
    pub institute_code: String,
    pub institute_name: String,
}

/// A full student row, as loaded for editing or display
///
/// `phone` and `record_book_number` are only filled in after decryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub id: i64,
    pub last_name: String,
    pub initials: String,
    pub birth_year: i32,
    pub admission_year: i32,
    pub group_name: String,
    pub department_id: i64,
    #[serde(default)]
    pub city_before: Option<String>,
    #[serde(default)]
    pub phone_encrypted: Option<String>,
    #[serde(default)]
    pub record_book_number_encrypted: Option<String>,
    pub department_code: String,
    pub institute_code: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub record_book_number: Option<String>,
}

impl StudentDetails {
    /// Display name, e.g. "Иванов И.И."
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.initials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_student() -> NewStudent {
        NewStudent {
            last_name: "Иванов".into(),
            initials: "И.И.".into(),
            birth_year: 2002,
            phone: "+7 (999) 123-45-67".into(),
            record_book_number: "12345678".into(),
            admission_year: 2020,
            group_name: "ИВТ-21".into(),
            department_id: 1,
            city_before: "Тверь".into(),
        }
    }

    #[test]
    fn test_valid_student() {
        assert!(sample_student().validate().is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut student = sample_student();
        student.last_name = "  ".into();
        student.initials = "II".into();
        student.phone = "12345".into();
        student.birth_year = 2010;
        student.admission_year = 2020;

        let errors = student.validation_errors();
        assert!(errors.contains(&StudentValidationError::Required("Last name")));
        assert!(errors.contains(&StudentValidationError::InvalidInitials("II".into())));
        assert!(errors.contains(&StudentValidationError::InvalidPhone("12345".into())));
        assert!(errors.contains(&StudentValidationError::TooYoung { age: 10 }));

        let err = student.validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_normalized() {
        let mut student = sample_student();
        student.last_name = " Иванов ".into();
        let student = student.normalized();

        assert_eq!(student.last_name, "Иванов");
        assert_eq!(student.phone, "79991234567");
    }

    #[test]
    fn test_to_record_has_plaintext_fields() {
        let record = sample_student().to_record().unwrap();
        assert_eq!(record["phone"], json!("+7 (999) 123-45-67"));
        assert_eq!(record["department_id"], json!(1));
    }

    #[test]
    fn test_update_from_record_rejects_unknown_columns() {
        let record = json!({ "id": 3, "group_name": "ИВТ-22" })
            .as_object()
            .cloned()
            .unwrap();
        let update = StudentUpdate::from_record(&record).unwrap();
        assert_eq!(update.group_name.as_deref(), Some("ИВТ-22"));

        let bad = json!({ "is_admin": true, "last_name": "x" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(StudentUpdate::from_record(&bad).unwrap_err().is_validation());

        let encrypted_column = json!({ "phone_encrypted": "abc" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(StudentUpdate::from_record(&encrypted_column).is_err());
    }

    #[test]
    fn test_update_record_contains_only_set_fields() {
        let update = StudentUpdate {
            phone: Some("89991234567".into()),
            ..Default::default()
        };
        let record = update.to_record().unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains_key("phone"));
        assert!(!update.is_empty());
        assert!(StudentUpdate::default().is_empty());
    }

    #[test]
    fn test_update_validation() {
        let update = StudentUpdate {
            birth_year: Some(2010),
            admission_year: Some(2020),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = StudentUpdate {
            birth_year: Some(2010),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_update_age_rule_uses_stored_years() {
        let current = StudentDetails {
            id: 1,
            last_name: "Иванов".into(),
            initials: "И.И.".into(),
            birth_year: 2002,
            admission_year: 2020,
            group_name: "ИВТ-21".into(),
            department_id: 1,
            city_before: None,
            phone_encrypted: None,
            record_book_number_encrypted: None,
            department_code: "ВТ".into(),
            institute_code: "ИИТ".into(),
            created_at: None,
            updated_at: None,
            phone: None,
            record_book_number: None,
        };

        let earlier_admission = StudentUpdate {
            admission_year: Some(2005),
            ..Default::default()
        };
        assert!(earlier_admission.validate().is_ok());
        let err = earlier_admission.validate_against(&current).unwrap_err();
        assert!(err.to_string().contains("got 3"));

        let later_birth = StudentUpdate {
            birth_year: Some(2010),
            ..Default::default()
        };
        assert!(later_birth.validate_against(&current).is_err());

        let fine = StudentUpdate {
            admission_year: Some(2021),
            ..Default::default()
        };
        assert!(fine.validate_against(&current).is_ok());
    }

    #[test]
    fn test_column_allow_list() {
        assert_eq!(
            StudentColumn::from_name("phone_encrypted"),
            Some(StudentColumn::PhoneEncrypted)
        );
        assert_eq!(StudentColumn::from_name("phone"), None);
        assert_eq!(StudentColumn::from_name("id"), None);
        assert_eq!(StudentColumn::from_name("updated_at"), None);
        for column in StudentColumn::ALL {
            assert_eq!(StudentColumn::from_name(column.as_str()), Some(column));
        }
    }
}
