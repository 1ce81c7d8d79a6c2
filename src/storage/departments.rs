//! Institute and department storage operations

use crate::error::{RecordsError, RecordsResult};
use crate::models::{Department, DepartmentOption, Institute};

use super::Database;

impl Database {
    /// List institutes ordered by code
    pub fn list_institutes(&mut self) -> RecordsResult<Vec<Institute>> {
        self.query_as("SELECT id, code, name FROM institutes ORDER BY code", [])
    }

    /// Find an institute by its code
    pub fn find_institute(&mut self, code: &str) -> RecordsResult<Option<Institute>> {
        let mut rows: Vec<Institute> = self.query_as(
            "SELECT id, code, name FROM institutes WHERE code = ?1",
            [code],
        )?;
        Ok(rows.pop())
    }

    /// Add an institute and return its id
    pub fn add_institute(&mut self, code: &str, name: &str) -> RecordsResult<i64> {
        let rows: Vec<Institute> = self.query_as(
            "INSERT INTO institutes (code, name) VALUES (?1, ?2) RETURNING id, code, name",
            [code, name],
        )?;
        let institute = rows
            .into_iter()
            .next()
            .ok_or_else(|| RecordsError::Query("Insert did not return an id".into()))?;

        tracing::info!(institute_id = institute.id, code, "Institute added");
        Ok(institute.id)
    }

    /// Add a department to an institute and return its id
    pub fn add_department(
        &mut self,
        institute_id: i64,
        code: &str,
        name: &str,
    ) -> RecordsResult<i64> {
        let rows: Vec<Department> = self.query_as(
            "INSERT INTO departments (institute_id, code, name) VALUES (?1, ?2, ?3) \
             RETURNING id, institute_id, code, name",
            rusqlite::params![institute_id, code, name],
        )?;
        let department = rows
            .into_iter()
            .next()
            .ok_or_else(|| RecordsError::Query("Insert did not return an id".into()))?;

        tracing::info!(department_id = department.id, code, "Department added");
        Ok(department.id)
    }

    /// Departments with their institute codes, ordered by institute then
    /// department code
    pub fn list_departments(&mut self) -> RecordsResult<Vec<DepartmentOption>> {
        self.query_as(
            "SELECT d.id, d.code, d.name, i.code AS institute_code \
             FROM departments d \
             JOIN institutes i ON d.institute_id = i.id \
             ORDER BY i.code, d.code",
            [],
        )
    }

    /// Find a department by id
    pub fn get_department(&mut self, id: i64) -> RecordsResult<Option<Department>> {
        let mut rows: Vec<Department> = self.query_as(
            "SELECT id, institute_id, code, name FROM departments WHERE id = ?1",
            [id],
        )?;
        Ok(rows.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list_departments() {
        let mut db = Database::open_in_memory().unwrap();
        let iit = db.add_institute("ИИТ", "Институт информационных технологий").unwrap();
        let ief = db.add_institute("ИЭФ", "Институт экономики и финансов").unwrap();

        db.add_department(iit, "ПИ", "Программная инженерия").unwrap();
        let vt = db.add_department(iit, "ВТ", "Вычислительная техника").unwrap();
        db.add_department(ief, "ЭК", "Экономика").unwrap();

        let options = db.list_departments().unwrap();
        let labels: Vec<String> = options.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            [
                "ИИТ/ВТ - Вычислительная техника",
                "ИИТ/ПИ - Программная инженерия",
                "ИЭФ/ЭК - Экономика",
            ]
        );

        let department = db.get_department(vt).unwrap().unwrap();
        assert_eq!(department.institute_id, iit);
        assert!(db.get_department(999).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let iit = db.add_institute("ИИТ", "Институт").unwrap();
        assert!(db.add_institute("ИИТ", "Другой").is_err());

        db.add_department(iit, "ВТ", "Вычислительная техника").unwrap();
        assert!(db.add_department(iit, "ВТ", "Повтор").is_err());
    }

    #[test]
    fn test_department_needs_existing_institute() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.add_department(42, "ВТ", "Вычислительная техника").is_err());
    }

    #[test]
    fn test_find_institute() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.add_institute("ИИТ", "Институт").unwrap();

        assert_eq!(db.find_institute("ИИТ").unwrap().map(|i| i.id), Some(id));
        assert!(db.find_institute("НЕТ").unwrap().is_none());
        assert_eq!(db.list_institutes().unwrap().len(), 1);
    }
}
