//! Student display formatting
//!
//! Formats students for terminal output in table and detail views.

use crate::models::{StudentDetails, StudentListing};

/// Display width of a column, in characters
fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.chars().count())
}

/// Format the student list as a table
pub fn format_student_list(students: &[StudentListing]) -> String {
    if students.is_empty() {
        return "No students found.".to_string();
    }

    let names: Vec<String> = students
        .iter()
        .map(|s| format!("{} {}", s.last_name, s.initials))
        .collect();
    let departments: Vec<String> = students
        .iter()
        .map(|s| format!("{}/{}", s.institute_code, s.department_code))
        .collect();

    let name_width = column_width(names.iter().map(String::as_str), "Name");
    let group_width = column_width(students.iter().map(|s| s.group_name.as_str()), "Group");
    let dept_width = column_width(departments.iter().map(String::as_str), "Department");

    let mut output = String::new();
    output.push_str(&format!(
        "{:>5}  {:<name_width$}  {:<group_width$}  {:>4}  {:>8}  {:<dept_width$}  {}\n",
        "ID",
        "Name",
        "Group",
        "Born",
        "Admitted",
        "Department",
        "City",
        name_width = name_width,
        group_width = group_width,
        dept_width = dept_width,
    ));
    output.push_str(&format!(
        "{:->5}  {:-<name_width$}  {:-<group_width$}  {:->4}  {:->8}  {:-<dept_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        group_width = group_width,
        dept_width = dept_width,
    ));

    for ((student, name), department) in students.iter().zip(&names).zip(&departments) {
        output.push_str(&format!(
            "{:>5}  {:<name_width$}  {:<group_width$}  {:>4}  {:>8}  {:<dept_width$}  {}\n",
            student.id,
            name,
            student.group_name,
            student.birth_year,
            student.admission_year,
            department,
            student.city_before.as_deref().unwrap_or(""),
            name_width = name_width,
            group_width = group_width,
            dept_width = dept_width,
        ));
    }

    output.push_str(&format!("\n{} student(s)\n", students.len()));
    output
}

/// Format a single student's details
///
/// Phone and record-book number are shown as `<encrypted>` when the
/// details were loaded without decryption.
pub fn format_student_details(student: &StudentDetails) -> String {
    let hidden = |plain: &Option<String>, encrypted: &Option<String>| match (plain, encrypted) {
        (Some(value), _) => value.clone(),
        (None, Some(_)) => "<encrypted>".to_string(),
        (None, None) => "-".to_string(),
    };

    let mut output = String::new();

    output.push_str(&format!("Student: {}\n", student.full_name()));
    output.push_str(&format!("  ID:             {}\n", student.id));
    output.push_str(&format!("  Group:          {}\n", student.group_name));
    output.push_str(&format!(
        "  Department:     {}/{}\n",
        student.institute_code, student.department_code
    ));
    output.push_str(&format!("  Birth Year:     {}\n", student.birth_year));
    output.push_str(&format!("  Admission Year: {}\n", student.admission_year));
    output.push_str(&format!(
        "  City:           {}\n",
        student.city_before.as_deref().unwrap_or("-")
    ));
    output.push('\n');
    output.push_str(&format!(
        "  Phone:          {}\n",
        hidden(&student.phone, &student.phone_encrypted)
    ));
    output.push_str(&format!(
        "  Record Book:    {}\n",
        hidden(&student.record_book_number, &student.record_book_number_encrypted)
    ));

    if let Some(created) = &student.created_at {
        output.push('\n');
        output.push_str(&format!("  Created:  {}\n", created));
    }
    if let Some(updated) = &student.updated_at {
        output.push_str(&format!("  Modified: {}\n", updated));
    }

    output
}
