//! Department display formatting

use crate::models::{DepartmentOption, Institute};

/// Format departments as a table
pub fn format_department_list(departments: &[DepartmentOption]) -> String {
    if departments.is_empty() {
        return "No departments found.".to_string();
    }

    let code_width = departments
        .iter()
        .map(|d| d.institute_code.chars().count() + d.code.chars().count() + 1)
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>5}  {:<code_width$}  {}\n",
        "ID",
        "Code",
        "Name",
        code_width = code_width
    ));
    output.push_str(&format!(
        "{:->5}  {:-<code_width$}  {:-<20}\n",
        "",
        "",
        "",
        code_width = code_width
    ));

    for department in departments {
        output.push_str(&format!(
            "{:>5}  {:<code_width$}  {}\n",
            department.id,
            format!("{}/{}", department.institute_code, department.code),
            department.name,
            code_width = code_width
        ));
    }

    output
}

/// Format institutes as a simple list
pub fn format_institute_list(institutes: &[Institute]) -> String {
    if institutes.is_empty() {
        return "No institutes found.".to_string();
    }

    let mut output = String::new();
    for institute in institutes {
        output.push_str(&format!("  {} - {}\n", institute.code, institute.name));
    }
    output
}
