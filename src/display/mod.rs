//! Display formatting for terminal output
//!
//! Formats students and reference data as plain-text tables and detail
//! views.

pub mod department;
pub mod student;

pub use department::{format_department_list, format_institute_list};
pub use student::{format_student_details, format_student_list};
