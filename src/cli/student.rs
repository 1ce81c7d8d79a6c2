//! Student CLI commands
//!
//! Implements CLI commands for student management.

use clap::Subcommand;

use crate::crypto::LazyEncryptor;
use crate::display::student::{format_student_details, format_student_list};
use crate::error::RecordsResult;
use crate::models::{NewStudent, StudentUpdate};
use crate::services::{StudentService, DEFAULT_LIST_LIMIT};
use crate::storage::Database;

/// Student subcommands
#[derive(Subcommand)]
pub enum StudentCommands {
    /// List students ordered by last name
    List {
        /// Maximum number of students to show
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Show a student, including phone and record-book number
    Show {
        /// Student ID
        id: i64,
    },
    /// Add a new student
    Add {
        /// Last name
        #[arg(long)]
        last_name: String,
        /// Initials, e.g. "И.О."
        #[arg(long)]
        initials: String,
        /// Year of birth
        #[arg(long)]
        birth_year: i32,
        /// Phone number, e.g. "+7 999 123-45-67"
        #[arg(long)]
        phone: String,
        /// Record-book number
        #[arg(long)]
        record_book: String,
        /// Year of admission
        #[arg(long)]
        admission_year: i32,
        /// Study group
        #[arg(short, long)]
        group: String,
        /// Department ID (see `department list`)
        #[arg(short, long)]
        department: i64,
        /// City of residence before admission
        #[arg(long)]
        city: String,
    },
    /// Edit a student
    Edit {
        /// Student ID
        id: i64,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        initials: Option<String>,
        #[arg(long)]
        birth_year: Option<i32>,
        /// New phone number (omit to keep the stored one)
        #[arg(long)]
        phone: Option<String>,
        /// New record-book number (omit to keep the stored one)
        #[arg(long)]
        record_book: Option<String>,
        #[arg(long)]
        admission_year: Option<i32>,
        #[arg(short, long)]
        group: Option<String>,
        #[arg(short, long)]
        department: Option<i64>,
        #[arg(long)]
        city: Option<String>,
    },
    /// Delete a student
    Delete {
        /// Student ID
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a student command
pub fn handle_student_command(
    db: &mut Database,
    encryptor: &LazyEncryptor,
    cmd: StudentCommands,
) -> RecordsResult<()> {
    let mut service = StudentService::new(db, encryptor);

    match cmd {
        StudentCommands::List { limit } => {
            let students = service.list(limit)?;
            print!("{}", format_student_list(&students));
        }

        StudentCommands::Show { id } => {
            let student = service.show(id)?;
            print!("{}", format_student_details(&student));
        }

        StudentCommands::Add {
            last_name,
            initials,
            birth_year,
            phone,
            record_book,
            admission_year,
            group,
            department,
            city,
        } => {
            let student = NewStudent {
                last_name,
                initials,
                birth_year,
                phone,
                record_book_number: record_book,
                admission_year,
                group_name: group,
                department_id: department,
                city_before: city,
            };
            let display_name = format!("{} {}", student.last_name.trim(), student.initials.trim());

            let id = service.create(student)?;
            println!("Added student: {}", display_name);
            println!("  ID: {}", id);
        }

        StudentCommands::Edit {
            id,
            last_name,
            initials,
            birth_year,
            phone,
            record_book,
            admission_year,
            group,
            department,
            city,
        } => {
            let update = StudentUpdate {
                last_name,
                initials,
                birth_year,
                phone,
                record_book_number: record_book,
                admission_year,
                group_name: group,
                department_id: department,
                city_before: city,
            };

            if update.is_empty() {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            service.update(id, update)?;
            println!("Updated student {}", id);
        }

        StudentCommands::Delete { id, force } => {
            let student = service.find(id)?;

            if !force {
                println!("About to delete student: {}", student.full_name());
                println!("Use --force to confirm deletion");
                return Ok(());
            }

            service.delete(id)?;
            println!("Deleted student: {}", student.full_name());
        }
    }

    Ok(())
}
