//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod department;
pub mod key;
pub mod student;
pub mod user;

pub use department::{handle_department_command, DepartmentCommands};
pub use key::{handle_key_command, KeyCommands};
pub use student::{handle_student_command, StudentCommands};
pub use user::{handle_user_command, sign_in, UserCommands};
