//! Service layer for student-records
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, normalization, and field decryption for display.

pub mod department;
pub mod student;
pub mod user;

pub use department::DepartmentService;
pub use student::{StudentService, DEFAULT_LIST_LIMIT};
pub use user::UserService;
