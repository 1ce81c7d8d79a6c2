//! Operator account service

use crate::error::{RecordsError, RecordsResult};
use crate::models::User;
use crate::storage::Database;

/// Service for operator accounts and sign-in
pub struct UserService<'a> {
    db: &'a mut Database,
}

impl<'a> UserService<'a> {
    /// Create a new user service
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Register a new operator
    pub fn register(
        &mut self,
        login: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> RecordsResult<User> {
        if self.db.find_user(login.trim())?.is_some() {
            return Err(RecordsError::Validation(format!(
                "User '{}' already exists",
                login.trim()
            )));
        }

        let full_name = full_name.map(str::trim).filter(|name| !name.is_empty());
        self.db.create_user(login, password, full_name)?;
        self.db
            .find_user(login.trim())?
            .ok_or_else(|| RecordsError::Query("Created user could not be read back".into()))
    }

    /// Sign in and make the user the creator of new records
    pub fn login(&mut self, login: &str, password: &str) -> RecordsResult<User> {
        let user = self
            .db
            .authenticate_user(login, password)?
            .ok_or_else(|| RecordsError::Auth("invalid login or password".into()))?;

        self.db.set_acting_user(Some(user.id));
        Ok(user)
    }
}
