//! Operator account storage and authentication

use serde::Deserialize;

use crate::crypto::{hash_password, verify_password};
use crate::error::{RecordsError, RecordsResult};
use crate::models::{bool_from_int, User};

use super::Database;

/// A user row together with its password hash
#[derive(Deserialize)]
struct Credentials {
    id: i64,
    login: String,
    full_name: Option<String>,
    #[serde(deserialize_with = "bool_from_int")]
    is_active: bool,
    password_hash: String,
}

impl From<Credentials> for User {
    fn from(credentials: Credentials) -> Self {
        Self {
            id: credentials.id,
            login: credentials.login,
            full_name: credentials.full_name,
            is_active: credentials.is_active,
        }
    }
}

impl Database {
    /// Create an operator account and return its id
    ///
    /// The password is stored as a salted Argon2 hash.
    pub fn create_user(
        &mut self,
        login: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> RecordsResult<i64> {
        let login = login.trim();
        if login.is_empty() {
            return Err(RecordsError::Validation("Login cannot be empty".into()));
        }

        let password_hash = hash_password(password)?;
        let rows: Vec<User> = self.query_as(
            "INSERT INTO users (login, password_hash, full_name) VALUES (?1, ?2, ?3) \
             RETURNING id, login, full_name, is_active",
            rusqlite::params![login, password_hash, full_name],
        )?;
        let user = rows
            .into_iter()
            .next()
            .ok_or_else(|| RecordsError::Query("Insert did not return an id".into()))?;

        tracing::info!(user_id = user.id, login, "User created");
        Ok(user.id)
    }

    /// Find an operator account by login
    pub fn find_user(&mut self, login: &str) -> RecordsResult<Option<User>> {
        let mut rows: Vec<User> = self.query_as(
            "SELECT id, login, full_name, is_active FROM users WHERE login = ?1",
            [login],
        )?;
        Ok(rows.pop())
    }

    /// Enable or disable an account; returns `false` for an unknown login
    pub fn set_user_active(&mut self, login: &str, active: bool) -> RecordsResult<bool> {
        let rows = self.execute_query(
            "UPDATE users SET is_active = ?1 WHERE login = ?2 RETURNING id",
            rusqlite::params![active, login],
            true,
        )?;
        Ok(rows.is_some_and(|rows| !rows.is_empty()))
    }

    /// Check a login and password against the active accounts
    ///
    /// Returns the user on success and `None` when the login is unknown,
    /// inactive, or the password does not match.
    pub fn authenticate_user(&mut self, login: &str, password: &str) -> RecordsResult<Option<User>> {
        let mut rows: Vec<Credentials> = self.query_as(
            "SELECT id, login, full_name, is_active, password_hash \
             FROM users WHERE login = ?1 AND is_active = 1",
            [login],
        )?;

        match rows.pop() {
            Some(credentials) if verify_password(password, &credentials.password_hash) => {
                tracing::info!(login, "User authenticated");
                Ok(Some(credentials.into()))
            }
            _ => {
                tracing::warn!(login, "Authentication failed");
                Ok(None)
            }
        }
    }
}
