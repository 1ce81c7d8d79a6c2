//! Operator account model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bool_from_int;

/// An operator who may sign in
///
/// The password hash is never part of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "bool_from_int")]
    pub is_active: bool,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.full_name {
            Some(name) => write!(f, "{} ({})", name, self.login),
            None => write!(f, "{}", self.login),
        }
    }
}
