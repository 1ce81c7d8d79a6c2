//! Passwords held in memory
//!
//! Database and login passwords are kept in a [`SecureString`], which wipes
//! its buffer when dropped and never prints its contents.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A password string, zeroized on drop
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Borrow the plaintext
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no password was given
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expose_and_empty() {
        let password = SecureString::from("hunter2".to_string());
        assert_eq!(password.expose(), "hunter2");
        assert!(!password.is_empty());
        assert!(SecureString::default().is_empty());
    }

    #[test]
    fn test_debug_hides_contents() {
        let password = SecureString::from("hunter2".to_string());
        assert_eq!(format!("{:?}", password), "SecureString(***)");
    }
}
