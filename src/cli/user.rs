//! Operator account CLI commands

use clap::Subcommand;

use crate::crypto::SecureString;
use crate::error::{RecordsError, RecordsResult};
use crate::models::User;
use crate::services::UserService;
use crate::storage::Database;

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "STUDENTS_PASSWORD";

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an operator account
    Add {
        /// Login name
        login: String,
        /// Full name
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Check a login and password
    Login {
        /// Login name
        login: String,
    },
}

/// Handle a user command
pub fn handle_user_command(db: &mut Database, cmd: UserCommands) -> RecordsResult<()> {
    match cmd {
        UserCommands::Add { login, full_name } => {
            let password = read_new_password()?;
            let user =
                UserService::new(db).register(&login, password.expose(), full_name.as_deref())?;
            println!("Created user: {}", user);
            println!("  ID: {}", user.id);
        }

        UserCommands::Login { login } => {
            let user = sign_in(db, &login)?;
            println!("Signed in as {}", user);
        }
    }

    Ok(())
}

/// Authenticate `login` and record them as the acting user
pub fn sign_in(db: &mut Database, login: &str) -> RecordsResult<User> {
    let password = read_password("Password: ")?;
    UserService::new(db).login(login, password.expose())
}

/// Read a password from the environment, or prompt with hidden input
pub fn read_password(prompt: &str) -> RecordsResult<SecureString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecureString::from(password));
    }

    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| RecordsError::Io(format!("Failed to read password: {}", e)))
}

/// Read a new password, asking twice when prompting
pub fn read_new_password() -> RecordsResult<SecureString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecureString::from(password));
    }

    loop {
        let first = read_password("New password: ")?;
        if first.is_empty() {
            println!("Password cannot be empty. Please try again.");
            continue;
        }

        let second = read_password("Confirm password: ")?;
        if first != second {
            println!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}
