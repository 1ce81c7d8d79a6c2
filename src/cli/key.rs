//! Encryption key CLI commands

use std::path::Path;

use clap::Subcommand;

use crate::crypto::generate_key_file;
use crate::error::RecordsResult;

use super::user::read_new_password;

/// Key subcommands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Create the field encryption key file
    Generate {
        /// Replace an existing key file (data encrypted with it becomes unreadable)
        #[arg(short, long)]
        force: bool,
        /// Mix a password into the new key as extra entropy. The salt is not
        /// stored, so the key cannot be recreated from the password later
        #[arg(short, long)]
        password: bool,
    },
}

/// Handle a key command
pub fn handle_key_command(key_file: &Path, cmd: KeyCommands) -> RecordsResult<()> {
    match cmd {
        KeyCommands::Generate { force, password } => {
            // An existing key is refused before asking for a password
            let password = if password && (force || !key_file.exists()) {
                Some(read_new_password()?)
            } else {
                None
            };
            generate_key_file(key_file, force, password.as_ref().map(|p| p.expose()))?;

            println!("Encryption key written to {}", key_file.display());
            println!("Keep this file safe: it is the only copy of the key.");
        }
    }

    Ok(())
}
