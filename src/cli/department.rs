//! Department CLI commands

use clap::Subcommand;

use crate::display::department::{format_department_list, format_institute_list};
use crate::error::RecordsResult;
use crate::services::DepartmentService;
use crate::storage::Database;

/// Department subcommands
#[derive(Subcommand)]
pub enum DepartmentCommands {
    /// List departments
    List {
        /// List institutes instead
        #[arg(short, long)]
        institutes: bool,
    },
    /// Add an institute
    AddInstitute {
        /// Short code, e.g. "ИИТ"
        code: String,
        /// Full name
        name: String,
    },
    /// Add a department to an institute
    Add {
        /// Institute code
        #[arg(short, long)]
        institute: String,
        /// Short code, e.g. "ВТ"
        code: String,
        /// Full name
        name: String,
    },
}

/// Handle a department command
pub fn handle_department_command(db: &mut Database, cmd: DepartmentCommands) -> RecordsResult<()> {
    let mut service = DepartmentService::new(db);

    match cmd {
        DepartmentCommands::List { institutes } => {
            if institutes {
                print!("{}", format_institute_list(&service.list_institutes()?));
            } else {
                print!("{}", format_department_list(&service.list()?));
            }
        }

        DepartmentCommands::AddInstitute { code, name } => {
            let id = service.add_institute(&code, &name)?;
            println!("Added institute: {} - {}", code.trim(), name.trim());
            println!("  ID: {}", id);
        }

        DepartmentCommands::Add {
            institute,
            code,
            name,
        } => {
            let id = service.add_department(&institute, &code, &name)?;
            println!("Added department: {}/{} - {}", institute.trim(), code.trim(), name.trim());
            println!("  ID: {}", id);
        }
    }

    Ok(())
}
