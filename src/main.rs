use anyhow::Result;
use clap::{Parser, Subcommand};

use student_records::cli::{
    handle_department_command, handle_key_command, handle_student_command, handle_user_command,
    sign_in,
};
use student_records::config::{AppPaths, Settings};
use student_records::crypto::LazyEncryptor;
use student_records::logging;
use student_records::storage::{initialize_storage, Database, SCHEMA_VERSION};

#[derive(Parser)]
#[command(
    name = "students",
    version,
    about = "Student records with encrypted personal data",
    long_about = "Manage student records stored in a relational database. Phone \
                  numbers and record-book numbers are encrypted before they are \
                  stored and are only decrypted when a record is shown."
)]
struct Cli {
    /// Environment file to load settings from (default: .env)
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<std::path::PathBuf>,

    /// Sign in as this operator before running a student command
    #[arg(short, long, global = true, env = "STUDENTS_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and the encryption key
    Init,

    /// Show current configuration and paths
    Config,

    /// Test the database connection
    Check,

    /// Encryption key management
    #[command(subcommand)]
    Key(student_records::cli::KeyCommands),

    /// Student management commands
    #[command(subcommand)]
    Student(student_records::cli::StudentCommands),

    /// Institute and department commands
    #[command(subcommand, alias = "dept")]
    Department(student_records::cli::DepartmentCommands),

    /// Operator account commands
    #[command(subcommand)]
    User(student_records::cli::UserCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths, settings and logging
    let paths = AppPaths::new()?;
    let settings = Settings::load(&paths, cli.env_file.as_deref())?;
    paths.ensure_directories(&[settings.app.export_dir.as_path()])?;
    logging::init(settings.app.log_level, Some(&settings.app.log_file))?;

    tracing::debug!(
        base_dir = %paths.base_dir().display(),
        database = %settings.database.target(),
        "Settings loaded"
    );

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing student records at: {}", paths.base_dir().display());
            initialize_storage(settings.database.clone())?;

            let encryptor = LazyEncryptor::new(&settings.encryption.key_file);
            encryptor.get()?;

            println!("Initialization complete!");
            println!();
            println!("  Schema version: {}", SCHEMA_VERSION);
            println!("  Key file:       {}", settings.encryption.key_file.display());
            println!();
            println!("Run 'students department add-institute' to add reference data.");
        }
        Some(Commands::Config) => {
            let db = &settings.database;
            println!("Student Records Configuration");
            println!("=============================");
            match &settings.env_file {
                Some(path) => println!("Environment file: {}", path.display()),
                None => println!("Environment file: (none)"),
            }
            println!("Base directory:   {}", paths.base_dir().display());
            println!();
            println!("Database:");
            println!("  Target:   {}", db.target());
            match db.database_path() {
                Some(path) => println!("  File:     {}", path.display()),
                None => println!("  File:     (in memory)"),
            }
            println!(
                "  Password: {}",
                if db.password.is_empty() { "(not set)" } else { "********" }
            );
            println!();
            println!("Encryption key:   {}", settings.encryption.key_file.display());
            println!("Log level:        {}", settings.app.log_level);
            println!("Log file:         {}", settings.app.log_file.display());
            println!("Export directory: {}", settings.app.export_dir.display());
        }
        Some(Commands::Check) => {
            let mut db = Database::new(settings.database.clone());
            if db.test_connection() {
                println!("Database connection OK: {}", settings.database.target());
            } else {
                anyhow::bail!(
                    "Database connection failed: {}",
                    settings.database.target()
                );
            }
        }
        Some(Commands::Key(cmd)) => {
            handle_key_command(&settings.encryption.key_file, cmd)?;
        }
        Some(Commands::Student(cmd)) => {
            let mut db = initialize_storage(settings.database.clone())?;
            if let Some(login) = cli.user.as_deref() {
                sign_in(&mut db, login)?;
            }
            let encryptor = LazyEncryptor::new(&settings.encryption.key_file);
            handle_student_command(&mut db, &encryptor, cmd)?;
        }
        Some(Commands::Department(cmd)) => {
            let mut db = initialize_storage(settings.database.clone())?;
            handle_department_command(&mut db, cmd)?;
        }
        Some(Commands::User(cmd)) => {
            let mut db = initialize_storage(settings.database.clone())?;
            handle_user_command(&mut db, cmd)?;
        }
        None => {
            println!("students - Student records with encrypted personal data");
            println!();
            println!("Run 'students --help' for usage information.");
            println!("Run 'students init' to create the database and key file.");
        }
    }

    Ok(())
}
