use caremap_core::config::{bool_from_env_value, database_path_from_env_value};
use caremap_core::{
    AssignmentDeletePolicy, CareError, CareResult, CareStore, Caller, CoreConfig, Registration,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "caremap")]
#[command(about = "Caremap patient–doctor record service CLI")]
struct Cli {
    /// SQLite database file (defaults to $CAREMAP_DATABASE, then caremap.db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its schema
    InitDb,
    /// Create an administrator account
    CreateAdmin {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
    },
    /// Grant (or with --revoke, remove) administrator rights
    SetAdmin {
        username: String,
        #[arg(long)]
        revoke: bool,
    },
    /// List all accounts
    ListUsers,
    /// List the patients owned by an account
    ListPatients { username: String },
    /// List all doctors
    ListDoctors,
    /// List the assignments visible to an account
    ListMappings { username: String },
}

fn open_store(database: Option<PathBuf>) -> CareResult<CareStore> {
    let path = database.unwrap_or_else(|| {
        database_path_from_env_value(std::env::var("CAREMAP_DATABASE").ok())
    });
    let admin_deletes_any = bool_from_env_value(
        "CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT",
        std::env::var("CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT").ok(),
        false,
    )?;
    let cfg = CoreConfig::new(
        path,
        AssignmentDeletePolicy::from_admin_flag(admin_deletes_any),
    )?;
    CareStore::open(Arc::new(cfg))
}

fn caller_for(store: &CareStore, username: &str) -> CareResult<Caller> {
    store
        .identities
        .find_by_username(username)?
        .map(|identity| Caller::from(&identity))
        .ok_or(CareError::NotFound)
}

fn run(command: Commands, store: &CareStore) -> CareResult<()> {
    match command {
        Commands::InitDb => {
            store.database().ping()?;
            println!("Database schema is ready.");
        }
        Commands::CreateAdmin {
            username,
            email,
            password,
            first_name,
        } => {
            let identity = store.identities.create_admin(Registration {
                username,
                email,
                first_name,
                password,
            })?;
            println!(
                "Created administrator {} with ID: {}",
                identity.username, identity.id
            );
        }
        Commands::SetAdmin { username, revoke } => {
            let identity = store.identities.set_admin(&username, !revoke)?;
            println!(
                "{} is {}an administrator",
                identity.username,
                if identity.is_admin { "" } else { "no longer " }
            );
        }
        Commands::ListUsers => {
            let identities = store.identities.list()?;
            if identities.is_empty() {
                println!("No users found.");
            }
            for identity in identities {
                println!(
                    "ID: {}, Username: {}, Email: {}, Admin: {}",
                    identity.id, identity.username, identity.email, identity.is_admin
                );
            }
        }
        Commands::ListPatients { username } => {
            let caller = caller_for(store, &username)?;
            let patients = store.patients.list(&caller)?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                println!(
                    "ID: {}, Name: {}, Age: {}, Gender: {}, Created: {}",
                    patient.id, patient.name, patient.age, patient.gender, patient.created_at
                );
            }
        }
        Commands::ListDoctors => {
            let doctors = store.doctors.list()?;
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for doctor in doctors {
                println!(
                    "ID: {}, Name: {}, Specialty: {}, Email: {}",
                    doctor.id, doctor.name, doctor.specialty, doctor.email
                );
            }
        }
        Commands::ListMappings { username } => {
            let caller = caller_for(store, &username)?;
            let assignments = store.assignments.list(&caller)?;
            if assignments.is_empty() {
                println!("No mappings found.");
            }
            for assignment in assignments {
                println!(
                    "ID: {}, Patient: {}, Doctor: {}, Assigned: {}",
                    assignment.id,
                    assignment.patient_name,
                    assignment.doctor_name,
                    assignment.assigned_at
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'caremap --help' for commands");
        return Ok(());
    };

    let store = open_store(cli.database)?;
    if let Err(e) = run(command, &store) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
