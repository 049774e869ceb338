//! # Caremap Core
//!
//! Core business logic for the caremap patient–doctor record service.
//!
//! This crate contains the data-access and authorization layer:
//! - Identity store (registration, credential checks, administrative flag)
//! - Patient, doctor and assignment repositories over SQLite
//! - Object-level authorization predicates shared by list and single-record paths
//!
//! **No API concerns**: tokens, HTTP servers and DTOs belong in `api-shared` and `api-rest`.

pub mod authorization;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod repositories;
pub mod validation;

pub use authorization::{Caller, Owned};
pub use caremap_types::{EmailAddress, NonEmptyText, TextError};
pub use caremap_uuid::RecordId;
pub use config::{AssignmentDeletePolicy, CoreConfig, PasswordCost};
pub use constants::DEFAULT_DATABASE_PATH;
pub use db::Database;
pub use error::{CareError, CareResult};
pub use identity::{Identity, IdentityStore, Registration};
pub use repositories::assignments::{Assignment, AssignmentRepository};
pub use repositories::doctors::{Doctor, DoctorChanges, DoctorFields, DoctorRepository};
pub use repositories::patients::{Patient, PatientChanges, PatientFields, PatientRepository};

use std::sync::Arc;

/// All repositories over one shared database handle.
#[derive(Clone, Debug)]
pub struct CareStore {
    pub identities: IdentityStore,
    pub patients: PatientRepository,
    pub doctors: DoctorRepository,
    pub assignments: AssignmentRepository,
    db: Database,
}

impl CareStore {
    /// Opens the database named by `cfg` and wires up every repository.
    pub fn open(cfg: Arc<CoreConfig>) -> CareResult<Self> {
        let db = Database::open(cfg.database_path())?;
        Ok(Self::with_database(db, cfg))
    }

    pub fn with_database(db: Database, cfg: Arc<CoreConfig>) -> Self {
        Self {
            identities: IdentityStore::new(db.clone(), cfg.clone()),
            patients: PatientRepository::new(db.clone()),
            doctors: DoctorRepository::new(db.clone()),
            assignments: AssignmentRepository::new(db.clone(), cfg),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolves an identity id to a [`Caller`], reading the current administrative flag.
    ///
    /// An id that no longer names an identity is [`CareError::Unauthenticated`].
    pub fn caller(&self, id: &RecordId) -> CareResult<Caller> {
        match self.identities.get(id) {
            Ok(identity) => Ok(Caller::from(&identity)),
            Err(CareError::NotFound) => Err(CareError::Unauthenticated),
            Err(e) => Err(e),
        }
    }
}
