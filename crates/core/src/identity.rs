//! Identity store: user accounts and credential checks.
//!
//! Passwords are hashed with argon2id using a random salt and stored as PHC strings. The hash
//! never leaves this module; [`Identity`] carries only the public account fields.

use crate::config::{CoreConfig, PasswordCost};
use crate::constants::FIRST_NAME_MAX_LEN;
use crate::db::Database;
use crate::repositories::shared::{id_column, now, timestamp_column, timestamp_to_sql};
use crate::validation;
use crate::{CareError, CareResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use caremap_uuid::RecordId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, OnceLock};

/// A user account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw registration input.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub password: String,
}

const IDENTITY_COLUMNS: &str = "id, username, email, first_name, is_admin, created_at";

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: id_column(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

#[derive(Clone, Debug)]
pub struct IdentityStore {
    db: Database,
    cfg: Arc<CoreConfig>,
    /// Verified against when the username is unknown, so both failures cost one argon2 run.
    decoy_hash: Arc<OnceLock<String>>,
}

impl IdentityStore {
    pub fn new(db: Database, cfg: Arc<CoreConfig>) -> Self {
        Self {
            db,
            cfg,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Registers a regular (non-administrative) account.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::Validation`] if a field is invalid, the password is too short, or
    /// the username is already taken.
    pub fn register(&self, registration: Registration) -> CareResult<Identity> {
        self.insert(registration, false)
    }

    /// Creates an administrator account. Used by the operator CLI.
    pub fn create_admin(&self, registration: Registration) -> CareResult<Identity> {
        self.insert(registration, true)
    }

    fn insert(&self, registration: Registration, is_admin: bool) -> CareResult<Identity> {
        let username = validation::username(&registration.username)?;
        let email = validation::email("email", &registration.email)?;
        let first_name =
            validation::optional_text("first_name", &registration.first_name, FIRST_NAME_MAX_LEN)?;
        validation::password(&registration.password)?;

        let password_hash = self.hash_password(&registration.password)?;

        let identity = Identity {
            id: RecordId::new(),
            username: username.into_inner(),
            email: email.to_string(),
            first_name,
            is_admin,
            created_at: now(),
        };

        self.db.write(|tx| {
            if find_by_username(tx, &identity.username)?.is_some() {
                return Err(CareError::field(
                    "username",
                    "a user with that username already exists",
                ));
            }
            tx.execute(
                "INSERT INTO identities (id, username, email, first_name, password_hash, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    identity.id.to_string(),
                    identity.username,
                    identity.email,
                    identity.first_name,
                    password_hash,
                    identity.is_admin,
                    timestamp_to_sql(&identity.created_at),
                ],
            )?;
            Ok(())
        })?;

        tracing::info!(
            "registered identity {} (admin: {})",
            identity.username,
            identity.is_admin
        );
        Ok(identity)
    }

    /// Checks a username/password pair.
    ///
    /// Unknown usernames and wrong passwords both yield [`CareError::Unauthenticated`].
    pub fn authenticate(&self, username: &str, password: &str) -> CareResult<Identity> {
        let found = self.db.read(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {IDENTITY_COLUMNS}, password_hash FROM identities WHERE username = ?1"
                    ),
                    params![username.trim()],
                    |row| Ok((identity_from_row(row)?, row.get::<_, String>(6)?)),
                )
                .optional()?)
        })?;

        let Some((identity, stored_hash)) = found else {
            verify_password(password, self.decoy()?)?;
            tracing::warn!("login attempt for unknown username");
            return Err(CareError::Unauthenticated);
        };

        if verify_password(password, &stored_hash)? {
            Ok(identity)
        } else {
            tracing::warn!("wrong password for {}", identity.username);
            Err(CareError::Unauthenticated)
        }
    }

    fn decoy(&self) -> CareResult<&str> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash.as_str());
        }
        let hash = self.hash_password(&RecordId::new().to_string())?;
        Ok(self.decoy_hash.get_or_init(|| hash).as_str())
    }

    pub fn get(&self, id: &RecordId) -> CareResult<Identity> {
        self.db.read(|conn| {
            conn.query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
                params![id.to_string()],
                identity_from_row,
            )
            .optional()?
            .ok_or(CareError::NotFound)
        })
    }

    pub fn find_by_username(&self, username: &str) -> CareResult<Option<Identity>> {
        self.db.read(|conn| find_by_username(conn, username))
    }

    /// Grants or revokes the administrative flag.
    pub fn set_admin(&self, username: &str, is_admin: bool) -> CareResult<Identity> {
        let updated = self.db.write(|tx| {
            let changed = tx.execute(
                "UPDATE identities SET is_admin = ?1 WHERE username = ?2",
                params![is_admin, username.trim()],
            )?;
            if changed == 0 {
                return Err(CareError::NotFound);
            }
            find_by_username(tx, username)?.ok_or(CareError::NotFound)
        })?;

        tracing::info!("set admin={} for {}", is_admin, updated.username);
        Ok(updated)
    }

    pub fn list(&self) -> CareResult<Vec<Identity>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY username"
            ))?;
            let identities = stmt
                .query_map([], identity_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(identities)
        })
    }

    fn hash_password(&self, password: &str) -> CareResult<String> {
        let argon2 = match self.cfg.password_cost() {
            PasswordCost::Standard => Argon2::default(),
            PasswordCost::Minimal => {
                let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
                    .map_err(|e| CareError::PasswordHash(e.to_string()))?;
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            }
        };
        let salt = SaltString::generate(&mut OsRng);
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CareError::PasswordHash(e.to_string()))
    }
}

/// Checks `password` against a stored PHC string. `Ok(false)` means a mismatch.
fn verify_password(password: &str, stored_hash: &str) -> CareResult<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| CareError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CareError::PasswordHash(e.to_string())),
    }
}

fn find_by_username(conn: &Connection, username: &str) -> CareResult<Option<Identity>> {
    Ok(conn
        .query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE username = ?1"),
            params![username.trim()],
            identity_from_row,
        )
        .optional()?)
}
