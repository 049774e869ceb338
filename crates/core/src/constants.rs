//! Constants used throughout the caremap core crate.
//!
//! Field limits live here so the repositories, the REST layer and the CLI agree on them.

/// Default SQLite database file when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "caremap.db";

/// Maximum length of a username.
pub const USERNAME_MAX_LEN: usize = 150;

/// Maximum length of a first name.
pub const FIRST_NAME_MAX_LEN: usize = 150;

/// Minimum number of characters in a password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Maximum length of a patient or doctor name.
pub const NAME_MAX_LEN: usize = 100;

/// Maximum length of a patient's gender value.
pub const GENDER_MAX_LEN: usize = 10;

/// Oldest age accepted for a patient.
pub const AGE_MAX: u32 = 150;

/// Maximum length of a doctor's specialty.
pub const SPECIALTY_MAX_LEN: usize = 100;

/// Maximum length of a doctor's contact number.
pub const CONTACT_NUMBER_MAX_LEN: usize = 15;
