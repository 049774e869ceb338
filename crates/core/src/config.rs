//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core services.
//! Nothing in this crate reads process-wide environment variables during request handling; the
//! binaries read the environment and hand the raw values to the parsing helpers below.

use crate::constants::DEFAULT_DATABASE_PATH;
use crate::{CareError, CareResult};
use std::path::{Path, PathBuf};

/// Who may delete an assignment.
///
/// The page-based surface of the original system only let the owner of the assignment's
/// patient delete it, while every other administrative path allowed administrators through.
/// Which rule applies is a deployment decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssignmentDeletePolicy {
    /// Only the owner of the assignment's patient may delete it.
    #[default]
    OwnerOnly,
    /// The owner, or any administrator.
    OwnerOrAdmin,
}

impl AssignmentDeletePolicy {
    pub fn from_admin_flag(admin_deletes_any: bool) -> Self {
        if admin_deletes_any {
            AssignmentDeletePolicy::OwnerOrAdmin
        } else {
            AssignmentDeletePolicy::OwnerOnly
        }
    }
}

/// Work factor used when hashing new passwords.
///
/// Verification always uses the parameters embedded in the stored hash, so lowering the cost
/// only affects hashes created afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PasswordCost {
    /// argon2id with the crate's recommended parameters.
    #[default]
    Standard,
    /// argon2id with the smallest legal parameters. Only for tests.
    Minimal,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    assignment_delete_policy: AssignmentDeletePolicy,
    password_cost: PasswordCost,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::InvalidConfig`] if `database_path` is empty.
    pub fn new(
        database_path: PathBuf,
        assignment_delete_policy: AssignmentDeletePolicy,
    ) -> CareResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(CareError::InvalidConfig(
                "database path cannot be empty".into(),
            ));
        }

        Ok(Self {
            database_path,
            assignment_delete_policy,
            password_cost: PasswordCost::Standard,
        })
    }

    pub fn with_password_cost(mut self, password_cost: PasswordCost) -> Self {
        self.password_cost = password_cost;
        self
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn assignment_delete_policy(&self) -> AssignmentDeletePolicy {
        self.assignment_delete_policy
    }

    pub fn password_cost(&self) -> PasswordCost {
        self.password_cost
    }
}

/// Resolve the database path from an optional raw value, falling back to
/// [`DEFAULT_DATABASE_PATH`] when unset or blank.
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Parse a boolean flag. Unset or blank means `default`.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
pub fn bool_from_env_value(name: &str, value: Option<String>, default: bool) -> CareResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(CareError::InvalidConfig(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

/// Parse a positive integer. Unset or blank means `default`.
pub fn positive_u64_from_env_value(
    name: &str,
    value: Option<String>,
    default: u64,
) -> CareResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(raw) = value else {
        return Ok(default);
    };

    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(CareError::InvalidConfig(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_database_path() {
        let err = CoreConfig::new(PathBuf::new(), AssignmentDeletePolicy::OwnerOnly)
            .expect_err("empty path should be rejected");
        assert!(matches!(err, CareError::InvalidConfig(_)));
    }

    #[test]
    fn database_path_defaults_when_blank() {
        assert_eq!(
            database_path_from_env_value(None),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some("  ".into())),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some("/var/lib/caremap.db".into())),
            PathBuf::from("/var/lib/caremap.db")
        );
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert!(bool_from_env_value("X", Some("TRUE".into()), false).unwrap());
        assert!(bool_from_env_value("X", Some("on".into()), false).unwrap());
        assert!(!bool_from_env_value("X", Some("0".into()), true).unwrap());
        assert!(bool_from_env_value("X", None, true).unwrap());
    }

    #[test]
    fn bool_parsing_names_the_variable_on_error() {
        let err = bool_from_env_value("CAREMAP_FLAG", Some("maybe".into()), false).unwrap_err();
        assert!(err.to_string().contains("CAREMAP_FLAG"));
    }

    #[test]
    fn positive_integer_rejects_zero_and_garbage() {
        assert_eq!(positive_u64_from_env_value("N", None, 5).unwrap(), 5);
        assert_eq!(positive_u64_from_env_value("N", Some("15".into()), 5).unwrap(), 15);
        assert!(positive_u64_from_env_value("N", Some("0".into()), 5).is_err());
        assert!(positive_u64_from_env_value("N", Some("-3".into()), 5).is_err());
    }

    #[test]
    fn policy_follows_admin_flag() {
        assert_eq!(
            AssignmentDeletePolicy::from_admin_flag(true),
            AssignmentDeletePolicy::OwnerOrAdmin
        );
        assert_eq!(
            AssignmentDeletePolicy::from_admin_flag(false),
            AssignmentDeletePolicy::OwnerOnly
        );
    }
}
