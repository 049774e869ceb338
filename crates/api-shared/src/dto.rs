//! JSON request and response bodies.
//!
//! Request types accept only the writable fields; anything else in the payload (an `owner`,
//! an `id`, a `created_at`) is ignored rather than rejected.

use caremap_core::{Assignment, Doctor, Identity, Patient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// One of `validation`, `not_found`, `forbidden`, `unauthenticated`, `internal`.
    pub error: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserRes {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
}

impl From<Identity> for UserRes {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username,
            email: identity.email,
            first_name: identity.first_name,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairRes {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshReq {
    pub refresh: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenRes {
    pub access: String,
}

/// Full patient payload for `POST` and `PUT`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientReq {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub address: String,
}

/// Partial patient payload for `PATCH`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PatientPatchReq {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl From<Patient> for PatientRes {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            owner: patient.owner.to_string(),
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            address: patient.address,
            created_at: patient.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorReq {
    pub name: String,
    pub specialty: String,
    pub contact_number: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DoctorPatchReq {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub contact_number: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Doctor> for DoctorRes {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id.to_string(),
            name: doctor.name,
            specialty: doctor.specialty,
            contact_number: doctor.contact_number,
            email: doctor.email,
            created_at: doctor.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentReq {
    /// Patient id.
    pub patient: String,
    /// Doctor id.
    pub doctor: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentRes {
    pub id: String,
    pub patient: String,
    pub patient_name: String,
    pub doctor: String,
    pub doctor_name: String,
    pub assigned_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentRes {
    fn from(assignment: Assignment) -> Self {
        Self {
            id: assignment.id.to_string(),
            patient: assignment.patient_id.to_string(),
            patient_name: assignment.patient_name,
            doctor: assignment.doctor_id.to_string(),
            doctor_name: assignment.doctor_name,
            assigned_at: assignment.assigned_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_request_ignores_owner_field() {
        let req: PatientReq = serde_json::from_str(
            r#"{"name":"Alice","age":30,"gender":"F","address":"1 Main St","owner":"someone-else"}"#,
        )
        .expect("extra fields should be ignored");
        assert_eq!(req.name, "Alice");
        assert_eq!(req.age, 30);
    }

    #[test]
    fn register_request_defaults_first_name() {
        let req: RegisterReq = serde_json::from_str(
            r#"{"username":"alice","email":"alice@example.com","password":"secret123"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name, "");
    }

    #[test]
    fn patch_request_accepts_partial_body() {
        let req: PatientPatchReq = serde_json::from_str(r#"{"age":31}"#).unwrap();
        assert_eq!(req.age, Some(31));
        assert!(req.name.is_none());
    }
}
