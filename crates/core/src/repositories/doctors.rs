//! Doctor repository.
//!
//! Doctors are a shared directory: not owned by any identity, and readable and writable by
//! every authenticated caller. Deleting a doctor removes its assignments.

use crate::constants::{NAME_MAX_LEN, SPECIALTY_MAX_LEN};
use crate::db::Database;
use crate::repositories::shared::{id_column, now, timestamp_column, timestamp_to_sql};
use crate::validation;
use crate::{CareError, CareResult};
use caremap_uuid::RecordId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctor {
    pub id: RecordId,
    pub name: String,
    pub specialty: String,
    pub contact_number: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct DoctorFields {
    pub name: String,
    pub specialty: String,
    pub contact_number: String,
    pub email: String,
}

/// A partial update; `None` leaves the field unchanged. `created_at` cannot be changed.
#[derive(Clone, Debug, Default)]
pub struct DoctorChanges {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

impl From<DoctorFields> for DoctorChanges {
    fn from(fields: DoctorFields) -> Self {
        Self {
            name: Some(fields.name),
            specialty: Some(fields.specialty),
            contact_number: Some(fields.contact_number),
            email: Some(fields.email),
        }
    }
}

const DOCTOR_COLUMNS: &str = "id, name, specialty, contact_number, email, created_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: id_column(row, 0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        contact_number: row.get(3)?,
        email: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

pub(crate) fn load_doctor(conn: &Connection, id: &RecordId) -> CareResult<Option<Doctor>> {
    Ok(conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            params![id.to_string()],
            doctor_from_row,
        )
        .optional()?)
}

#[derive(Clone, Debug)]
pub struct DoctorRepository {
    db: Database,
}

impl DoctorRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All doctors, newest first.
    pub fn list(&self) -> CareResult<Vec<Doctor>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY created_at DESC, id"
            ))?;
            let doctors = stmt
                .query_map([], doctor_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(doctors)
        })
    }

    pub fn create(&self, fields: DoctorFields) -> CareResult<Doctor> {
        let doctor = Doctor {
            id: RecordId::new(),
            name: validation::required_text("name", &fields.name, NAME_MAX_LEN)?.into_inner(),
            specialty: validation::required_text("specialty", &fields.specialty, SPECIALTY_MAX_LEN)?
                .into_inner(),
            contact_number: validation::contact_number(&fields.contact_number)?.into_inner(),
            email: validation::email("email", &fields.email)?.to_string(),
            created_at: now(),
        };

        self.db.write(|tx| {
            tx.execute(
                &format!("INSERT INTO doctors ({DOCTOR_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    doctor.id.to_string(),
                    doctor.name,
                    doctor.specialty,
                    doctor.contact_number,
                    doctor.email,
                    timestamp_to_sql(&doctor.created_at),
                ],
            )?;
            Ok(())
        })?;

        tracing::info!("doctor {} created", doctor.id);
        Ok(doctor)
    }

    pub fn get(&self, id: &RecordId) -> CareResult<Doctor> {
        self.db
            .read(|conn| load_doctor(conn, id)?.ok_or(CareError::NotFound))
    }

    pub fn update(&self, id: &RecordId, changes: DoctorChanges) -> CareResult<Doctor> {
        let updated = self.db.write(|tx| {
            let mut doctor = load_doctor(tx, id)?.ok_or(CareError::NotFound)?;

            if let Some(name) = changes.name {
                doctor.name = validation::required_text("name", &name, NAME_MAX_LEN)?.into_inner();
            }
            if let Some(specialty) = changes.specialty {
                doctor.specialty =
                    validation::required_text("specialty", &specialty, SPECIALTY_MAX_LEN)?
                        .into_inner();
            }
            if let Some(contact_number) = changes.contact_number {
                doctor.contact_number = validation::contact_number(&contact_number)?.into_inner();
            }
            if let Some(email) = changes.email {
                doctor.email = validation::email("email", &email)?.to_string();
            }

            tx.execute(
                "UPDATE doctors SET name = ?1, specialty = ?2, contact_number = ?3, email = ?4
                 WHERE id = ?5",
                params![
                    doctor.name,
                    doctor.specialty,
                    doctor.contact_number,
                    doctor.email,
                    doctor.id.to_string(),
                ],
            )?;
            Ok(doctor)
        })?;

        tracing::info!("doctor {} updated", updated.id);
        Ok(updated)
    }

    pub fn delete(&self, id: &RecordId) -> CareResult<()> {
        self.db.write(|tx| {
            let removed = tx.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
            if removed == 0 {
                return Err(CareError::NotFound);
            }
            Ok(())
        })?;

        tracing::info!("doctor {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{house, next_tick, test_store};

    #[test]
    fn list_is_newest_first() {
        let store = test_store();
        let first = store.doctors.create(house()).unwrap();
        next_tick();
        let second = store
            .doctors
            .create(DoctorFields {
                name: "Lisa Cuddy".into(),
                specialty: "Endocrinology".into(),
                ..house()
            })
            .unwrap();

        let ids: Vec<_> = store
            .doctors
            .list()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn create_list_get() {
        let store = test_store();
        let created = store.doctors.create(house()).unwrap();

        assert_eq!(store.doctors.get(&created.id).unwrap(), created);
        assert_eq!(store.doctors.list().unwrap(), vec![created]);
    }

    #[test]
    fn update_is_partial_and_keeps_created_at() {
        let store = test_store();
        let created = store.doctors.create(house()).unwrap();

        let updated = store
            .doctors
            .update(
                &created.id,
                DoctorChanges {
                    specialty: Some("Nephrology".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.specialty, "Nephrology");
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn missing_doctor_is_not_found() {
        let store = test_store();
        let missing = RecordId::new();

        assert!(matches!(store.doctors.get(&missing), Err(CareError::NotFound)));
        assert!(matches!(
            store.doctors.update(&missing, DoctorChanges::default()),
            Err(CareError::NotFound)
        ));
        assert!(matches!(store.doctors.delete(&missing), Err(CareError::NotFound)));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let store = test_store();
        let mut fields = house();
        fields.email = "house-at-plainsboro".into();

        let err = store.doctors.create(fields).unwrap_err();
        match err {
            CareError::Validation(msg) => assert!(msg.starts_with("email:")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn delete_removes_doctor() {
        let store = test_store();
        let created = store.doctors.create(house()).unwrap();
        store.doctors.delete(&created.id).unwrap();
        assert!(store.doctors.list().unwrap().is_empty());
    }
}
