//! Patient repository.
//!
//! Patients are owned by the identity that created them. The list is always scoped to the
//! caller's own patients; single-record reads and writes are open to the owner and to
//! administrators. A record the caller may not see is reported as [`CareError::NotFound`].

use crate::authorization::{can_access_patient, is_owner, Caller, Owned};
use crate::constants::{GENDER_MAX_LEN, NAME_MAX_LEN};
use crate::db::Database;
use crate::repositories::shared::{id_column, now, timestamp_column, timestamp_to_sql};
use crate::validation;
use crate::{CareError, CareResult};
use caremap_uuid::RecordId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// A stored patient record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub id: RecordId,
    pub owner: RecordId,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Owned for Patient {
    fn owner(&self) -> &RecordId {
        &self.owner
    }
}

/// Fields supplied when creating a patient. The owner is never taken from input.
#[derive(Clone, Debug, Default)]
pub struct PatientFields {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub address: String,
}

/// A partial update; `None` leaves the field unchanged.
#[derive(Clone, Debug, Default)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

impl From<PatientFields> for PatientChanges {
    fn from(fields: PatientFields) -> Self {
        Self {
            name: Some(fields.name),
            age: Some(fields.age),
            gender: Some(fields.gender),
            address: Some(fields.address),
        }
    }
}

const PATIENT_COLUMNS: &str = "id, owner_id, name, age, gender, address, created_at";

pub(crate) fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: id_column(row, 0)?,
        owner: id_column(row, 1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        gender: row.get(4)?,
        address: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

/// Loads a patient regardless of who is asking. Callers must apply a predicate.
pub(crate) fn load_patient(conn: &Connection, id: &RecordId) -> CareResult<Option<Patient>> {
    Ok(conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id.to_string()],
            patient_from_row,
        )
        .optional()?)
}

/// Loads a patient the caller may access, or `NotFound`.
pub(crate) fn load_accessible_patient(
    conn: &Connection,
    caller: &Caller,
    id: &RecordId,
) -> CareResult<Patient> {
    match load_patient(conn, id)? {
        Some(patient) if can_access_patient(caller, &patient) => Ok(patient),
        Some(_) => {
            tracing::warn!("caller {} denied access to patient {}", caller.id(), id);
            Err(CareError::NotFound)
        }
        None => Err(CareError::NotFound),
    }
}

#[derive(Clone, Debug)]
pub struct PatientRepository {
    db: Database,
}

impl PatientRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Patients owned by `caller`, newest first. Administrators also see only their own.
    pub fn list(&self, caller: &Caller) -> CareResult<Vec<Patient>> {
        let patients = self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PATIENT_COLUMNS} FROM patients WHERE owner_id = ?1
                 ORDER BY created_at DESC, id"
            ))?;
            let rows = stmt
                .query_map(params![caller.id().to_string()], patient_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(patients
            .into_iter()
            .filter(|patient| is_owner(caller, patient))
            .collect())
    }

    /// Creates a patient owned by `caller`.
    pub fn create(&self, caller: &Caller, fields: PatientFields) -> CareResult<Patient> {
        let patient = Patient {
            id: RecordId::new(),
            owner: caller.id().clone(),
            name: validation::required_text("name", &fields.name, NAME_MAX_LEN)?.into_inner(),
            age: validation::age(fields.age)?,
            gender: validation::required_text("gender", &fields.gender, GENDER_MAX_LEN)?
                .into_inner(),
            address: validation::required_text("address", &fields.address, usize::MAX)?
                .into_inner(),
            created_at: now(),
        };

        self.db.write(|tx| {
            tx.execute(
                &format!(
                    "INSERT INTO patients ({PATIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    patient.id.to_string(),
                    patient.owner.to_string(),
                    patient.name,
                    patient.age,
                    patient.gender,
                    patient.address,
                    timestamp_to_sql(&patient.created_at),
                ],
            )?;
            Ok(())
        })?;

        tracing::info!("patient {} created by {}", patient.id, caller.id());
        Ok(patient)
    }

    pub fn get(&self, caller: &Caller, id: &RecordId) -> CareResult<Patient> {
        self.db
            .read(|conn| load_accessible_patient(conn, caller, id))
    }

    /// Applies `changes` to a patient the caller may access.
    ///
    /// The owner and creation timestamp are never modified.
    pub fn update(
        &self,
        caller: &Caller,
        id: &RecordId,
        changes: PatientChanges,
    ) -> CareResult<Patient> {
        let updated = self.db.write(|tx| {
            let mut patient = load_accessible_patient(tx, caller, id)?;

            if let Some(name) = changes.name {
                patient.name = validation::required_text("name", &name, NAME_MAX_LEN)?.into_inner();
            }
            if let Some(age) = changes.age {
                patient.age = validation::age(age)?;
            }
            if let Some(gender) = changes.gender {
                patient.gender =
                    validation::required_text("gender", &gender, GENDER_MAX_LEN)?.into_inner();
            }
            if let Some(address) = changes.address {
                patient.address =
                    validation::required_text("address", &address, usize::MAX)?.into_inner();
            }

            tx.execute(
                "UPDATE patients SET name = ?1, age = ?2, gender = ?3, address = ?4 WHERE id = ?5",
                params![
                    patient.name,
                    patient.age,
                    patient.gender,
                    patient.address,
                    patient.id.to_string(),
                ],
            )?;
            Ok(patient)
        })?;

        tracing::info!("patient {} updated by {}", updated.id, caller.id());
        Ok(updated)
    }

    /// Deletes a patient and, through the foreign-key cascade, all of its assignments.
    pub fn delete(&self, caller: &Caller, id: &RecordId) -> CareResult<()> {
        self.db.write(|tx| {
            let patient = load_accessible_patient(tx, caller, id)?;
            tx.execute(
                "DELETE FROM patients WHERE id = ?1",
                params![patient.id.to_string()],
            )?;
            Ok(())
        })?;

        tracing::info!("patient {} deleted by {}", id, caller.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, alice_patient, next_tick, regular, test_store};

    #[test]
    fn list_is_newest_first() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let first = store.patients.create(&alice, alice_patient()).unwrap();
        next_tick();
        let second = store
            .patients
            .create(
                &alice,
                PatientFields {
                    name: "Bea".into(),
                    ..alice_patient()
                },
            )
            .unwrap();

        let names: Vec<_> = store
            .patients
            .list(&alice)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(second.created_at > first.created_at);
        assert_eq!(names, ["Bea", "Alice"]);
    }

    #[test]
    fn create_then_get_round_trips_fields() {
        let store = test_store();
        let alice = regular(&store, "alice");

        let created = store
            .patients
            .create(&alice, alice_patient())
            .expect("create should succeed");
        let fetched = store.patients.get(&alice, &created.id).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Alice");
        assert_eq!(fetched.age, 30);
        assert_eq!(fetched.gender, "F");
        assert_eq!(fetched.address, "1 Main St");
        assert_eq!(&fetched.owner, alice.id());
    }

    #[test]
    fn list_returns_exactly_the_callers_patients() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");

        let a1 = store.patients.create(&alice, alice_patient()).unwrap();
        let a2 = store.patients.create(&alice, alice_patient()).unwrap();
        let b1 = store.patients.create(&bob, alice_patient()).unwrap();

        let mut alice_ids: Vec<_> = store
            .patients
            .list(&alice)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        alice_ids.sort();
        let mut expected = vec![a1.id, a2.id];
        expected.sort();
        assert_eq!(alice_ids, expected);

        let bob_list = store.patients.list(&bob).unwrap();
        assert_eq!(bob_list.len(), 1);
        assert_eq!(bob_list[0].id, b1.id);

        assert!(store.patients.list(&root).unwrap().is_empty());
    }

    #[test]
    fn other_owners_patient_is_not_found() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let p1 = store.patients.create(&alice, alice_patient()).unwrap();

        assert!(matches!(
            store.patients.get(&bob, &p1.id),
            Err(CareError::NotFound)
        ));
        assert!(matches!(
            store.patients.delete(&bob, &p1.id),
            Err(CareError::NotFound)
        ));
        assert!(store.patients.get(&alice, &p1.id).is_ok());
    }

    #[test]
    fn stranger_update_fails_admin_update_succeeds() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let p1 = store.patients.create(&alice, alice_patient()).unwrap();

        let change = || PatientChanges {
            name: Some("X".into()),
            ..Default::default()
        };

        assert!(matches!(
            store.patients.update(&bob, &p1.id, change()),
            Err(CareError::NotFound)
        ));
        assert_eq!(store.patients.get(&alice, &p1.id).unwrap().name, "Alice");

        let updated = store.patients.update(&root, &p1.id, change()).unwrap();
        assert_eq!(updated.name, "X");
        assert_eq!(&updated.owner, alice.id());
        assert_eq!(updated.created_at, p1.created_at);
        assert_eq!(store.patients.get(&alice, &p1.id).unwrap().name, "X");
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let p1 = store.patients.create(&alice, alice_patient()).unwrap();

        let updated = store
            .patients
            .update(
                &alice,
                &p1.id,
                PatientChanges {
                    age: Some(31),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.age, 31);
        assert_eq!(updated.name, p1.name);
        assert_eq!(updated.address, p1.address);
    }

    #[test]
    fn invalid_update_leaves_record_untouched() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let p1 = store.patients.create(&alice, alice_patient()).unwrap();

        let err = store
            .patients
            .update(
                &alice,
                &p1.id,
                PatientChanges {
                    name: Some("Renamed".into()),
                    age: Some(-4),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));
        assert_eq!(store.patients.get(&alice, &p1.id).unwrap(), p1);
    }

    #[test]
    fn create_rejects_blank_name() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let mut fields = alice_patient();
        fields.name = "   ".into();

        assert!(matches!(
            store.patients.create(&alice, fields),
            Err(CareError::Validation(_))
        ));
        assert!(store.patients.list(&alice).unwrap().is_empty());
    }

    #[test]
    fn admin_can_delete_any_patient() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let root = admin(&store, "root");
        let p1 = store.patients.create(&alice, alice_patient()).unwrap();

        store.patients.delete(&root, &p1.id).unwrap();
        assert!(matches!(
            store.patients.get(&alice, &p1.id),
            Err(CareError::NotFound)
        ));
    }
}
