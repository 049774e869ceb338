//! Assignment repository: links between one patient and one doctor.
//!
//! An assignment has no owner of its own; it is visible to whoever may access its patient.
//! Only the patient's owner (or an administrator) may create one, and deletion follows the
//! configured [`AssignmentDeletePolicy`].

use crate::authorization::{can_access_assignment, can_access_patient, can_delete_assignment, Caller, Owned};
use crate::config::{AssignmentDeletePolicy, CoreConfig};
use crate::db::Database;
use crate::repositories::doctors::load_doctor;
use crate::repositories::patients::{load_accessible_patient, load_patient};
use crate::repositories::shared::{id_column, now, timestamp_column, timestamp_to_sql};
use crate::{CareError, CareResult};
use caremap_uuid::RecordId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

/// A stored assignment, with the names of both ends for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub patient_name: String,
    pub doctor_id: RecordId,
    pub doctor_name: String,
    pub assigned_at: DateTime<Utc>,
    patient_owner: RecordId,
}

impl Owned for Assignment {
    /// The owner of the assignment's patient.
    fn owner(&self) -> &RecordId {
        &self.patient_owner
    }
}

const ASSIGNMENT_SELECT: &str = "SELECT a.id, a.patient_id, p.name, p.owner_id, a.doctor_id, d.name, a.assigned_at
     FROM assignments a
     JOIN patients p ON p.id = a.patient_id
     JOIN doctors d ON d.id = a.doctor_id";

const NEWEST_FIRST: &str = "ORDER BY a.assigned_at DESC, a.id";

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: id_column(row, 0)?,
        patient_id: id_column(row, 1)?,
        patient_name: row.get(2)?,
        patient_owner: id_column(row, 3)?,
        doctor_id: id_column(row, 4)?,
        doctor_name: row.get(5)?,
        assigned_at: timestamp_column(row, 6)?,
    })
}

fn load_assignment(conn: &Connection, id: &RecordId) -> CareResult<Option<Assignment>> {
    Ok(conn
        .query_row(
            &format!("{ASSIGNMENT_SELECT} WHERE a.id = ?1"),
            params![id.to_string()],
            assignment_from_row,
        )
        .optional()?)
}

#[derive(Clone, Debug)]
pub struct AssignmentRepository {
    db: Database,
    cfg: Arc<CoreConfig>,
}

impl AssignmentRepository {
    pub fn new(db: Database, cfg: Arc<CoreConfig>) -> Self {
        Self { db, cfg }
    }

    pub fn delete_policy(&self) -> AssignmentDeletePolicy {
        self.cfg.assignment_delete_policy()
    }

    /// Every assignment the caller may access: all of them for an administrator, otherwise
    /// those whose patient the caller owns. Newest first.
    pub fn list(&self, caller: &Caller) -> CareResult<Vec<Assignment>> {
        let all = self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!("{ASSIGNMENT_SELECT} {NEWEST_FIRST}"))?;
            let rows = stmt
                .query_map([], assignment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(all
            .into_iter()
            .filter(|assignment| can_access_assignment(caller, assignment))
            .collect())
    }

    /// Assignments of one patient. `NotFound` unless the caller may access the patient.
    pub fn list_for_patient(
        &self,
        caller: &Caller,
        patient_id: &RecordId,
    ) -> CareResult<Vec<Assignment>> {
        let rows = self.db.read(|conn| {
            let patient = load_accessible_patient(conn, caller, patient_id)?;
            let mut stmt =
                conn.prepare(&format!("{ASSIGNMENT_SELECT} WHERE a.patient_id = ?1 {NEWEST_FIRST}"))?;
            let rows = stmt
                .query_map(params![patient.id.to_string()], assignment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows
            .into_iter()
            .filter(|assignment| can_access_assignment(caller, assignment))
            .collect())
    }

    /// Assigns a doctor to one of the caller's patients.
    ///
    /// # Errors
    ///
    /// [`CareError::Validation`] if the patient does not exist or is not the caller's (unless
    /// the caller is an administrator), if the doctor does not exist, or if the pair is
    /// already assigned. A foreign patient reports the same error as a missing one.
    pub fn create(
        &self,
        caller: &Caller,
        patient_id: &RecordId,
        doctor_id: &RecordId,
    ) -> CareResult<Assignment> {
        let created = self.db.write(|tx| {
            let patient = load_patient(tx, patient_id)?.ok_or_else(|| {
                CareError::field("patient", "no such patient")
            })?;
            if !can_access_patient(caller, &patient) {
                tracing::warn!(
                    "caller {} tried to assign a doctor to patient {}",
                    caller.id(),
                    patient.id
                );
                return Err(CareError::field("patient", "no such patient"));
            }

            let doctor = load_doctor(tx, doctor_id)?
                .ok_or_else(|| CareError::field("doctor", "no such doctor"))?;

            let already: Option<String> = tx
                .query_row(
                    "SELECT id FROM assignments WHERE patient_id = ?1 AND doctor_id = ?2",
                    params![patient.id.to_string(), doctor.id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if already.is_some() {
                return Err(CareError::Validation(
                    "this doctor is already assigned to this patient".into(),
                ));
            }

            let assignment = Assignment {
                id: RecordId::new(),
                patient_id: patient.id.clone(),
                patient_name: patient.name.clone(),
                doctor_id: doctor.id.clone(),
                doctor_name: doctor.name,
                assigned_at: now(),
                patient_owner: patient.owner,
            };
            tx.execute(
                "INSERT INTO assignments (id, patient_id, doctor_id, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    assignment.id.to_string(),
                    assignment.patient_id.to_string(),
                    assignment.doctor_id.to_string(),
                    timestamp_to_sql(&assignment.assigned_at),
                ],
            )?;
            Ok(assignment)
        })?;

        tracing::info!(
            "assignment {} created by {} (patient {}, doctor {})",
            created.id,
            caller.id(),
            created.patient_id,
            created.doctor_id
        );
        Ok(created)
    }

    /// Deletes an assignment. `NotFound` unless the delete policy admits the caller.
    pub fn delete(&self, caller: &Caller, id: &RecordId) -> CareResult<()> {
        let policy = self.delete_policy();
        self.db.write(|tx| {
            let assignment = load_assignment(tx, id)?.ok_or(CareError::NotFound)?;
            if !can_delete_assignment(caller, &assignment, policy) {
                tracing::warn!("caller {} denied deleting assignment {}", caller.id(), id);
                return Err(CareError::NotFound);
            }
            tx.execute(
                "DELETE FROM assignments WHERE id = ?1",
                params![assignment.id.to_string()],
            )?;
            Ok(())
        })?;

        tracing::info!("assignment {} deleted by {}", id, caller.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::doctors::DoctorFields;
    use crate::test_support::{
        admin, alice_patient, house, next_tick, regular, test_store, test_store_with_policy,
    };

    #[test]
    fn lists_are_newest_first() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let gregory = store.doctors.create(house()).unwrap();
        let wilson = store
            .doctors
            .create(DoctorFields {
                name: "James Wilson".into(),
                specialty: "Oncology".into(),
                ..house()
            })
            .unwrap();

        let older = store.assignments.create(&alice, &patient.id, &gregory.id).unwrap();
        next_tick();
        let newer = store.assignments.create(&alice, &patient.id, &wilson.id).unwrap();

        let expected = vec![newer.clone(), older.clone()];
        assert_eq!(store.assignments.list(&alice).unwrap(), expected);
        assert_eq!(
            store.assignments.list_for_patient(&alice, &patient.id).unwrap(),
            expected
        );
    }

    #[test]
    fn owner_can_assign_and_list() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();

        let assignment = store
            .assignments
            .create(&alice, &patient.id, &doctor.id)
            .expect("owner should be able to assign");

        assert_eq!(assignment.patient_name, "Alice");
        assert_eq!(assignment.doctor_name, "Gregory House");
        assert_eq!(store.assignments.list(&alice).unwrap(), vec![assignment.clone()]);
        assert_eq!(
            store.assignments.list_for_patient(&alice, &patient.id).unwrap(),
            vec![assignment]
        );
    }

    #[test]
    fn assigning_someone_elses_patient_is_a_validation_error_except_for_admins() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();

        let err = store
            .assignments
            .create(&bob, &patient.id, &doctor.id)
            .unwrap_err();
        assert!(matches!(err, CareError::Validation(_)));

        store
            .assignments
            .create(&root, &patient.id, &doctor.id)
            .expect("admin should be able to assign");
    }

    #[test]
    fn foreign_patient_reads_like_a_missing_one() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();

        let foreign = store
            .assignments
            .create(&bob, &patient.id, &doctor.id)
            .unwrap_err();
        let missing = store
            .assignments
            .create(&bob, &RecordId::new(), &doctor.id)
            .unwrap_err();

        assert_eq!(foreign.to_string(), missing.to_string());
        assert!(matches!(foreign, CareError::Validation(m) if m == "patient: no such patient"));
    }

    #[test]
    fn admin_still_needs_an_existing_patient() {
        let store = test_store();
        let root = admin(&store, "root");
        let doctor = store.doctors.create(house()).unwrap();

        assert!(matches!(
            store.assignments.create(&root, &RecordId::new(), &doctor.id),
            Err(CareError::Validation(_))
        ));
    }

    #[test]
    fn missing_doctor_and_duplicates_are_rejected() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();

        assert!(matches!(
            store.assignments.create(&alice, &patient.id, &RecordId::new()),
            Err(CareError::Validation(_))
        ));

        store.assignments.create(&alice, &patient.id, &doctor.id).unwrap();
        assert!(matches!(
            store.assignments.create(&alice, &patient.id, &doctor.id),
            Err(CareError::Validation(_))
        ));
    }

    #[test]
    fn admin_lists_everything_regular_callers_list_their_own() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let doctor = store.doctors.create(house()).unwrap();

        let pa = store.patients.create(&alice, alice_patient()).unwrap();
        let pb = store.patients.create(&bob, alice_patient()).unwrap();
        let aa = store.assignments.create(&alice, &pa.id, &doctor.id).unwrap();
        let ab = store.assignments.create(&bob, &pb.id, &doctor.id).unwrap();

        let all: Vec<_> = store
            .assignments
            .list(&root)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&aa.id) && all.contains(&ab.id));

        assert_eq!(store.assignments.list(&alice).unwrap(), vec![aa]);
        assert_eq!(store.assignments.list(&bob).unwrap(), vec![ab]);
    }

    #[test]
    fn list_for_patient_hides_other_owners_patients() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();

        assert!(matches!(
            store.assignments.list_for_patient(&bob, &patient.id),
            Err(CareError::NotFound)
        ));
        assert!(store
            .assignments
            .list_for_patient(&root, &patient.id)
            .unwrap()
            .is_empty());
        assert!(matches!(
            store.assignments.list_for_patient(&root, &RecordId::new()),
            Err(CareError::NotFound)
        ));
    }

    #[test]
    fn deleting_a_patient_cascades_to_its_assignments() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let root = admin(&store, "root");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();
        store.assignments.create(&alice, &patient.id, &doctor.id).unwrap();

        store.patients.delete(&alice, &patient.id).unwrap();

        assert!(store.assignments.list(&root).unwrap().is_empty());
        let orphans: i64 = store
            .db
            .read(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM assignments", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn deleting_a_doctor_cascades_to_its_assignments() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();
        store.assignments.create(&alice, &patient.id, &doctor.id).unwrap();

        store.doctors.delete(&doctor.id).unwrap();
        assert!(store.assignments.list(&alice).unwrap().is_empty());
    }

    #[test]
    fn owner_only_policy_blocks_admin_delete() {
        let store = test_store();
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();
        let assignment = store.assignments.create(&alice, &patient.id, &doctor.id).unwrap();

        assert!(matches!(
            store.assignments.delete(&bob, &assignment.id),
            Err(CareError::NotFound)
        ));
        assert!(matches!(
            store.assignments.delete(&root, &assignment.id),
            Err(CareError::NotFound)
        ));

        store.assignments.delete(&alice, &assignment.id).unwrap();
        assert!(store.assignments.list(&alice).unwrap().is_empty());
    }

    #[test]
    fn owner_or_admin_policy_allows_admin_delete() {
        let store = test_store_with_policy(AssignmentDeletePolicy::OwnerOrAdmin);
        let alice = regular(&store, "alice");
        let bob = regular(&store, "bob");
        let root = admin(&store, "root");
        let patient = store.patients.create(&alice, alice_patient()).unwrap();
        let doctor = store.doctors.create(house()).unwrap();
        let assignment = store.assignments.create(&alice, &patient.id, &doctor.id).unwrap();

        assert!(matches!(
            store.assignments.delete(&bob, &assignment.id),
            Err(CareError::NotFound)
        ));
        store.assignments.delete(&root, &assignment.id).unwrap();
        assert!(store.assignments.list(&root).unwrap().is_empty());
    }
}
