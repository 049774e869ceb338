//! Object-level authorization.
//!
//! Every repository call receives an explicit [`Caller`]. Visibility and mutability are
//! decided by the pure predicates in this module, and the repositories apply the same
//! predicate on list paths and on single-record paths.
//!
//! Records that belong to an identity implement [`Owned`]. A patient is owned by the identity
//! that created it; an assignment inherits the owner of its patient. Doctors are not owned and
//! have no predicate: any authenticated caller may read or change them.

use crate::config::AssignmentDeletePolicy;
use crate::identity::Identity;
use caremap_uuid::RecordId;

/// The authenticated identity on whose behalf an operation runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    id: RecordId,
    is_admin: bool,
}

impl Caller {
    pub fn new(id: RecordId, is_admin: bool) -> Self {
        Self { id, is_admin }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl From<&Identity> for Caller {
    fn from(identity: &Identity) -> Self {
        Caller::new(identity.id.clone(), identity.is_admin)
    }
}

/// A record bound to exactly one owning identity.
pub trait Owned {
    fn owner(&self) -> &RecordId;
}

/// True when `caller` owns `record`. Administrators get no special treatment.
pub fn is_owner<T: Owned + ?Sized>(caller: &Caller, record: &T) -> bool {
    record.owner() == caller.id()
}

/// True when `caller` may read or change `record`: the owner, or any administrator.
pub fn can_access<T: Owned + ?Sized>(caller: &Caller, record: &T) -> bool {
    caller.is_admin() || is_owner(caller, record)
}

pub fn can_access_patient(caller: &Caller, patient: &crate::Patient) -> bool {
    can_access(caller, patient)
}

/// An assignment is accessible exactly when its patient is.
pub fn can_access_assignment(caller: &Caller, assignment: &crate::Assignment) -> bool {
    can_access(caller, assignment)
}

pub fn can_delete_assignment(
    caller: &Caller,
    assignment: &crate::Assignment,
    policy: AssignmentDeletePolicy,
) -> bool {
    match policy {
        AssignmentDeletePolicy::OwnerOnly => is_owner(caller, assignment),
        AssignmentDeletePolicy::OwnerOrAdmin => can_access_assignment(caller, assignment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        owner: RecordId,
    }

    impl Owned for Note {
        fn owner(&self) -> &RecordId {
            &self.owner
        }
    }

    #[test]
    fn owner_can_access_own_record() {
        let alice = Caller::new(RecordId::new(), false);
        let note = Note {
            owner: alice.id().clone(),
        };
        assert!(is_owner(&alice, &note));
        assert!(can_access(&alice, &note));
    }

    #[test]
    fn stranger_cannot_access() {
        let bob = Caller::new(RecordId::new(), false);
        let note = Note {
            owner: RecordId::new(),
        };
        assert!(!can_access(&bob, &note));
    }

    #[test]
    fn admin_can_access_but_is_not_owner() {
        let admin = Caller::new(RecordId::new(), true);
        let note = Note {
            owner: RecordId::new(),
        };
        assert!(can_access(&admin, &note));
        assert!(!is_owner(&admin, &note));
    }
}
