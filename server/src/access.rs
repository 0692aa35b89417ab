//! Role rules. Every role decision in the handlers goes through here.

use clinic_db::PatientScope;

use crate::auth::{Identity, Role};
use crate::error::ApiError;

/// Which patients `identity` may see.
pub fn scope_patient_list(identity: &Identity) -> Result<PatientScope, ApiError> {
    match identity.role {
        Role::Pharmacist => Ok(PatientScope::All),
        Role::Doctor => Ok(PatientScope::AssignedTo(identity.subject_id)),
        Role::Patient => Ok(PatientScope::Only(identity.subject_id)),
        Role::Other(_) => Err(ApiError::Forbidden),
    }
}

/// Creating, updating and deleting patients and treatments.
pub fn require_doctor(identity: &Identity) -> Result<(), ApiError> {
    match identity.role {
        Role::Doctor => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}

/// Any staff account, whatever its role.
pub fn require_staff(identity: &Identity) -> Result<(), ApiError> {
    match identity.role {
        Role::Patient => Err(ApiError::Forbidden),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_scope_by_role() {
        assert_eq!(
            scope_patient_list(&Identity::new(12, Role::Pharmacist, "Nok")).unwrap(),
            PatientScope::All
        );
        assert_eq!(
            scope_patient_list(&Identity::new(5, Role::Doctor, "Dr. Somsak")).unwrap(),
            PatientScope::AssignedTo(5)
        );
        assert_eq!(
            scope_patient_list(&Identity::new(7, Role::Patient, "Malee")).unwrap(),
            PatientScope::Only(7)
        );
    }

    #[test]
    fn test_unknown_roles_are_forbidden() {
        for role in ["nurse", "admin", ""] {
            let identity = Identity::new(1, role, "someone");
            assert!(matches!(scope_patient_list(&identity), Err(ApiError::Forbidden)));
        }
    }

    #[test]
    fn test_doctor_and_staff_guards() {
        let doctor = Identity::new(5, Role::Doctor, "Dr. Somsak");
        let pharmacist = Identity::new(12, Role::Pharmacist, "Nok");
        let patient = Identity::new(7, Role::Patient, "Malee");
        let nurse = Identity::new(3, "nurse", "Ploy");

        assert!(require_doctor(&doctor).is_ok());
        assert!(require_doctor(&pharmacist).is_err());
        assert!(require_doctor(&patient).is_err());

        assert!(require_staff(&doctor).is_ok());
        assert!(require_staff(&nurse).is_ok());
        assert!(matches!(require_staff(&patient), Err(ApiError::Forbidden)));
    }
}
