use crate::models::PatientRecord;

/// Row-level filter for patient queries. Backends apply it inside the query
/// rather than filtering a full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientScope {
    /// Every patient.
    All,
    /// Patients whose `doctor_id` equals the given staff id.
    AssignedTo(i64),
    /// Only the patient with this `p_id`.
    Only(i64),
}

impl PatientScope {
    pub fn permits(&self, patient: &PatientRecord) -> bool {
        match *self {
            PatientScope::All => true,
            PatientScope::AssignedTo(doctor_id) => patient.doctor_id == Some(doctor_id),
            PatientScope::Only(p_id) => patient.p_id == p_id,
        }
    }

    /// `(doctor_id, p_id)` filter values; `None` means unconstrained.
    pub(crate) fn bind_values(&self) -> (Option<i64>, Option<i64>) {
        match *self {
            PatientScope::All => (None, None),
            PatientScope::AssignedTo(doctor_id) => (Some(doctor_id), None),
            PatientScope::Only(p_id) => (None, Some(p_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(p_id: i64, doctor_id: Option<i64>) -> PatientRecord {
        PatientRecord {
            p_id,
            name: format!("patient-{p_id}"),
            citizen_id: format!("{p_id:013}"),
            password_hash: String::new(),
            age: 30,
            gender: "female".to_string(),
            doctor_id,
        }
    }

    #[test]
    fn test_scope_permits() {
        let assigned = patient(1, Some(5));
        let other = patient(2, Some(6));
        let orphan = patient(3, None);

        assert!(PatientScope::All.permits(&orphan));
        assert!(PatientScope::AssignedTo(5).permits(&assigned));
        assert!(!PatientScope::AssignedTo(5).permits(&other));
        assert!(!PatientScope::AssignedTo(5).permits(&orphan));
        assert!(PatientScope::Only(2).permits(&other));
        assert!(!PatientScope::Only(2).permits(&assigned));
    }

    #[test]
    fn test_bind_values() {
        assert_eq!(PatientScope::All.bind_values(), (None, None));
        assert_eq!(PatientScope::AssignedTo(9).bind_values(), (Some(9), None));
        assert_eq!(PatientScope::Only(4).bind_values(), (None, Some(4)));
    }
}
