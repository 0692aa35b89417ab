use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{
    InventoryLot, Medication, MedicationChanges, NewInventoryLot, NewMedication, NewPatient,
    NewStaff, NewTreatment, PatientChanges, PatientRecord, StaffRecord, Treatment,
};
use crate::scope::PatientScope;

/// Structured clinic records: staff, patients, medications, stock and
/// treatments.
///
/// Lookups return `Ok(None)` for missing rows and deletes return whether a row
/// was removed; listing never fails just because a table is empty. References
/// between tables are not enforced here, callers check them before writing.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn insert_staff(&self, staff: NewStaff) -> StoreResult<StaffRecord>;
    async fn staff_by_id(&self, staff_id: i64) -> StoreResult<Option<StaffRecord>>;
    async fn staff_by_username(&self, username: &str) -> StoreResult<Option<StaffRecord>>;
    async fn list_staff(&self) -> StoreResult<Vec<StaffRecord>>;
    async fn delete_staff(&self, staff_id: i64) -> StoreResult<bool>;

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<PatientRecord>;
    async fn patients(&self, scope: PatientScope) -> StoreResult<Vec<PatientRecord>>;
    async fn patient(&self, p_id: i64, scope: PatientScope) -> StoreResult<Option<PatientRecord>>;
    async fn patient_by_citizen_id(&self, citizen_id: &str)
        -> StoreResult<Option<PatientRecord>>;
    async fn update_patient(
        &self,
        p_id: i64,
        changes: PatientChanges,
    ) -> StoreResult<Option<PatientRecord>>;
    async fn delete_patient(&self, p_id: i64) -> StoreResult<bool>;

    async fn insert_medication(&self, medication: NewMedication) -> StoreResult<Medication>;
    async fn medications(&self) -> StoreResult<Vec<Medication>>;
    async fn medication(&self, med_id: i64) -> StoreResult<Option<Medication>>;
    async fn update_medication(
        &self,
        med_id: i64,
        changes: MedicationChanges,
    ) -> StoreResult<Option<Medication>>;
    async fn delete_medication(&self, med_id: i64) -> StoreResult<bool>;

    async fn insert_inventory_lot(&self, lot: NewInventoryLot) -> StoreResult<InventoryLot>;
    async fn inventory_lots(&self) -> StoreResult<Vec<InventoryLot>>;
    async fn inventory_lots_for(&self, med_id: i64) -> StoreResult<Vec<InventoryLot>>;
    async fn delete_inventory_lot(&self, inv_id: i64) -> StoreResult<bool>;

    async fn insert_treatment(&self, treatment: NewTreatment) -> StoreResult<Treatment>;
    async fn treatments_for(&self, p_id: i64) -> StoreResult<Vec<Treatment>>;

    /// Releases the backend's connections. Called once at shutdown.
    async fn close(&self) {}
}
