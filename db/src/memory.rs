//! Process-local backends used for development runs and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{apply_merge, DocumentStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    InventoryLot, Medication, MedicationChanges, NewInventoryLot, NewMedication, NewPatient,
    NewStaff, NewTreatment, PatientChanges, PatientRecord, StaffRecord, Treatment,
};
use crate::relational::RelationalStore;
use crate::repository::{SINGLE_KEY_COLLECTIONS, SINGLE_KEY_CONSTRAINT};
use crate::scope::PatientScope;

/// Ids start at 1, like BIGSERIAL.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

struct Tables {
    staff: Table<StaffRecord>,
    patients: Table<PatientRecord>,
    medications: Table<Medication>,
    inventory: Table<InventoryLot>,
    treatments: Table<Treatment>,
}

pub struct MemoryRelationalStore {
    tables: RwLock<Tables>,
}

impl MemoryRelationalStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                staff: Table::new(),
                patients: Table::new(),
                medications: Table::new(),
                inventory: Table::new(),
                treatments: Table::new(),
            }),
        }
    }
}

impl Default for MemoryRelationalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn insert_staff(&self, staff: NewStaff) -> StoreResult<StaffRecord> {
        let mut tables = self.tables.write().await;
        if tables
            .staff
            .rows
            .values()
            .any(|s| s.username == staff.username)
        {
            return Err(StoreError::unique("staff_username_key"));
        }
        Ok(tables.staff.insert_with(|staff_id| StaffRecord {
            staff_id,
            username: staff.username,
            password_hash: staff.password_hash,
            name: staff.name,
            role: staff.role,
        }))
    }

    async fn staff_by_id(&self, staff_id: i64) -> StoreResult<Option<StaffRecord>> {
        Ok(self.tables.read().await.staff.rows.get(&staff_id).cloned())
    }

    async fn staff_by_username(&self, username: &str) -> StoreResult<Option<StaffRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .staff
            .rows
            .values()
            .find(|s| s.username == username)
            .cloned())
    }

    async fn list_staff(&self) -> StoreResult<Vec<StaffRecord>> {
        Ok(self.tables.read().await.staff.all())
    }

    async fn delete_staff(&self, staff_id: i64) -> StoreResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .staff
            .rows
            .remove(&staff_id)
            .is_some())
    }

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<PatientRecord> {
        let mut tables = self.tables.write().await;
        if tables
            .patients
            .rows
            .values()
            .any(|p| p.citizen_id == patient.citizen_id)
        {
            return Err(StoreError::unique("patient_citizen_id_key"));
        }
        Ok(tables.patients.insert_with(|p_id| PatientRecord {
            p_id,
            name: patient.name,
            citizen_id: patient.citizen_id,
            password_hash: patient.password_hash,
            age: patient.age,
            gender: patient.gender,
            doctor_id: patient.doctor_id,
        }))
    }

    async fn patients(&self, scope: PatientScope) -> StoreResult<Vec<PatientRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .rows
            .values()
            .filter(|p| scope.permits(p))
            .cloned()
            .collect())
    }

    async fn patient(&self, p_id: i64, scope: PatientScope) -> StoreResult<Option<PatientRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .rows
            .get(&p_id)
            .filter(|p| scope.permits(p))
            .cloned())
    }

    async fn patient_by_citizen_id(
        &self,
        citizen_id: &str,
    ) -> StoreResult<Option<PatientRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .rows
            .values()
            .find(|p| p.citizen_id == citizen_id)
            .cloned())
    }

    async fn update_patient(
        &self,
        p_id: i64,
        changes: PatientChanges,
    ) -> StoreResult<Option<PatientRecord>> {
        let mut tables = self.tables.write().await;
        let Some(patient) = tables.patients.rows.get_mut(&p_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            patient.name = name;
        }
        if let Some(age) = changes.age {
            patient.age = age;
        }
        if let Some(gender) = changes.gender {
            patient.gender = gender;
        }
        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, p_id: i64) -> StoreResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .patients
            .rows
            .remove(&p_id)
            .is_some())
    }

    async fn insert_medication(&self, medication: NewMedication) -> StoreResult<Medication> {
        let mut tables = self.tables.write().await;
        Ok(tables.medications.insert_with(|med_id| Medication {
            med_id,
            name: medication.name,
            common_name: medication.common_name,
            price: medication.price,
        }))
    }

    async fn medications(&self) -> StoreResult<Vec<Medication>> {
        Ok(self.tables.read().await.medications.all())
    }

    async fn medication(&self, med_id: i64) -> StoreResult<Option<Medication>> {
        Ok(self.tables.read().await.medications.rows.get(&med_id).cloned())
    }

    async fn update_medication(
        &self,
        med_id: i64,
        changes: MedicationChanges,
    ) -> StoreResult<Option<Medication>> {
        let mut tables = self.tables.write().await;
        let Some(medication) = tables.medications.rows.get_mut(&med_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            medication.name = name;
        }
        if let Some(common_name) = changes.common_name {
            medication.common_name = Some(common_name);
        }
        if let Some(price) = changes.price {
            medication.price = price;
        }
        Ok(Some(medication.clone()))
    }

    async fn delete_medication(&self, med_id: i64) -> StoreResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .medications
            .rows
            .remove(&med_id)
            .is_some())
    }

    async fn insert_inventory_lot(&self, lot: NewInventoryLot) -> StoreResult<InventoryLot> {
        let mut tables = self.tables.write().await;
        Ok(tables.inventory.insert_with(|inv_id| InventoryLot {
            inv_id,
            med_id: lot.med_id,
            in_day: lot.in_day,
            exp_day: lot.exp_day,
            quantity: lot.quantity,
        }))
    }

    async fn inventory_lots(&self) -> StoreResult<Vec<InventoryLot>> {
        Ok(self.tables.read().await.inventory.all())
    }

    async fn inventory_lots_for(&self, med_id: i64) -> StoreResult<Vec<InventoryLot>> {
        let tables = self.tables.read().await;
        Ok(tables
            .inventory
            .rows
            .values()
            .filter(|lot| lot.med_id == med_id)
            .cloned()
            .collect())
    }

    async fn delete_inventory_lot(&self, inv_id: i64) -> StoreResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .inventory
            .rows
            .remove(&inv_id)
            .is_some())
    }

    async fn insert_treatment(&self, treatment: NewTreatment) -> StoreResult<Treatment> {
        let mut tables = self.tables.write().await;
        Ok(tables.treatments.insert_with(|t_id| Treatment {
            t_id,
            p_id: treatment.p_id,
            med_id: treatment.med_id,
            amount: treatment.amount,
            date: treatment.date,
        }))
    }

    async fn treatments_for(&self, p_id: i64) -> StoreResult<Vec<Treatment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .treatments
            .rows
            .values()
            .filter(|t| t.p_id == p_id)
            .cloned()
            .collect())
    }
}

struct StoredDocument {
    id: Uuid,
    collection: String,
    key: i64,
    body: Value,
}

/// Documents kept in insertion order.
pub struct MemoryDocumentStore {
    documents: RwLock<Vec<StoredDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, key: i64, body: Value) -> StoreResult<Uuid> {
        let mut documents = self.documents.write().await;
        if SINGLE_KEY_COLLECTIONS.contains(&collection)
            && documents
                .iter()
                .any(|d| d.collection == collection && d.key == key)
        {
            return Err(StoreError::unique(SINGLE_KEY_CONSTRAINT));
        }

        let id = Uuid::new_v4();
        documents.push(StoredDocument {
            id,
            collection: collection.to_string(),
            key,
            body,
        });
        Ok(id)
    }

    async fn find(&self, collection: &str, key: i64) -> StoreResult<Vec<Value>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|d| d.collection == collection && d.key == key)
            .map(|d| d.body.clone())
            .collect())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|d| d.collection == collection)
            .map(|d| d.body.clone())
            .collect())
    }

    async fn merge(
        &self,
        collection: &str,
        key: i64,
        patch: &Value,
    ) -> StoreResult<Option<Value>> {
        let mut documents = self.documents.write().await;
        let Some(doc) = documents
            .iter_mut()
            .find(|d| d.collection == collection && d.key == key)
        else {
            return Ok(None);
        };
        apply_merge(&mut doc.body, patch);
        tracing::debug!("✓ Document merged: {}/{} ({})", collection, key, doc.id);
        Ok(Some(doc.body.clone()))
    }
}
