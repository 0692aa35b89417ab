use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::document::DocumentStore;
use crate::error::StoreResult;
use crate::models::{EventLog, MedInfo, PatientHistory, PatientHistoryPatch};

pub const MED_INFO: &str = "med_info";
pub const PATIENT_HISTORY: &str = "patient_hist";
pub const EVENT_LOG: &str = "event_log";

/// Collections holding at most one document per key. Backends reject a
/// second insert with [`SINGLE_KEY_CONSTRAINT`].
pub const SINGLE_KEY_COLLECTIONS: &[&str] = &[MED_INFO, PATIENT_HISTORY];
pub const SINGLE_KEY_CONSTRAINT: &str = "documents_single_key_idx";

/// Typed access to the clinic's document collections on top of a raw
/// [`DocumentStore`].
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn med_info(&self, med_id: i64) -> StoreResult<Option<MedInfo>> {
        decode_opt(self.store.find_one(MED_INFO, med_id).await?)
    }

    pub async fn all_med_info(&self) -> StoreResult<Vec<MedInfo>> {
        decode_all(self.store.find_all(MED_INFO).await?)
    }

    /// Fails with a unique violation when the medication already has one.
    pub async fn insert_med_info(&self, info: &MedInfo) -> StoreResult<Uuid> {
        self.store
            .insert(MED_INFO, info.med_id, serde_json::to_value(info)?)
            .await
    }

    pub async fn patient_history(&self, p_id: i64) -> StoreResult<Option<PatientHistory>> {
        decode_opt(self.store.find_one(PATIENT_HISTORY, p_id).await?)
    }

    pub async fn insert_patient_history(&self, history: &PatientHistory) -> StoreResult<Uuid> {
        self.store
            .insert(PATIENT_HISTORY, history.p_id, serde_json::to_value(history)?)
            .await
    }

    /// Merges `patch` into the stored history. `None` when the patient has no
    /// history document.
    pub async fn patch_patient_history(
        &self,
        p_id: i64,
        patch: &PatientHistoryPatch,
    ) -> StoreResult<Option<PatientHistory>> {
        let patch = serde_json::to_value(patch)?;
        decode_opt(self.store.merge(PATIENT_HISTORY, p_id, &patch).await?)
    }

    pub async fn append_event(&self, event: &EventLog) -> StoreResult<Uuid> {
        self.store
            .insert(EVENT_LOG, event.staff_id, serde_json::to_value(event)?)
            .await
    }

    pub async fn events_for(&self, staff_id: i64) -> StoreResult<Vec<EventLog>> {
        decode_all(self.store.find(EVENT_LOG, staff_id).await?)
    }
}

fn decode_opt<T: DeserializeOwned>(value: Option<Value>) -> StoreResult<Option<T>> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(Into::into)
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> StoreResult<Vec<T>> {
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use chrono::Utc;

    fn documents() -> Documents {
        Documents::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn test_med_info_roundtrip_and_absence() {
        let docs = documents();
        assert!(docs.med_info(1).await.unwrap().is_none());

        let info = MedInfo {
            med_id: 1,
            guideline: Some("Take after meals".to_string()),
            warning: None,
        };
        docs.insert_med_info(&info).await.unwrap();

        assert_eq!(docs.med_info(1).await.unwrap(), Some(info));
        assert_eq!(docs.all_med_info().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patch_history_keeps_other_fields() {
        let docs = documents();
        let original = PatientHistory {
            p_id: 7,
            history: Some("first visit".to_string()),
            diagnosis: vec!["Diabetes".to_string()],
            medication: vec!["Metformin".to_string()],
            allergies: vec![],
        };
        docs.insert_patient_history(&original).await.unwrap();

        let patch = PatientHistoryPatch {
            history: Some("new note".to_string()),
            ..Default::default()
        };
        let updated = docs.patch_patient_history(7, &patch).await.unwrap().unwrap();

        assert_eq!(updated.history.as_deref(), Some("new note"));
        assert_eq!(updated.diagnosis, original.diagnosis);
        assert_eq!(updated.medication, original.medication);
    }

    #[tokio::test]
    async fn test_patch_missing_history_returns_none() {
        let docs = documents();
        let patch = PatientHistoryPatch::default();
        assert!(docs.patch_patient_history(99, &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_events_are_grouped_by_staff() {
        let docs = documents();
        for (staff_id, action) in [(1, "create_patient"), (2, "add_treatment"), (1, "update_patient")] {
            docs.append_event(&EventLog {
                staff_id,
                date: Utc::now(),
                action: action.to_string(),
                description: None,
            })
            .await
            .unwrap();
        }

        let events = docs.events_for(1).await.unwrap();
        let actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["create_patient", "update_patient"]);
    }
}
