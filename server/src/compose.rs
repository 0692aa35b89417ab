//! Views that join relational rows with their documents by shared key.

use chrono::NaiveDate;
use clinic_db::models::{InventoryLot, MedInfo, Medication, NewInventoryLot};
use clinic_db::Stores;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub inv_id: i64,
    pub in_day: NaiveDate,
    pub exp_day: NaiveDate,
    pub quantity: i64,
}

impl From<InventoryLot> for StockEntry {
    fn from(lot: InventoryLot) -> Self {
        Self {
            inv_id: lot.inv_id,
            in_day: lot.in_day,
            exp_day: lot.exp_day,
            quantity: lot.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedInfoBlock {
    pub guideline: Option<String>,
    pub warning: Option<String>,
}

impl From<Option<MedInfo>> for MedInfoBlock {
    fn from(info: Option<MedInfo>) -> Self {
        match info {
            Some(info) => Self {
                guideline: info.guideline,
                warning: info.warning,
            },
            None => Self::default(),
        }
    }
}

/// A medication with its stock lots and guideline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationView {
    pub med_id: i64,
    pub name: String,
    pub common_name: Option<String>,
    pub price: i64,
    pub stock: Vec<StockEntry>,
    pub med_info: MedInfoBlock,
}

/// Every medication joined with its lots and MedInfo. Lookups for different
/// medications run concurrently; the output keeps the relational row order.
pub async fn compose_medication_view(stores: &Stores) -> Result<Vec<MedicationView>, ApiError> {
    let medications = stores.relational.medications().await?;
    try_join_all(medications.into_iter().map(|med| view_for(stores, med))).await
}

async fn view_for(stores: &Stores, med: Medication) -> Result<MedicationView, ApiError> {
    let (lots, info) = futures::try_join!(
        stores.relational.inventory_lots_for(med.med_id),
        stores.documents.med_info(med.med_id),
    )?;

    Ok(MedicationView {
        med_id: med.med_id,
        name: med.name,
        common_name: med.common_name,
        price: med.price,
        stock: lots.into_iter().map(StockEntry::from).collect(),
        med_info: info.into(),
    })
}

/// Adds a stock lot after checking that its medication exists. Nothing is
/// written for an unknown `med_id`.
pub async fn create_inventory_lot(
    stores: &Stores,
    lot: NewInventoryLot,
) -> Result<InventoryLot, ApiError> {
    if lot.quantity < 0 {
        return Err(ApiError::validation("quantity", "must not be negative"));
    }
    if stores.relational.medication(lot.med_id).await?.is_none() {
        return Err(ApiError::not_found(format!(
            "Medication {} not found",
            lot.med_id
        )));
    }

    let created = stores.relational.insert_inventory_lot(lot).await?;
    tracing::info!(
        "✓ Added stock lot {} for medication {}",
        created.inv_id,
        created.med_id
    );
    Ok(created)
}
