use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DbConfig;
use crate::document::DocumentStore;
use crate::error::StoreResult;
use crate::memory::{MemoryDocumentStore, MemoryRelationalStore};
use crate::migrations::{run_migrations, DOCUMENT_MIGRATIONS, RELATIONAL_MIGRATIONS};
use crate::postgres::{PgDocumentStore, PgRelationalStore};
use crate::relational::RelationalStore;
use crate::repository::Documents;

/// Both store clients, opened at startup and closed at shutdown.
///
/// The two stores share no transaction: an operation that writes to both can
/// leave one written and the other not if the second write fails.
#[derive(Clone)]
pub struct Stores {
    pub relational: Arc<dyn RelationalStore>,
    pub documents: Documents,
}

impl Stores {
    pub fn new(relational: Arc<dyn RelationalStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            relational,
            documents: Documents::new(documents),
        }
    }

    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRelationalStore::new()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    /// Connects both PostgreSQL pools, applies pending migrations and wraps
    /// them in store clients.
    pub async fn connect(
        relational: &DbConfig<'_>,
        documents: &DbConfig<'_>,
    ) -> StoreResult<Self> {
        let relational_pool = open_pool(relational).await?;
        run_migrations(&relational_pool, RELATIONAL_MIGRATIONS).await?;
        tracing::info!("✓ Relational store connected");

        let document_pool = open_pool(documents).await?;
        run_migrations(&document_pool, DOCUMENT_MIGRATIONS).await?;
        tracing::info!("✓ Document store connected");

        Ok(Self::new(
            Arc::new(PgRelationalStore::new(relational_pool)),
            Arc::new(PgDocumentStore::new(document_pool)),
        ))
    }

    pub async fn close(&self) {
        self.relational.close().await;
        self.documents.store().close().await;
    }
}

async fn open_pool(config: &DbConfig<'_>) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;

    // Verify database connection
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedInfo, NewMedication};

    #[tokio::test]
    async fn test_in_memory_stores_are_independent() {
        let stores = Stores::in_memory();
        let med = stores
            .relational
            .insert_medication(NewMedication {
                name: "Paracetamol".to_string(),
                common_name: Some("Tylenol".to_string()),
                price: 20,
            })
            .await
            .unwrap();

        assert!(stores.documents.med_info(med.med_id).await.unwrap().is_none());

        stores
            .documents
            .insert_med_info(&MedInfo {
                med_id: med.med_id,
                guideline: None,
                warning: Some("Max 4g per day".to_string()),
            })
            .await
            .unwrap();

        // Deleting the relational row leaves the document in place.
        assert!(stores.relational.delete_medication(med.med_id).await.unwrap());
        assert!(stores.documents.med_info(med.med_id).await.unwrap().is_some());

        stores.close().await;
    }
}
