use tracing::info;

use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::config::DatabaseConfig;
use crate::gateway::{Database, StoreError};

/// The composition root: one database handle shared by every client.
///
/// Opening it bootstraps the schema and probes the store; dropping the
/// clients does not close the pool, [`OrderSystem::shutdown`] does.
#[derive(Clone)]
pub struct OrderSystem {
    pub order_client: OrderClient,
    pub user_client: UserClient,
    pub product_client: ProductClient,
    db: Database,
}

impl OrderSystem {
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let db = Database::open(config).await?;
        Ok(Self::with_database(db))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            order_client: OrderClient::new(db.clone()),
            user_client: UserClient::new(db.clone()),
            product_client: ProductClient::new(db.clone()),
            db,
        }
    }

    #[cfg(test)]
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn shutdown(self) {
        info!("Shutting down system...");
        self.db.close().await;
        info!("System shutdown complete.");
    }
}
