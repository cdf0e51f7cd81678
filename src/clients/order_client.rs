use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::domain::{OrderCreate, OrderFilters, OrderRow, OrderUpdate, OrderView, Page};
use crate::gateway::{settle, Database};
use crate::order::query::{self, ORDERS_PAGE_SIZE};
use crate::order::validators::{
    distinct, ensure_all_exist, ensure_order_exists, ensure_products_exist, ensure_user_exists, Reference,
};
use crate::order::OrderError;

/// Client for the order subsystem.
///
/// Every mutation runs in one transaction on a dedicated pooled connection:
/// referenced ids are validated, association rows written, and the whole unit
/// committed or rolled back together.
#[derive(Clone)]
pub struct OrderClient {
    db: Database,
}

impl OrderClient {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an order stamped with the current time.
    pub async fn create_order(&self, order: OrderCreate) -> Result<i64, OrderError> {
        self.create_order_at(order, Utc::now()).await
    }

    #[instrument(skip(self, order), fields(user_id = order.user_id, products = ?order.product_ids))]
    pub async fn create_order_at(&self, order: OrderCreate, created_at: DateTime<Utc>) -> Result<i64, OrderError> {
        info!("Processing create_order request");

        let product_ids = distinct(&order.product_ids);
        if product_ids.is_empty() {
            return Err(OrderError::ValidationError("at least one product is required".to_string()));
        }

        let mut tx = self.db.begin().await?;
        let outcome = insert_order(&mut tx, order.user_id, &product_ids, created_at.trunc_subsecs(0)).await;
        let order_id = settle(tx, outcome).await?;

        info!(order_id, "Order created successfully");
        Ok(order_id)
    }

    /// Replaces both association sets of an existing order.
    #[instrument(skip(self, update), fields(users = ?update.user_ids, products = ?update.product_ids))]
    pub async fn update_order(&self, order_id: i64, update: OrderUpdate) -> Result<(), OrderError> {
        info!("Processing update_order request");

        let user_ids = distinct(&update.user_ids);
        let product_ids = distinct(&update.product_ids);

        let mut tx = self.db.begin().await?;
        let outcome = replace_links(&mut tx, order_id, &user_ids, &product_ids).await;
        settle(tx, outcome).await?;

        info!("Order updated successfully");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i64) -> Result<(), OrderError> {
        info!("Processing delete_order request");

        let mut tx = self.db.begin().await?;
        let outcome = remove_order(&mut tx, order_id).await;
        settle(tx, outcome).await?;

        info!("Order deleted successfully");
        Ok(())
    }

    /// One page of the flat join, newest orders first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filters: OrderFilters, page: u32) -> Result<Page<OrderRow>, OrderError> {
        let page = query::fetch_page(self.db.pool(), &filters, page, ORDERS_PAGE_SIZE).await?;
        info!(total_items = page.total_items, rows = page.items.len(), "Listed orders");
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderView, OrderError> {
        let mut conn = self.db.pool().acquire().await.map_err(crate::gateway::StoreError::from)?;
        let rows = query::fetch_order_rows(&mut conn, order_id).await?;
        query::fold_rows(&rows)
            .into_iter()
            .next()
            .ok_or(OrderError::OrderNotFound(order_id))
    }
}

async fn insert_order(
    conn: &mut SqliteConnection,
    user_id: i64,
    product_ids: &[i64],
    created_at: DateTime<Utc>,
) -> Result<i64, OrderError> {
    ensure_user_exists(conn, user_id).await?;
    ensure_products_exist(conn, product_ids).await?;

    let order_id = sqlx::query("INSERT INTO orders (data_creazione) VALUES (?)")
        .bind(created_at)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    insert_links(conn, Reference::User, order_id, &[user_id]).await?;
    insert_links(conn, Reference::Product, order_id, product_ids).await?;
    Ok(order_id)
}

async fn replace_links(
    conn: &mut SqliteConnection,
    order_id: i64,
    user_ids: &[i64],
    product_ids: &[i64],
) -> Result<(), OrderError> {
    ensure_order_exists(conn, order_id).await?;
    ensure_all_exist(conn, Reference::User, user_ids).await?;
    ensure_all_exist(conn, Reference::Product, product_ids).await?;

    delete_links(conn, Reference::User, order_id).await?;
    delete_links(conn, Reference::Product, order_id).await?;

    insert_links(conn, Reference::User, order_id, user_ids).await?;
    insert_links(conn, Reference::Product, order_id, product_ids).await?;
    Ok(())
}

async fn remove_order(conn: &mut SqliteConnection, order_id: i64) -> Result<(), OrderError> {
    ensure_order_exists(conn, order_id).await?;

    delete_links(conn, Reference::Product, order_id).await?;
    delete_links(conn, Reference::User, order_id).await?;
    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_links(
    conn: &mut SqliteConnection,
    reference: Reference,
    order_id: i64,
    ids: &[i64],
) -> Result<(), OrderError> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "INSERT INTO {} (order_id, {}) ",
        reference.link_table(),
        reference.link_column()
    ));
    builder.push_values(ids, |mut link, id| {
        link.push_bind(order_id).push_bind(*id);
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}

async fn delete_links(conn: &mut SqliteConnection, reference: Reference, order_id: i64) -> Result<(), OrderError> {
    sqlx::query(&format!("DELETE FROM {} WHERE order_id = ?", reference.link_table()))
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::test_support::{count_rows, memory_system, memory_system_with, seed_product, seed_product_with_id, seed_user};

    #[tokio::test]
    async fn test_create_order_links_user_and_products() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;

        let order_id = system.order_client.create_order(OrderCreate::new(user, [a, b])).await.unwrap();
        assert!(order_id > 0);

        let view = system.order_client.get_order(order_id).await.unwrap();
        assert_eq!(view.user_ids(), vec![user]);
        assert_eq!(view.product_ids(), vec![a, b]);
        assert_eq!(view.users[0].first_name, "Mario");

        // Ids are never handed out twice
        let next = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();
        assert!(next > order_id);
    }

    #[tokio::test]
    async fn test_create_order_collapses_duplicate_products() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;

        let order_id = system.order_client.create_order(OrderCreate::new(user, [a, a])).await.unwrap();

        let view = system.order_client.get_order(order_id).await.unwrap();
        assert_eq!(view.product_ids(), vec![a]);
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_user_writes_nothing() {
        let system = memory_system().await;
        let a = seed_product(&system, "Prodotto A").await;

        let err = system.order_client.create_order(OrderCreate::new(42, [a])).await.unwrap_err();

        assert_eq!(err, OrderError::UsersNotFound(vec![42]));
        assert_eq!(count_rows(&system, "orders").await, 0);
        assert_eq!(count_rows(&system, "order_users").await, 0);
        assert_eq!(count_rows(&system, "order_products").await, 0);
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_product_writes_nothing() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;

        let err = system.order_client.create_order(OrderCreate::new(user, [a, 999])).await.unwrap_err();

        assert_eq!(err, OrderError::ProductsNotFound(vec![999]));
        assert_eq!(count_rows(&system, "orders").await, 0);
        assert_eq!(count_rows(&system, "order_products").await, 0);
    }

    #[tokio::test]
    async fn test_create_order_requires_products() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;

        let err = system.order_client.create_order(OrderCreate::new(user, [])).await.unwrap_err();

        assert!(matches!(err, OrderError::ValidationError(_)));
        assert_eq!(count_rows(&system, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let system = memory_system().await;
        let first_user = seed_user(&system, "Mario", "Rossi").await;
        let third_user = seed_user(&system, "Anna", "Bianchi").await;
        let original = seed_product(&system, "Prodotto A").await;
        let p301 = seed_product_with_id(&system, 301, "Prodotto 301").await;
        let p302 = seed_product_with_id(&system, 302, "Prodotto 302").await;
        let order_id = system
            .order_client
            .create_order(OrderCreate::new(first_user, [original]))
            .await
            .unwrap();

        system
            .order_client
            .update_order(order_id, OrderUpdate::new([third_user], [p301, p302]))
            .await
            .unwrap();

        let view = system.order_client.get_order(order_id).await.unwrap();
        assert_eq!(view.user_ids(), vec![third_user]);
        assert_eq!(view.product_ids(), vec![301, 302]);
    }

    #[tokio::test]
    async fn test_update_with_empty_lists_clears_that_kind() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;
        let order_id = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();

        // 1. No users, new products
        system
            .order_client
            .update_order(order_id, OrderUpdate::new([], [a, b]))
            .await
            .unwrap();
        let view = system.order_client.get_order(order_id).await.unwrap();
        assert!(view.users.is_empty());
        assert_eq!(view.product_ids(), vec![a, b]);

        // 2. The symmetric case
        system
            .order_client
            .update_order(order_id, OrderUpdate::new([user], []))
            .await
            .unwrap();
        let view = system.order_client.get_order(order_id).await.unwrap();
        assert_eq!(view.user_ids(), vec![user]);
        assert!(view.products.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_order_writes_nothing() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();

        let err = system
            .order_client
            .update_order(77, OrderUpdate::new([user], [a]))
            .await
            .unwrap_err();

        assert_eq!(err, OrderError::OrderNotFound(77));
        assert_eq!(count_rows(&system, "order_users").await, 1);
        assert_eq!(count_rows(&system, "order_products").await, 1);
    }

    #[tokio::test]
    async fn test_update_with_unknown_product_keeps_previous_links() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let order_id = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();

        let err = system
            .order_client
            .update_order(order_id, OrderUpdate::new([user], [a, 555]))
            .await
            .unwrap_err();

        assert_eq!(err, OrderError::ProductsNotFound(vec![555]));
        let view = system.order_client.get_order(order_id).await.unwrap();
        assert_eq!(view.user_ids(), vec![user]);
        assert_eq!(view.product_ids(), vec![a]);
    }

    #[tokio::test]
    async fn test_delete_removes_order_and_links() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;
        let keep = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();
        let order_id = system.order_client.create_order(OrderCreate::new(user, [a, b])).await.unwrap();

        system.order_client.delete_order(order_id).await.unwrap();

        assert_eq!(count_rows(&system, "orders").await, 1);
        assert_eq!(count_rows(&system, "order_users").await, 1);
        assert_eq!(count_rows(&system, "order_products").await, 1);
        assert_eq!(
            system.order_client.get_order(order_id).await.unwrap_err(),
            OrderError::OrderNotFound(order_id)
        );

        // Deleting again reports NotFound and leaves the other order alone
        assert_eq!(
            system.order_client.delete_order(order_id).await.unwrap_err(),
            OrderError::OrderNotFound(order_id)
        );
        assert!(system.order_client.get_order(keep).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_transactions_release_their_connection() {
        // A single connection: a leaked one would make the next acquire time out
        let config = DatabaseConfig {
            acquire_timeout: std::time::Duration::from_millis(500),
            ..DatabaseConfig::in_memory()
        };
        let system = memory_system_with(&config).await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;

        for _ in 0..3 {
            assert!(system.order_client.create_order(OrderCreate::new(user, [404])).await.is_err());
            assert!(system.order_client.update_order(404, OrderUpdate::default()).await.is_err());
            assert!(system.order_client.delete_order(404).await.is_err());
        }

        let order_id = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();
        system.order_client.delete_order(order_id).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_are_serialized() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = DatabaseConfig::new(format!("sqlite://{}", dir.path().join("orders.db").display()));
        let system = memory_system_with(&config).await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;
        let target = system.order_client.create_order(OrderCreate::new(user, [a])).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..40 {
            let orders = system.order_client.clone();
            tasks.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    orders
                        .update_order(target, OrderUpdate::new([user], [a, b]))
                        .await
                        .map(|_| None)
                } else {
                    orders.create_order(OrderCreate::new(user, [a, b])).await.map(Some)
                }
            }));
        }

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().is_some() {
                created += 1;
            }
        }

        assert_eq!(created, 30);
        assert_eq!(count_rows(&system, "orders").await, 31);
        assert_eq!(count_rows(&system, "order_products").await, 62);
        system.shutdown().await;
    }
}
