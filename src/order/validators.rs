//! Existence checks for the ids an order refers to.
//!
//! Every check runs on the caller's connection, so inside a transaction it sees
//! the same snapshot the subsequent writes will commit against.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, warn};

use super::OrderError;

/// An entity an order links to, with the table holding its rows and the
/// association table holding the links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    User,
    Product,
}

impl Reference {
    pub fn table(self) -> &'static str {
        match self {
            Reference::User => "users",
            Reference::Product => "products",
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            Reference::User => "order_users",
            Reference::Product => "order_products",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            Reference::User => "user_id",
            Reference::Product => "product_id",
        }
    }

    fn not_found(self, missing: Vec<i64>) -> OrderError {
        match self {
            Reference::User => OrderError::UsersNotFound(missing),
            Reference::Product => OrderError::ProductsNotFound(missing),
        }
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn distinct(ids: &[i64]) -> Vec<i64> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

pub async fn ensure_order_exists(conn: &mut SqliteConnection, order_id: i64) -> Result<(), OrderError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => {
            warn!(order_id, "Order not found");
            Err(OrderError::OrderNotFound(order_id))
        }
    }
}

pub async fn ensure_user_exists(conn: &mut SqliteConnection, user_id: i64) -> Result<(), OrderError> {
    ensure_all_exist(conn, Reference::User, &[user_id]).await
}

pub async fn ensure_products_exist(conn: &mut SqliteConnection, product_ids: &[i64]) -> Result<(), OrderError> {
    ensure_all_exist(conn, Reference::Product, product_ids).await
}

/// Selects every row whose id is in the distinct set of `ids` and compares the
/// count; on mismatch reports the ids that were not found. An empty set passes.
pub async fn ensure_all_exist(
    conn: &mut SqliteConnection,
    reference: Reference,
    ids: &[i64],
) -> Result<(), OrderError> {
    let requested = distinct(ids);
    if requested.is_empty() {
        return Ok(());
    }

    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT id FROM {} WHERE id IN (", reference.table()));
    let mut list = builder.separated(", ");
    for id in &requested {
        list.push_bind(*id);
    }
    list.push_unseparated(")");

    let found: Vec<i64> = builder.build_query_scalar().fetch_all(&mut *conn).await?;

    if found.len() == requested.len() {
        debug!(table = reference.table(), count = found.len(), "References validated");
        return Ok(());
    }

    let missing: Vec<i64> = requested.into_iter().filter(|id| !found.contains(id)).collect();
    warn!(table = reference.table(), ?missing, "Referenced rows not found");
    Err(reference.not_found(missing))
}
