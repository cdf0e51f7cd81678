use std::fmt::Debug;
use std::marker::PhantomData;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use thiserror::Error;

use super::{Database, StoreError};
use crate::domain::Page;

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// A record stored in a single table with a generated integer id and text columns.
///
/// Users and products implement this and get create/read/list/update/delete
/// through [`ResourceClient`] without hand-written SQL.
pub trait Entity:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Clone + Debug + Send + Sync + Unpin + 'static
{
    /// Body accepted by both create and full update.
    type Payload: Send + Sync + Debug;

    const TABLE: &'static str;
    /// Writable columns, in the order [`Entity::values`] yields them.
    const COLUMNS: &'static [&'static str];
    const PAGE_SIZE: u32;

    fn values(payload: &Self::Payload) -> Vec<String>;

    /// Presence checks run before any write.
    fn validate(payload: &Self::Payload) -> Result<(), String>;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceError {
    #[error("Invalid payload: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ResourceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.into())
    }
}

// =============================================================================
// 2. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    db: Database,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    fn select_clause() -> String {
        format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    pub async fn create(&self, payload: T::Payload) -> Result<i64, ResourceError> {
        T::validate(&payload).map_err(ResourceError::Invalid)?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        let mut values = builder.separated(", ");
        for value in T::values(&payload) {
            values.push_bind(value);
        }
        values.push_unseparated(")");

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<T>, ResourceError> {
        let item = sqlx::query_as::<_, T>(&format!("{} WHERE id = ?", Self::select_clause()))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(item)
    }

    /// One page ordered by id; `page` is 1-indexed.
    pub async fn list(&self, page: u32) -> Result<Page<T>, ResourceError> {
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(T::PAGE_SIZE);

        let items = sqlx::query_as::<_, T>(&format!(
            "{} ORDER BY id ASC LIMIT ? OFFSET ?",
            Self::select_clause()
        ))
        .bind(i64::from(T::PAGE_SIZE))
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", T::TABLE))
            .fetch_one(self.db.pool())
            .await?;

        Ok(Page::new(items, page, T::PAGE_SIZE, u64::try_from(total).unwrap_or(0)))
    }

    /// Overwrites every column. Returns `false` when no row has this id.
    pub async fn update(&self, id: i64, payload: T::Payload) -> Result<bool, ResourceError> {
        T::validate(&payload).map_err(ResourceError::Invalid)?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", T::TABLE));
        let mut assignments = builder.separated(", ");
        for (column, value) in T::COLUMNS.iter().zip(T::values(&payload)) {
            assignments.push(format!("{column} = "));
            assignments.push_bind_unseparated(value);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when no row has this id.
    pub async fn delete(&self, id: i64) -> Result<bool, ResourceError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::TABLE))
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// 3. USAGE (Test)
// =============================================================================
