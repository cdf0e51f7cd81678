//! Fixtures for tests: a throwaway in-memory system and seeding helpers.

use crate::app_system::OrderSystem;
use crate::config::DatabaseConfig;
use crate::domain::{ProductCreate, UserCreate};

pub async fn memory_system() -> OrderSystem {
    memory_system_with(&DatabaseConfig::in_memory()).await
}

pub async fn memory_system_with(config: &DatabaseConfig) -> OrderSystem {
    OrderSystem::open(config).await.expect("in-memory database should open")
}

pub async fn seed_user(system: &OrderSystem, first_name: &str, last_name: &str) -> i64 {
    let email = format!("{}.{}@example.com", first_name, last_name).to_lowercase();
    system
        .user_client
        .create_user(UserCreate::new(first_name, last_name, email))
        .await
        .expect("user should be created")
}

pub async fn seed_product(system: &OrderSystem, name: &str) -> i64 {
    system
        .product_client
        .create_product(ProductCreate { name: name.to_string() })
        .await
        .expect("product should be created")
}

/// Inserts a user under a fixed id.
pub async fn seed_user_with_id(system: &OrderSystem, id: i64, first_name: &str, last_name: &str) -> i64 {
    sqlx::query("INSERT INTO users (id, nome, cognome, email) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(format!("{}.{}@example.com", first_name, last_name).to_lowercase())
        .execute(system.database().pool())
        .await
        .expect("user should be inserted");
    id
}

/// Inserts a product under a fixed id.
pub async fn seed_product_with_id(system: &OrderSystem, id: i64, name: &str) -> i64 {
    sqlx::query("INSERT INTO products (id, nome) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(system.database().pool())
        .await
        .expect("product should be inserted");
    id
}

pub async fn count_rows(system: &OrderSystem, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(system.database().pool())
        .await
        .expect("count should succeed")
}
