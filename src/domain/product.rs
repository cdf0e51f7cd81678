use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents a product in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nome")]
    #[sqlx(rename = "nome")]
    pub name: String,
}

/// Payload for creating or renaming a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductCreate {
    #[serde(rename = "nome")]
    pub name: String,
}
