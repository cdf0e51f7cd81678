use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{Product, User};

/// Payload for creating a new order: exactly one user, one or more products.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: i64,
    pub product_ids: Vec<i64>,
}

impl OrderCreate {
    pub fn new(user_id: i64, product_ids: impl Into<Vec<i64>>) -> Self {
        Self {
            user_id,
            product_ids: product_ids.into(),
        }
    }
}

/// Replacement link sets for an existing order. Empty lists clear that kind of link.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub user_ids: Vec<i64>,
    pub product_ids: Vec<i64>,
}

impl OrderUpdate {
    pub fn new(user_ids: impl Into<Vec<i64>>, product_ids: impl Into<Vec<i64>>) -> Self {
        Self {
            user_ids: user_ids.into(),
            product_ids: product_ids.into(),
        }
    }
}

/// Restrictions applied to the order listing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrderFilters {
    /// Calendar date of creation, time of day ignored.
    pub exact_date: Option<NaiveDate>,
    /// Orders linked to this product (their other products are still returned).
    pub product_id: Option<i64>,
}

/// One row of the four-table join: an order paired with one of its users and
/// one of its products. Link columns are `None` when the order has no such link.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrderRow {
    pub order_id: i64,
    #[serde(rename = "data_creazione")]
    pub created_at: DateTime<Utc>,
    pub user_id: Option<i64>,
    #[serde(rename = "user_nome")]
    pub user_first_name: Option<String>,
    #[serde(rename = "user_cognome")]
    pub user_last_name: Option<String>,
    pub user_email: Option<String>,
    pub product_id: Option<i64>,
    #[serde(rename = "product_nome")]
    pub product_name: Option<String>,
}

impl OrderRow {
    pub fn user(&self) -> Option<User> {
        Some(User {
            id: self.user_id?,
            first_name: self.user_first_name.clone()?,
            last_name: self.user_last_name.clone()?,
            email: self.user_email.clone()?,
        })
    }

    pub fn product(&self) -> Option<Product> {
        Some(Product {
            id: self.product_id?,
            name: self.product_name.clone()?,
        })
    }
}

/// An order with its links folded into nested lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order_id: i64,
    #[serde(rename = "data_creazione")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "utenti")]
    pub users: Vec<User>,
    #[serde(rename = "prodotti")]
    pub products: Vec<Product>,
}

impl OrderView {
    pub fn new(order_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            created_at,
            users: Vec::new(),
            products: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn user_ids(&self) -> Vec<i64> {
        self.users.iter().map(|u| u.id).collect()
    }

    #[cfg(test)]
    pub fn product_ids(&self) -> Vec<i64> {
        self.products.iter().map(|p| p.id).collect()
    }
}
