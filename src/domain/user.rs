use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nome")]
    #[sqlx(rename = "nome")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    #[sqlx(rename = "cognome")]
    pub last_name: String,
    pub email: String,
}

/// Payload for creating or replacing a user.
///
/// Missing fields deserialize as empty strings so the presence check can
/// report them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserCreate {
    #[serde(rename = "nome")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    pub last_name: String,
    pub email: String,
}

impl UserCreate {
    #[cfg(test)]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}
