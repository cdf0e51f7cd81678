use crate::domain::{User, UserCreate};
use crate::gateway::Entity;

impl Entity for User {
    type Payload = UserCreate;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["nome", "cognome", "email"];
    const PAGE_SIZE: u32 = 2;

    fn values(payload: &UserCreate) -> Vec<String> {
        vec![
            payload.first_name.clone(),
            payload.last_name.clone(),
            payload.email.clone(),
        ]
    }

    /// All three fields are mandatory.
    fn validate(payload: &UserCreate) -> Result<(), String> {
        if Self::values(payload).iter().any(|v| v.trim().is_empty()) {
            return Err("Tutti i campi sono obbligatori".to_string());
        }
        Ok(())
    }
}
