use crate::domain::{Product, ProductCreate};
use crate::gateway::Entity;

impl Entity for Product {
    type Payload = ProductCreate;

    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &["nome"];
    const PAGE_SIZE: u32 = 10;

    fn values(payload: &ProductCreate) -> Vec<String> {
        vec![payload.name.clone()]
    }

    fn validate(payload: &ProductCreate) -> Result<(), String> {
        if payload.name.trim().is_empty() {
            return Err("Devi inserire un nome".to_string());
        }
        Ok(())
    }
}
