use crate::domain::{Product, ProductCreate};
use crate::gateway::ResourceClient;
use crate::product::ProductError;

/// Client for the product catalogue.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl_basic_client!(ProductClient, Product, ProductCreate, ProductError, product);
