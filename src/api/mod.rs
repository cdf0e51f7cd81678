//! HTTP surface: routing, shared state and the handlers for each resource.

pub mod orders;
pub mod products;
pub mod response;
pub mod users;

use axum::{routing::get, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::app_system::OrderSystem;
use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderClient,
    pub users: UserClient,
    pub products: ProductClient,
    pub empty_orders_as_not_found: bool,
}

impl AppState {
    pub fn new(system: &OrderSystem, config: ApiConfig) -> Self {
        Self {
            orders: system.order_client.clone(),
            users: system.user_client.clone(),
            products: system.product_client.clone(),
            empty_orders_as_not_found: config.empty_orders_as_not_found,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Unparseable or non-positive pages fall back to the first one.
pub fn lenient_page(raw: Option<String>) -> u32 {
    raw.and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/{id}",
            get(orders::get_order).put(orders::update_order).delete(orders::delete_order),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/products", get(products::list_products).post(products::create_product))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Benvenuto in Orizon!"
}
