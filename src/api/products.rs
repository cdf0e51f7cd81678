use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::response::{ApiError, ApiResult, MessageBody, Paginated, ProductCreated};
use super::{lenient_page, AppState, PageQuery};
use crate::domain::{Product, ProductCreate};
use crate::product::ProductError;

const NAME_REQUIRED: &str = "Devi inserire un nome";
const NAME_REQUIRED_FOR_UPDATE: &str = "Inserisci un nome per la modifica";

fn product_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("ID prodotto non valido"))
}

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductCreated>)> {
    let Json(product) = body.map_err(|_| ApiError::validation(NAME_REQUIRED))?;
    let product_id = state.products.create_product(product).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductCreated {
            message: "Prodotto creato con successo".to_string(),
            product_id,
        }),
    ))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Product>>> {
    let page = state.products.list_products(lenient_page(query.page)).await?;
    Ok(Json(page.into()))
}

pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let id = product_id(path)?;
    let product = state.products.get_product(id).await?.ok_or(ProductError::NotFound(id))?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductCreate>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = product_id(path)?;
    let Json(product) = body.map_err(|_| ApiError::validation(NAME_REQUIRED_FOR_UPDATE))?;

    match state.products.update_product(id, product).await {
        Ok(()) => Ok(Json(MessageBody::new("Prodotto aggiornato con successo"))),
        Err(ProductError::ValidationError(_)) => Err(ApiError::validation(NAME_REQUIRED_FOR_UPDATE)),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = product_id(path)?;
    state.products.delete_product(id).await?;
    Ok(Json(MessageBody::new("Prodotto eliminato con successo")))
}
