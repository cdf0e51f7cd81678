use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::response::{ApiError, ApiResult, ErrorCode, MessageBody, OrderCreated, Paginated};
use super::AppState;
use crate::domain::{OrderCreate, OrderFilters, OrderUpdate, OrderView};
use crate::order::query::fold_rows;
use crate::order::OrderError;

const CREATE_REQUIRED: &str = "user_id e products sono richiesti";
const INVALID_DATA: &str = "Dati non validi";
const INVALID_PARAMS: &str = "Parametri di ricerca non validi";
const INVALID_ID: &str = "ID ordine non valido";

/// Raw `GET /orders` parameters; empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub data: Option<String>,
    pub product_id: Option<String>,
    pub page: Option<String>,
    pub view: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListView {
    Flat,
    Grouped,
}

#[derive(Debug)]
struct ListRequest {
    filters: OrderFilters,
    page: u32,
    view: ListView,
}

impl ListOrdersQuery {
    fn parse(self) -> Option<ListRequest> {
        let exact_date = match present(self.data) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()?),
            None => None,
        };
        let product_id = match present(self.product_id) {
            Some(raw) => Some(raw.parse::<i64>().ok()?),
            None => None,
        };
        let page = match present(self.page) {
            Some(raw) => raw.parse::<u32>().ok().filter(|page| *page > 0)?,
            None => 1,
        };
        let view = match present(self.view).as_deref() {
            None | Some("flat") => ListView::Flat,
            Some("grouped") => ListView::Grouped,
            Some(_) => return None,
        };

        Some(ListRequest {
            filters: OrderFilters { exact_date, product_id },
            page,
            view,
        })
    }
}

fn present(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// A positive id given as a JSON number or a numeric string.
fn as_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

fn as_ids(value: Option<&Value>) -> Option<Vec<i64>> {
    value?.as_array()?.iter().map(as_id).collect()
}

fn parse_create(body: &Value) -> Option<OrderCreate> {
    let user_id = as_id(body.get("user_id")?)?;
    let product_ids = as_ids(body.get("products")).filter(|ids| !ids.is_empty())?;
    Some(OrderCreate::new(user_id, product_ids))
}

fn parse_update(body: &Value) -> Option<OrderUpdate> {
    Some(OrderUpdate::new(as_ids(body.get("utenti"))?, as_ids(body.get("prodotti"))?))
}

fn order_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected order id");
            Err(ApiError::validation(INVALID_ID))
        }
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderCreated>)> {
    let order = body
        .ok()
        .and_then(|Json(body)| parse_create(&body))
        .ok_or_else(|| ApiError::validation(CREATE_REQUIRED))?;

    let order_id = state.orders.create_order(order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            message: "Ordine creato con successo".to_string(),
            order_id,
        }),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let request = query
        .ok()
        .and_then(|Query(query)| query.parse())
        .ok_or_else(|| ApiError::validation(INVALID_PARAMS))?;

    let page = state.orders.list_orders(request.filters, request.page).await?;
    if page.items.is_empty() && state.empty_orders_as_not_found {
        info!(page = request.page, "No orders matched");
        return Err(ApiError::no_results());
    }

    let response = match request.view {
        ListView::Flat => Json(Paginated::from(page)).into_response(),
        ListView::Grouped => Json(Paginated::from(page.map_items(|rows| fold_rows(&rows)))).into_response(),
    };
    Ok(response)
}

pub async fn get_order(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<OrderView>> {
    let id = order_id(path)?;
    Ok(Json(state.orders.get_order(id).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = path.map_err(|_| ApiError::validation(INVALID_DATA))?.0;
    let update = body
        .ok()
        .and_then(|Json(body)| parse_update(&body))
        .ok_or_else(|| ApiError::validation(INVALID_DATA))?;

    match state.orders.update_order(id, update).await {
        Ok(()) => Ok(Json(MessageBody::new("Ordine aggiornato con successo"))),
        // This endpoint reports a missing order as a server error; the code stays stable.
        Err(OrderError::OrderNotFound(_)) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::OrderNotFound,
            "Ordine non trovato",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_order(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = order_id(path)?;
    state.orders.delete_order(id).await?;
    Ok(Json(MessageBody::new("Ordine eliminato con successo")))
}
