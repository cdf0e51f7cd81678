//! Wire shapes: the pagination envelope, success bodies and the error envelope.
//!
//! Internal failure detail is logged here and never copied into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::domain::Page;
use crate::gateway::StoreError;
use crate::order::OrderError;
use crate::product::ProductError;
use crate::user::UserError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        let pagination = Pagination {
            current_page: page.page,
            total_pages: page.total_pages(),
            total_items: page.total_items,
            items_per_page: page.page_size,
        };
        Self {
            data: page.items,
            pagination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub message: String,
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub message: String,
    pub product_id: i64,
}

/// Stable, machine-readable error identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    OrderNotFound,
    UserNotFound,
    ProductNotFound,
    NoResults,
    ConstraintViolation,
    StoreUnavailable,
    InternalError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, message)
    }

    pub fn no_results() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NoResults, "Nessun ordine trovato")
    }

    fn from_store(err: &StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(_) => Self::new(
                StatusCode::CONFLICT,
                ErrorCode::ConstraintViolation,
                "Operazione in conflitto con i dati esistenti",
            ),
            StoreError::Unavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::StoreUnavailable,
                "Servizio temporaneamente non disponibile",
            ),
            StoreError::Query(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "Errore interno del server",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::ValidationError(_) => {
                warn!(error = %err, "Rejected order request");
                Self::validation("Dati non validi")
            }
            OrderError::OrderNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, ErrorCode::OrderNotFound, "Ordine non trovato")
            }
            OrderError::UsersNotFound(_) => {
                warn!(error = %err, "Order refers to unknown users");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::UserNotFound, "Utente non trovato")
            }
            OrderError::ProductsNotFound(_) => {
                warn!(error = %err, "Order refers to unknown products");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::ProductNotFound,
                    "Uno o più prodotti non esistono",
                )
            }
            OrderError::ConstraintViolation(detail) => {
                error!(error = %err, "Order write violated a constraint");
                Self::from_store(&StoreError::ConstraintViolation(detail.clone()))
            }
            OrderError::DatabaseError(store) => {
                error!(error = %err, "Order operation failed");
                Self::from_store(store)
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, ErrorCode::UserNotFound, "Utente non trovato"),
            UserError::ValidationError(message) => Self::validation(message),
            UserError::DatabaseError(store) => {
                error!(error = %store, "User operation failed");
                Self::from_store(&store)
            }
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, ErrorCode::ProductNotFound, "Prodotto non trovato")
            }
            ProductError::ValidationError(message) => Self::validation(message),
            ProductError::DatabaseError(store) => {
                error!(error = %store, "Product operation failed");
                Self::from_store(&store)
            }
        }
    }
}
