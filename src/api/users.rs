use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::response::{ApiError, ApiResult, MessageBody, Paginated, UserCreated};
use super::{lenient_page, AppState, PageQuery};
use crate::domain::{User, UserCreate};
use crate::user::UserError;

const REQUIRED_FIELDS: &str = "Tutti i campi sono obbligatori";

fn user_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("ID utente non valido"))
}

fn payload(body: Result<Json<UserCreate>, JsonRejection>) -> ApiResult<UserCreate> {
    body.map(|Json(user)| user)
        .map_err(|_| ApiError::validation(REQUIRED_FIELDS))
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserCreated>)> {
    let user_id = state.users.create_user(payload(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "Utente creato con successo".to_string(),
            user_id,
        }),
    ))
}

pub async fn list_users(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Json<Paginated<User>>> {
    let page = state.users.list_users(lenient_page(query.page)).await?;
    Ok(Json(page.into()))
}

pub async fn get_user(State(state): State<AppState>, path: Result<Path<i64>, PathRejection>) -> ApiResult<Json<User>> {
    let id = user_id(path)?;
    let user = state.users.get_user(id).await?.ok_or(UserError::NotFound(id))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UserCreate>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = user_id(path)?;
    state.users.update_user(id, payload(body)?).await?;
    Ok(Json(MessageBody::new("Utente aggiornato con successo")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageBody>> {
    let id = user_id(path)?;
    state.users.delete_user(id).await?;
    Ok(Json(MessageBody::new("Utente eliminato con successo")))
}
