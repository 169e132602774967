use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::ErrorResponse;
use crate::services::{
    conversation::{ConversationService, Menu, UserId},
    currencies::Currency,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConversationService>,
}

#[derive(Deserialize, Debug)]
pub struct MessageRequest {
    pub user_id: i64,
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub text: String,
    pub menu: Menu,
    pub buttons: Vec<Vec<String>>,
}

#[derive(Serialize, Debug)]
pub struct CurrencyEntry {
    pub code: &'static str,
    pub label: String,
}

pub async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(payload) = payload.map_err(|rejection| {
        ErrorResponse::new(rejection.status(), "invalid_request", &rejection.body_text())
    })?;
    debug!("API message from user {}", payload.user_id);

    let reply = state
        .service
        .handle(UserId(payload.user_id), &payload.text)
        .await;

    Ok(match reply {
        Some(reply) => Json(MessageResponse {
            buttons: reply.menu.rows(),
            text: reply.text,
            menu: reply.menu,
        })
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn currencies() -> impl IntoResponse {
    let entries: Vec<CurrencyEntry> = Currency::all()
        .iter()
        .map(|currency| CurrencyEntry {
            code: currency.code(),
            label: currency.decorate(),
        })
        .collect();
    Json(entries)
}
