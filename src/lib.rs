use crate::api::{ErrorResponse, MessageResponse};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod pages;
pub mod proxy;
pub mod routes;
pub mod sanitize;
pub mod search;
pub mod store;

pub fn error_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(ErrorResponse::new(msg))).into_response()
}

pub fn server_error(msg: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

pub fn bad_request(msg: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, msg)
}

pub fn good_response(msg: &str) -> Response {
    (StatusCode::OK, Json(MessageResponse::new(msg))).into_response()
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
