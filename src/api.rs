use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl MessageResponse {
    pub fn new(msg: &str) -> Self {
        MessageResponse {
            message: msg.to_owned(),
        }
    }
}

impl ErrorResponse {
    pub fn new(msg: &str) -> Self {
        ErrorResponse { error: msg.to_owned() }
    }
}
