use axum::http::StatusCode;
use std::{error::Error, fmt};

#[derive(Debug)]
pub enum FetchError {
    Timeout(String),
    Transport(String),
    Status(u16, String),
    Redirect(String),
    ClientBuild(String),
}

impl std::error::Error for FetchError {}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FetchError::*;
        match self {
            Timeout(url) => write!(f, "Timeout: {}", url),
            Transport(s) => write!(f, "Transport: {}", s),
            Status(code, url) => write!(f, "Status: HTTP {} for {}", code, url),
            Redirect(s) => write!(f, "Redirect: {}", s),
            ClientBuild(s) => write!(f, "ClientBuild: {}", s),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Deserialize(serde_json::Error),
    Serialize(serde_json::Error),
    Task(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use StoreError::*;
        match self {
            Io(e) => Some(e),
            Deserialize(e) => Some(e),
            Serialize(e) => Some(e),
            Task(_) => None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StoreError::*;
        match self {
            Io(_) => write!(f, "IoError"),
            Deserialize(_) => write!(f, "DeserializationError"),
            Serialize(_) => write!(f, "SerializationError"),
            Task(s) => write!(f, "TaskError: {}", s),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error)
    }
}

#[derive(Debug)]
pub enum GatewayError {
    Validation(String),
    MissingQuery,
    Fetch(FetchError),
    Parse(String),
    Persistence(StoreError),
    ServerConfig(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        use GatewayError::*;
        match self {
            Validation(_) | MissingQuery => StatusCode::BAD_REQUEST,
            Fetch(_) | Parse(_) | Persistence(_) | ServerConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use GatewayError::*;
        match self {
            Validation(s) => write!(f, "ValidationError: {}", s),
            MissingQuery => write!(f, "MissingQueryError"),
            Fetch(e) => write!(f, "FetchError: {}", e),
            Parse(s) => write!(f, "ParseError: {}", s),
            Persistence(e) => write!(f, "PersistenceError: {}", crate::unpack_error(e)),
            ServerConfig(s) => write!(f, "ServerConfigError: {}", s),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use GatewayError::*;
        match self {
            Fetch(e) => Some(e as &dyn Error),
            Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for GatewayError {
    fn from(error: FetchError) -> Self {
        GatewayError::Fetch(error)
    }
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        GatewayError::Persistence(error)
    }
}
