use std::collections::BTreeMap;

use thiserror::Error;
use warp::http::StatusCode;

use crate::NON_FIELD_ERRORS;

/// Messages per offending field, in a stable order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub struct QueryError {
    info: String,
    unique_violation: bool,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            unique_violation: false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.unique_violation
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => Self {
                unique_violation: e.is_unique_violation(),
                info: format!("{e}"),
            },
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(e),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        ApiError::Internal(value.info)
    }
}

/// Every failure a request can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(key: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.to_string(), vec![message.to_string()]);
        ApiError::Validation(errors)
    }

    pub fn non_field(message: &str) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation(errors) => serde_json::json!(errors),
            ApiError::NotFound | ApiError::Unauthenticated(_) => {
                serde_json::json!({ "detail": self.to_string() })
            }
            ApiError::Internal(_) => serde_json::json!({ "detail": "A server error occurred." }),
        }
    }
}

impl warp::reject::Reject for ApiError {}

/// Maps a unique-constraint failure onto `field`, anything else stays internal.
pub fn unique_or_internal(e: sqlx::Error, field: &str, message: &str) -> ApiError {
    let e = QueryError::from(e);
    if e.is_unique_violation() {
        ApiError::field(field, message)
    } else {
        e.into()
    }
}
