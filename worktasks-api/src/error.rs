/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every error becomes a JSON body of the form
/// `{"error": <code>, "message": <text>, "details": [...]?}`.
///
/// | Variant           | Status | Code                                   |
/// |-------------------|--------|----------------------------------------|
/// | `BadRequest`      | 400    | `bad_request`                          |
/// | `Rejected`        | 400    | `self_delete`, `last_admin`            |
/// | `Unauthorized`    | 401    | `unauthorized`                         |
/// | `Forbidden`       | 403    | `forbidden`                            |
/// | `NotFound`        | 404    | `not_found`                            |
/// | `Conflict`        | 409    | `email_taken`, `user_has_assigned_tasks`, `conflict` |
/// | `ValidationError` | 422    | `validation_error`                     |
/// | `InternalError`   | 500    | `internal_error`                       |

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;
use worktasks_shared::{
    auth::{identity::IdentityError, jwt::JwtError, middleware::AuthError, policy::UserDeleteDenial},
    store::{ConflictKind, StoreError},
};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),

    /// A well-formed request refused by a safety rule, with its own code
    Rejected { code: &'static str, message: String },

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict { code: &'static str, message: String },

    ValidationError(Vec<ValidationErrorDetail>),

    /// Details are logged, never returned
    InternalError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. "not_found"
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Rejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Rejected { code, message } => write!(f, "Rejected ({}): {}", code, message),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { code, message } => write!(f, "Conflict ({}): {}", code, message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Rejected { code, message } => (code, message, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict { code, message } => (code, message, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", capitalize(what))),
            StoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            StoreError::Rejected(denial) => ApiError::Rejected {
                code: match denial {
                    UserDeleteDenial::SelfDelete => "self_delete",
                    UserDeleteDenial::LastAdmin => "last_admin",
                    UserDeleteDenial::NotAdmin => "forbidden",
                },
                message: denial.to_string(),
            },
            StoreError::Conflict(kind) => ApiError::Conflict {
                code: match kind {
                    ConflictKind::EmailTaken => "email_taken",
                    ConflictKind::AssignedTasks => "user_has_assigned_tasks",
                },
                message: kind.to_string(),
            },
            StoreError::Validation(msg) => ApiError::validation("request", msg),
            err @ (StoreError::Password(_) | StoreError::Database(_)) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::Store(e) => e.into(),
            IdentityError::Password(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            other => AuthError::from(other).into(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code));
                    ValidationErrorDetail::new(field.to_string(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
