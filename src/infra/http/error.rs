use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blogo_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::auth::AuthError;
use crate::application::blogs::BlogError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::users::UserError;

pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const NOT_FOUND: &str = "not_found";
    pub const FORBIDDEN: &str = "forbidden";
    pub const DUPLICATE: &str = "duplicate";
    pub const SELF_FOLLOW: &str = "self_follow";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INTEGRITY: &str = "integrity_error";
    pub const REPO: &str = "repo_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REQUEST_TIMEOUT: &str = "request_timeout";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn invalid_input(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, message, hint)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, message, None)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn request_timeout() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::REQUEST_TIMEOUT,
            "Request timed out",
            None,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = format!(
            "{}: {}",
            self.code,
            self.hint.as_deref().unwrap_or(self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", self.status, detail).attach(&mut response);
        response
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint),
            ),
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::InvalidInput { message } => {
                Self::invalid_input("Invalid input", Some(message))
            }
            RepoError::Integrity { message } => Self::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "Integrity constraint violated",
                Some(message),
            ),
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                None,
            ),
            RepoError::Persistence(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Persistence error",
                Some(message),
            ),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidInput { field } => {
                Self::invalid_input("Invalid user", Some(field.to_string()))
            }
            UserError::NotFound { entity, id } => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "User not found",
                Some(format!("{entity} {id}")),
            ),
            UserError::Conflict { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Username or email already taken",
                Some(constraint),
            ),
            UserError::SelfFollowNotAllowed => Self::new(
                StatusCode::BAD_REQUEST,
                codes::SELF_FOLLOW,
                "Cannot follow yourself",
                None,
            ),
            UserError::Repo(repo) => repo.into(),
        }
    }
}

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::InvalidInput { field } => {
                Self::invalid_input("Invalid blog", Some(field.to_string()))
            }
            BlogError::NotFound { entity, id } => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Blog not found",
                Some(format!("{entity} {id}")),
            ),
            BlogError::Conflict { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate blog",
                Some(constraint),
            ),
            BlogError::NotOwner => Self::forbidden("Only the author may modify this blog"),
            BlogError::Repo(repo) => repo.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Missing => Self::unauthorized("Bearer token required"),
            AuthError::Invalid => Self::unauthorized("Invalid bearer token"),
            AuthError::Expired => Self::unauthorized("Bearer token expired"),
            AuthError::Signing(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Token signing failed",
                Some(message),
            ),
        }
    }
}
