use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{book::BookError, repository::RepositoryError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ErrorVerbosity {
    /// Server returns an empty response with [`StatusCode::NO_CONTENT`] for all errors.
    None,
    /// Server returns only the appropriate status code.
    StatusCode,
    /// Server returns only the message with the appropriate status code.
    #[default]
    Message,
    /// Server returns the message, the error type, the reason and the appropriate status code.
    Full,
}

impl ErrorVerbosity {
    pub fn should_generate_error_reason(&self) -> bool {
        matches!(self, ErrorVerbosity::Full)
    }
}

pub trait ErrorVerbosityProvider {
    fn error_verbosity(&self) -> ErrorVerbosity;
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Human readable error message.
    #[schema(example = "Book not found")]
    pub error: String,
    /// Only with [`ErrorVerbosity::Full`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Only with [`ErrorVerbosity::Full`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Only with [`ErrorVerbosity::Full`] for body errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_schema: Option<String>,
}

#[derive(Debug, From)]
/// API error
pub enum ApiError {
    /// Internal server error
    ///
    /// This error is returned when an internal server error occurs, e.g. the data file is unreadable.
    InternalServerError(InternalServerError),
    /// Body error
    ///
    /// This error is returned when the body is not as expected.
    Body(BodyError),
    /// Path error
    ///
    /// This error is returned when the path is not as expected.
    Path(PathError),
    /// Method not allowed
    ///
    /// This error is returned when the method is not allowed.
    MethodNotAllowed(MethodNotAllowedError),
    /// Not found error
    ///
    /// This error is returned when no route matches.
    NotFound(NotFoundError),
    /// Resource error
    ///
    /// This error is returned when an operation on a resource fails, e.g. a book does not exist.
    Resource(ResourceError),
}

impl ApiError {
    /// Maps a repository failure to the matching response.
    ///
    /// Storage failures become internal server errors.
    pub fn from_repository_error(verbosity: ErrorVerbosity, err: RepositoryError) -> Self {
        match err {
            RepositoryError::Book(err) => ResourceError::new(verbosity, &err).into(),
            RepositoryError::Storage(err) => {
                InternalServerError::from_generic_error(verbosity, err).into()
            }
        }
    }

    fn verbosity(&self) -> ErrorVerbosity {
        match self {
            ApiError::InternalServerError(err) => err.verbosity,
            ApiError::Body(err) => err.verbosity,
            ApiError::Path(err) => err.verbosity,
            ApiError::MethodNotAllowed(err) => err.verbosity,
            ApiError::NotFound(err) => err.verbosity,
            ApiError::Resource(err) => err.verbosity,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::InternalServerError(_) => "An internal server error has occurred",
            ApiError::Body(_) => "Failed to parse request body",
            ApiError::Path(_) => "Failed to parse path parameters",
            ApiError::MethodNotAllowed(_) => "Method not allowed",
            ApiError::NotFound(_) => "The requested resource was not found",
            ApiError::Resource(err) => err.message,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InternalServerError(_) => "InternalServerError",
            ApiError::Body(_) => "Body",
            ApiError::Path(_) => "Path",
            ApiError::MethodNotAllowed(_) => "MethodNotAllowed",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Resource(err) => err.error_type,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(err) => err.status_code,
            ApiError::Path(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Resource(err) => err.status_code,
        }
    }

    fn into_body(self) -> ApiErrorResponse {
        let error = self.message().to_string();

        if !self.verbosity().should_generate_error_reason() {
            return ApiErrorResponse {
                error,
                error_type: None,
                reason: None,
                expected_schema: None,
            };
        }

        let error_type = Some(self.error_type().to_string());

        let (reason, expected_schema) = match self {
            ApiError::InternalServerError(err) => (err.internal_server_error, None),
            ApiError::Body(err) => (err.body_error_reason, err.body_expected_schema),
            ApiError::Path(err) => (err.path_error_reason, None),
            ApiError::MethodNotAllowed(_) | ApiError::NotFound(_) => (None, None),
            ApiError::Resource(err) => (err.reason, None),
        };

        ApiErrorResponse {
            error,
            error_type,
            reason,
            expected_schema,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        match self.verbosity() {
            ErrorVerbosity::None => StatusCode::NO_CONTENT.into_response(),
            ErrorVerbosity::StatusCode => status_code.into_response(),
            ErrorVerbosity::Message | ErrorVerbosity::Full => {
                (status_code, Json(self.into_body())).into_response()
            }
        }
    }
}

#[derive(Debug)]
pub struct InternalServerError {
    verbosity: ErrorVerbosity,
    internal_server_error: Option<String>,
}

impl InternalServerError {
    pub fn from_generic_error<E: Into<anyhow::Error>>(verbosity: ErrorVerbosity, err: E) -> Self {
        let err: anyhow::Error = err.into();
        let err = format!("{err:#}");
        tracing::error!(%err, "Internal server error");

        let internal_server_error = verbosity.should_generate_error_reason().then_some(err);

        InternalServerError {
            verbosity,
            internal_server_error,
        }
    }
}

#[derive(Debug)]
pub struct BodyError {
    verbosity: ErrorVerbosity,
    status_code: StatusCode,
    body_error_reason: Option<String>,
    body_expected_schema: Option<String>,
}

impl BodyError {
    pub fn new(
        verbosity: ErrorVerbosity,
        status_code: StatusCode,
        body_error_reason: String,
        body_expected_schema: String,
    ) -> Self {
        let (body_error_reason, body_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(body_error_reason), Some(body_expected_schema)),
                false => (None, None),
            };

        BodyError {
            verbosity,
            status_code,
            body_error_reason,
            body_expected_schema,
        }
    }

    pub fn from_json_rejection(
        verbosity: ErrorVerbosity,
        json_rejection: JsonRejection,
        body_expected_schema: String,
    ) -> Self {
        Self::new(
            verbosity,
            json_rejection.status(),
            json_rejection.body_text(),
            body_expected_schema,
        )
    }
}

#[derive(Debug)]
pub struct PathError {
    verbosity: ErrorVerbosity,
    path_error_reason: Option<String>,
}

impl PathError {
    pub fn new(verbosity: ErrorVerbosity, path_error_reason: String) -> Self {
        let path_error_reason = verbosity
            .should_generate_error_reason()
            .then_some(path_error_reason);

        PathError {
            verbosity,
            path_error_reason,
        }
    }

    pub fn from_path_rejection(verbosity: ErrorVerbosity, path_rejection: PathRejection) -> ApiError {
        PathError::new(verbosity, path_rejection.body_text()).into()
    }
}

#[derive(Debug)]
pub struct MethodNotAllowedError {
    verbosity: ErrorVerbosity,
}

impl MethodNotAllowedError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        MethodNotAllowedError { verbosity }
    }
}

#[derive(Debug)]
pub struct NotFoundError {
    verbosity: ErrorVerbosity,
}

impl NotFoundError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        NotFoundError { verbosity }
    }
}

/// Describes how a failed operation on a resource is reported.
pub trait ResourceErrorProvider {
    fn status_code(&self) -> StatusCode;

    /// Message shown to the client.
    fn message(&self) -> &'static str;

    fn error_type(&self) -> &'static str;

    /// Detailed reason, only shown with [`ErrorVerbosity::Full`].
    fn reason(&self) -> String;
}

#[derive(Debug)]
pub struct ResourceError {
    verbosity: ErrorVerbosity,
    status_code: StatusCode,
    message: &'static str,
    error_type: &'static str,
    reason: Option<String>,
}

impl ResourceError {
    pub fn new<P: ResourceErrorProvider>(verbosity: ErrorVerbosity, provider: &P) -> Self {
        let reason = verbosity
            .should_generate_error_reason()
            .then(|| provider.reason());

        ResourceError {
            verbosity,
            status_code: provider.status_code(),
            message: provider.message(),
            error_type: provider.error_type(),
            reason,
        }
    }
}

impl ResourceErrorProvider for BookError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookError::Invalid { .. } => StatusCode::BAD_REQUEST,
            BookError::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            BookError::NotFound { .. } => "Book not found",
            BookError::Invalid { .. } => "Invalid book data",
            BookError::Conflict { .. } => "Book ID already exists",
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            BookError::NotFound { .. } => "BookNotFound",
            BookError::Invalid { .. } => "InvalidBookData",
            BookError::Conflict { .. } => "BookIdAlreadyExists",
        }
    }

    fn reason(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, Option<Value>) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body = (!bytes.is_empty())
            .then(|| serde_json::from_slice(&bytes).expect("Body is not JSON"));

        (status, body)
    }

    fn not_found() -> BookError {
        BookError::NotFound {
            id: "b1".to_string(),
        }
    }

    #[tokio::test]
    async fn message_verbosity_renders_only_the_message() {
        let err = ResourceError::new(ErrorVerbosity::Message, &not_found()).into();

        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, Some(json!({"error": "Book not found"})));
    }

    #[tokio::test]
    async fn full_verbosity_adds_type_and_reason() {
        let err = ResourceError::new(ErrorVerbosity::Full, &not_found()).into();

        let (_, body) = render(err).await;

        assert_eq!(
            body,
            Some(json!({
                "error": "Book not found",
                "error_type": "BookNotFound",
                "reason": "Book with id `b1` not found",
            }))
        );
    }

    #[tokio::test]
    async fn status_code_verbosity_has_no_body() {
        let err = ResourceError::new(
            ErrorVerbosity::StatusCode,
            &BookError::Conflict {
                id: "b1".to_string(),
            },
        )
        .into();

        assert_eq!(render(err).await, (StatusCode::CONFLICT, None));
    }

    #[tokio::test]
    async fn none_verbosity_hides_the_status() {
        let err = NotFoundError::new(ErrorVerbosity::None).into();

        assert_eq!(render(err).await, (StatusCode::NO_CONTENT, None));
    }

    #[tokio::test]
    async fn internal_error_reason_only_when_full() {
        let err = InternalServerError::from_generic_error(
            ErrorVerbosity::Message,
            anyhow::anyhow!("disk on fire"),
        )
        .into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            Some(json!({"error": "An internal server error has occurred"}))
        );

        let err = InternalServerError::from_generic_error(
            ErrorVerbosity::Full,
            anyhow::anyhow!("disk on fire"),
        )
        .into();
        let (_, body) = render(err).await;
        assert_eq!(
            body.and_then(|body| body.get("reason").cloned()),
            Some(json!("disk on fire"))
        );
    }
}
