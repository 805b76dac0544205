use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{
    book::{Book, BookError, REQUIRED_FIELDS},
    error::{ApiError, ErrorVerbosityProvider, ResourceError},
    extractor::json::ApiJsonOrDefault,
    state::ApiState,
};

pub struct CreateBookResponse(pub Book);

impl IntoResponse for CreateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Create a new book.
///
/// `book_id`, `title`, `author`, `genre`, `year` and `copies` must be present and non-empty.
/// Any other fields are stored as they are.
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = Book,
    responses(
        (status = 201, description = "The created book", body = Book),
        (status = 400, description = "Invalid book data", body = crate::error::ApiErrorResponse),
        (status = 409, description = "Book ID already exists", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Books could not be stored", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn create_book(
    State(state): State<ApiState>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<Value>,
) -> Result<CreateBookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    let candidate = Book::from_value(body).ok_or_else(|| {
        ResourceError::new(
            verbosity,
            &BookError::Invalid {
                missing: REQUIRED_FIELDS.to_vec(),
            },
        )
    })?;

    let book = state
        .books()
        .create(candidate)
        .await
        .map_err(|err| ApiError::from_repository_error(verbosity, err))?;

    Ok(CreateBookResponse(book))
}
