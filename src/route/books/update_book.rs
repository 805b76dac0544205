use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    book::{Book, BookPatch},
    error::{ApiError, ErrorVerbosityProvider},
    extractor::{json::ApiJsonOrDefault, path::ApiPath},
    state::ApiState,
};

use super::BookIdPath;

pub struct UpdateBookResponse(pub Book);

impl IntoResponse for UpdateBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.0)).into_response()
    }
}

/// Overlay the given fields on an existing book.
///
/// Fields missing from the body are kept. Nothing is re-validated.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "The `book_id` of the book")),
    request_body = BookPatch,
    responses(
        (status = 200, description = "The updated book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Books could not be stored", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn update_book(
    ApiPath(path): ApiPath<BookIdPath>,
    State(state): State<ApiState>,
    ApiJsonOrDefault(patch): ApiJsonOrDefault<BookPatch>,
) -> Result<UpdateBookResponse, ApiError> {
    let book = state
        .books()
        .update(&path.id, patch)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(UpdateBookResponse(book))
}
