use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    book::Book,
    error::{ApiError, ErrorVerbosityProvider},
    extractor::path::ApiPath,
    state::ApiState,
};

use super::BookIdPath;

pub struct GetBookResponse(pub Book);

impl IntoResponse for GetBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.0)).into_response()
    }
}

/// Get a single book by its `book_id`.
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "The `book_id` of the book")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Books could not be loaded", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn get_book(
    ApiPath(path): ApiPath<BookIdPath>,
    State(state): State<ApiState>,
) -> Result<GetBookResponse, ApiError> {
    let book = state
        .books()
        .get(&path.id)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(GetBookResponse(book))
}
