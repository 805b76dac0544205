use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    book::Book,
    error::{ApiError, ErrorVerbosityProvider},
    extractor::path::ApiPath,
    state::ApiState,
};

use super::BookIdPath;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookResponse {
    #[schema(example = "Book deleted")]
    pub message: String,
    #[serde(rename = "deletedBook")]
    pub deleted_book: Book,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Delete a book.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "The `book_id` of the book")),
    responses(
        (status = 200, description = "The deleted book", body = DeleteBookResponse),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Books could not be stored", body = crate::error::ApiErrorResponse),
    )
)]
pub async fn delete_book(
    ApiPath(path): ApiPath<BookIdPath>,
    State(state): State<ApiState>,
) -> Result<DeleteBookResponse, ApiError> {
    let deleted_book = state
        .books()
        .remove(&path.id)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(DeleteBookResponse {
        message: "Book deleted".to_string(),
        deleted_book,
    })
}
