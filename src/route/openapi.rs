use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::{
    book::{Book, BookPatch},
    error::ApiErrorResponse,
    state::ApiState,
};

use super::books::{
    create_book, delete_book::DeleteBookResponse, delete_book, get_book, list_books, update_book,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books::list_books,
        get_book::get_book,
        create_book::create_book,
        update_book::update_book,
        delete_book::delete_book,
    ),
    components(schemas(Book, BookPatch, DeleteBookResponse, ApiErrorResponse)),
    tags((name = "books", description = "Book management"))
)]
pub struct ApiDoc;

pub fn app() -> Router<ApiState> {
    Router::<ApiState>::new().route(
        "/api-doc/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
