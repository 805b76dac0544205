use serde::Deserialize;

pub mod app;
pub mod create_book;
pub mod delete_book;
pub mod get_book;
pub mod list_books;
pub mod update_book;


/// Path parameters of `/books/:id`.
#[derive(Debug, Deserialize)]
pub struct BookIdPath {
    pub id: String,
}
