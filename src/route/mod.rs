pub mod books;
pub mod openapi;
