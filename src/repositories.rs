use crate::models::author::{
    Author, AuthorExistsError, CreateAuthorError, CreateAuthorRequest, DeleteAuthorError,
    FindAuthorError, ListAuthorsError, ListAuthorsQuery, UpdateAuthorError, UpdateAuthorRequest,
};
use crate::models::book::{
    AddBookAuthorError, Book, BookExistsError, CreateBookError, CreateBookRequest,
    DeleteBookError, FindBookError, ListBooksError, ListBooksQuery, PublicationStatus,
    RemoveBookAuthorError, UpdateBookError, UpdateBookRequest, UpdatePublicationStatusError,
};
use crate::models::page::Page;
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError>;

    async fn find_author(&self, id: i64) -> Result<Author, FindAuthorError>;

    async fn list_authors(&self, query: &ListAuthorsQuery)
    -> Result<Page<Author>, ListAuthorsError>;

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError>;

    async fn delete_author(&self, id: i64) -> Result<(), DeleteAuthorError>;

    async fn author_exists(&self, id: i64) -> Result<bool, AuthorExistsError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError>;

    async fn find_book(&self, id: i64) -> Result<Book, FindBookError>;

    async fn list_books(&self, query: &ListBooksQuery) -> Result<Page<Book>, ListBooksError>;

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError>;

    async fn delete_book(&self, id: i64) -> Result<(), DeleteBookError>;

    async fn book_exists(&self, id: i64) -> Result<bool, BookExistsError>;

    async fn update_publication_status(
        &self,
        id: i64,
        status: PublicationStatus,
    ) -> Result<Book, UpdatePublicationStatusError>;

    async fn add_book_author(
        &self,
        book_id: i64,
        author_id: i64,
    ) -> Result<Book, AddBookAuthorError>;

    async fn remove_book_author(
        &self,
        book_id: i64,
        author_id: i64,
    ) -> Result<Book, RemoveBookAuthorError>;
}
